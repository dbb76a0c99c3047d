mod error;
mod galaxy_config;
mod generate;

pub use error::ConfigurationError;
pub use galaxy_config::{GalaxyConfig, GalaxyConfigPlugin, GalaxyParameters};
pub use generate::{generate, generate_seeded, PointCloud};
