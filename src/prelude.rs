pub use crate::galaxy::{GalaxyConfig, GalaxyParameters, PointCloud};
