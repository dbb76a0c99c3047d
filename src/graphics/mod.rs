use bevy::prelude::*;

mod galaxy_points;

pub use galaxy_points::{seed_label, GalaxyStats};

pub struct GraphicsPlugin;

impl Plugin for GraphicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(galaxy_points::GalaxyPointsPlugin);
    }
}
