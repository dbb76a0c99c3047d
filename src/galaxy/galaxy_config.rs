use super::ConfigurationError;
use bevy::prelude::*;

/// Everything a single galaxy generation depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalaxyParameters {
    pub count: usize,
    /// Billboard size in world units, only read by the renderer
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    /// Angular twist per unit of radius
    pub spin: f32,
    /// Exposed in the panel but not applied to the jitter
    pub randomness: f32,
    pub randomness_power: f32,
    pub height: f32,
    pub inside_color: Srgba,
    pub outside_color: Srgba,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 100_000,
            size: 0.034,
            radius: 4.2,
            branches: 7,
            spin: 1.0,
            randomness: 1.586,
            randomness_power: 2.0,
            height: 5.0,
            inside_color: Srgba::rgb_u8(0xff, 0x60, 0x30),
            outside_color: Srgba::rgb_u8(0x1b, 0x39, 0x84),
        }
    }
}

impl GalaxyParameters {
    pub const MIN: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.1,
        branches: 2,
        spin: -5.0,
        randomness: 0.0,
        randomness_power: 1.0,
        height: 1.0,
        inside_color: Srgba::BLACK,
        outside_color: Srgba::BLACK,
    };
    pub const MAX: Self = Self {
        count: 200_000,
        size: 0.1,
        radius: 20.0,
        branches: 20,
        spin: 5.0,
        randomness: 2.0,
        randomness_power: 10.0,
        height: 10.0,
        inside_color: Srgba::WHITE,
        outside_color: Srgba::WHITE,
    };

    /// Rejects parameters that would put NaN or Infinity into the point buffers.
    /// A zero count is valid and produces an empty cloud.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigurationError::InvalidRadius(self.radius));
        }
        if self.branches == 0 {
            return Err(ConfigurationError::InvalidBranches(self.branches));
        }
        Ok(())
    }
}

#[derive(Resource, Clone, PartialEq, Default)]
pub struct GalaxyConfig {
    /// Bumped whenever the applied parameters change, consumers rebuild on mismatch
    pub generation: i32,
    pub parameters: GalaxyParameters,
    /// `None` draws from the thread rng on every rebuild
    pub seed: Option<u64>,
}

impl GalaxyConfig {
    /// Forces consumers to rebuild even though nothing changed.
    pub fn request_regeneration(&mut self) {
        self.generation += 1;
    }
}

/// Last applied parameter snapshot
#[derive(Resource, Default)]
struct GalaxyConfigOld(Option<(GalaxyParameters, Option<u64>)>);

pub struct GalaxyConfigPlugin;

impl Plugin for GalaxyConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyConfig>()
            .init_resource::<GalaxyConfigOld>()
            .add_systems(Update, apply_ui_updates);
    }
}

fn apply_ui_updates(
    mut galaxy_config_old: ResMut<GalaxyConfigOld>,
    mut galaxy_config: ResMut<GalaxyConfig>,
) {
    if !galaxy_config.is_changed() {
        return;
    }
    let snapshot = (galaxy_config.parameters, galaxy_config.seed);
    if galaxy_config_old.0 != Some(snapshot) {
        galaxy_config.generation += 1;
        galaxy_config_old.0 = Some(snapshot);
    }
}
