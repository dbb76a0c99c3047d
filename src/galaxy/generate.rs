//! Spiral galaxy point cloud generation.
//!
//! Every particle gets a random radius, is assigned to an arm by its index, twisted by
//! `spin` proportionally to that radius and scattered by power-shaped jitter. Colors
//! blend from the inside color at the center to the outside color at the rim.

use super::{ConfigurationError, GalaxyParameters};
use rand::prelude::*;
use rand::rngs::{StdRng, ThreadRng};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Particles per independently seeded chunk in [`generate_seeded`]
pub const SEEDED_CHUNK_SIZE: usize = 4096;

/// Stream of draws consumed by the generator.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn uniform(&mut self) -> f32;

    /// Sign draw for the jitter, `true` keeps the jitter positive
    fn positive(&mut self) -> bool {
        self.uniform() < 0.5
    }
}

impl RandomSource for StdRng {
    fn uniform(&mut self) -> f32 {
        self.random::<f32>()
    }
}

impl RandomSource for ThreadRng {
    fn uniform(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Flat, index aligned particle buffers ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    /// Interleaved x, y, z
    pub positions: Vec<f32>,
    /// Interleaved r, g, b in `[0, 1]`
    pub colors: Vec<f32>,
    pub size: f32,
}

impl PointCloud {
    fn zeroed(count: usize, size: f32) -> Self {
        Self {
            positions: vec![0.0; count * 3],
            colors: vec![0.0; count * 3],
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Generates `params.count` particles drawing from `rng` in particle order.
///
/// Fails before allocating if the parameters cannot produce finite buffers.
pub fn generate<R: RandomSource + ?Sized>(
    params: &GalaxyParameters,
    rng: &mut R,
) -> Result<PointCloud, ConfigurationError> {
    params.validate()?;

    let mut cloud = PointCloud::zeroed(params.count, params.size);
    for (index, (position, color)) in cloud
        .positions
        .chunks_exact_mut(3)
        .zip(cloud.colors.chunks_exact_mut(3))
        .enumerate()
    {
        write_particle(params, index, rng, position, color);
    }
    Ok(cloud)
}

/// Parallel generation where every chunk of [`SEEDED_CHUNK_SIZE`] particles owns an
/// rng derived from `seed` and the chunk index. The output only depends on the seed
/// and the parameters, never on the number of worker threads.
pub fn generate_seeded(
    params: &GalaxyParameters,
    seed: u64,
) -> Result<PointCloud, ConfigurationError> {
    params.validate()?;

    let mut cloud = PointCloud::zeroed(params.count, params.size);
    let stride = SEEDED_CHUNK_SIZE * 3;
    cloud
        .positions
        .par_chunks_mut(stride)
        .zip(cloud.colors.par_chunks_mut(stride))
        .enumerate()
        .for_each(|(chunk, (positions, colors))| {
            let mut rng = chunk_rng(seed, chunk);
            let first = chunk * SEEDED_CHUNK_SIZE;
            for (offset, (position, color)) in positions
                .chunks_exact_mut(3)
                .zip(colors.chunks_exact_mut(3))
                .enumerate()
            {
                write_particle(params, first + offset, &mut rng, position, color);
            }
        });
    Ok(cloud)
}

fn chunk_rng(seed: u64, chunk: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (chunk as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Signed jitter in `[-1, 1]`, larger powers pull it towards zero
fn jitter<R: RandomSource + ?Sized>(rng: &mut R, power: f32) -> f32 {
    let magnitude = rng.uniform().powf(power);
    if rng.positive() {
        magnitude
    } else {
        -magnitude
    }
}

fn write_particle<R: RandomSource + ?Sized>(
    params: &GalaxyParameters,
    index: usize,
    rng: &mut R,
    position: &mut [f32],
    color: &mut [f32],
) {
    let radius = rng.uniform() * params.radius;
    let spin_angle = radius * params.spin;
    let branch_angle =
        (index % params.branches as usize) as f32 / params.branches as f32 * TAU;

    let jitter_x = jitter(rng, params.randomness_power);
    let jitter_y = jitter(rng, params.randomness_power);
    let jitter_z = jitter(rng, params.randomness_power);

    // squaring drops the jitter sign on purpose, arms thicken towards the rim
    let angle = branch_angle + spin_angle;
    position[0] = angle.cos() * (radius + jitter_x).powi(2);
    position[1] = jitter_y * (rng.uniform() - 0.5) * params.height;
    position[2] = angle.sin() * (radius + jitter_z).powi(2);

    let t = radius / params.radius;
    let inside = params.inside_color;
    let outside = params.outside_color;
    color[0] = mix_channel(inside.red, outside.red, t);
    color[1] = mix_channel(inside.green, outside.green, t);
    color[2] = mix_channel(inside.blue, outside.blue, t);
}

/// Exact at both ends, `t == 0` returns `a` and `t == 1` returns `b`
fn mix_channel(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::color::Srgba;

    /// Always returns the same draws
    struct FixedSource {
        uniform: f32,
        positive: bool,
    }

    impl RandomSource for FixedSource {
        fn uniform(&mut self) -> f32 {
            self.uniform
        }

        fn positive(&mut self) -> bool {
            self.positive
        }
    }

    /// Plays back a recorded stream of draws, signs come from `uniform() < 0.5`
    struct SequenceSource {
        draws: Vec<f32>,
        next: usize,
    }

    impl RandomSource for SequenceSource {
        fn uniform(&mut self) -> f32 {
            let draw = self.draws[self.next];
            self.next += 1;
            draw
        }
    }

    fn params() -> GalaxyParameters {
        GalaxyParameters {
            count: 5000,
            ..Default::default()
        }
    }

    #[test]
    fn test_buffer_lengths_match_count() {
        let mut rng = StdRng::seed_from_u64(42);
        let cloud = generate(&params(), &mut rng).unwrap();
        assert_eq!(cloud.positions.len(), 3 * 5000);
        assert_eq!(cloud.colors.len(), 3 * 5000);
        assert_eq!(cloud.len(), 5000);
        assert_eq!(cloud.position_triples().len(), 5000);
        assert_eq!(cloud.color_triples().len(), 5000);
    }

    #[test]
    fn test_size_is_passed_through() {
        let params = GalaxyParameters {
            size: 0.077,
            ..params()
        };
        let cloud = generate(&params, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(cloud.size, 0.077);
    }

    #[test]
    fn test_zero_count_gives_empty_buffers() {
        let params = GalaxyParameters {
            count: 0,
            ..params()
        };
        let cloud = generate(&params, &mut StdRng::seed_from_u64(42)).unwrap();
        assert!(cloud.is_empty());
        assert!(cloud.colors.is_empty());

        let seeded = generate_seeded(&params, 42).unwrap();
        assert!(seeded.is_empty());
    }

    #[test]
    fn test_color_channels_in_unit_range() {
        let cloud = generate(&params(), &mut StdRng::seed_from_u64(3)).unwrap();
        for (i, channel) in cloud.colors.iter().enumerate() {
            assert!(
                (0.0..=1.0).contains(channel),
                "Color value {i} = {channel} is outside [0, 1]"
            );
        }
    }

    #[test]
    fn test_single_branch_keeps_every_particle_on_one_arm() {
        let params = GalaxyParameters {
            branches: 1,
            spin: 0.0,
            ..params()
        };
        let cloud = generate(&params, &mut StdRng::seed_from_u64(9)).unwrap();
        for (i, [x, _, z]) in cloud.position_triples().iter().enumerate() {
            assert_eq!(*z, 0.0, "Particle {i} left the single arm");
            assert!(*x >= 0.0, "Particle {i} is behind the arm origin");
        }
    }

    #[test]
    fn test_same_seed_produces_identical_buffers() {
        let a = generate(&params(), &mut StdRng::seed_from_u64(123)).unwrap();
        let b = generate(&params(), &mut StdRng::seed_from_u64(123)).unwrap();
        let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.positions), bits(&b.positions));
        assert_eq!(bits(&a.colors), bits(&b.colors));
    }

    #[test]
    fn test_randomness_does_not_scale_jitter() {
        let calm = GalaxyParameters {
            randomness: 0.0,
            ..params()
        };
        let wild = GalaxyParameters {
            randomness: 2.0,
            ..params()
        };
        let a = generate(&calm, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generate(&wild, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_center_color_is_inside_color() {
        let params = GalaxyParameters {
            count: 3,
            inside_color: Srgba::rgb(0.2, 0.4, 0.6),
            outside_color: Srgba::rgb(0.9, 0.1, 0.3),
            ..params()
        };
        let mut rng = FixedSource {
            uniform: 0.0,
            positive: true,
        };
        let cloud = generate(&params, &mut rng).unwrap();
        for color in cloud.color_triples() {
            assert_eq!(*color, [0.2, 0.4, 0.6]);
        }
    }

    #[test]
    fn test_rim_color_is_outside_color() {
        let params = GalaxyParameters {
            count: 3,
            inside_color: Srgba::rgb(0.2, 0.4, 0.6),
            outside_color: Srgba::rgb(0.9, 0.1, 0.3),
            ..params()
        };
        let mut rng = FixedSource {
            uniform: 1.0,
            positive: false,
        };
        let cloud = generate(&params, &mut rng).unwrap();
        for color in cloud.color_triples() {
            assert_eq!(*color, [0.9, 0.1, 0.3]);
        }
    }

    #[test]
    fn test_fixed_draws_give_hand_computed_cloud() {
        let params = GalaxyParameters {
            count: 4,
            branches: 2,
            radius: 1.0,
            spin: 0.0,
            randomness_power: 2.0,
            height: 5.0,
            inside_color: Srgba::rgb(1.0, 0.0, 0.0),
            outside_color: Srgba::rgb(0.0, 0.0, 1.0),
            ..params()
        };
        let mut rng = FixedSource {
            uniform: 0.5,
            positive: true,
        };
        let cloud = generate(&params, &mut rng).unwrap();

        // radius 0.5, jitter 0.5^2, radial term (0.5 + 0.25)^2
        let expected = [
            [0.5625, 0.0, 0.0],
            [-0.5625, 0.0, 0.0],
            [0.5625, 0.0, 0.0],
            [-0.5625, 0.0, 0.0],
        ];
        for (i, (actual, expected)) in cloud
            .position_triples()
            .iter()
            .zip(expected.iter())
            .enumerate()
        {
            for axis in 0..3 {
                assert!(
                    (actual[axis] - expected[axis]).abs() < 1e-6,
                    "Particle {i} axis {axis}: {} != {}",
                    actual[axis],
                    expected[axis]
                );
            }
        }
        for color in cloud.color_triples() {
            assert_eq!(*color, [0.5, 0.0, 0.5]);
        }
    }

    #[test]
    fn test_draws_are_consumed_in_particle_order() {
        let params = GalaxyParameters {
            count: 1,
            branches: 1,
            radius: 2.0,
            spin: std::f32::consts::FRAC_PI_2,
            randomness_power: 2.0,
            height: 4.0,
            inside_color: Srgba::rgb(1.0, 0.0, 0.0),
            outside_color: Srgba::rgb(0.0, 0.0, 1.0),
            ..params()
        };
        // radius, then magnitude and sign for x, y, z, then the vertical draw
        let mut rng = SequenceSource {
            draws: vec![0.25, 0.5, 0.1, 0.8, 0.9, 0.6, 0.7, 0.75],
            next: 0,
        };
        let cloud = generate(&params, &mut rng).unwrap();
        assert_eq!(rng.next, 8);

        // radius 0.5 at angle pi/4, jitter +0.25, -0.64, -0.36
        let half_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;
        let expected = [half_sqrt2 * 0.5625, -0.64, half_sqrt2 * 0.0196];
        let actual = cloud.position_triples()[0];
        for axis in 0..3 {
            assert!(
                (actual[axis] - expected[axis]).abs() < 1e-5,
                "Axis {axis}: {} != {}",
                actual[axis],
                expected[axis]
            );
        }

        let color = cloud.color_triples()[0];
        assert!((color[0] - 0.75).abs() < 1e-6);
        assert_eq!(color[1], 0.0);
        assert!((color[2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_zero_radius_fails_without_nan() {
        let params = GalaxyParameters {
            radius: 0.0,
            ..params()
        };
        let result = generate(&params, &mut StdRng::seed_from_u64(1));
        assert_eq!(result, Err(ConfigurationError::InvalidRadius(0.0)));
        assert_eq!(
            generate_seeded(&params, 1),
            Err(ConfigurationError::InvalidRadius(0.0))
        );
    }

    #[test]
    fn test_zero_branches_fails() {
        let params = GalaxyParameters {
            branches: 0,
            ..params()
        };
        let result = generate(&params, &mut StdRng::seed_from_u64(1));
        assert_eq!(result, Err(ConfigurationError::InvalidBranches(0)));
    }

    #[test]
    fn test_height_bounds_vertical_spread() {
        let params = GalaxyParameters {
            height: 2.0,
            ..params()
        };
        let cloud = generate_seeded(&params, 77).unwrap();
        for (i, [_, y, _]) in cloud.position_triples().iter().enumerate() {
            assert!(y.abs() <= 1.0, "Particle {i} y = {y} exceeds height / 2");
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_seeded(&params(), 2024).unwrap();
        let b = generate_seeded(&params(), 2024).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_seeded(&params(), 1).unwrap();
        let b = generate_seeded(&params(), 9999).unwrap();
        let differences = a
            .position_triples()
            .iter()
            .zip(b.position_triples())
            .filter(|(p, q)| p != q)
            .count();
        assert!(
            differences > 4500,
            "Expected most particles to differ between seeds, only {differences}/5000 differed"
        );
    }

    #[test]
    fn test_seeded_branches_follow_global_index_across_chunks() {
        let params = GalaxyParameters {
            count: SEEDED_CHUNK_SIZE * 2 + 17,
            branches: 3,
            spin: 0.0,
            ..params()
        };
        let cloud = generate_seeded(&params, 11).unwrap();
        assert_eq!(cloud.len(), params.count);

        let around_boundaries = (SEEDED_CHUNK_SIZE - 8..SEEDED_CHUNK_SIZE + 8)
            .chain(2 * SEEDED_CHUNK_SIZE - 8..params.count);
        for i in around_boundaries {
            let [x, _, z] = cloud.position_triples()[i];
            let length = (x * x + z * z).sqrt();
            if length < 1e-4 {
                continue;
            }
            let angle = (i % 3) as f32 / 3.0 * TAU;
            assert!(
                (x / length - angle.cos()).abs() < 1e-3
                    && (z / length - angle.sin()).abs() < 1e-3,
                "Particle {i} is not on arm {}",
                i % 3
            );
        }
    }
}
