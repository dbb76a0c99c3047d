use crate::galaxy::{generate, generate_seeded};
use crate::prelude::*;
use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey, NotShadowCaster},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::{Indices, MeshVertexBufferLayoutRef, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        render_resource::{
            AsBindGroup, RenderPipelineDescriptor, ShaderRef, SpecializedMeshPipelineError,
        },
        view::NoFrustumCulling,
    },
};
use rayon::prelude::*;
use std::time::Instant;

const SHADER_ASSET_PATH: &str = "shaders/galaxy_points.wgsl";

/// Billboard corners, the shader expands each quad along the camera axes
const QUAD_CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

pub struct GalaxyPointsPlugin;

impl Plugin for GalaxyPointsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<GalaxyPointsMaterial>::default())
            .init_resource::<GalaxyPointsSlot>()
            .init_resource::<GalaxyStats>()
            .add_systems(PostUpdate, rebuild_galaxy_points);
    }
}

#[derive(Component)]
pub struct GalaxyPoints;

/// Summary of the cloud currently on screen
#[derive(Resource, Default)]
pub struct GalaxyStats {
    pub particles: usize,
    pub seed: Option<u64>,
    pub generation_ms: f32,
}

struct InstalledPoints {
    entity: Entity,
    mesh: Handle<Mesh>,
    material: Handle<GalaxyPointsMaterial>,
}

/// The single displayed cloud. Replaced as a whole, never patched.
#[derive(Resource)]
pub struct GalaxyPointsSlot {
    generation: i32,
    installed: Option<InstalledPoints>,
}

impl Default for GalaxyPointsSlot {
    fn default() -> Self {
        Self {
            generation: -1,
            installed: None,
        }
    }
}

pub fn seed_label(seed: Option<u64>) -> String {
    seed.map_or_else(|| "random".to_string(), |seed| seed.to_string())
}

fn generation_summary(
    generation: i32,
    particles: usize,
    seed: Option<u64>,
    generation_ms: f32,
) -> String {
    format!(
        "Galaxy generation {generation}: {particles} particles, seed {}, in {generation_ms:.2} ms",
        seed_label(seed)
    )
}

/// Vertex colors are read as linear, the cloud stores sRGB components
fn vertex_color(color: &[f32; 3]) -> [f32; 4] {
    let linear = LinearRgba::from(Srgba::rgb(color[0], color[1], color[2]));
    [linear.red, linear.green, linear.blue, 1.0]
}

/// Expands every particle into a quad: 4 vertices sharing the particle center and
/// color, told apart by their corner uv.
pub fn build_points_mesh(cloud: &PointCloud) -> Mesh {
    let vertex_count = cloud.len() * 4;

    let mut positions = vec![[0.0f32; 3]; vertex_count];
    let mut colors = vec![[0.0f32; 4]; vertex_count];
    positions
        .par_chunks_exact_mut(4)
        .zip(colors.par_chunks_exact_mut(4))
        .zip(
            cloud
                .position_triples()
                .par_iter()
                .zip(cloud.color_triples().par_iter()),
        )
        .for_each(|((quad_positions, quad_colors), (center, color))| {
            quad_positions.fill(*center);
            quad_colors.fill(vertex_color(color));
        });

    let uvs: Vec<[f32; 2]> = QUAD_CORNERS
        .iter()
        .copied()
        .cycle()
        .take(vertex_count)
        .collect();

    let indices: Vec<u32> = (0..cloud.len() as u32)
        .flat_map(|quad| {
            let base = quad * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
    .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
    .with_inserted_indices(Indices::U32(indices))
}

/// Regenerates the cloud whenever the config generation moves on.
/// Rejected parameters leave the current cloud untouched.
fn rebuild_galaxy_points(
    mut commands: Commands,
    galaxy_config: Res<GalaxyConfig>,
    mut slot: ResMut<GalaxyPointsSlot>,
    mut stats: ResMut<GalaxyStats>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<GalaxyPointsMaterial>>,
) {
    if slot.generation == galaxy_config.generation {
        return;
    }
    slot.generation = galaxy_config.generation;

    let params = &galaxy_config.parameters;
    let start = Instant::now();
    let result = match galaxy_config.seed {
        Some(seed) => generate_seeded(params, seed),
        None => generate(params, &mut rand::rng()),
    };
    let cloud = match result {
        Ok(cloud) => cloud,
        Err(err) => {
            warn!("Galaxy not regenerated, invalid {}: {err}", err.field());
            return;
        }
    };
    let mesh = (!cloud.is_empty()).then(|| build_points_mesh(&cloud));
    let generation_ms = start.elapsed().as_secs_f32() * 1000.0;

    info!(
        "{}",
        generation_summary(
            galaxy_config.generation,
            cloud.len(),
            galaxy_config.seed,
            generation_ms
        )
    );

    // the replacement is complete, release the old cloud before installing it
    if let Some(old) = slot.installed.take() {
        commands.entity(old.entity).despawn();
        meshes.remove(&old.mesh);
        materials.remove(&old.material);
    }

    if let Some(mesh) = mesh {
        let mesh = meshes.add(mesh);
        let material = materials.add(GalaxyPointsMaterial {
            size: cloud.size,
            alpha_mode: AlphaMode::Add,
        });
        let entity = commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                Visibility::Inherited,
                GalaxyPoints,
                NotShadowCaster,
                NoFrustumCulling,
            ))
            .id();
        slot.installed = Some(InstalledPoints {
            entity,
            mesh,
            material,
        });
    }

    *stats = GalaxyStats {
        particles: cloud.len(),
        seed: galaxy_config.seed,
        generation_ms,
    };
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GalaxyPointsMaterial {
    #[uniform(0)]
    size: f32,
    alpha_mode: AlphaMode,
}

impl Material for GalaxyPointsMaterial {
    fn vertex_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            Mesh::ATTRIBUTE_COLOR.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        // billboards always face the camera
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}
