use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
};
use bevy_egui::EguiContexts;
use std::f32::consts::FRAC_PI_2;

const START_POSITION: Vec3 = Vec3::new(3.0, 3.0, 3.0);
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 60.0;
const ROTATE_SPEED: f32 = 0.005;
/// Higher settles faster
const DAMPING: f32 = 10.0;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(PostUpdate, camera_control_system);
    }
}

fn spawn_camera(mut commands: Commands, mut clearcolor: ResMut<ClearColor>) {
    *clearcolor = ClearColor(Color::BLACK);
    let camera_main = CameraMain::default();
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        Tonemapping::None,
        Transform::from_translation(camera_main.translation()).looking_at(Vec3::ZERO, Vec3::Y),
        camera_main,
    ));
}

/// Orbit camera around `target_pos`. Input moves the targets, the actual angles and
/// zoom ease towards them every frame.
#[derive(Component, Clone)]
pub struct CameraMain {
    target_pos: Vec3,
    yaw: f32,
    pitch: f32,
    target_yaw: f32,
    target_pitch: f32,
    /// 0 is closest, 1 furthest
    zoom: f32,
    smooth_zoom_buffer: f32,
}

impl Default for CameraMain {
    fn default() -> Self {
        let distance = START_POSITION.length();
        let yaw = f32::atan2(START_POSITION.x, START_POSITION.z);
        let pitch = (START_POSITION.y / distance).asin();
        Self {
            target_pos: Vec3::ZERO,
            yaw,
            pitch,
            target_yaw: yaw,
            target_pitch: pitch,
            zoom: ((distance - MIN_DISTANCE) / (MAX_DISTANCE - MIN_DISTANCE)).sqrt(),
            smooth_zoom_buffer: 0.0,
        }
    }
}

impl CameraMain {
    fn distance(&self) -> f32 {
        MIN_DISTANCE + (MAX_DISTANCE - MIN_DISTANCE) * self.zoom * self.zoom
    }

    fn translation(&self) -> Vec3 {
        let direction = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target_pos + direction * self.distance()
    }

    fn rotate(&mut self, delta: Vec2) {
        let pitch_limit = FRAC_PI_2 - 0.01;
        self.target_yaw -= delta.x * ROTATE_SPEED;
        self.target_pitch =
            (self.target_pitch + delta.y * ROTATE_SPEED).clamp(-pitch_limit, pitch_limit);
    }

    /// Eases angles towards their targets and drains part of the zoom buffer
    fn settle(&mut self, delta_secs: f32) {
        let blend = 1.0 - f32::exp(-DAMPING * delta_secs);
        self.yaw += (self.target_yaw - self.yaw) * blend;
        self.pitch += (self.target_pitch - self.pitch) * blend;

        let smooth_zoom_min = 0.001f32;
        let smooth_zoom_factor = 0.2f32;

        let smooth_zoom_amount = if self.smooth_zoom_buffer < 0.0 {
            f32::min(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                (-smooth_zoom_min).max(self.smooth_zoom_buffer),
            )
        } else {
            f32::max(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                smooth_zoom_min.min(self.smooth_zoom_buffer),
            )
        };
        self.zoom = (self.zoom - smooth_zoom_amount).clamp(0.0, 1.0);
        self.smooth_zoom_buffer -= smooth_zoom_amount;
    }
}

pub fn camera_control_system(
    mut query: Query<(&mut Transform, &mut CameraMain)>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
    time: Res<Time>,
) {
    let Ok((mut transform, mut camera_main)) = query.single_mut() else {
        return;
    };

    // events are drained either way so they don't pile up while the panel has focus
    let pointer_free = !contexts.ctx_mut().wants_pointer_input();

    let motion: Vec2 = motion_evr.read().map(|ev| ev.delta).sum();
    if pointer_free && mouse_buttons.pressed(MouseButton::Left) {
        camera_main.rotate(motion);
    }

    for ev in scroll_evr.read() {
        if !pointer_free {
            continue;
        }
        match ev.unit {
            MouseScrollUnit::Line => {
                camera_main.smooth_zoom_buffer += ev.y * 0.05;
            }
            MouseScrollUnit::Pixel => {
                camera_main.smooth_zoom_buffer += ev.y * 0.005;
            }
        }
    }

    camera_main.settle(time.delta_secs());

    transform.translation = camera_main.translation();
    transform.look_at(camera_main.target_pos, Vec3::Y);
}
