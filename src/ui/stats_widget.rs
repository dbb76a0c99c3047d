use crate::graphics::{seed_label, GalaxyStats};
use bevy::diagnostic::DiagnosticsStore;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;

pub struct StatsWidgetPlugin;

impl Plugin for StatsWidgetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_widget)
            .add_systems(Update, update_widget_system)
            .add_plugins(FrameTimeDiagnosticsPlugin::default());
    }
}

#[derive(Component)]
struct StatsWidget;

fn setup_widget(mut commands: Commands) {
    commands
        .spawn((
            Node {
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::FlexStart,
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::FlexStart,
                width: Val::Px(260.),
                right: Val::Percent(1.),
                top: Val::Percent(1.),
                bottom: Val::Auto,
                left: Val::Auto,
                padding: UiRect::all(Val::Px(8.0)),
                ..default()
            },
            BackgroundColor(Color::linear_rgba(0.0, 0.03, 0.08, 0.5)),
            GlobalZIndex(i32::MAX - 1),
        ))
        .with_children(|parent| {
            parent.spawn((
                StatsWidget,
                Text(" N/A".to_string()),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
            ));
        });
}

fn stats_text(fps: f64, frame_time: f64, stats: &GalaxyStats) -> String {
    let seed = seed_label(stats.seed);
    format!(
        "{:>10} {fps:.1} ({frame_time:.2} ms)\n{:>10} {}\n{:>10} {:.2} ms\n{:>10} {seed}",
        "FPS:",
        "Stars:",
        stats.particles,
        "Built in:",
        stats.generation_ms,
        "Seed:",
    )
}

fn update_widget_system(
    diagnostics: Res<DiagnosticsStore>,
    stats: Res<GalaxyStats>,
    mut query: Query<&mut Text, With<StatsWidget>>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);
    let frame_time = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(|fps| fps.smoothed())
        .unwrap_or(0.0);

    for mut text in &mut query {
        text.0 = stats_text(fps, frame_time, &stats);
    }
}
