use crate::prelude::*;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

pub struct ConfigEguiPlugin;

impl Plugin for ConfigEguiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyConfigUi>()
            .add_systems(Startup, configure_visuals_system)
            .add_systems(Update, ui_system);
    }
}

/// Draft edited by the widgets, copied into [`GalaxyConfig`] when an edit finishes
#[derive(Resource, Default)]
struct GalaxyConfigUi {
    parameters: GalaxyParameters,
    fixed_seed: bool,
    seed: u64,
}

impl GalaxyConfigUi {
    fn apply_to(&self, config: &mut GalaxyConfig) {
        config.parameters = self.parameters;
        config.seed = self.fixed_seed.then_some(self.seed);
    }
}

fn configure_visuals_system(mut contexts: EguiContexts) {
    contexts.ctx_mut().set_visuals(egui::Visuals {
        window_corner_radius: 0.0.into(),
        ..egui::Visuals::dark()
    });
}

/// Continuous drags only count once released, everything else counts immediately
fn edit_finished(response: &egui::Response) -> bool {
    response.drag_stopped() || (response.changed() && !response.dragged())
}

fn color_row(ui: &mut egui::Ui, label: &str, color: &mut Srgba) -> egui::Response {
    let mut srgb = [color.red, color.green, color.blue].map(|c| (c * 255.0).round() as u8);
    let response = ui
        .horizontal(|ui| {
            let response = ui.color_edit_button_srgb(&mut srgb);
            ui.label(format!("{label} {}", color.to_hex()));
            response
        })
        .inner;
    if response.changed() {
        *color = Srgba::rgb_u8(srgb[0], srgb[1], srgb[2]);
    }
    response
}

fn ui_system(
    mut contexts: EguiContexts,
    mut draft: ResMut<GalaxyConfigUi>,
    mut galaxy_config: ResMut<GalaxyConfig>,
) {
    let ctx = contexts.ctx_mut();
    let draft = &mut *draft;
    let minval = GalaxyParameters::MIN;
    let maxval = GalaxyParameters::MAX;

    let mut commit = false;
    let mut regenerate = false;

    egui::SidePanel::left("side_panel")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Galaxy");

            let params = &mut draft.parameters;
            egui::CollapsingHeader::new("Stars")
                .default_open(true)
                .show(ui, |ui| {
                    let response = ui.add(
                        egui::Slider::new(&mut params.count, minval.count..=maxval.count)
                            .step_by(100.0)
                            .text("Stars Count"),
                    );
                    commit |= edit_finished(&response);
                    let response = ui.add(
                        egui::Slider::new(&mut params.size, minval.size..=maxval.size)
                            .step_by(0.001)
                            .text("Stars Size"),
                    );
                    commit |= edit_finished(&response);
                });

            egui::CollapsingHeader::new("Shape")
                .default_open(true)
                .show(ui, |ui| {
                    let response = ui.add(
                        egui::Slider::new(&mut params.radius, minval.radius..=maxval.radius)
                            .step_by(0.01)
                            .text("Radius"),
                    );
                    commit |= edit_finished(&response);
                    let response = ui.add(
                        egui::Slider::new(&mut params.branches, minval.branches..=maxval.branches)
                            .text("Branches"),
                    );
                    commit |= edit_finished(&response);
                    let response = ui.add(
                        egui::Slider::new(&mut params.spin, minval.spin..=maxval.spin)
                            .step_by(0.001)
                            .text("Spin"),
                    );
                    commit |= edit_finished(&response);
                    let response = ui.add(
                        egui::Slider::new(&mut params.height, minval.height..=maxval.height)
                            .step_by(0.01)
                            .text("Height"),
                    );
                    commit |= edit_finished(&response);
                });

            egui::CollapsingHeader::new("Scatter")
                .default_open(true)
                .show(ui, |ui| {
                    let response = ui
                        .add(
                            egui::Slider::new(
                                &mut params.randomness,
                                minval.randomness..=maxval.randomness,
                            )
                            .step_by(0.001)
                            .text("Randomness"),
                        )
                        .on_hover_text("Does not move the particles");
                    commit |= edit_finished(&response);
                    let response = ui.add(
                        egui::Slider::new(
                            &mut params.randomness_power,
                            minval.randomness_power..=maxval.randomness_power,
                        )
                        .step_by(1.0)
                        .text("Randomness Power"),
                    );
                    commit |= edit_finished(&response);
                });

            egui::CollapsingHeader::new("Colors")
                .default_open(true)
                .show(ui, |ui| {
                    commit |= color_row(ui, "Inside", &mut params.inside_color).changed();
                    commit |= color_row(ui, "Outside", &mut params.outside_color).changed();
                });

            ui.separator();
            egui::CollapsingHeader::new("Seed").show(ui, |ui| {
                commit |= ui.checkbox(&mut draft.fixed_seed, "Fixed seed").changed();
                ui.add_enabled_ui(draft.fixed_seed, |ui| {
                    let response = ui.add(egui::DragValue::new(&mut draft.seed).prefix("seed: "));
                    commit |= edit_finished(&response);
                });
            });

            ui.separator();
            ui.horizontal(|ui| {
                regenerate = ui.button("Regenerate").clicked();
                if ui.button("Reset").clicked() {
                    draft.parameters = GalaxyParameters::default();
                    commit = true;
                }
            });
        });

    if commit {
        draft.apply_to(&mut galaxy_config);
    }
    if regenerate {
        galaxy_config.request_regeneration();
    }
}
