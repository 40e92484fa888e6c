use crate::AppState;
use crate::composer::CompositionState;
use crate::creature::CreatureController;
use crate::pose::DetectionState;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};

const GUIDELINE_TEXT: &str =
    "Please show a simple lighter. Do not hide it partially with your hand. Magic will happen.";

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayState>()
            .add_systems(Update, toggle_debug_panel_shortcut)
            .add_systems(EguiPrimaryContextPass, draw_overlay_egui);
    }
}

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverlayState {
    pub guideline_dismissed: bool,
    pub debug_visible: bool,
}

impl OverlayState {
    /// The instructions stay up until the object shows up once or the user
    /// hides them.
    pub fn guideline_visible(&self, detection: &DetectionState) -> bool {
        !self.guideline_dismissed && !detection.ever_detected
    }
}

pub fn toggle_debug_panel_shortcut(
    keys: Res<ButtonInput<KeyCode>>,
    mut overlay: ResMut<OverlayState>,
) {
    if keys.just_pressed(KeyCode::F3) {
        overlay.debug_visible = !overlay.debug_visible;
    }
}

fn draw_overlay_egui(
    mut contexts: EguiContexts,
    mut overlay: ResMut<OverlayState>,
    app_state: Res<State<AppState>>,
    detection: Res<DetectionState>,
    composition: Res<CompositionState>,
    creatures: Query<&CreatureController>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    if matches!(app_state.get(), AppState::Loading) {
        egui::Area::new(egui::Id::new("loading"))
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("Loading...").size(20.0));
            });
    }

    if overlay.guideline_visible(&detection) {
        draw_guideline(&mut overlay, ctx);
    }

    if overlay.debug_visible {
        draw_debug_panel(ctx, &detection, &composition, &creatures);
    }
}

fn draw_guideline(overlay: &mut OverlayState, ctx: &egui::Context) {
    egui::Window::new("Instructions")
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(GUIDELINE_TEXT).size(16.0));
                ui.add_space(8.0);
                if ui.button("Hide instructions").clicked() {
                    overlay.guideline_dismissed = true;
                }
            });
        });
}

fn draw_debug_panel(
    ctx: &egui::Context,
    detection: &DetectionState,
    composition: &CompositionState,
    creatures: &Query<&CreatureController>,
) {
    egui::Window::new("Debug")
        .default_pos(egui::pos2(12.0, 12.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!(
                "detected: {} (ever: {})",
                detection.detected, detection.ever_detected
            ));
            for controller in creatures {
                let state = &controller.state;
                ui.separator();
                ui.label(format!("phase: {}", state.phase()));
                ui.label(format!(
                    "arrive: {:.3}  attack: {:.3}",
                    state.arrive_progress().value(),
                    state.attack_progress().value()
                ));
                ui.label(format!(
                    "flame throwing: {}  ambient flame: {}",
                    state.is_flame_throwing(),
                    state.is_ambient_flame()
                ));
            }
            ui.separator();
            ui.label(format!(
                "breath: {}  flame: {}",
                composition.breath.is_some(),
                composition.flame.is_some()
            ));
        });
}
