use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};

use crate::graph::EngineContext;
use crate::ui::{HUD_EDGE_PADDING, HUD_PANEL_GAP, PANEL_W};

pub fn hud_overlay(mut contexts: EguiContexts, engine: Res<EngineContext>) {
    let ctx = contexts.ctx_mut();
    let screen = ctx.screen_rect();
    let x = screen.min.x + PANEL_W + HUD_PANEL_GAP;
    let y = screen.min.y + HUD_EDGE_PADDING;

    let shown = engine.scene.primitives().iter().filter(|p| p.visible).count();
    egui::Area::new("hud".into())
        .order(egui::Order::Foreground)
        .fixed_pos(egui::pos2(x, y))
        .show(ctx, |ui| {
            ui.group(|ui| {
                ui.label(format!("Mode: {}", engine.mode.as_str()));
                ui.label(format!(
                    "Visible: {} / {} primitives",
                    shown,
                    engine.scene.primitives().len()
                ));
                ui.label(format!("Generation: {}", engine.scene.generation()));
                ui.label(format!("Camera distance: {:.1}", engine.camera.distance()));
                if engine.camera.is_animating() {
                    ui.label("Focusing…");
                }
                ui.label(format!("Frames: {}", engine.render_loop.frames()));
            });
        });
}
