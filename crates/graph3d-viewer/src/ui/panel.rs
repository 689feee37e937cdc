use bevy::prelude::{EventReader, Res, ResMut};
use bevy_egui::{egui, EguiContexts};
use graph3d_core::{FilterRequest, FilterStrategy, Node};

use crate::app::events::NodeSelected;
use crate::app::resources::HostUi;
use crate::graph::EngineContext;
use crate::net::{NetClient, Request};
use crate::ui::PANEL_W;
use crate::util::config::{self, RenderMode};

pub fn record_selection(mut events: EventReader<NodeSelected>, mut host: ResMut<HostUi>) {
    if let Some(NodeSelected(node)) = events.read().last() {
        host.last_selected = Some(node.clone());
    }
}

pub fn ui_panel(
    mut contexts: EguiContexts,
    mut engine: ResMut<EngineContext>,
    mut host: ResMut<HostUi>,
    client: Res<NetClient>,
) {
    // a miss in the viewport clears the engine selection; mirror it
    if engine.selected.is_none() {
        host.last_selected = None;
    }

    egui::SidePanel::left("left")
        .exact_width(PANEL_W)
        .show(contexts.ctx_mut(), |ui| {
            ui.heading("Graph3D");
            match &engine.status.last_report {
                Some(r) => {
                    ui.label(format!("nodes: {}", r.nodes));
                    ui.label(format!("cones: {}", r.cones));
                    ui.label(format!("edges: {}", r.edges));
                    if !r.diagnostics.is_empty() {
                        ui.label(format!("skipped records: {}", r.diagnostics.len()));
                    }
                }
                None => {
                    ui.label("no graph loaded");
                }
            }
            ui.separator();

            let mut mode = engine.mode;
            ui.horizontal(|ui| {
                ui.label("Mode:");
                ui.selectable_value(&mut mode, RenderMode::Full, "Full");
                ui.selectable_value(&mut mode, RenderMode::Simplified, "Simplified");
            });
            if engine.set_mode(mode) {
                host.config.render_mode = mode;
            }

            ui.add_space(8.0);
            ui.heading("Edge filter");
            let mut strategy = host.strategy;
            egui::ComboBox::from_label("strategy")
                .selected_text(strategy.as_str())
                .show_ui(ui, |ui| {
                    for s in FilterStrategy::ALL {
                        ui.selectable_value(&mut strategy, s, s.as_str());
                    }
                });
            host.strategy = strategy;
            ui.add(egui::Slider::new(&mut host.threshold, 0.0..=1.0).text("threshold"));

            ui.horizontal(|ui| {
                let busy = engine.status.pending.is_some();
                if ui.add_enabled(!busy, egui::Button::new("Apply filter")).clicked() {
                    let req = Request::FilterEdges(FilterRequest::new(host.strategy, host.threshold));
                    engine.dispatch(&client, req);
                }
                if ui.add_enabled(!busy, egui::Button::new("Reload graph")).clicked() {
                    engine.dispatch(&client, Request::FetchGraph);
                }
            });

            if let Some(pending) = engine.status.pending {
                ui.label(format!("waiting for {pending}…"));
            }
            if let Some(err) = &engine.status.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
            }

            ui.add_space(8.0);
            ui.separator();
            ui.heading("Selection");
            match &host.last_selected {
                Some(node) => node_details(ui, node),
                None => {
                    ui.label("(none) click a node");
                }
            }

            ui.add_space(10.0);
            ui.separator();
            if ui.button("Save settings").clicked() {
                let mut cfg = host.config.clone();
                cfg.filter_strategy = host.strategy;
                cfg.filter_threshold = host.threshold;
                host.save_status = Some(match config::save(&cfg) {
                    Ok(()) => {
                        host.config = cfg;
                        "settings saved".to_string()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "saving viewer config");
                        format!("save failed: {e:#}")
                    }
                });
            }
            if let Some(s) = &host.save_status {
                ui.label(s.as_str());
            }
        });
}

fn node_details(ui: &mut egui::Ui, node: &Node) {
    ui.label(format!("id: {}", node.id));
    ui.label(format!("position: ({:.3}, {:.3}, {:.3})", node.x, node.y, node.z));
    ui.label(format!("degree centrality: {:.4}", node.degree_centrality));
    if let Some(size) = node.size {
        ui.label(format!("size: {size:.3}"));
    }
    if let Some(color) = &node.color {
        ui.label(format!("color: {color}"));
    }
    if let Some(src) = node.spoke_source() {
        ui.label(format!("spoke of: {src}"));
    }
}
