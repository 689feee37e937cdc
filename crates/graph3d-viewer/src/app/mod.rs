use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::app::events::NodeSelected;
use crate::app::resources::{HostUi, NetRx};
use crate::graph::EngineContext;
use crate::net::{self, IncomingKind, NetClient, Request};
use crate::render::frame::Viewport;
use crate::render::SceneEntities;
use crate::util::config::ViewerConfig;

pub mod events;
pub mod resources;

/// Messages drained per frame; the rest wait for the next one.
const MAX_MESSAGES_PER_FRAME: usize = 16;

pub struct Graph3dViewerPlugin {
    pub config: ViewerConfig,
}

impl Plugin for Graph3dViewerPlugin {
    fn build(&self, app: &mut App) {
        let cfg = self.config.clone();
        let (tx, rx) = crossbeam_channel::unbounded();
        let client = net::spawn_client(cfg.backend_url.clone(), cfg.request_timeout(), tx);

        app.add_event::<NodeSelected>()
            .insert_resource(EngineContext::attach(&cfg, Viewport::default()))
            .insert_resource(NetRx(rx))
            .insert_resource(client)
            .insert_resource(HostUi::new(cfg))
            .init_resource::<SceneEntities>()
            .add_systems(
                Startup,
                (size_viewport, crate::render::setup_scene, initial_fetch).chain(),
            )
            .add_systems(
                Update,
                (
                    pump_network,
                    crate::render::track_resize,
                    crate::ui::ui_panel,
                    crate::ui::hud_overlay,
                    crate::render::orbit_input,
                    crate::render::pick_on_click,
                    crate::ui::record_selection,
                    crate::render::advance_frame,
                    crate::render::sync_scene,
                    crate::render::draw_edges,
                )
                    .chain(),
            )
            .add_systems(Last, crate::render::teardown_on_exit);
    }
}

fn size_viewport(windows: Query<&Window, With<PrimaryWindow>>, mut engine: ResMut<EngineContext>) {
    if let Ok(window) = windows.get_single() {
        engine.render_loop.resize(window.width(), window.height());
    }
}

fn initial_fetch(host: Res<HostUi>, client: Res<NetClient>, mut engine: ResMut<EngineContext>) {
    if !host.config.fetch_on_start {
        return;
    }
    engine.dispatch(&client, Request::FetchGraph);
}

fn pump_network(mut engine: ResMut<EngineContext>, rx: Res<NetRx>) {
    for msg in rx.0.try_iter().take(MAX_MESSAGES_PER_FRAME) {
        match msg.kind {
            IncomingKind::Snapshot { snapshot, issues } => {
                tracing::debug!(request = msg.request, "applying snapshot");
                engine.load_snapshot(snapshot, issues);
            }
            IncomingKind::Failed(err) => engine.on_fetch_error(&err),
        }
    }
}
