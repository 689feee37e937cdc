mod app;
mod graph;
mod net;
mod render;
mod ui;
mod util;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use crate::app::Graph3dViewerPlugin;
use crate::util::{args, config};

fn main() -> anyhow::Result<()> {
    let overrides = args::parse_args()?;
    let mut cfg = config::load_or_default();
    overrides.apply(&mut cfg);

    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Graph3D".into(),
                        resolution: (1280.0, 720.0).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: cfg.log_filter.clone(),
                    ..default()
                }),
        )
        .add_plugins(EguiPlugin)
        .add_plugins(Graph3dViewerPlugin { config: cfg })
        .run();
    if exit.is_error() {
        anyhow::bail!("viewer exited with {exit:?}");
    }
    Ok(())
}
