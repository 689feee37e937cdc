use bevy::prelude::Resource;
use crossbeam_channel::Receiver;
use graph3d_core::FilterStrategy;

use crate::net::Incoming;
use crate::util::config::ViewerConfig;

#[derive(Resource)]
pub struct NetRx(pub Receiver<Incoming>);

/// Host-side state of the side panel.
#[derive(Resource, Debug, Clone)]
pub struct HostUi {
    pub config: ViewerConfig,
    pub strategy: FilterStrategy,
    pub threshold: f32,
    pub last_selected: Option<graph3d_core::Node>,
    pub save_status: Option<String>,
}

impl HostUi {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            strategy: config.filter_strategy,
            threshold: config.filter_threshold,
            config,
            last_selected: None,
            save_status: None,
        }
    }
}
