use bevy::prelude::Event;
use graph3d_core::Node;

/// A node (or a spoke cone's representative) was clicked.
#[derive(Event, Debug, Clone)]
pub struct NodeSelected(pub Node);
