use serde::{Deserialize, Serialize};

mod decode;

pub use decode::RecordIssue;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backends send `null` for attributes a node does not have.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// One graph vertex as served by the backend. Coordinates are layout output,
/// already computed server side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, alias = "degreeCentrality", deserialize_with = "null_as_default")]
    pub degree_centrality: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default, alias = "isSpoke", deserialize_with = "null_as_default")]
    pub is_spoke: bool,
    #[serde(default, alias = "sourceId", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<NodeId>,
}

impl Node {
    pub fn new(id: &str, x: f32, y: f32, z: f32, degree_centrality: f32) -> Self {
        Self {
            id: NodeId::from(id),
            x,
            y,
            z,
            degree_centrality,
            color: None,
            size: None,
            is_spoke: false,
            source_id: None,
        }
    }

    pub fn spoke_of(mut self, source: &str) -> Self {
        self.is_spoke = true;
        self.source_id = Some(NodeId::from(source));
        self
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Spoke group key, if this node collapses into a cone in simplified mode.
    pub fn spoke_source(&self) -> Option<&NodeId> {
        if self.is_spoke {
            self.source_id.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, alias = "sourcePos", skip_serializing_if = "Option::is_none")]
    pub source_pos: Option<[f32; 3]>,
    #[serde(default, alias = "targetPos", skip_serializing_if = "Option::is_none")]
    pub target_pos: Option<[f32; 3]>,
}

impl Edge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: NodeId::from(source),
            target: NodeId::from(target),
            source_pos: None,
            target_pos: None,
        }
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_degree_centrality(&self) -> f32 {
        self.nodes
            .iter()
            .map(|n| n.degree_centrality)
            .fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    #[default]
    Betweenness,
    Frequency,
    Information,
    Random,
}

impl FilterStrategy {
    pub const ALL: [FilterStrategy; 4] = [
        FilterStrategy::Betweenness,
        FilterStrategy::Frequency,
        FilterStrategy::Information,
        FilterStrategy::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Betweenness => "betweenness",
            Self::Frequency => "frequency",
            Self::Information => "information",
            Self::Random => "random",
        }
    }
}

/// Body of `POST /filter_edges`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub strategy: FilterStrategy,
    pub threshold: f32,
}

impl FilterRequest {
    /// Threshold is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(strategy: FilterStrategy, threshold: f32) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            strategy,
            threshold,
        }
    }
}

pub const PROCESS_GRAPH_PATH: &str = "/process_graph";
pub const FILTER_EDGES_PATH: &str = "/filter_edges";
