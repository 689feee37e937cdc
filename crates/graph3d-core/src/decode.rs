use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::{Edge, GraphSnapshot, Node, NodeId};

/// A single record the decoder dropped. The rest of the snapshot survives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordIssue {
    #[error("node #{index} is malformed: {reason}")]
    MalformedNode { index: usize, reason: String },
    #[error("edge #{index} is malformed: {reason}")]
    MalformedEdge { index: usize, reason: String },
    #[error("node #{index} repeats id {id}")]
    DuplicateNode { index: usize, id: NodeId },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    nodes: Vec<serde_json::Value>,
    #[serde(default)]
    edges: Vec<serde_json::Value>,
}

impl GraphSnapshot {
    /// Strict on the envelope, lenient per record.
    pub fn from_json_lenient(bytes: &[u8]) -> serde_json::Result<(Self, Vec<RecordIssue>)> {
        let env: Envelope = serde_json::from_slice(bytes)?;
        Ok(Self::from_values(env.nodes, env.edges))
    }

    fn from_values(
        raw_nodes: Vec<serde_json::Value>,
        raw_edges: Vec<serde_json::Value>,
    ) -> (Self, Vec<RecordIssue>) {
        let mut issues = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::with_capacity(raw_nodes.len());
        let mut nodes = Vec::with_capacity(raw_nodes.len());

        for (index, value) in raw_nodes.into_iter().enumerate() {
            let node = match serde_json::from_value::<Node>(value) {
                Ok(n) => n,
                Err(e) => {
                    issues.push(RecordIssue::MalformedNode {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if let Err(reason) = validate_node(&node) {
                issues.push(RecordIssue::MalformedNode { index, reason });
                continue;
            }
            if !seen.insert(node.id.clone()) {
                issues.push(RecordIssue::DuplicateNode {
                    index,
                    id: node.id,
                });
                continue;
            }
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        for (index, value) in raw_edges.into_iter().enumerate() {
            match serde_json::from_value::<Edge>(value) {
                Ok(e) => edges.push(e),
                Err(e) => issues.push(RecordIssue::MalformedEdge {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        (Self { nodes, edges }, issues)
    }
}

fn validate_node(n: &Node) -> Result<(), String> {
    if n.id.0.is_empty() {
        return Err("empty id".to_string());
    }
    if !(n.x.is_finite() && n.y.is_finite() && n.z.is_finite()) {
        return Err(format!("non-finite position for {}", n.id));
    }
    if !n.degree_centrality.is_finite() || n.degree_centrality < 0.0 {
        return Err(format!(
            "degree centrality {} out of range for {}",
            n.degree_centrality, n.id
        ));
    }
    if let Some(size) = n.size {
        if !size.is_finite() || size <= 0.0 {
            return Err(format!("size {size} out of range for {}", n.id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_bad_records_and_keeps_the_rest() {
        let body = br#"{
            "nodes": [
                {"id":"n1","x":0,"y":0,"z":0,"degree_centrality":1},
                {"id":"n2","y":0,"z":0},
                {"id":"n3","x":1,"y":1,"z":1,"degree_centrality":-2},
                {"id":"n1","x":5,"y":5,"z":5}
            ],
            "edges": [
                {"source":"n1","target":"n3"},
                {"source":"n1"}
            ]
        }"#;

        let (snap, issues) = GraphSnapshot::from_json_lenient(body).expect("envelope");
        assert_eq!(snap.nodes.len(), 1);
        assert_eq!(snap.nodes[0].x, 0.0);
        assert_eq!(snap.edges.len(), 1);
        assert_eq!(issues.len(), 4);
        assert!(matches!(issues[0], RecordIssue::MalformedNode { index: 1, .. }));
        assert!(matches!(issues[1], RecordIssue::MalformedNode { index: 2, .. }));
        assert!(matches!(issues[2], RecordIssue::DuplicateNode { index: 3, .. }));
        assert!(matches!(issues[3], RecordIssue::MalformedEdge { index: 1, .. }));
    }

    #[test]
    fn null_attributes_fall_back_to_defaults() {
        let body = br#"{
            "nodes": [
                {"id":"a","x":0,"y":0,"z":0,"is_spoke":null,"source_id":null,"color":null,"size":null},
                {"id":"b","x":1,"y":0,"z":0,"degree_centrality":null,"isSpoke":null}
            ],
            "edges": [{"source":"a","target":"b","source_pos":null}]
        }"#;

        let (snap, issues) = GraphSnapshot::from_json_lenient(body).expect("envelope");
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.edges.len(), 1);
        assert!(!snap.nodes[0].is_spoke);
        assert!(snap.nodes[0].size.is_none());
        assert_eq!(snap.nodes[1].degree_centrality, 0.0);
    }

    #[test]
    fn carries_precomputed_edge_positions() {
        let body = br#"{"nodes":[],"edges":[{"source":"a","target":"b","source_pos":[1,2,3],"target_pos":[4,5,6]}]}"#;
        let (snap, issues) = GraphSnapshot::from_json_lenient(body).expect("envelope");
        assert!(issues.is_empty());
        assert_eq!(snap.edges[0].source_pos, Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn rejects_non_object_envelope() {
        assert!(GraphSnapshot::from_json_lenient(b"[1,2,3]").is_err());
        assert!(GraphSnapshot::from_json_lenient(b"not json").is_err());
    }
}
