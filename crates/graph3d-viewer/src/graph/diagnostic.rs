use graph3d_core::{NodeId, RecordIssue};
use thiserror::Error;

/// Non-fatal problems found while turning a snapshot into primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneDiagnostic {
    #[error(transparent)]
    Record(#[from] RecordIssue),
    #[error("edge {from} -> {to} references a missing node")]
    UnresolvedEdge { from: NodeId, to: NodeId },
    #[error("spoke group {source_id} has no origin node; cone left unoriented")]
    UnresolvedSpokeOrigin { source_id: NodeId },
    #[error("spoke group {source_id} sits on its origin node; cone left unoriented")]
    DegenerateSpokeDirection { source_id: NodeId },
    #[error("node {0} appears twice in one snapshot; later copy skipped")]
    DuplicateNode(NodeId),
}

impl SceneDiagnostic {
    pub fn log(&self) {
        match self {
            Self::UnresolvedEdge { .. } => tracing::debug!(diagnostic = %self, "edge dropped"),
            _ => tracing::warn!(diagnostic = %self, "scene diagnostic"),
        }
    }
}
