use graph3d_core::{FilterRequest, GraphSnapshot, RecordIssue};
use thiserror::Error;

/// What the UI asks the network thread to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    FetchGraph,
    FilterEdges(FilterRequest),
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Request::FetchGraph => "process_graph",
            Request::FilterEdges(_) => "filter_edges",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend answered HTTP {0}")]
    Status(u16),
    #[error("response is not a graph: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not encode request: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Transport(e.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct Incoming {
    pub request: &'static str,
    pub kind: IncomingKind,
}

#[derive(Debug)]
pub enum IncomingKind {
    Snapshot {
        snapshot: GraphSnapshot,
        issues: Vec<RecordIssue>,
    },
    Failed(FetchError),
}

impl Incoming {
    pub fn snapshot(request: &Request, snapshot: GraphSnapshot, issues: Vec<RecordIssue>) -> Self {
        Self {
            request: request.label(),
            kind: IncomingKind::Snapshot { snapshot, issues },
        }
    }

    pub fn failed(request: &Request, err: FetchError) -> Self {
        Self {
            request: request.label(),
            kind: IncomingKind::Failed(err),
        }
    }
}

/// Shared by both endpoints: status check then lenient decode.
pub fn decode_response(status: u16, body: &[u8]) -> Result<(GraphSnapshot, Vec<RecordIssue>), FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }
    Ok(GraphSnapshot::from_json_lenient(body)?)
}
