use bevy::prelude::Resource;
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

use crate::net::protocol::{decode_response, FetchError, Incoming, Request};
use graph3d_core::{FILTER_EDGES_PATH, PROCESS_GRAPH_PATH};

/// Handle the UI uses to queue requests for the network thread.
#[derive(Resource, Clone)]
pub struct NetClient {
    tx: Sender<Request>,
}

impl NetClient {
    pub fn new(tx: Sender<Request>) -> Self {
        Self { tx }
    }

    /// False when the network thread is gone and the request was dropped.
    pub fn send(&self, req: Request) -> bool {
        let label = req.label();
        if self.tx.send(req).is_err() {
            tracing::error!(request = label, "network thread is gone; request dropped");
            return false;
        }
        tracing::debug!(request = label, "request queued");
        true
    }
}

pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Starts the network thread. Requests are served one at a time in arrival
/// order; results come back on `tx`.
pub fn spawn_client(base_url: String, timeout: Duration, tx: Sender<Incoming>) -> NetClient {
    let (req_tx, req_rx) = crossbeam_channel::unbounded::<Request>();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(error = %e, "tokio runtime");
                return;
            }
        };
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "http client");
                return;
            }
        };
        serve(&rt, &client, &base_url, req_rx, tx);
        tracing::debug!("network thread stopped");
    });
    NetClient::new(req_tx)
}

fn serve(
    rt: &tokio::runtime::Runtime,
    client: &reqwest::Client,
    base_url: &str,
    rx: Receiver<Request>,
    tx: Sender<Incoming>,
) {
    for req in rx.iter() {
        let msg = match rt.block_on(execute(client, base_url, &req)) {
            Ok((snapshot, issues)) => {
                tracing::info!(
                    request = req.label(),
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    skipped = issues.len(),
                    "graph received"
                );
                Incoming::snapshot(&req, snapshot, issues)
            }
            Err(e) => {
                tracing::warn!(request = req.label(), error = %e, "fetch failed");
                Incoming::failed(&req, e)
            }
        };
        if tx.send(msg).is_err() {
            break;
        }
    }
}

async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    req: &Request,
) -> Result<(graph3d_core::GraphSnapshot, Vec<graph3d_core::RecordIssue>), FetchError> {
    let builder = match req {
        Request::FetchGraph => client.get(endpoint(base_url, PROCESS_GRAPH_PATH)),
        Request::FilterEdges(filter) => {
            let body = serde_json::to_vec(filter).map_err(|e| FetchError::Encode(e.to_string()))?;
            client
                .post(endpoint(base_url, FILTER_EDGES_PATH))
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body)
        }
    };
    let resp = builder.send().await?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await?;
    decode_response(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_reports_a_stopped_network_thread() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let client = NetClient::new(tx);
        assert!(client.send(Request::FetchGraph));
        drop(rx);
        assert!(!client.send(Request::FetchGraph));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://127.0.0.1:5000/", PROCESS_GRAPH_PATH),
            "http://127.0.0.1:5000/process_graph"
        );
        assert_eq!(
            endpoint("http://h:1", FILTER_EDGES_PATH),
            "http://h:1/filter_edges"
        );
    }

    #[test]
    fn unreachable_backend_reports_a_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let (tx, rx) = crossbeam_channel::unbounded();
        let client = spawn_client(format!("http://127.0.0.1:{port}"), Duration::from_secs(2), tx);
        assert!(client.send(Request::FetchGraph));

        let msg = rx.recv_timeout(Duration::from_secs(10)).expect("reply");
        assert_eq!(msg.request, "process_graph");
        assert!(matches!(msg.kind, crate::net::IncomingKind::Failed(FetchError::Transport(_))));
    }
}
