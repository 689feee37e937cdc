use bevy::math::Vec2;
use bevy::prelude::Resource;
use graph3d_core::{GraphSnapshot, Node, RecordIssue};
use std::sync::Arc;

use crate::graph::diagnostic::SceneDiagnostic;
use crate::graph::highlight::HighlightState;
use crate::graph::scene::{RebuildReport, SceneArena, SceneConfig, SceneKey};
use crate::net::{FetchError, NetClient, Request};
use crate::render::camera::{CameraController, CameraSettings};
use crate::render::frame::{RenderLoop, Viewport};
use crate::render::picking;
use crate::util::config::{RenderMode, ViewerConfig};

/// What the host panel shows about the backend conversation.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    pub last_error: Option<String>,
    pub last_report: Option<RebuildReport>,
    pub loads: u64,
    pub pending: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Hit { key: SceneKey, node: Node },
    Miss,
}

/// Everything one viewport owns. Built on attach, emptied on detach; every
/// system goes through this resource rather than module-level state.
#[derive(Resource, Debug)]
pub struct EngineContext {
    pub scene: SceneArena,
    pub camera: CameraController,
    pub highlight: HighlightState,
    pub render_loop: RenderLoop,
    pub mode: RenderMode,
    pub snapshot: Option<Arc<GraphSnapshot>>,
    pub selected: Option<Node>,
    pub status: EngineStatus,
    scene_cfg: SceneConfig,
    reframe_on_reload: bool,
    framed_once: bool,
}

impl EngineContext {
    pub fn attach(cfg: &ViewerConfig, viewport: Viewport) -> Self {
        tracing::info!(
            mode = cfg.render_mode.as_str(),
            width = viewport.width,
            height = viewport.height,
            "viewport attached"
        );
        Self {
            scene: SceneArena::default(),
            camera: CameraController::new(CameraSettings::from_viewer(cfg)),
            highlight: HighlightState::default(),
            render_loop: RenderLoop::attach(viewport),
            mode: cfg.render_mode,
            snapshot: None,
            selected: None,
            status: EngineStatus::default(),
            scene_cfg: SceneConfig::from_viewer(cfg),
            reframe_on_reload: cfg.reframe_on_reload,
            framed_once: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.render_loop.is_attached()
    }

    /// Releases every primitive. A second call is a no-op returning 0.
    pub fn detach(&mut self) -> usize {
        if !self.render_loop.detach() {
            return 0;
        }
        let released = self.scene.clear();
        self.highlight.invalidate();
        self.snapshot = None;
        self.selected = None;
        released
    }

    /// Queues `req` and marks it pending. If the network thread is gone the
    /// failure is recorded right away so the host can retry.
    pub fn dispatch(&mut self, client: &NetClient, req: Request) -> bool {
        let label = req.label();
        self.status.pending = Some(label);
        if client.send(req) {
            return true;
        }
        self.on_fetch_error(&FetchError::Transport(format!(
            "network thread is not running; {label} not sent"
        )));
        false
    }

    /// Replaces the scene with `snapshot`. The camera is framed on the first
    /// non-empty snapshot only, unless reframing on reload is enabled.
    pub fn load_snapshot(
        &mut self,
        snapshot: GraphSnapshot,
        issues: Vec<RecordIssue>,
    ) -> Option<&RebuildReport> {
        if !self.is_attached() {
            tracing::debug!(nodes = snapshot.nodes.len(), "snapshot ignored after detach");
            return None;
        }
        let snapshot = Arc::new(snapshot);
        let mut report = self.scene.rebuild(&snapshot, self.mode, &self.scene_cfg);
        for issue in issues {
            let d = SceneDiagnostic::from(issue);
            d.log();
            report.diagnostics.push(d);
        }

        self.highlight.invalidate();
        self.selected = None;
        let reframe = !self.framed_once || self.reframe_on_reload;
        if reframe && self.camera.frame_all(&snapshot.nodes, self.scene_cfg.scale).is_some() {
            self.framed_once = true;
        }

        self.snapshot = Some(snapshot);
        self.status.loads += 1;
        self.status.last_error = None;
        self.status.pending = None;
        Some(self.status.last_report.insert(report))
    }

    /// Switches between full and simplified rendering, rebuilding from the
    /// retained snapshot. Returns whether anything changed.
    pub fn set_mode(&mut self, mode: RenderMode) -> bool {
        if mode == self.mode {
            return false;
        }
        tracing::info!(from = self.mode.as_str(), to = mode.as_str(), "render mode changed");
        self.mode = mode;
        if let Some(snapshot) = self.snapshot.clone() {
            let report = self.scene.rebuild(&snapshot, mode, &self.scene_cfg);
            self.highlight.invalidate();
            self.selected = None;
            self.status.last_report = Some(report);
        }
        true
    }

    /// The previous scene stays on screen.
    pub fn on_fetch_error(&mut self, err: &FetchError) {
        tracing::warn!(error = %err, pending = ?self.status.pending, "keeping previous scene");
        self.status.last_error = Some(err.to_string());
        self.status.pending = None;
    }

    /// Resolves a click at `screen` pixels. A hit focuses the camera on the
    /// primitive and isolates its neighborhood; a miss restores everything.
    pub fn click(&mut self, screen: Vec2) -> ClickOutcome {
        let hit = picking::pick(
            screen,
            self.render_loop.viewport(),
            &self.camera,
            self.scene.primitives(),
        )
        .and_then(|id| self.scene.get(id))
        .and_then(|p| {
            let key = p.shape.key()?.clone();
            let node = p.shape.node()?.clone();
            Some((key, node, p.shape.position()))
        });

        match hit {
            Some((key, node, position)) => {
                tracing::info!(node = %node.id, ?key, "node selected");
                self.camera.focus_on(position);
                self.highlight.highlight(&mut self.scene, &key);
                self.selected = Some(node.clone());
                ClickOutcome::Hit { key, node }
            }
            None => {
                if self.highlight.selected().is_some() {
                    tracing::debug!("selection cleared");
                }
                self.highlight.reset(&mut self.scene);
                self.selected = None;
                ClickOutcome::Miss
            }
        }
    }
}
