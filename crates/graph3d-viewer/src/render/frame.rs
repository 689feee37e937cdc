use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::graph::EngineContext;
use crate::render::camera::ViewportCamera;
use crate::render::spatial::SceneEntities;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

/// Frame bookkeeping for the drawing surface.
#[derive(Debug, Default)]
pub struct RenderLoop {
    viewport: Viewport,
    frames: u64,
    attached: bool,
}

impl RenderLoop {
    pub fn attach(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames: 0,
            attached: true,
        }
    }

    pub fn detach(&mut self) -> bool {
        std::mem::replace(&mut self.attached, false)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Zero-sized surfaces (minimized windows) keep the last real size.
    pub fn resize(&mut self, width: f32, height: f32) -> bool {
        if !(width > 0.0 && height > 0.0) {
            return false;
        }
        let next = Viewport::new(width, height);
        if next == self.viewport {
            return false;
        }
        self.viewport = next;
        true
    }

    pub fn begin_frame(&mut self) -> Option<u64> {
        if !self.attached {
            return None;
        }
        self.frames += 1;
        Some(self.frames)
    }
}

pub fn track_resize(mut events: EventReader<WindowResized>, mut engine: ResMut<EngineContext>) {
    for ev in events.read() {
        if engine.render_loop.resize(ev.width, ev.height) {
            tracing::debug!(width = ev.width, height = ev.height, "viewport resized");
        }
    }
}

/// Steps the camera and writes its pose; the aspect ratio itself is kept in
/// sync by bevy's camera system.
pub fn advance_frame(
    time: Res<Time>,
    mut engine: ResMut<EngineContext>,
    mut cam_q: Query<(&mut Transform, &mut Projection), With<ViewportCamera>>,
) {
    if engine.render_loop.begin_frame().is_none() {
        return;
    }
    engine.camera.update(time.delta_seconds());

    let Ok((mut tf, mut projection)) = cam_q.get_single_mut() else {
        return;
    };
    let next = engine.camera.transform();
    if *tf != next {
        *tf = next;
    }
    if let Projection::Perspective(p) = &mut *projection {
        let fov = engine.camera.fov_y();
        if (p.fov - fov).abs() > f32::EPSILON {
            p.fov = fov;
        }
    }
}

pub fn teardown_on_exit(
    mut exits: EventReader<AppExit>,
    mut commands: Commands,
    mut entities: ResMut<SceneEntities>,
    mut engine: ResMut<EngineContext>,
) {
    if exits.read().last().is_none() {
        return;
    }
    let despawned = entities.release(&mut commands);
    let released = engine.detach();
    tracing::info!(despawned, released, "viewport detached");
}
