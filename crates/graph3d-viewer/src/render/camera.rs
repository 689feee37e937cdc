use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use graph3d_core::Node;
use std::f32::consts::{PI, TAU};

use crate::graph::geometry::scaled_position;
use crate::graph::EngineContext;
use crate::util::config::ViewerConfig;

const POLE_EPSILON: f32 = 1e-3;
const SETTLE_EPSILON: f32 = 1e-5;
const WHEEL_LINE_STEP: f32 = 0.1;
const WHEEL_PIXEL_STEP: f32 = 0.002;

#[derive(Component)]
pub struct ViewportCamera;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(100.0, 50.0, 50.0),
            target: Vec3::ZERO,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub fov_y: f32,
    pub default_eye: Vec3,
    pub zoom_factor: f32,
    pub focus_duration: f32,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self::from_viewer(&ViewerConfig::default())
    }
}

impl CameraSettings {
    pub fn from_viewer(cfg: &ViewerConfig) -> Self {
        let min_distance = cfg.min_distance.max(0.01);
        Self {
            fov_y: cfg.fov_degrees.clamp(1.0, 170.0).to_radians(),
            default_eye: Vec3::from_array(cfg.default_eye),
            zoom_factor: if cfg.zoom_factor > 0.0 { cfg.zoom_factor } else { 2.0 },
            focus_duration: cfg.focus_duration().as_secs_f32(),
            damping: cfg.damping.clamp(0.01, 1.0),
            min_distance,
            max_distance: cfg.max_distance.max(min_distance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FocusTween {
    from: Vec3,
    to: Vec3,
    aim: Vec3,
    elapsed: f32,
    duration: f32,
}

impl FocusTween {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// power2.out
pub fn ease_out_quad(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Inertia {
    theta: f32,
    phi: f32,
    pan: Vec3,
    dolly: f32,
}

impl Inertia {
    fn is_settled(&self) -> bool {
        self.theta.abs() < SETTLE_EPSILON
            && self.phi.abs() < SETTLE_EPSILON
            && self.pan.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON
            && self.dolly.abs() < SETTLE_EPSILON
    }
}

/// Owns the camera pose. Input only accumulates deltas; `update` applies a
/// damped share of them per frame, or advances the focus tween.
#[derive(Debug, Clone)]
pub struct CameraController {
    state: CameraState,
    settings: CameraSettings,
    tween: Option<FocusTween>,
    inertia: Inertia,
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        let state = CameraState {
            position: settings.default_eye,
            ..CameraState::default()
        };
        Self {
            state,
            settings,
            tween: None,
            inertia: Inertia::default(),
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn set_state(&mut self, state: CameraState) {
        self.state = state;
        self.tween = None;
        self.inertia = Inertia::default();
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn fov_y(&self) -> f32 {
        self.settings.fov_y / self.state.zoom.max(0.01)
    }

    pub fn distance(&self) -> f32 {
        self.state.position.distance(self.state.target)
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn is_settled(&self) -> bool {
        self.tween.is_none() && self.inertia.is_settled()
    }

    pub fn transform(&self) -> Transform {
        let tf = Transform::from_translation(self.state.position);
        if self.distance() <= f32::EPSILON {
            return tf;
        }
        tf.looking_at(self.state.target, Vec3::Y)
    }

    /// Moves to the default eye and aims at the center of the nodes' bounding
    /// box. Not a bounds fit: the eye stays put whatever the extent.
    pub fn frame_all(&mut self, nodes: &[Node], scale: f32) -> Option<Vec3> {
        let mut iter = nodes.iter().map(|n| scaled_position(n, scale));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let center = (min + max) * 0.5;

        let mut eye = self.settings.default_eye;
        if eye.distance(center) < self.settings.min_distance {
            eye = center + Vec3::Z * (self.settings.min_distance * 10.0).max(10.0);
        }
        self.set_state(CameraState {
            position: eye,
            target: center,
            zoom: self.state.zoom,
        });
        tracing::debug!(?center, ?eye, "camera framed");
        Some(center)
    }

    /// Starts a tween bringing the eye `zoom_factor` times closer to `point`
    /// along the current view line. A running tween is replaced and the new
    /// one starts from wherever the eye is now.
    pub fn focus_on(&mut self, point: Vec3) {
        let from = self.state.position;
        let offset = from - point;
        let dist = offset.length();
        let dir = offset.try_normalize().unwrap_or(Vec3::Z);
        let to = point + dir * (dist / self.settings.zoom_factor).max(self.settings.min_distance);

        if self.tween.is_some() {
            tracing::debug!("focus tween replaced");
        }
        self.inertia = Inertia::default();
        self.tween = Some(FocusTween {
            from,
            to,
            aim: point,
            elapsed: 0.0,
            duration: self.settings.focus_duration,
        });
        self.state.target = point;
    }

    /// Screen-space drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if self.tween.is_some() {
            return;
        }
        let h = viewport_height.max(1.0);
        self.inertia.theta -= TAU * dx / h;
        self.inertia.phi -= TAU * dy / h;
    }

    /// Screen-space drag in pixels; moves the target in the view plane.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if self.tween.is_some() {
            return;
        }
        let h = viewport_height.max(1.0);
        let forward = (self.state.target - self.state.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        let target_distance = self.distance() * (self.fov_y() * 0.5).tan();

        self.inertia.pan += -right * (2.0 * dx * target_distance / h)
            + up * (2.0 * dy * target_distance / h);
    }

    /// Positive steps move closer.
    pub fn dolly(&mut self, steps: f32) {
        if self.tween.is_some() {
            return;
        }
        self.inertia.dolly -= steps;
    }

    /// Advances by `dt` seconds. Returns whether the pose changed.
    pub fn update(&mut self, dt: f32) -> bool {
        if let Some(tween) = self.tween.as_mut() {
            tween.elapsed += dt.max(0.0);
            let t = tween.progress();
            self.state.position = tween.from.lerp(tween.to, ease_out_quad(t));
            self.state.target = tween.aim;
            if t >= 1.0 {
                self.tween = None;
            }
            return true;
        }

        if self.inertia.is_settled() {
            self.inertia = Inertia::default();
            return false;
        }

        let k = self.settings.damping;
        let offset = self.state.position - self.state.target;
        let radius = offset.length().max(self.settings.min_distance);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.inertia.theta * k;
        phi = (phi + self.inertia.phi * k).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let radius = (radius * (self.inertia.dolly * k).exp())
            .clamp(self.settings.min_distance, self.settings.max_distance);
        self.state.target += self.inertia.pan * k;

        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        self.state.position = self.state.target + offset;

        let decay = 1.0 - k;
        self.inertia.theta *= decay;
        self.inertia.phi *= decay;
        self.inertia.pan *= decay;
        self.inertia.dolly *= decay;
        true
    }
}

pub fn setup_scene(mut commands: Commands, engine: Res<EngineContext>) {
    commands.insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)));
    commands.spawn((
        Camera3dBundle {
            transform: engine.camera.transform(),
            projection: PerspectiveProjection {
                fov: engine.camera.fov_y(),
                near: 0.1,
                far: 10_000.0,
                ..default()
            }
            .into(),
            ..default()
        },
        ViewportCamera,
    ));
}

/// Left drag orbits, right drag pans, wheel dollies.
pub fn orbit_input(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut engine: ResMut<EngineContext>,
) {
    if contexts.ctx_mut().wants_pointer_input() {
        motion.clear();
        wheel.clear();
        return;
    }

    let height = engine.render_loop.viewport().height;
    let drag: Vec2 = motion.read().map(|ev| ev.delta).sum();
    if drag != Vec2::ZERO {
        if buttons.pressed(MouseButton::Left) {
            engine.camera.rotate(drag.x, drag.y, height);
        } else if buttons.pressed(MouseButton::Right) || buttons.pressed(MouseButton::Middle) {
            engine.camera.pan(drag.x, drag.y, height);
        }
    }

    for ev in wheel.read() {
        let step = match ev.unit {
            MouseScrollUnit::Line => WHEEL_LINE_STEP,
            MouseScrollUnit::Pixel => WHEEL_PIXEL_STEP,
        };
        engine.camera.dolly(ev.y * step);
    }
}
