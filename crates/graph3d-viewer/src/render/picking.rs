use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::app::events::NodeSelected;
use crate::graph::scene::{PrimitiveId, ScenePrimitive};
use crate::graph::state::ClickOutcome;
use crate::graph::EngineContext;
use crate::render::camera::CameraController;
use crate::render::frame::Viewport;

/// Pointer travel (px) below which a press/release pair counts as a click.
const CLICK_SLOP: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Screen pixels (origin top-left) to `[-1, 1]` device space, `+y` up.
pub fn screen_to_ndc(screen: Vec2, viewport: &Viewport) -> Vec2 {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    Vec2::new(2.0 * screen.x / w - 1.0, 1.0 - 2.0 * screen.y / h)
}

pub fn ray_from_ndc(ndc: Vec2, camera: &CameraController, aspect: f32) -> PickRay {
    let half = (camera.fov_y() * 0.5).tan();
    let local = Vec3::new(ndc.x * half * aspect, ndc.y * half, -1.0);
    let tf = camera.transform();
    PickRay {
        origin: tf.translation,
        direction: (tf.rotation * local).normalize(),
    }
}

/// Distance along the ray to the first hit with the sphere, if any.
pub fn ray_sphere(ray: &PickRay, center: Vec3, radius: f32) -> Option<f32> {
    let oc = center - ray.origin;
    let t_mid = oc.dot(ray.direction);
    let d2 = oc.length_squared() - t_mid * t_mid;
    let r2 = radius * radius;
    if d2 > r2 {
        return None;
    }
    let half_chord = (r2 - d2).sqrt();
    let (near, far) = (t_mid - half_chord, t_mid + half_chord);
    if far < 0.0 {
        None
    } else if near >= 0.0 {
        Some(near)
    } else {
        Some(0.0)
    }
}

/// Nearest visible node or cone under the pointer. Edges never hit.
pub fn pick(
    screen: Vec2,
    viewport: &Viewport,
    camera: &CameraController,
    candidates: &[ScenePrimitive],
) -> Option<PrimitiveId> {
    let ray = ray_from_ndc(screen_to_ndc(screen, viewport), camera, viewport.aspect());
    candidates
        .iter()
        .filter(|p| p.visible && p.shape.is_pickable())
        .filter_map(|p| ray_sphere(&ray, p.shape.position(), p.shape.radius).map(|t| (t, p.id)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id)
}

pub fn pick_on_click(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    mut contexts: EguiContexts,
    mut engine: ResMut<EngineContext>,
    mut pressed_at: Local<Option<Vec2>>,
    mut out: EventWriter<NodeSelected>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let cursor = window.cursor_position();

    if buttons.just_pressed(MouseButton::Left) {
        *pressed_at = if contexts.ctx_mut().wants_pointer_input() {
            None
        } else {
            cursor
        };
        return;
    }
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    let (Some(start), Some(end)) = (pressed_at.take(), cursor) else {
        return;
    };
    if start.distance(end) >= CLICK_SLOP {
        return;
    }

    if let ClickOutcome::Hit { node, .. } = engine.click(end) {
        out.send(NodeSelected(node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::scene::{SceneArena, SceneConfig, SceneKey};
    use crate::render::camera::{CameraSettings, CameraState};
    use crate::util::config::RenderMode;
    use graph3d_core::{GraphSnapshot, Node, NodeId};

    fn camera_at(position: Vec3, target: Vec3) -> CameraController {
        let mut cam = CameraController::new(CameraSettings::default());
        cam.set_state(CameraState {
            position,
            target,
            zoom: 1.0,
        });
        cam
    }

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    #[test]
    fn ndc_corners_and_center() {
        let vp = viewport();
        assert_eq!(screen_to_ndc(Vec2::new(400.0, 300.0), &vp), Vec2::ZERO);
        assert_eq!(screen_to_ndc(Vec2::new(0.0, 0.0), &vp), Vec2::new(-1.0, 1.0));
        assert_eq!(screen_to_ndc(Vec2::new(800.0, 600.0), &vp), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = camera_at(Vec3::new(0.0, 0.0, 50.0), Vec3::ZERO);
        let ray = ray_from_ndc(Vec2::ZERO, &cam, 4.0 / 3.0);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn ray_sphere_hits_and_misses() {
        let ray = PickRay {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        assert_eq!(ray_sphere(&ray, Vec3::new(10.0, 0.0, 0.0), 1.0), Some(9.0));
        assert_eq!(ray_sphere(&ray, Vec3::new(10.0, 3.0, 0.0), 1.0), None);
        assert_eq!(ray_sphere(&ray, Vec3::new(-10.0, 0.0, 0.0), 1.0), None);
        assert_eq!(ray_sphere(&ray, Vec3::ZERO, 1.0), Some(0.0));
    }

    fn scene(mode: RenderMode) -> SceneArena {
        let snap = GraphSnapshot::new(
            vec![
                Node::new("near", 0.0, 0.0, 0.1, 1.0),
                Node::new("far", 0.0, 0.0, -0.1, 1.0),
                Node::new("side", 0.3, 0.0, 0.0, 1.0),
                Node::new("s1", 0.0, 0.2, 0.0, 0.1).spoke_of("side"),
            ],
            vec![],
        );
        let mut arena = SceneArena::default();
        arena.rebuild(&snap, mode, &SceneConfig::default());
        arena
    }

    #[test]
    fn picks_nearest_node_on_the_ray() {
        let arena = scene(RenderMode::Full);
        let cam = camera_at(Vec3::new(0.0, 0.0, 60.0), Vec3::ZERO);

        let hit = pick(Vec2::new(400.0, 300.0), &viewport(), &cam, arena.primitives()).expect("hit");

        assert_eq!(
            arena.get(hit).and_then(|p| p.shape.key().cloned()),
            Some(SceneKey::Node(NodeId::from("near")))
        );
    }

    #[test]
    fn empty_space_is_a_miss() {
        let arena = scene(RenderMode::Full);
        let cam = camera_at(Vec3::new(0.0, 0.0, 60.0), Vec3::ZERO);
        assert!(pick(Vec2::new(5.0, 5.0), &viewport(), &cam, arena.primitives()).is_none());
    }

    #[test]
    fn hidden_primitives_are_skipped() {
        let mut arena = scene(RenderMode::Full);
        let cam = camera_at(Vec3::new(0.0, 0.0, 60.0), Vec3::ZERO);
        let near = SceneKey::Node(NodeId::from("near"));
        arena.set_visibility(|p| p.key() != Some(&near));

        let hit = pick(Vec2::new(400.0, 300.0), &viewport(), &cam, arena.primitives()).expect("hit");
        assert_eq!(
            arena.get(hit).and_then(|p| p.shape.key().cloned()),
            Some(SceneKey::Node(NodeId::from("far")))
        );
    }

    #[test]
    fn cones_are_pickable_in_simplified_mode() {
        let arena = scene(RenderMode::Simplified);
        // straight down onto the cone at (0, 20, 0)
        let cam = camera_at(Vec3::new(0.0, 80.0, 0.001), Vec3::new(0.0, 20.0, 0.0));

        let hit = pick(Vec2::new(400.0, 300.0), &viewport(), &cam, arena.primitives()).expect("hit");
        assert_eq!(
            arena.get(hit).and_then(|p| p.shape.key().cloned()),
            Some(SceneKey::SpokeGroup(NodeId::from("side")))
        );
    }
}
