//! Pure builders turning one node or edge record into a renderable primitive.
//!
//! Nothing here touches the ECS; the scene synchronizer owns the results and
//! the render systems turn them into entities.

use bevy::color::Color;
use bevy::math::{Quat, Vec3};
use bevy::transform::components::Transform;
use graph3d_core::{Edge, Node, NodeId};
use std::collections::HashMap;

use crate::graph::diagnostic::SceneDiagnostic;
use crate::graph::scene::SceneKey;
use crate::util::color;

pub type NodeLookup<'a> = HashMap<&'a NodeId, &'a Node>;

const CENTRALITY_RADIUS: f32 = 0.15;
const MIN_CONE_SEGMENTS: u32 = 3;
const MAX_CONE_SEGMENTS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub color: Color,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub accent: Color,
    pub edge_color: Color,
    pub edge_opacity: f32,
    pub cone_radius: f32,
    pub cone_height: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Color::srgb(1.0, 0.0, 0.0),
            edge_color: Color::srgb(0.733, 0.733, 0.733),
            edge_opacity: 0.1,
            cone_radius: 1.5,
            cone_height: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    Node {
        key: SceneKey,
        node: Node,
    },
    Cone {
        key: SceneKey,
        representative: Node,
        spoke_count: usize,
        segments: u32,
    },
    Edge {
        from: SceneKey,
        to: SceneKey,
        from_pos: Vec3,
        to_pos: Vec3,
    },
}

/// A built shape before the arena assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub transform: Transform,
    pub style: Style,
    /// World-space bounding sphere radius used for hit testing.
    pub radius: f32,
}

impl Primitive {
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn key(&self) -> Option<&SceneKey> {
        match &self.kind {
            PrimitiveKind::Node { key, .. } | PrimitiveKind::Cone { key, .. } => Some(key),
            PrimitiveKind::Edge { .. } => None,
        }
    }

    /// The record handed to the host when this primitive is clicked.
    pub fn node(&self) -> Option<&Node> {
        match &self.kind {
            PrimitiveKind::Node { node, .. } => Some(node),
            PrimitiveKind::Cone { representative, .. } => Some(representative),
            PrimitiveKind::Edge { .. } => None,
        }
    }

    pub fn is_pickable(&self) -> bool {
        !matches!(self.kind, PrimitiveKind::Edge { .. })
    }
}

pub fn scaled_position(node: &Node, scale: f32) -> Vec3 {
    Vec3::new(node.x, node.y, node.z) * scale
}

/// Radius from an explicit override, then the record's own size, then
/// `ln(dc + 1)`. Zero centrality counts as 1 so isolated nodes stay visible.
pub fn node_radius(node: &Node, size_override: Option<f32>) -> f32 {
    size_override.or(node.size).unwrap_or_else(|| {
        let degree = if node.degree_centrality > 0.0 {
            node.degree_centrality
        } else {
            1.0
        };
        (degree + 1.0).ln() * CENTRALITY_RADIUS
    })
}

pub fn build_node(node: &Node, scale: f32, size_override: Option<f32>, palette: &Palette) -> Primitive {
    let radius = node_radius(node, size_override);
    Primitive {
        kind: PrimitiveKind::Node {
            key: SceneKey::Node(node.id.clone()),
            node: node.clone(),
        },
        transform: Transform::from_translation(scaled_position(node, scale))
            .with_scale(Vec3::splat(radius)),
        style: Style {
            color: color::parse_or(node.color.as_deref(), palette.accent),
            opacity: 1.0,
        },
        radius,
    }
}

/// `None` when either endpoint is missing; the caller skips the edge.
pub fn build_edge(edge: &Edge, scale: f32, lookup: &NodeLookup, palette: &Palette) -> Option<Primitive> {
    let source = lookup.get(&edge.source)?;
    let target = lookup.get(&edge.target)?;
    Some(build_link(
        SceneKey::Node(source.id.clone()),
        scaled_position(source, scale),
        SceneKey::Node(target.id.clone()),
        scaled_position(target, scale),
        palette,
    ))
}

pub fn build_link(from: SceneKey, from_pos: Vec3, to: SceneKey, to_pos: Vec3, palette: &Palette) -> Primitive {
    Primitive {
        kind: PrimitiveKind::Edge {
            from,
            to,
            from_pos,
            to_pos,
        },
        transform: Transform::from_translation(from_pos.lerp(to_pos, 0.5)),
        style: Style {
            color: palette.edge_color,
            opacity: palette.edge_opacity,
        },
        radius: 0.0,
    }
}

pub fn cone_segments(spoke_count: usize) -> u32 {
    let wanted = u32::try_from(spoke_count).unwrap_or(u32::MAX).saturating_add(2);
    wanted.clamp(MIN_CONE_SEGMENTS, MAX_CONE_SEGMENTS)
}

/// One cone standing in for every spoke sharing `representative.source_id`.
/// Its `+Y` axis points at the origin node when that node resolves.
pub fn build_spoke_cone(
    representative: &Node,
    spoke_count: usize,
    scale: f32,
    lookup: &NodeLookup,
    palette: &Palette,
) -> (Primitive, Option<SceneDiagnostic>) {
    let source_id = representative
        .source_id
        .clone()
        .unwrap_or_else(|| representative.id.clone());
    let position = scaled_position(representative, scale);

    let (rotation, diagnostic) = match lookup.get(&source_id) {
        None => (
            Quat::IDENTITY,
            Some(SceneDiagnostic::UnresolvedSpokeOrigin {
                source_id: source_id.clone(),
            }),
        ),
        Some(origin) => match cone_rotation(position, scaled_position(origin, scale)) {
            Some(rot) => (rot, None),
            None => (
                Quat::IDENTITY,
                Some(SceneDiagnostic::DegenerateSpokeDirection {
                    source_id: source_id.clone(),
                }),
            ),
        },
    };

    let scale_v = Vec3::new(palette.cone_radius, palette.cone_height, palette.cone_radius);
    let prim = Primitive {
        kind: PrimitiveKind::Cone {
            key: SceneKey::SpokeGroup(source_id),
            representative: representative.clone(),
            spoke_count,
            segments: cone_segments(spoke_count),
        },
        transform: Transform {
            translation: position,
            rotation,
            scale: scale_v,
        },
        style: Style {
            color: color::parse_or(representative.color.as_deref(), palette.accent),
            opacity: 1.0,
        },
        radius: palette
            .cone_radius
            .hypot(palette.cone_height * 0.5),
    };
    (prim, diagnostic)
}

/// Shortest-arc rotation taking `+Y` onto the direction `from -> to`.
pub fn cone_rotation(from: Vec3, to: Vec3) -> Option<Quat> {
    let dir = (to - from).try_normalize()?;
    Some(Quat::from_rotation_arc(Vec3::Y, dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(nodes: &[Node]) -> NodeLookup<'_> {
        nodes.iter().map(|n| (&n.id, n)).collect()
    }

    #[test]
    fn node_radius_prefers_override_then_size_then_centrality() {
        let mut n = Node::new("a", 0.0, 0.0, 0.0, 4.0);
        assert!((node_radius(&n, None) - 5f32.ln() * 0.15).abs() < 1e-6);
        n.size = Some(3.0);
        assert_eq!(node_radius(&n, None), 3.0);
        assert_eq!(node_radius(&n, Some(0.7)), 0.7);
    }

    #[test]
    fn zero_centrality_still_has_a_radius() {
        let n = Node::new("a", 0.0, 0.0, 0.0, 0.0);
        assert!(node_radius(&n, None) > 0.0);
    }

    #[test]
    fn build_node_scales_position_and_defaults_color() {
        let palette = Palette::default();
        let n = Node::new("a", 1.0, -2.0, 0.5, 1.0);
        let p = build_node(&n, 100.0, None, &palette);
        assert_eq!(p.position(), Vec3::new(100.0, -200.0, 50.0));
        assert_eq!(color::color_key(p.style.color), color::color_key(palette.accent));
        assert_eq!(p.node(), Some(&n));
    }

    #[test]
    fn build_edge_requires_both_endpoints() {
        let palette = Palette::default();
        let nodes = vec![Node::new("a", 0.0, 0.0, 0.0, 1.0), Node::new("b", 1.0, 0.0, 0.0, 1.0)];
        let lk = lookup(&nodes);

        let ok = build_edge(&Edge::new("a", "b"), 10.0, &lk, &palette).expect("edge");
        match ok.kind {
            PrimitiveKind::Edge { from_pos, to_pos, .. } => {
                assert_eq!(from_pos, Vec3::ZERO);
                assert_eq!(to_pos, Vec3::new(10.0, 0.0, 0.0));
            }
            _ => panic!("not an edge"),
        }
        assert!((ok.style.opacity - 0.1).abs() < 1e-6);
        assert!(build_edge(&Edge::new("a", "zz"), 10.0, &lk, &palette).is_none());
        assert!(build_edge(&Edge::new("zz", "b"), 10.0, &lk, &palette).is_none());
    }

    #[test]
    fn cone_points_from_group_to_origin() {
        let palette = Palette::default();
        let nodes = vec![Node::new("hub", 1.0, 0.0, 0.0, 3.0)];
        let spoke = Node::new("s1", 0.0, 0.0, 0.0, 0.1).spoke_of("hub");
        let (cone, diag) = build_spoke_cone(&spoke, 5, 1.0, &lookup(&nodes), &palette);

        assert!(diag.is_none());
        let axis = cone.transform.rotation * Vec3::Y;
        assert!((axis - Vec3::X).length() < 1e-5, "axis was {axis:?}");
        match cone.kind {
            PrimitiveKind::Cone { segments, spoke_count, ref key, .. } => {
                assert_eq!(segments, 7);
                assert_eq!(spoke_count, 5);
                assert_eq!(key, &SceneKey::SpokeGroup(NodeId::from("hub")));
            }
            _ => panic!("not a cone"),
        }
    }

    #[test]
    fn cone_without_origin_keeps_default_orientation() {
        let palette = Palette::default();
        let spoke = Node::new("s1", 0.0, 0.0, 0.0, 0.1).spoke_of("ghost");
        let (cone, diag) = build_spoke_cone(&spoke, 1, 1.0, &NodeLookup::new(), &palette);

        assert_eq!(cone.transform.rotation, Quat::IDENTITY);
        assert!(matches!(diag, Some(SceneDiagnostic::UnresolvedSpokeOrigin { .. })));
    }

    #[test]
    fn cone_on_top_of_origin_is_degenerate() {
        let palette = Palette::default();
        let nodes = vec![Node::new("hub", 0.0, 0.0, 0.0, 3.0)];
        let spoke = Node::new("s1", 0.0, 0.0, 0.0, 0.1).spoke_of("hub");
        let (cone, diag) = build_spoke_cone(&spoke, 1, 1.0, &lookup(&nodes), &palette);

        assert_eq!(cone.transform.rotation, Quat::IDENTITY);
        assert!(matches!(diag, Some(SceneDiagnostic::DegenerateSpokeDirection { .. })));
    }

    #[test]
    fn cone_segments_are_clamped() {
        assert_eq!(cone_segments(0), 3);
        assert_eq!(cone_segments(1), 3);
        assert_eq!(cone_segments(10), 12);
        assert_eq!(cone_segments(10_000), 64);
    }

    #[test]
    fn antiparallel_direction_still_rotates() {
        let rot = cone_rotation(Vec3::ZERO, Vec3::new(0.0, -5.0, 0.0)).expect("rotation");
        assert!(((rot * Vec3::Y) - Vec3::NEG_Y).length() < 1e-5);
    }
}
