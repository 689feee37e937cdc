use std::collections::HashSet;

use crate::graph::geometry::PrimitiveKind;
use crate::graph::scene::{SceneArena, SceneKey};

/// Derived visibility overlay. Only ever flips `visible` on primitives the
/// arena already owns.
#[derive(Debug, Default)]
pub struct HighlightState {
    selected: Option<SceneKey>,
    dirty: bool,
}

impl HighlightState {
    pub fn selected(&self) -> Option<&SceneKey> {
        self.selected.as_ref()
    }

    /// True once after every visibility change; the render side polls this.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Forget the selection without touching primitives (they were rebuilt).
    pub fn invalidate(&mut self) {
        self.selected = None;
        self.dirty = true;
    }

    /// Shows only `key`, its direct neighbors and the edges among them.
    /// Returns the number of visible primitives.
    pub fn highlight(&mut self, scene: &mut SceneArena, key: &SceneKey) -> usize {
        let members = connected_subnetwork(scene, key);
        let shown = scene.set_visibility(|p| match &p.kind {
            PrimitiveKind::Node { key: k, .. } | PrimitiveKind::Cone { key: k, .. } => members.contains(k),
            PrimitiveKind::Edge { from, to, .. } => members.contains(from) && members.contains(to),
        });
        tracing::debug!(selected = ?key, members = members.len(), shown, "highlight applied");
        self.selected = Some(key.clone());
        self.dirty = true;
        shown
    }

    pub fn reset(&mut self, scene: &mut SceneArena) {
        scene.set_visibility(|_| true);
        self.selected = None;
        self.dirty = true;
    }
}

/// `key` plus every key sharing an edge with it.
pub fn connected_subnetwork(scene: &SceneArena, key: &SceneKey) -> HashSet<SceneKey> {
    let mut out = HashSet::new();
    out.insert(key.clone());
    for (_, from, to) in scene.edges() {
        if from == key {
            out.insert(to.clone());
        } else if to == key {
            out.insert(from.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::scene::SceneConfig;
    use crate::util::config::RenderMode;
    use graph3d_core::{Edge, GraphSnapshot, Node, NodeId};

    fn key(id: &str) -> SceneKey {
        SceneKey::Node(NodeId::from(id))
    }

    fn visible(scene: &SceneArena, k: &SceneKey) -> bool {
        scene.by_key(k).map(|p| p.visible).expect("primitive")
    }

    fn edge_visible(scene: &SceneArena) -> Vec<bool> {
        scene.edges().map(|(p, _, _)| p.visible).collect()
    }

    fn abc() -> SceneArena {
        let snap = GraphSnapshot::new(
            vec![
                Node::new("A", 0.0, 0.0, 0.0, 1.0),
                Node::new("B", 1.0, 0.0, 0.0, 1.0),
                Node::new("C", 2.0, 0.0, 0.0, 1.0),
            ],
            vec![Edge::new("A", "B")],
        );
        let mut scene = SceneArena::default();
        scene.rebuild(&snap, RenderMode::Full, &SceneConfig::default());
        scene
    }

    #[test]
    fn clicking_a_isolates_its_neighborhood_and_reset_restores() {
        let mut scene = abc();
        let mut hl = HighlightState::default();

        let shown = hl.highlight(&mut scene, &key("A"));
        assert_eq!(shown, 3);
        assert!(visible(&scene, &key("A")));
        assert!(visible(&scene, &key("B")));
        assert!(!visible(&scene, &key("C")));
        assert_eq!(edge_visible(&scene), vec![true]);
        assert!(hl.take_dirty());
        assert!(!hl.take_dirty());

        hl.reset(&mut scene);
        assert!(scene.primitives().iter().all(|p| p.visible));
        assert!(hl.selected().is_none());
        assert!(hl.take_dirty());
    }

    #[test]
    fn isolated_node_shows_only_itself() {
        let mut scene = abc();
        let mut hl = HighlightState::default();

        hl.highlight(&mut scene, &key("C"));

        assert!(visible(&scene, &key("C")));
        assert!(!visible(&scene, &key("A")));
        assert_eq!(edge_visible(&scene), vec![false]);
    }

    #[test]
    fn edges_between_neighbors_stay_visible() {
        let snap = GraphSnapshot::new(
            vec![
                Node::new("A", 0.0, 0.0, 0.0, 1.0),
                Node::new("B", 1.0, 0.0, 0.0, 1.0),
                Node::new("C", 2.0, 0.0, 0.0, 1.0),
                Node::new("D", 3.0, 0.0, 0.0, 1.0),
            ],
            vec![Edge::new("A", "B"), Edge::new("A", "C"), Edge::new("B", "C"), Edge::new("C", "D")],
        );
        let mut scene = SceneArena::default();
        scene.rebuild(&snap, RenderMode::Full, &SceneConfig::default());
        let mut hl = HighlightState::default();

        hl.highlight(&mut scene, &key("A"));

        assert_eq!(edge_visible(&scene), vec![true, true, true, false]);
        assert!(!visible(&scene, &key("D")));
    }

    #[test]
    fn spoke_group_highlight_includes_its_origin() {
        let snap = GraphSnapshot::new(
            vec![
                Node::new("hub", 0.0, 0.0, 0.0, 1.0),
                Node::new("far", 5.0, 0.0, 0.0, 1.0),
                Node::new("s1", 1.0, 0.0, 0.0, 0.1).spoke_of("hub"),
            ],
            vec![Edge::new("hub", "s1")],
        );
        let mut scene = SceneArena::default();
        scene.rebuild(&snap, RenderMode::Simplified, &SceneConfig::default());
        let mut hl = HighlightState::default();
        let group = SceneKey::SpokeGroup(NodeId::from("hub"));

        hl.highlight(&mut scene, &group);

        assert!(visible(&scene, &group));
        assert!(visible(&scene, &key("hub")));
        assert!(!visible(&scene, &key("far")));
    }
}
