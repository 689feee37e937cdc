use graph3d_core::{GraphSnapshot, Node, NodeId};
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::graph::diagnostic::SceneDiagnostic;
use crate::graph::geometry::{self, NodeLookup, Palette, Primitive, PrimitiveKind};
use crate::util::color;
use crate::util::config::{RenderMode, ViewerConfig};

/// Join key of a pickable primitive. Spoke groups get their own namespace so
/// a group can never collide with a node of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneKey {
    Node(NodeId),
    SpokeGroup(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId {
    pub generation: u64,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenePrimitive {
    pub id: PrimitiveId,
    pub shape: Primitive,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub scale: f32,
    pub min_node_size: f32,
    pub max_node_size: f32,
    pub palette: Palette,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scale: 100.0,
            min_node_size: 0.4,
            max_node_size: 2.0,
            palette: Palette::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_viewer(cfg: &ViewerConfig) -> Self {
        let defaults = Palette::default();
        let min = cfg.min_node_size.max(0.0);
        let scale = if cfg.scale.is_finite() && cfg.scale > 0.0 {
            cfg.scale
        } else {
            tracing::warn!(scale = cfg.scale, "scale must be positive; using default");
            SceneConfig::default().scale
        };
        Self {
            scale,
            min_node_size: min,
            max_node_size: cfg.max_node_size.max(min),
            palette: Palette {
                accent: color::parse_or(Some(&cfg.accent_color), defaults.accent),
                edge_color: color::parse_or(Some(&cfg.edge_color), defaults.edge_color),
                edge_opacity: cfg.edge_opacity.clamp(0.0, 1.0),
                cone_radius: cfg.cone_radius,
                cone_height: cfg.cone_height,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildReport {
    pub generation: u64,
    pub mode: RenderMode,
    pub nodes: usize,
    pub cones: usize,
    pub edges: usize,
    /// Edges that touched a spoke and were folded into its group edge.
    pub collapsed_edges: usize,
    pub diagnostics: Vec<SceneDiagnostic>,
}

/// Linear interpolation of `dc / max_dc` into `[min, max]`.
pub fn normalized_size(degree_centrality: f32, max_degree: f32, min: f32, max: f32) -> f32 {
    if max_degree <= 0.0 {
        return min;
    }
    let t = (degree_centrality / max_degree).clamp(0.0, 1.0);
    min * (1.0 - t) + max * t
}

/// Owns every rendered primitive. Rebuilt wholesale per snapshot; ids from an
/// older generation never resolve.
#[derive(Debug, Default)]
pub struct SceneArena {
    generation: u64,
    primitives: Vec<ScenePrimitive>,
    keys: HashMap<SceneKey, PrimitiveId>,
}

impl SceneArena {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn primitives(&self) -> &[ScenePrimitive] {
        &self.primitives
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&ScenePrimitive> {
        if id.generation != self.generation {
            return None;
        }
        self.primitives.get(id.index as usize)
    }

    pub fn by_key(&self, key: &SceneKey) -> Option<&ScenePrimitive> {
        self.keys.get(key).and_then(|id| self.get(*id))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&ScenePrimitive, &SceneKey, &SceneKey)> {
        self.primitives.iter().filter_map(|p| match &p.shape.kind {
            PrimitiveKind::Edge { from, to, .. } => Some((p, from, to)),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&PrimitiveKind) -> bool) -> usize {
        self.primitives.iter().filter(|p| pred(&p.shape.kind)).count()
    }

    /// Sets every primitive's visibility from `f`; returns how many are visible.
    pub fn set_visibility(&mut self, mut f: impl FnMut(&Primitive) -> bool) -> usize {
        let mut shown = 0;
        for p in self.primitives.iter_mut() {
            p.visible = f(&p.shape);
            shown += usize::from(p.visible);
        }
        shown
    }

    /// Drops every primitive and starts a new generation.
    pub fn clear(&mut self) -> usize {
        let released = self.primitives.len();
        self.primitives.clear();
        self.keys.clear();
        self.generation += 1;
        released
    }

    fn push(&mut self, shape: Primitive) -> Result<PrimitiveId, SceneDiagnostic> {
        let id = PrimitiveId {
            generation: self.generation,
            index: self.primitives.len() as u32,
        };
        if let Some(key) = shape.key() {
            if self.keys.contains_key(key) {
                let dup = match key {
                    SceneKey::Node(n) | SceneKey::SpokeGroup(n) => n.clone(),
                };
                return Err(SceneDiagnostic::DuplicateNode(dup));
            }
            self.keys.insert(key.clone(), id);
        }
        self.primitives.push(ScenePrimitive {
            id,
            shape,
            visible: true,
        });
        Ok(id)
    }

    /// Pushes `shape`; a rejected primitive becomes a diagnostic.
    fn place(&mut self, shape: Primitive, report: &mut RebuildReport) -> Option<PrimitiveId> {
        match self.push(shape) {
            Ok(id) => Some(id),
            Err(d) => {
                report.diagnostics.push(d);
                None
            }
        }
    }

    /// Replaces the whole scene with primitives for `snapshot`. Never fails:
    /// bad records become diagnostics.
    pub fn rebuild(&mut self, snapshot: &GraphSnapshot, mode: RenderMode, cfg: &SceneConfig) -> RebuildReport {
        let released = self.clear();
        let mut report = RebuildReport {
            generation: self.generation,
            mode,
            ..RebuildReport::default()
        };

        match mode {
            RenderMode::Full => self.build_full(snapshot, cfg, &mut report),
            RenderMode::Simplified => self.build_simplified(snapshot, cfg, &mut report),
        }

        report.nodes = self.count(|k| matches!(k, PrimitiveKind::Node { .. }));
        report.cones = self.count(|k| matches!(k, PrimitiveKind::Cone { .. }));
        report.edges = self.count(|k| matches!(k, PrimitiveKind::Edge { .. }));

        for d in &report.diagnostics {
            d.log();
        }
        tracing::info!(
            generation = report.generation,
            mode = mode.as_str(),
            released,
            nodes = report.nodes,
            cones = report.cones,
            edges = report.edges,
            collapsed = report.collapsed_edges,
            diagnostics = report.diagnostics.len(),
            "scene rebuilt"
        );
        report
    }

    fn build_full(&mut self, snapshot: &GraphSnapshot, cfg: &SceneConfig, report: &mut RebuildReport) {
        let lookup = lookup_of(snapshot.nodes.iter());
        let max_degree = snapshot.max_degree_centrality();

        for node in &snapshot.nodes {
            let size = normalized_size(
                node.degree_centrality,
                max_degree,
                cfg.min_node_size,
                cfg.max_node_size,
            );
            let prim = geometry::build_node(node, cfg.scale, Some(size), &cfg.palette);
            self.place(prim, report);
        }

        for edge in &snapshot.edges {
            match geometry::build_edge(edge, cfg.scale, &lookup, &cfg.palette) {
                Some(prim) => {
                    self.place(prim, report);
                }
                None => report.diagnostics.push(SceneDiagnostic::UnresolvedEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                }),
            }
        }
    }

    fn build_simplified(&mut self, snapshot: &GraphSnapshot, cfg: &SceneConfig, report: &mut RebuildReport) {
        let mut groups: Vec<(&NodeId, SmallVec<[&Node; 8]>)> = Vec::new();
        let mut group_of: HashMap<&NodeId, usize> = HashMap::new();
        let mut plain: Vec<&Node> = Vec::with_capacity(snapshot.nodes.len());
        let mut spokes: HashMap<&NodeId, &NodeId> = HashMap::new();

        for node in &snapshot.nodes {
            match node.spoke_source() {
                Some(src) => {
                    spokes.entry(&node.id).or_insert(src);
                    let slot = *group_of.entry(src).or_insert_with(|| {
                        groups.push((src, SmallVec::new()));
                        groups.len() - 1
                    });
                    groups[slot].1.push(node);
                }
                None => plain.push(node),
            }
        }

        let lookup = lookup_of(plain.iter().copied());

        for node in &plain {
            let prim = geometry::build_node(node, cfg.scale, None, &cfg.palette);
            self.place(prim, report);
        }

        for (source_id, members) in &groups {
            let (cone, diagnostic) =
                geometry::build_spoke_cone(members[0], members.len(), cfg.scale, &lookup, &cfg.palette);
            report.diagnostics.extend(diagnostic);

            let cone_pos = cone.position();
            let cone_key = SceneKey::SpokeGroup((*source_id).clone());
            if self.place(cone, report).is_none() {
                continue;
            }

            if let Some(origin) = lookup.get(source_id) {
                let link = geometry::build_link(
                    cone_key,
                    cone_pos,
                    SceneKey::Node(origin.id.clone()),
                    geometry::scaled_position(origin, cfg.scale),
                    &cfg.palette,
                );
                self.place(link, report);
            }
        }

        for edge in &snapshot.edges {
            if spokes.contains_key(&edge.source) || spokes.contains_key(&edge.target) {
                report.collapsed_edges += 1;
                continue;
            }
            match geometry::build_edge(edge, cfg.scale, &lookup, &cfg.palette) {
                Some(prim) => {
                    self.place(prim, report);
                }
                None => report.diagnostics.push(SceneDiagnostic::UnresolvedEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                }),
            }
        }
    }
}

fn lookup_of<'a>(nodes: impl Iterator<Item = &'a Node>) -> NodeLookup<'a> {
    let mut lookup = NodeLookup::new();
    for n in nodes {
        lookup.entry(&n.id).or_insert(n);
    }
    lookup
}
