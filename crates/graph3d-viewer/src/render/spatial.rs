use bevy::prelude::*;
use std::collections::HashMap;

use crate::graph::geometry::{PrimitiveKind, Style};
use crate::graph::scene::PrimitiveId;
use crate::graph::EngineContext;
use crate::util::color::color_key;

#[derive(Component)]
pub struct PrimitiveMarker(pub PrimitiveId);

/// ECS mirror of the scene arena for one generation, plus shared assets.
#[derive(Resource, Default)]
pub struct SceneEntities {
    generation: Option<u64>,
    entities: HashMap<PrimitiveId, Entity>,
    sphere: Option<Handle<Mesh>>,
    cones: HashMap<u32, Handle<Mesh>>,
    materials: HashMap<String, Handle<StandardMaterial>>,
}

impl SceneEntities {
    /// Despawns whatever still exists. Safe to call repeatedly.
    pub fn release(&mut self, commands: &mut Commands) -> usize {
        let mut despawned = 0;
        for (id, entity) in self.entities.drain() {
            match commands.get_entity(entity) {
                Some(ec) => {
                    ec.despawn_recursive();
                    despawned += 1;
                }
                None => tracing::debug!(?id, "primitive entity already gone"),
            }
        }
        self.generation = None;
        despawned
    }

    fn sphere(&mut self, meshes: &mut Assets<Mesh>) -> Handle<Mesh> {
        self.sphere
            .get_or_insert_with(|| meshes.add(Sphere::new(1.0).mesh().uv(32, 18)))
            .clone()
    }

    fn cone(&mut self, meshes: &mut Assets<Mesh>, segments: u32) -> Handle<Mesh> {
        self.cones
            .entry(segments)
            .or_insert_with(|| {
                meshes.add(
                    Cone {
                        radius: 1.0,
                        height: 1.0,
                    }
                    .mesh()
                    .resolution(segments),
                )
            })
            .clone()
    }

    fn material(&mut self, mats: &mut Assets<StandardMaterial>, style: &Style) -> Handle<StandardMaterial> {
        let key = format!("{}@{:.3}", color_key(style.color), style.opacity);
        self.materials
            .entry(key)
            .or_insert_with(|| {
                let opaque = style.opacity >= 1.0;
                mats.add(StandardMaterial {
                    base_color: style.color.with_alpha(style.opacity),
                    unlit: true,
                    alpha_mode: if opaque { AlphaMode::Opaque } else { AlphaMode::Blend },
                    ..default()
                })
            })
            .clone()
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Respawns entities when the arena moved to a new generation, then mirrors
/// highlight visibility onto them.
pub fn sync_scene(
    mut commands: Commands,
    mut engine: ResMut<EngineContext>,
    mut entities: ResMut<SceneEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<StandardMaterial>>,
    mut vis_q: Query<&mut Visibility, With<PrimitiveMarker>>,
) {
    let generation = engine.scene.generation();
    if entities.generation != Some(generation) {
        entities.release(&mut commands);

        for prim in engine.scene.primitives() {
            let mesh = match &prim.shape.kind {
                PrimitiveKind::Node { .. } => entities.sphere(&mut meshes),
                PrimitiveKind::Cone { segments, .. } => entities.cone(&mut meshes, *segments),
                PrimitiveKind::Edge { .. } => continue,
            };
            let material = entities.material(&mut mats, &prim.shape.style);
            let entity = commands
                .spawn((
                    PbrBundle {
                        mesh,
                        material,
                        transform: prim.shape.transform,
                        visibility: visibility(prim.visible),
                        ..default()
                    },
                    PrimitiveMarker(prim.id),
                ))
                .id();
            entities.entities.insert(prim.id, entity);
        }
        entities.generation = Some(generation);
        engine.highlight.take_dirty();
        return;
    }

    if !engine.highlight.take_dirty() {
        return;
    }
    for prim in engine.scene.primitives() {
        let Some(entity) = entities.entities.get(&prim.id) else {
            continue;
        };
        if let Ok(mut v) = vis_q.get_mut(*entity) {
            *v = visibility(prim.visible);
        }
    }
}

/// Edges are thin translucent lines; gizmos redraw them every frame.
pub fn draw_edges(engine: Res<EngineContext>, mut gizmos: Gizmos) {
    for (prim, _, _) in engine.scene.edges() {
        if !prim.visible {
            continue;
        }
        if let PrimitiveKind::Edge { from_pos, to_pos, .. } = &prim.shape.kind {
            let style = &prim.shape.style;
            gizmos.line(*from_pos, *to_pos, style.color.with_alpha(style.opacity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::scene::SceneKey;
    use crate::render::frame::Viewport;
    use crate::util::config::ViewerConfig;
    use bevy::ecs::system::RunSystemOnce;
    use graph3d_core::{Edge, GraphSnapshot, Node, NodeId};

    fn abc() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("A", 0.0, 0.0, 0.0, 1.0),
                Node::new("B", 0.0, 0.5, 0.0, 1.0),
                Node::new("C", 0.0, -0.5, 0.0, 1.0),
            ],
            vec![Edge::new("A", "B")],
        )
    }

    fn app_with(snapshot: GraphSnapshot) -> App {
        let mut engine = EngineContext::attach(&ViewerConfig::default(), Viewport::new(800.0, 600.0));
        engine.load_snapshot(snapshot, vec![]);

        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<SceneEntities>()
            .insert_resource(engine)
            .add_systems(Update, sync_scene);
        app.update();
        app
    }

    fn markers(app: &mut App) -> Vec<(PrimitiveId, Entity)> {
        let world = app.world_mut();
        world
            .query::<(Entity, &PrimitiveMarker)>()
            .iter(world)
            .map(|(e, m)| (m.0, e))
            .collect()
    }

    fn visibility_of(app: &mut App, id: &str) -> Visibility {
        let prim = app
            .world()
            .resource::<EngineContext>()
            .scene
            .by_key(&SceneKey::Node(NodeId::from(id)))
            .map(|p| p.id)
            .expect("primitive");
        let entity = markers(app)
            .into_iter()
            .find(|(p, _)| *p == prim)
            .map(|(_, e)| e)
            .expect("entity");
        *app.world().get::<Visibility>(entity).expect("visibility")
    }

    #[test]
    fn spawns_one_entity_per_node_and_respawns_on_reload() {
        let mut app = app_with(abc());
        let first = markers(&mut app);
        assert_eq!(first.len(), 3);

        let snap = GraphSnapshot::new(vec![Node::new("solo", 0.0, 0.0, 0.0, 1.0)], vec![]);
        app.world_mut().resource_mut::<EngineContext>().load_snapshot(snap, vec![]);
        app.update();

        let second = markers(&mut app);
        assert_eq!(second.len(), 1);
        assert!(first.iter().all(|(_, e)| app.world().get_entity(*e).is_none()));
    }

    #[test]
    fn release_skips_entities_that_are_already_gone() {
        let mut app = app_with(abc());
        let (_, victim) = markers(&mut app)[0];
        app.world_mut().despawn(victim);

        let world = app.world_mut();
        let released = world.run_system_once(
            |mut commands: Commands, mut entities: ResMut<SceneEntities>| entities.release(&mut commands),
        );
        assert_eq!(released, 2);
        assert!(markers(&mut app).is_empty());

        let again = app.world_mut().run_system_once(
            |mut commands: Commands, mut entities: ResMut<SceneEntities>| entities.release(&mut commands),
        );
        assert_eq!(again, 0);
    }

    #[test]
    fn highlight_hides_entities_outside_the_neighborhood() {
        let mut app = app_with(abc());
        assert_eq!(visibility_of(&mut app, "C"), Visibility::Inherited);

        {
            let mut engine = app.world_mut().resource_mut::<EngineContext>();
            let engine = &mut *engine;
            engine
                .highlight
                .highlight(&mut engine.scene, &SceneKey::Node(NodeId::from("A")));
        }
        app.update();

        assert_eq!(visibility_of(&mut app, "A"), Visibility::Inherited);
        assert_eq!(visibility_of(&mut app, "B"), Visibility::Inherited);
        assert_eq!(visibility_of(&mut app, "C"), Visibility::Hidden);

        {
            let mut engine = app.world_mut().resource_mut::<EngineContext>();
            let engine = &mut *engine;
            engine.highlight.reset(&mut engine.scene);
        }
        app.update();
        assert_eq!(visibility_of(&mut app, "C"), Visibility::Inherited);
    }
}
