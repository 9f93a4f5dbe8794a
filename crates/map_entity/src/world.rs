use tracing::{debug, info};

use crate::entity::{Entity, EntityContext, EntityData, EntityPatch};
use crate::events::EntityEvent;
use crate::host::{EntityId, Vec2};
use crate::EntityError;

/// Owns the entities of one scene and tears them down on `Remove`.
#[derive(Debug)]
pub struct EntityWorld {
    ctx: EntityContext,
    entities: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
}

impl EntityWorld {
    pub fn new(ctx: EntityContext) -> Self {
        Self {
            ctx,
            entities: Vec::new(),
            pending_despawns: Vec::new(),
        }
    }

    pub fn context(&self) -> &EntityContext {
        &self.ctx
    }

    pub fn spawn(&mut self, data: EntityData) -> Result<EntityId, EntityError> {
        if self.find(&data.id).is_some() {
            return Err(EntityError::DuplicateEntity(data.id));
        }
        let id = data.id.clone();
        self.entities.push(Entity::new(data, self.ctx.clone()));
        info!(entity_id = %id, entity_count = self.entities.len(), "entity_spawned");
        Ok(id)
    }

    pub fn despawn(&mut self, id: &EntityId) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.pending_despawns.push(id.clone());
        true
    }

    /// Destroys queued entities in id order.
    pub fn apply_pending(&mut self) {
        if self.pending_despawns.is_empty() {
            return;
        }
        self.pending_despawns.sort();
        self.pending_despawns.dedup();
        for id in std::mem::take(&mut self.pending_despawns) {
            let Some(index) = self.entities.iter().position(|entity| entity.id() == &id) else {
                continue;
            };
            self.entities.remove(index).destroy();
            info!(entity_id = %id, "entity_despawned");
        }
    }

    /// Drains emitted events, applies `Remove` requests, and hands every
    /// event back in emission order.
    pub fn process_events(&mut self) -> Vec<EntityEvent> {
        let events = self.ctx.events.drain();
        for event in &events {
            if let EntityEvent::Remove { entity_id } = event {
                if !self.despawn(entity_id) {
                    debug!(entity_id = %entity_id, "remove_for_unknown_entity");
                }
            }
        }
        self.apply_pending();
        events
    }

    pub fn update_entity(&mut self, patch: EntityPatch) -> Result<Vec2, EntityError> {
        let id = patch.id.clone();
        self.find_mut(&id)
            .ok_or(EntityError::UnknownEntity(id))?
            .update_entity(patch)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter().map(Entity::id)
    }

    pub fn find(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn find_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Nearest activatable entity whose activation radius covers `point`.
    pub fn closest_activatable(&self, point: Vec2) -> Option<&EntityId> {
        let mut best: Option<(f32, &EntityId)> = None;
        for entity in &self.entities {
            if !entity.is_activatable() {
                continue;
            }
            let distance = entity.position().distance(point);
            if distance > entity.activation_radius() {
                continue;
            }
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, entity.id())),
            }
        }
        best.map(|(_, id)| id)
    }

    pub fn clear(&mut self) {
        for entity in &mut self.entities {
            entity.destroy();
        }
        self.entities.clear();
        self.pending_despawns.clear();
        self.ctx.actions_menu.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{entity_data, harness, HostCall};

    #[test]
    fn duplicate_spawn_is_rejected() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        world
            .spawn(entity_data("a", 0.0, 0.0, false, json!({})))
            .expect("first");
        let result = world.spawn(entity_data("a", 1.0, 1.0, false, json!({})));
        assert!(matches!(result, Err(EntityError::DuplicateEntity(_))));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn remove_event_destroys_entity_on_processing() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        let a = world
            .spawn(entity_data("a", 0.0, 0.0, true, json!({})))
            .expect("a");
        world
            .spawn(entity_data("b", 0.0, 0.0, true, json!({})))
            .expect("b");

        world.find(&a).expect("a").delete();
        assert_eq!(world.entity_count(), 2);

        let events = world.process_events();
        assert_eq!(events, vec![EntityEvent::Remove { entity_id: a.clone() }]);
        assert_eq!(world.entity_count(), 1);
        assert!(world.find(&a).is_none());
        assert!(h.host.calls().contains(&HostCall::Release(a)));
    }

    #[test]
    fn pending_despawns_are_destroyed_in_id_order() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        for id in ["c", "a", "b"] {
            world
                .spawn(entity_data(id, 0.0, 0.0, false, json!({})))
                .expect("spawn");
        }
        h.host.clear();

        world.despawn(&EntityId::new("c"));
        world.despawn(&EntityId::new("a"));
        world.despawn(&EntityId::new("c"));
        world.apply_pending();

        assert_eq!(
            h.host.calls(),
            vec![
                HostCall::Release(EntityId::new("a")),
                HostCall::Release(EntityId::new("c")),
            ]
        );
        assert_eq!(world.ids().collect::<Vec<_>>(), vec![&EntityId::new("b")]);
    }

    #[test]
    fn dropping_world_releases_every_renderable() {
        let h = harness();
        {
            let mut world = EntityWorld::new(h.ctx.clone());
            world
                .spawn(entity_data("a", 0.0, 0.0, true, json!({})))
                .expect("a");
            world
                .spawn(entity_data("b", 5.0, 5.0, false, json!({})))
                .expect("b");
        }
        let releases: Vec<HostCall> = h
            .host
            .calls()
            .into_iter()
            .filter(|call| matches!(call, HostCall::Release(_)))
            .collect();
        assert_eq!(
            releases,
            vec![
                HostCall::Release(EntityId::new("a")),
                HostCall::Release(EntityId::new("b")),
            ]
        );
    }

    #[test]
    fn despawn_of_unknown_entity_is_ignored() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        assert!(!world.despawn(&EntityId::new("ghost")));
        h.ctx.events.push(EntityEvent::Remove {
            entity_id: EntityId::new("ghost"),
        });
        assert_eq!(world.process_events().len(), 1);
    }

    #[test]
    fn update_routes_patch_by_id() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        let id = world
            .spawn(entity_data("a", 0.0, 0.0, false, json!({})))
            .expect("a");
        world
            .update_entity(EntityPatch::new(id.clone()).with_position(5.0, 6.0))
            .expect("update");
        assert_eq!(world.find(&id).expect("a").position(), Vec2 { x: 5.0, y: 6.0 });

        let missing = world.update_entity(EntityPatch::new(EntityId::new("zzz")));
        assert!(matches!(missing, Err(EntityError::UnknownEntity(_))));
    }

    #[test]
    fn closest_activatable_respects_radius_and_interactivity() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        world
            .spawn(entity_data("near", 10.0, 0.0, true, json!({})))
            .expect("near");
        world
            .spawn(entity_data("nearer_static", 1.0, 0.0, false, json!({})))
            .expect("static");
        world
            .spawn(entity_data("far", 500.0, 0.0, true, json!({})))
            .expect("far");

        assert_eq!(
            world.closest_activatable(Vec2::default()),
            Some(&EntityId::new("near"))
        );
        assert_eq!(world.closest_activatable(Vec2 { x: 250.0, y: 0.0 }), None);
    }

    #[test]
    fn clear_destroys_everything_and_closes_menu() {
        let h = harness();
        let mut world = EntityWorld::new(h.ctx.clone());
        let id = world
            .spawn(entity_data(
                "a",
                0.0,
                0.0,
                true,
                json!({"playAudio": {"buttonLabel": "Play", "audioLink": "a.mp3"}}),
            ))
            .expect("a");
        world.find_mut(&id).expect("a").activate().expect("open");
        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(!h.ctx.actions_menu.is_open());
        assert!(h.host.calls().contains(&HostCall::Release(id)));
    }
}
