use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::actions::build_actions;
use crate::config::InteractionConfig;
use crate::events::{EntityEvent, EntityEventQueue};
use crate::host::{
    CoWebsiteManager, DisplaySize, EditorModeHandle, EntityId, OutlineStyle, SceneHost, Vec2,
};
use crate::menu::{ActionsMenu, ActionsMenuHandle};
use crate::outline::{OutlineColor, OutlineColorStore, OutlineSubscription};
use crate::properties::{PropertyPayload, PropertyRegistry};
use crate::EntityError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPrefab {
    pub name: String,
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Row-major cells, 1 for blocking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision_grid: Option<Vec<Vec<i32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_offset: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityData {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub prefab: EntityPrefab,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub properties: PropertyRegistry,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefabPatch {
    pub name: Option<String>,
    pub image_path: Option<String>,
    pub tags: Option<Vec<String>>,
    pub collision_grid: Option<Vec<Vec<i32>>>,
    pub depth_offset: Option<f32>,
}

/// Partial entity data. Only the id is required; absent fields keep their
/// current value and `properties` is deep-merged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPatch {
    pub id: EntityId,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub interactive: Option<bool>,
    #[serde(default)]
    pub prefab: Option<PrefabPatch>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl EntityPatch {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            x: None,
            y: None,
            interactive: None,
            prefab: None,
            properties: None,
        }
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = Some(properties);
        self
    }
}

/// Collaborators shared by every entity of one scene.
#[derive(Clone)]
pub struct EntityContext {
    pub host: Rc<dyn SceneHost>,
    pub co_websites: Rc<dyn CoWebsiteManager>,
    pub actions_menu: ActionsMenuHandle,
    pub editor_mode: EditorModeHandle,
    pub events: EntityEventQueue,
    pub config: InteractionConfig,
}

impl std::fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityContext")
            .field("config", &self.config)
            .field("editor_mode", &self.editor_mode)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    NonInteractive,
    Interactive { menu_open: bool },
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The map editor is editing entities; activation is ignored.
    Suppressed,
    MenuOpened,
    MenuClosed,
}

pub struct Entity {
    data: EntityData,
    display_size: DisplaySize,
    activatable: bool,
    activation_radius: f32,
    old_position_top_left: Vec2,
    outline: OutlineColorStore,
    outline_subscription: Option<OutlineSubscription>,
    ctx: EntityContext,
    destroyed: bool,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("data", &self.data)
            .field("display_size", &self.display_size)
            .field("activatable", &self.activatable)
            .field("outline", &self.outline)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl Entity {
    pub fn new(data: EntityData, ctx: EntityContext) -> Self {
        let position = Vec2 {
            x: data.x,
            y: data.y,
        };
        let display_size = ctx
            .host
            .create_renderable(&data.id, position, &data.prefab.image_path);
        let outline = OutlineColorStore::default();
        let outline_subscription = outline.subscribe(outline_listener(
            Rc::clone(&ctx.host),
            data.id.clone(),
            ctx.config.outline_thickness,
        ));

        let mut entity = Self {
            activatable: data.interactive,
            activation_radius: ctx.config.activation_radius,
            data,
            display_size,
            old_position_top_left: Vec2::default(),
            outline,
            outline_subscription: Some(outline_subscription),
            ctx,
            destroyed: false,
        };
        entity.old_position_top_left = entity.top_left();
        entity.apply_depth();
        if entity.activatable {
            entity.register_input(true);
        }
        debug!(
            entity_id = %entity.data.id,
            interactive = entity.activatable,
            "entity_constructed"
        );
        entity
    }

    pub fn id(&self) -> &EntityId {
        &self.data.id
    }

    pub fn entity_data(&self) -> &EntityData {
        &self.data
    }

    pub fn position(&self) -> Vec2 {
        Vec2 {
            x: self.data.x,
            y: self.data.y,
        }
    }

    pub fn display_size(&self) -> DisplaySize {
        self.display_size
    }

    /// Renderables are centered on their position.
    pub fn top_left(&self) -> Vec2 {
        Vec2 {
            x: self.data.x - self.display_size.width * 0.5,
            y: self.data.y - self.display_size.height * 0.5,
        }
    }

    pub fn old_position_top_left(&self) -> Vec2 {
        self.old_position_top_left
    }

    pub fn set_old_position_top_left(&mut self, x: f32, y: f32) {
        self.old_position_top_left = Vec2 { x, y };
    }

    pub fn is_activatable(&self) -> bool {
        self.activatable
    }

    pub fn activation_radius(&self) -> f32 {
        self.activation_radius
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn state(&self) -> EntityState {
        if self.destroyed {
            EntityState::Destroyed
        } else if self.activatable {
            EntityState::Interactive {
                menu_open: self.ctx.actions_menu.owner().as_ref() == Some(&self.data.id),
            }
        } else {
            EntityState::NonInteractive
        }
    }

    pub fn collision_grid(&self) -> Option<&[Vec<i32>]> {
        self.data.prefab.collision_grid.as_deref()
    }

    /// Blocking cells flipped to -1, used to lift this entity's footprint
    /// out of the map collision layer.
    pub fn reversed_collision_grid(&self) -> Option<Vec<Vec<i32>>> {
        self.data.prefab.collision_grid.as_ref().map(|grid| {
            grid.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| if *cell == 1 { -1 } else { *cell })
                        .collect()
                })
                .collect()
        })
    }

    /// Applies `patch` and returns the top-left corner from before the update,
    /// which is also kept as `old_position_top_left`.
    pub fn update_entity(&mut self, patch: EntityPatch) -> Result<Vec2, EntityError> {
        self.ensure_alive()?;
        let previous_top_left = self.top_left();

        if let Some(x) = patch.x {
            self.data.x = x;
        }
        if let Some(y) = patch.y {
            self.data.y = y;
        }
        if let Some(prefab) = patch.prefab {
            self.apply_prefab_patch(prefab);
        }
        if let Some(properties) = patch.properties {
            self.data.properties.merge(properties);
        }
        if let Some(interactive) = patch.interactive {
            self.data.interactive = interactive;
            if interactive != self.activatable {
                self.activatable = interactive;
                self.register_input(interactive);
            }
        }

        self.ctx.host.set_position(&self.data.id, self.position());
        self.apply_depth();
        self.old_position_top_left = previous_top_left;
        debug!(entity_id = %self.data.id, "entity_updated");
        Ok(previous_top_left)
    }

    /// Moves the entity as the end of a drag and emits `Moved`.
    pub fn move_to(&mut self, x: f32, y: f32) -> Result<(), EntityError> {
        self.ensure_alive()?;
        let from_top_left = self.top_left();
        self.data.x = x;
        self.data.y = y;
        self.ctx.host.set_position(&self.data.id, self.position());
        self.apply_depth();
        self.old_position_top_left = from_top_left;
        self.ctx.events.push(EntityEvent::Moved {
            entity_id: self.data.id.clone(),
            from_top_left,
            to: self.position(),
        });
        Ok(())
    }

    pub fn activate(&mut self) -> Result<ActivationOutcome, EntityError> {
        self.ensure_alive()?;
        if self.ctx.editor_mode.blocks_activation() {
            debug!(entity_id = %self.data.id, "activation_suppressed_by_editor");
            return Ok(ActivationOutcome::Suppressed);
        }
        self.toggle_actions_menu()
    }

    /// Same as `activate` but ignores the editor mode.
    pub fn force_activate(&mut self) -> Result<ActivationOutcome, EntityError> {
        self.ensure_alive()?;
        self.toggle_actions_menu()
    }

    pub fn deactivate(&mut self) {
        self.ctx.actions_menu.clear();
    }

    pub fn properties(&self) -> &PropertyRegistry {
        &self.data.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: Option<PropertyPayload>) {
        let key = key.into();
        self.data.properties.set(key.clone(), value.clone());
        self.ctx.events.push(EntityEvent::PropertiesUpdated {
            entity_id: self.data.id.clone(),
            key,
            value,
        });
    }

    pub fn set_property_json(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let payload = PropertyPayload::decode(&key, value);
        self.set_property(key, payload);
    }

    /// Asks the owner of the entity set to remove this entity.
    pub fn delete(&self) {
        self.ctx.events.push(EntityEvent::Remove {
            entity_id: self.data.id.clone(),
        });
    }

    /// Releases the outline subscription, then the host renderable.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(subscription) = self.outline_subscription.take() {
            subscription.unsubscribe();
        }
        if self.ctx.actions_menu.owner().as_ref() == Some(&self.data.id) {
            self.ctx.actions_menu.clear();
        }
        self.ctx.host.release_renderable(&self.data.id);
        self.destroyed = true;
        debug!(entity_id = %self.data.id, "entity_destroyed");
    }

    pub fn outline_color(&self) -> Option<OutlineColor> {
        self.outline.current()
    }

    pub fn set_follow_outline_color(&mut self, color: OutlineColor) {
        self.outline.set_follow_color(color);
    }

    pub fn remove_follow_outline_color(&mut self) {
        self.outline.remove_follow_color();
    }

    pub fn set_api_outline_color(&mut self, color: OutlineColor) {
        self.outline.set_api_color(color);
    }

    pub fn remove_api_outline_color(&mut self) {
        self.outline.remove_api_color();
    }

    pub fn pointer_over_outline(&mut self, color: OutlineColor) {
        self.outline.pointer_over(color);
    }

    pub fn pointer_out_outline(&mut self) {
        self.outline.pointer_out();
    }

    pub fn character_close_by_outline(&mut self, color: OutlineColor) {
        self.outline.character_close_by(color);
    }

    pub fn character_far_away_outline(&mut self) {
        self.outline.character_far_away();
    }

    fn toggle_actions_menu(&self) -> Result<ActivationOutcome, EntityError> {
        if self.ctx.actions_menu.clear() {
            return Ok(ActivationOutcome::MenuClosed);
        }

        let contents = build_actions(
            &self.data.id,
            &self.data.properties,
            &self.ctx.events,
            &self.ctx.co_websites,
        )?;
        let mut menu = ActionsMenu::new(self.data.id.clone(), contents.header);
        for action in contents.actions {
            menu.add_action(action);
        }
        info!(
            entity_id = %self.data.id,
            action_count = menu.actions().len(),
            "actions_menu_opened"
        );
        self.ctx.actions_menu.open(menu);
        Ok(ActivationOutcome::MenuOpened)
    }

    fn apply_prefab_patch(&mut self, patch: PrefabPatch) {
        let prefab = &mut self.data.prefab;
        if let Some(name) = patch.name {
            prefab.name = name;
        }
        if let Some(image_path) = patch.image_path {
            prefab.image_path = image_path;
        }
        if let Some(tags) = patch.tags {
            prefab.tags = tags;
        }
        if let Some(collision_grid) = patch.collision_grid {
            prefab.collision_grid = Some(collision_grid);
        }
        if let Some(depth_offset) = patch.depth_offset {
            prefab.depth_offset = Some(depth_offset);
        }
    }

    fn apply_depth(&self) {
        let depth = self.data.y
            + self.display_size.height * 0.5
            + self.data.prefab.depth_offset.unwrap_or(0.0);
        self.ctx.host.set_depth(&self.data.id, depth);
    }

    fn register_input(&self, enabled: bool) {
        let cursor = enabled.then_some(self.ctx.config.interactive_cursor.as_str());
        self.ctx.host.set_interactive(&self.data.id, cursor);
        self.ctx.host.set_draggable(&self.data.id, enabled);
    }

    fn ensure_alive(&self) -> Result<(), EntityError> {
        if self.destroyed {
            return Err(EntityError::Destroyed(self.data.id.clone()));
        }
        Ok(())
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn outline_listener(
    host: Rc<dyn SceneHost>,
    entity_id: EntityId,
    thickness: u32,
) -> impl FnMut(Option<OutlineColor>) {
    move |color| {
        host.remove_outline(&entity_id);
        if let Some(color) = color {
            host.add_outline(&entity_id, OutlineStyle { thickness, color });
        }
        host.mark_dirty();
    }
}
