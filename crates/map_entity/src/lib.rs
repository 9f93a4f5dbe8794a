use thiserror::Error;

mod actions;
mod config;
mod entity;
mod events;
mod host;
mod map_file;
mod menu;
mod outline;
mod properties;
mod world;

#[cfg(test)]
mod testing;

pub use actions::{build_actions, ActionCallback, ActionMenuAction, ActionMenuContents};
pub use config::{InteractionConfig, DEFAULT_ACTIVATION_RADIUS, DEFAULT_OUTLINE_THICKNESS};
pub use entity::{
    ActivationOutcome, Entity, EntityContext, EntityData, EntityPatch, EntityPrefab, EntityState,
    PrefabPatch,
};
pub use events::{ActivatedProperty, EntityEvent, EntityEventQueue, JITSI_CONFIG_PROPERTY};
pub use host::{
    CoWebsite, CoWebsiteLoadError, CoWebsiteManager, DisplaySize, EditorModeHandle,
    EntityEditorMode, EntityId, LoadFailureHandler, OutlineStyle, SceneHost, Vec2,
};
pub use map_file::{
    load_map_entity_file, parse_map_entity_file, MapEntityFile, MapFileError,
    MAP_ENTITY_FILE_VERSION,
};
pub use menu::{ActionsMenu, ActionsMenuHandle};
pub use outline::{
    OutlineColor, OutlineColorState, OutlineColorStore, OutlineSource, OutlineSubscription,
};
pub use properties::{
    JitsiRoomProperty, OpenTabProperty, PlayAudioProperty, PropertyKind, PropertyPayload,
    PropertyRegistry,
};
pub use world::EntityWorld;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("openTab link '{link}' on entity {entity_id} is not a valid url: {source}")]
    InvalidTabUrl {
        entity_id: EntityId,
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("entity {0} already exists in the world")]
    DuplicateEntity(EntityId),
    #[error("entity {0} does not exist in the world")]
    UnknownEntity(EntityId),
    #[error("entity {0} has already been destroyed")]
    Destroyed(EntityId),
}
