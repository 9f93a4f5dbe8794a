use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::host::{EntityId, Vec2};
use crate::properties::PropertyPayload;

/// Map property under which a jitsi room's serialized config is published.
pub const JITSI_CONFIG_PROPERTY: &str = "jitsiConfig";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatedProperty {
    pub property_name: String,
    pub property_value: String,
}

impl ActivatedProperty {
    pub fn new(property_name: impl Into<String>, property_value: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            property_value: property_value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    Moved {
        entity_id: EntityId,
        from_top_left: Vec2,
        to: Vec2,
    },
    Remove {
        entity_id: EntityId,
    },
    PropertiesUpdated {
        entity_id: EntityId,
        key: String,
        value: Option<PropertyPayload>,
    },
    /// All payloads of one activation travel together.
    PropertyActivated {
        entity_id: EntityId,
        properties: Vec<ActivatedProperty>,
    },
}

impl EntityEvent {
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::Moved { entity_id, .. }
            | Self::Remove { entity_id }
            | Self::PropertiesUpdated { entity_id, .. }
            | Self::PropertyActivated { entity_id, .. } => entity_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Moved { .. } => "moved",
            Self::Remove { .. } => "remove",
            Self::PropertiesUpdated { .. } => "properties_updated",
            Self::PropertyActivated { .. } => "property_activated",
        }
    }
}

/// Events emitted by entities, drained by the owning world in emission order.
#[derive(Debug, Clone, Default)]
pub struct EntityEventQueue {
    events: Rc<RefCell<Vec<EntityEvent>>>,
}

impl EntityEventQueue {
    pub fn push(&self, event: EntityEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn drain(&self) -> Vec<EntityEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
