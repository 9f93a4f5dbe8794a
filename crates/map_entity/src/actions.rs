use std::fmt;
use std::rc::Rc;

use tracing::{error, info};
use url::Url;

use crate::events::{ActivatedProperty, EntityEvent, EntityEventQueue, JITSI_CONFIG_PROPERTY};
use crate::host::{CoWebsite, CoWebsiteManager, EntityId};
use crate::properties::{OpenTabProperty, PropertyKind, PropertyPayload, PropertyRegistry};
use crate::EntityError;

const BUILTIN_ACTION_PRIORITY: u32 = 1;

pub type ActionCallback = Rc<dyn Fn()>;

#[derive(Clone)]
pub struct ActionMenuAction {
    pub action_name: String,
    pub protected: bool,
    pub priority: u32,
    callback: ActionCallback,
}

impl ActionMenuAction {
    pub fn new(
        action_name: impl Into<String>,
        protected: bool,
        priority: u32,
        callback: impl Fn() + 'static,
    ) -> Self {
        Self {
            action_name: action_name.into(),
            protected,
            priority,
            callback: Rc::new(callback),
        }
    }

    pub fn activate(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for ActionMenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionMenuAction")
            .field("action_name", &self.action_name)
            .field("protected", &self.protected)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionMenuContents {
    pub header: String,
    pub actions: Vec<ActionMenuAction>,
}

/// Derives the menu of one entity from its properties, in property order.
///
/// Fails only when an embedded `openTab` link is not a valid URL; nothing is
/// built in that case.
pub fn build_actions(
    entity_id: &EntityId,
    properties: &PropertyRegistry,
    events: &EntityEventQueue,
    co_websites: &Rc<dyn CoWebsiteManager>,
) -> Result<ActionMenuContents, EntityError> {
    let mut contents = ActionMenuContents::default();

    for (key, payload) in properties.iter() {
        let Some(payload) = payload.filter(|payload| payload.is_truthy()) else {
            continue;
        };
        match payload {
            PropertyPayload::TextHeader(text) => contents.header = text.clone(),
            PropertyPayload::JitsiRoom(room) => {
                let activated = vec![
                    ActivatedProperty::new(PropertyKind::JitsiRoom.key(), room.room_name.clone()),
                    ActivatedProperty::new(
                        JITSI_CONFIG_PROPERTY,
                        room.jitsi_room_config.to_string(),
                    ),
                ];
                contents.actions.push(emitting_action(
                    &room.button_label,
                    entity_id,
                    events,
                    activated,
                ));
            }
            PropertyPayload::PlayAudio(audio) => {
                let activated = vec![ActivatedProperty::new(
                    PropertyKind::PlayAudio.key(),
                    audio.audio_link.clone(),
                )];
                contents.actions.push(emitting_action(
                    &audio.button_label,
                    entity_id,
                    events,
                    activated,
                ));
            }
            PropertyPayload::OpenTab(tab) if tab.in_new_tab => {
                let activated = vec![ActivatedProperty::new(
                    PropertyKind::OpenTab.key(),
                    tab.link.clone(),
                )];
                contents.actions.push(emitting_action(
                    &tab.button_label,
                    entity_id,
                    events,
                    activated,
                ));
            }
            PropertyPayload::OpenTab(tab) => {
                contents
                    .actions
                    .push(co_website_action(tab, entity_id, co_websites)?);
            }
            PropertyPayload::Opaque(_) => {
                tracing::trace!(entity_id = %entity_id, key, "property_without_action");
            }
        }
    }

    Ok(contents)
}

fn emitting_action(
    label: &str,
    entity_id: &EntityId,
    events: &EntityEventQueue,
    activated: Vec<ActivatedProperty>,
) -> ActionMenuAction {
    let entity_id = entity_id.clone();
    let events = events.clone();
    ActionMenuAction::new(label, true, BUILTIN_ACTION_PRIORITY, move || {
        events.push(EntityEvent::PropertyActivated {
            entity_id: entity_id.clone(),
            properties: activated.clone(),
        });
    })
}

fn co_website_action(
    tab: &OpenTabProperty,
    entity_id: &EntityId,
    co_websites: &Rc<dyn CoWebsiteManager>,
) -> Result<ActionMenuAction, EntityError> {
    let url = Url::parse(&tab.link).map_err(|source| EntityError::InvalidTabUrl {
        entity_id: entity_id.clone(),
        link: tab.link.clone(),
        source,
    })?;
    let website = CoWebsite::new(url)
        .with_allow_api(tab.allow_api)
        .with_policy(tab.policy.clone())
        .with_width_percent(tab.width);
    let entity_id = entity_id.clone();
    let co_websites = Rc::clone(co_websites);

    Ok(ActionMenuAction::new(
        &tab.button_label,
        true,
        BUILTIN_ACTION_PRIORITY,
        move || {
            info!(entity_id = %entity_id, url = %website.url(), "co_website_opening");
            co_websites.add_to_store(&website);
            let failed_entity = entity_id.clone();
            co_websites.load(
                &website,
                Box::new(move |load_error| {
                    error!(
                        entity_id = %failed_entity,
                        error = %load_error,
                        "co_website_load_failed"
                    );
                }),
            );
        },
    ))
}
