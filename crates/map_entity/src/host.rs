use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineStyle {
    pub thickness: u32,
    pub color: u32,
}

/// Capabilities the rendering engine exposes to entities.
///
/// Entities never own engine objects; they address their renderable by id
/// and the host is free to batch or defer the actual draw work.
pub trait SceneHost {
    fn create_renderable(&self, id: &EntityId, position: Vec2, image_path: &str) -> DisplaySize;
    fn release_renderable(&self, id: &EntityId);
    fn set_position(&self, id: &EntityId, position: Vec2);
    fn set_depth(&self, id: &EntityId, depth: f32);
    /// `None` disables pointer interaction for the renderable.
    fn set_interactive(&self, id: &EntityId, cursor: Option<&str>);
    fn set_draggable(&self, id: &EntityId, draggable: bool);
    fn add_outline(&self, id: &EntityId, style: OutlineStyle);
    fn remove_outline(&self, id: &EntityId);
    fn mark_dirty(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoWebsite {
    url: Url,
    allow_api: bool,
    policy: Option<String>,
    width_percent: Option<u32>,
}

impl CoWebsite {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            allow_api: false,
            policy: None,
            width_percent: None,
        }
    }

    pub fn with_allow_api(mut self, allow_api: bool) -> Self {
        self.allow_api = allow_api;
        self
    }

    pub fn with_policy(mut self, policy: Option<String>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_width_percent(mut self, width_percent: Option<u32>) -> Self {
        self.width_percent = width_percent;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn allow_api(&self) -> bool {
        self.allow_api
    }

    pub fn policy(&self) -> Option<&str> {
        self.policy.as_deref()
    }

    pub fn width_percent(&self) -> Option<u32> {
        self.width_percent
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to load co-website {url}: {message}")]
pub struct CoWebsiteLoadError {
    pub url: String,
    pub message: String,
}

pub type LoadFailureHandler = Box<dyn FnOnce(CoWebsiteLoadError)>;

/// Side panel that shows embedded web content next to the map.
pub trait CoWebsiteManager {
    fn add_to_store(&self, website: &CoWebsite);
    /// Starts loading without blocking. `on_failure` runs at most once, possibly later.
    fn load(&self, website: &CoWebsite, on_failure: LoadFailureHandler);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityEditorMode {
    #[default]
    AddMode,
    EditMode,
    RemoveMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EditorModeState {
    editor_active: bool,
    entity_mode: EntityEditorMode,
}

/// Shared view of the map editor mode. Entities only read it.
#[derive(Debug, Clone, Default)]
pub struct EditorModeHandle {
    state: Rc<Cell<EditorModeState>>,
}

impl EditorModeHandle {
    pub fn editor_active(&self) -> bool {
        self.state.get().editor_active
    }

    pub fn entity_mode(&self) -> EntityEditorMode {
        self.state.get().entity_mode
    }

    pub fn set_editor_active(&self, editor_active: bool) {
        let mut state = self.state.get();
        state.editor_active = editor_active;
        self.state.set(state);
    }

    pub fn set_entity_mode(&self, entity_mode: EntityEditorMode) {
        let mut state = self.state.get();
        state.entity_mode = entity_mode;
        self.state.set(state);
    }

    pub fn blocks_activation(&self) -> bool {
        let state = self.state.get();
        state.editor_active && state.entity_mode == EntityEditorMode::EditMode
    }
}
