use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::config::InteractionConfig;
use crate::entity::{EntityContext, EntityData, EntityPrefab};
use crate::events::EntityEventQueue;
use crate::host::{
    CoWebsite, CoWebsiteLoadError, CoWebsiteManager, DisplaySize, EditorModeHandle, EntityId,
    LoadFailureHandler, OutlineStyle, SceneHost, Vec2,
};
use crate::menu::ActionsMenuHandle;
use crate::properties::PropertyRegistry;

pub(crate) const TEST_DISPLAY_SIZE: DisplaySize = DisplaySize {
    width: 32.0,
    height: 64.0,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HostCall {
    Create(EntityId, Vec2, String),
    Release(EntityId),
    Position(EntityId, Vec2),
    Depth(EntityId, f32),
    Interactive(EntityId, Option<String>),
    Draggable(EntityId, bool),
    AddOutline(EntityId, OutlineStyle),
    RemoveOutline(EntityId),
    MarkDirty,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    calls: RefCell<Vec<HostCall>>,
    this: Weak<RecordingHost>,
    refs_at_release: RefCell<Vec<usize>>,
}

impl RecordingHost {
    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Strong handle count on this host, sampled at each release.
    pub(crate) fn refs_at_release(&self) -> Vec<usize> {
        self.refs_at_release.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub(crate) fn dirty_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| **call == HostCall::MarkDirty)
            .count()
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl SceneHost for RecordingHost {
    fn create_renderable(&self, id: &EntityId, position: Vec2, image_path: &str) -> DisplaySize {
        self.record(HostCall::Create(id.clone(), position, image_path.to_string()));
        TEST_DISPLAY_SIZE
    }

    fn release_renderable(&self, id: &EntityId) {
        self.refs_at_release
            .borrow_mut()
            .push(self.this.strong_count());
        self.record(HostCall::Release(id.clone()));
    }

    fn set_position(&self, id: &EntityId, position: Vec2) {
        self.record(HostCall::Position(id.clone(), position));
    }

    fn set_depth(&self, id: &EntityId, depth: f32) {
        self.record(HostCall::Depth(id.clone(), depth));
    }

    fn set_interactive(&self, id: &EntityId, cursor: Option<&str>) {
        self.record(HostCall::Interactive(id.clone(), cursor.map(str::to_string)));
    }

    fn set_draggable(&self, id: &EntityId, draggable: bool) {
        self.record(HostCall::Draggable(id.clone(), draggable));
    }

    fn add_outline(&self, id: &EntityId, style: OutlineStyle) {
        self.record(HostCall::AddOutline(id.clone(), style));
    }

    fn remove_outline(&self, id: &EntityId) {
        self.record(HostCall::RemoveOutline(id.clone()));
    }

    fn mark_dirty(&self) {
        self.record(HostCall::MarkDirty);
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingCoWebsites {
    added: RefCell<Vec<String>>,
    loaded: RefCell<Vec<String>>,
    failure: RefCell<Option<String>>,
    failures_reported: Rc<Cell<u32>>,
}

impl RecordingCoWebsites {
    pub(crate) fn fail_loads_with(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_string());
    }

    pub(crate) fn added(&self) -> Vec<String> {
        self.added.borrow().clone()
    }

    pub(crate) fn loaded(&self) -> Vec<String> {
        self.loaded.borrow().clone()
    }

    pub(crate) fn failures_reported(&self) -> u32 {
        self.failures_reported.get()
    }
}

impl CoWebsiteManager for RecordingCoWebsites {
    fn add_to_store(&self, website: &CoWebsite) {
        self.added.borrow_mut().push(website.url().to_string());
    }

    fn load(&self, website: &CoWebsite, on_failure: LoadFailureHandler) {
        self.loaded.borrow_mut().push(website.url().to_string());
        if let Some(message) = self.failure.borrow().clone() {
            self.failures_reported.set(self.failures_reported.get() + 1);
            on_failure(CoWebsiteLoadError {
                url: website.url().to_string(),
                message,
            });
        }
    }
}

pub(crate) struct TestHarness {
    pub(crate) ctx: EntityContext,
    pub(crate) host: Rc<RecordingHost>,
    pub(crate) co_websites: Rc<RecordingCoWebsites>,
}

pub(crate) fn harness() -> TestHarness {
    let host = Rc::new_cyclic(|this| RecordingHost {
        this: this.clone(),
        ..RecordingHost::default()
    });
    let co_websites = Rc::new(RecordingCoWebsites::default());
    let ctx = EntityContext {
        host: host.clone(),
        co_websites: co_websites.clone(),
        actions_menu: ActionsMenuHandle::default(),
        editor_mode: EditorModeHandle::default(),
        events: EntityEventQueue::default(),
        config: InteractionConfig::default(),
    };
    TestHarness {
        ctx,
        host,
        co_websites,
    }
}

pub(crate) fn properties(value: Value) -> PropertyRegistry {
    match value {
        Value::Object(map) => PropertyRegistry::from(map),
        other => panic!("expected object, got {other}"),
    }
}

pub(crate) fn entity_data(id: &str, x: f32, y: f32, interactive: bool, props: Value) -> EntityData {
    EntityData {
        id: EntityId::new(id),
        x,
        y,
        prefab: EntityPrefab {
            name: "table".to_string(),
            image_path: "furniture/table.png".to_string(),
            tags: Vec::new(),
            collision_grid: None,
            depth_offset: None,
        },
        interactive,
        properties: properties(props),
    }
}
