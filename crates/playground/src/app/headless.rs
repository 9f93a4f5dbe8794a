use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use map_entity::{
    CoWebsite, CoWebsiteLoadError, CoWebsiteManager, DisplaySize, EntityId, LoadFailureHandler,
    OutlineStyle, SceneHost, Vec2,
};
use tracing::{debug, info};

const TILE_SIZE_PX: f32 = 32.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct HeadlessRenderable {
    pub(crate) image_path: String,
    pub(crate) position: Vec2,
    pub(crate) depth: f32,
    pub(crate) cursor: Option<String>,
    pub(crate) draggable: bool,
    pub(crate) outline: Option<OutlineStyle>,
}

/// Scene host without a window: keeps renderable state and counts redraws.
#[derive(Debug, Default)]
pub(crate) struct HeadlessHost {
    renderables: RefCell<HashMap<EntityId, HeadlessRenderable>>,
    dirty_marks: Cell<u64>,
}

impl HeadlessHost {
    #[cfg(test)]
    pub(crate) fn renderable(&self, id: &EntityId) -> Option<HeadlessRenderable> {
        self.renderables.borrow().get(id).cloned()
    }

    pub(crate) fn renderable_count(&self) -> usize {
        self.renderables.borrow().len()
    }

    pub(crate) fn dirty_marks(&self) -> u64 {
        self.dirty_marks.get()
    }

    fn with_renderable(&self, id: &EntityId, apply: impl FnOnce(&mut HeadlessRenderable)) {
        match self.renderables.borrow_mut().get_mut(id) {
            Some(renderable) => apply(renderable),
            None => debug!(entity_id = %id, "host_call_for_released_renderable"),
        }
    }
}

impl SceneHost for HeadlessHost {
    fn create_renderable(&self, id: &EntityId, position: Vec2, image_path: &str) -> DisplaySize {
        self.renderables.borrow_mut().insert(
            id.clone(),
            HeadlessRenderable {
                image_path: image_path.to_string(),
                position,
                ..HeadlessRenderable::default()
            },
        );
        DisplaySize {
            width: TILE_SIZE_PX,
            height: TILE_SIZE_PX,
        }
    }

    fn release_renderable(&self, id: &EntityId) {
        self.renderables.borrow_mut().remove(id);
    }

    fn set_position(&self, id: &EntityId, position: Vec2) {
        self.with_renderable(id, |renderable| renderable.position = position);
    }

    fn set_depth(&self, id: &EntityId, depth: f32) {
        self.with_renderable(id, |renderable| renderable.depth = depth);
    }

    fn set_interactive(&self, id: &EntityId, cursor: Option<&str>) {
        self.with_renderable(id, |renderable| {
            renderable.cursor = cursor.map(str::to_string)
        });
    }

    fn set_draggable(&self, id: &EntityId, draggable: bool) {
        self.with_renderable(id, |renderable| renderable.draggable = draggable);
    }

    fn add_outline(&self, id: &EntityId, style: OutlineStyle) {
        self.with_renderable(id, |renderable| renderable.outline = Some(style));
    }

    fn remove_outline(&self, id: &EntityId) {
        self.with_renderable(id, |renderable| renderable.outline = None);
    }

    fn mark_dirty(&self) {
        self.dirty_marks.set(self.dirty_marks.get().saturating_add(1));
    }
}

/// Side panel stand-in. Only http(s) pages can be embedded.
#[derive(Debug, Default)]
pub(crate) struct HeadlessCoWebsites {
    opened: RefCell<Vec<String>>,
}

impl HeadlessCoWebsites {
    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl CoWebsiteManager for HeadlessCoWebsites {
    fn add_to_store(&self, website: &CoWebsite) {
        info!(url = %website.url(), allow_api = website.allow_api(), "co_website_added");
    }

    fn load(&self, website: &CoWebsite, on_failure: LoadFailureHandler) {
        let scheme = website.url().scheme();
        if scheme != "http" && scheme != "https" {
            on_failure(CoWebsiteLoadError {
                url: website.url().to_string(),
                message: format!("scheme '{scheme}' cannot be embedded"),
            });
            return;
        }
        self.opened.borrow_mut().push(website.url().to_string());
        info!(url = %website.url(), "co_website_loaded");
    }
}
