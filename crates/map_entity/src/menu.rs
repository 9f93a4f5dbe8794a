use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::actions::ActionMenuAction;
use crate::host::EntityId;

#[derive(Debug, Clone)]
pub struct ActionsMenu {
    owner: EntityId,
    title: String,
    actions: Vec<ActionMenuAction>,
}

impl ActionsMenu {
    pub fn new(owner: EntityId, title: impl Into<String>) -> Self {
        Self {
            owner,
            title: title.into(),
            actions: Vec::new(),
        }
    }

    pub fn owner(&self) -> &EntityId {
        &self.owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// An action with the same name replaces the earlier one in place.
    pub fn add_action(&mut self, action: ActionMenuAction) {
        match self
            .actions
            .iter_mut()
            .find(|existing| existing.action_name == action.action_name)
        {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    pub fn actions(&self) -> &[ActionMenuAction] {
        &self.actions
    }

    /// Highest priority first; ties keep insertion order.
    pub fn actions_by_priority(&self) -> Vec<&ActionMenuAction> {
        let mut sorted: Vec<&ActionMenuAction> = self.actions.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        sorted
    }

    pub fn find(&self, action_name: &str) -> Option<&ActionMenuAction> {
        self.actions
            .iter()
            .find(|action| action.action_name == action_name)
    }
}

/// The one action menu slot shared by every entity of a scene.
#[derive(Debug, Clone, Default)]
pub struct ActionsMenuHandle {
    current: Rc<RefCell<Option<ActionsMenu>>>,
}

impl ActionsMenuHandle {
    /// Replaces whatever menu was open.
    pub fn open(&self, menu: ActionsMenu) {
        let previous = self.current.borrow_mut().replace(menu);
        if let Some(previous) = previous {
            debug!(owner = %previous.owner, "actions_menu_replaced");
        }
    }

    pub fn clear(&self) -> bool {
        self.current.borrow_mut().take().is_some()
    }

    pub fn is_open(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.current.borrow().as_ref().map(|menu| menu.owner.clone())
    }

    pub fn snapshot(&self) -> Option<ActionsMenu> {
        self.current.borrow().clone()
    }

    /// Runs the named action of the open menu. Returns false when no such
    /// action is shown.
    pub fn trigger(&self, action_name: &str) -> bool {
        let action = self
            .current
            .borrow()
            .as_ref()
            .and_then(|menu| menu.find(action_name).cloned());
        match action {
            Some(action) => {
                action.activate();
                true
            }
            None => false,
        }
    }
}
