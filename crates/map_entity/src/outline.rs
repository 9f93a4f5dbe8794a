use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// 0xRRGGBB
pub type OutlineColor = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineSource {
    PointerOver,
    CharacterCloseBy,
    Api,
    Follow,
}

impl OutlineSource {
    /// Highest precedence first. The first source holding a color wins.
    pub const PRECEDENCE: [OutlineSource; 4] = [
        OutlineSource::PointerOver,
        OutlineSource::CharacterCloseBy,
        OutlineSource::Api,
        OutlineSource::Follow,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineColorState {
    pub follow: Option<OutlineColor>,
    pub api: Option<OutlineColor>,
    pub pointer_over: Option<OutlineColor>,
    pub character_close_by: Option<OutlineColor>,
}

impl OutlineColorState {
    pub fn get(&self, source: OutlineSource) -> Option<OutlineColor> {
        match source {
            OutlineSource::PointerOver => self.pointer_over,
            OutlineSource::CharacterCloseBy => self.character_close_by,
            OutlineSource::Api => self.api,
            OutlineSource::Follow => self.follow,
        }
    }

    fn slot_mut(&mut self, source: OutlineSource) -> &mut Option<OutlineColor> {
        match source {
            OutlineSource::PointerOver => &mut self.pointer_over,
            OutlineSource::CharacterCloseBy => &mut self.character_close_by,
            OutlineSource::Api => &mut self.api,
            OutlineSource::Follow => &mut self.follow,
        }
    }

    pub fn resolve(&self) -> Option<OutlineColor> {
        OutlineSource::PRECEDENCE
            .iter()
            .find_map(|source| self.get(*source))
    }
}

type Listener = Box<dyn FnMut(Option<OutlineColor>)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Composes the four outline sources into one displayed color.
///
/// Every setter call emits exactly once, in call order, even when the
/// resolved color does not change. Subscribing does not emit.
#[derive(Default)]
pub struct OutlineColorStore {
    state: OutlineColorState,
    listeners: Rc<RefCell<Listeners>>,
}

impl fmt::Debug for OutlineColorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineColorStore")
            .field("state", &self.state)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl OutlineColorStore {
    pub fn subscribe(
        &self,
        listener: impl FnMut(Option<OutlineColor>) + 'static,
    ) -> OutlineSubscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id = listeners.next_id.saturating_add(1);
        listeners.entries.push((id, Box::new(listener)));
        OutlineSubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    pub fn state(&self) -> OutlineColorState {
        self.state
    }

    pub fn current(&self) -> Option<OutlineColor> {
        self.state.resolve()
    }

    pub fn set(&mut self, source: OutlineSource, color: Option<OutlineColor>) {
        *self.state.slot_mut(source) = color;
        self.emit();
    }

    pub fn set_follow_color(&mut self, color: OutlineColor) {
        self.set(OutlineSource::Follow, Some(color));
    }

    pub fn remove_follow_color(&mut self) {
        self.set(OutlineSource::Follow, None);
    }

    pub fn set_api_color(&mut self, color: OutlineColor) {
        self.set(OutlineSource::Api, Some(color));
    }

    pub fn remove_api_color(&mut self) {
        self.set(OutlineSource::Api, None);
    }

    pub fn pointer_over(&mut self, color: OutlineColor) {
        self.set(OutlineSource::PointerOver, Some(color));
    }

    pub fn pointer_out(&mut self) {
        self.set(OutlineSource::PointerOver, None);
    }

    pub fn character_close_by(&mut self, color: OutlineColor) {
        self.set(OutlineSource::CharacterCloseBy, Some(color));
    }

    pub fn character_far_away(&mut self) {
        self.set(OutlineSource::CharacterCloseBy, None);
    }

    fn emit(&self) {
        let color = self.state.resolve();
        // Listeners must not subscribe or unsubscribe from inside the callback.
        let mut listeners = self.listeners.borrow_mut();
        for (_, listener) in listeners.entries.iter_mut() {
            listener(color);
        }
    }
}

/// Removes its listener when dropped.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct OutlineSubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl OutlineSubscription {
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for OutlineSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineSubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for OutlineSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
