use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use backstack_core::WorkScope;
use slotmap::{SlotMap, new_key_type};

use crate::{Bundle, Route};

new_key_type! {
    pub struct EntryKey;
}

/// State of one activation `(route, position)` that outlives its view.
///
/// Holds the activation's arguments and its work scope. The scope is live
/// only while the activation's view is attached: it starts cancelled, is
/// replaced by a fresh one on every attach and cancelled again on detach.
#[derive(Clone)]
pub struct StackEntry(Rc<EntryInner>);

struct EntryInner {
    route: Route,
    position: usize,
    args: RefCell<Option<Bundle>>,
    scope: RefCell<WorkScope>,
    binding: Cell<u64>,
}

impl StackEntry {
    pub(crate) fn new(route: Route, position: usize) -> Self {
        let scope = WorkScope::new();
        scope.cancel();
        Self(Rc::new(EntryInner {
            route,
            position,
            args: RefCell::new(None),
            scope: RefCell::new(scope),
            binding: Cell::new(0),
        }))
    }

    pub fn route(&self) -> &Route {
        &self.0.route
    }

    /// Index from the bottom of the back stack (0 = first pushed).
    pub fn position(&self) -> usize {
        self.0.position
    }

    pub fn args(&self) -> Option<Bundle> {
        self.0.args.borrow().clone()
    }

    pub fn with_args<R>(&self, f: impl FnOnce(Option<&Bundle>) -> R) -> R {
        f(self.0.args.borrow().as_ref())
    }

    pub fn set_args(&self, args: Option<Bundle>) {
        *self.0.args.borrow_mut() = args;
    }

    pub fn scope(&self) -> WorkScope {
        self.0.scope.borrow().clone()
    }

    /// Replaces a cancelled scope with a live one. Returns `true` if a new
    /// scope was created.
    pub(crate) fn renew_scope(&self) -> bool {
        let mut scope = self.0.scope.borrow_mut();
        if scope.is_active() {
            return false;
        }
        *scope = WorkScope::new();
        true
    }

    pub(crate) fn cancel_scope(&self) {
        // clone out: cleanups may read this entry
        let scope = self.scope();
        scope.cancel();
    }

    /// Starts a new view binding; callbacks of older bindings become stale.
    pub(crate) fn next_binding(&self) -> u64 {
        let next = self.0.binding.get() + 1;
        self.0.binding.set(next);
        next
    }

    pub(crate) fn is_current_binding(&self, binding: u64) -> bool {
        self.0.binding.get() == binding
    }

    pub fn ptr_eq(&self, other: &StackEntry) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for StackEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackEntry")
            .field("route", &self.0.route)
            .field("position", &self.0.position)
            .field("args", &self.0.args.borrow())
            .finish()
    }
}

/// Arena of activation states owned by one navigator.
#[derive(Default)]
pub struct EntryStore {
    arena: SlotMap<EntryKey, StackEntry>,
    index: HashMap<(Route, usize), EntryKey>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_of(&self, route: &Route, position: usize) -> Option<EntryKey> {
        self.index.get(&(route.clone(), position)).copied()
    }

    pub fn get(&self, route: &Route, position: usize) -> Option<StackEntry> {
        let key = self.key_of(route, position)?;
        self.arena.get(key).cloned()
    }

    pub fn get_or_create(&mut self, route: &Route, position: usize) -> StackEntry {
        if let Some(entry) = self.get(route, position) {
            return entry;
        }
        let entry = StackEntry::new(route.clone(), position);
        let key = self.arena.insert(entry.clone());
        self.index.insert((route.clone(), position), key);
        log::trace!("entry created for {route}_{position}");
        entry
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Forgets all entries, handing them back so the caller can cancel their
    /// scopes outside any borrow of the store.
    pub fn drain(&mut self) -> Vec<StackEntry> {
        self.index.clear();
        self.arena.drain().map(|(_, entry)| entry).collect()
    }
}
