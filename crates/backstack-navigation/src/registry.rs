use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use backstack_core::View;

use crate::{
    Bundle, EntryStore, NavController, NavError, PopHandler, PopResult, Result, Route,
    RouteEntry, StackEntry,
};

type AttachHook<T> = Rc<dyn Fn(&NavController, &T, &StackEntry)>;
type DetachHook<T> = Rc<dyn Fn(&T, &StackEntry)>;
type PopHook<T> = Rc<dyn Fn(&T, Option<&Route>) -> PopResult>;

/// Anything a route can build that exposes a root view.
pub trait ViewBinding: 'static {
    fn root(&self) -> &View;
}

impl ViewBinding for View {
    fn root(&self) -> &View {
        self
    }
}

/// Screen logic bundled into one object.
///
/// `update` runs every time the screen's view attaches (first show and every
/// revisit); `on_pop` takes part in pop interception while the screen is in
/// front.
pub trait ViewController: 'static {
    fn build_view(&mut self, entry: &StackEntry) -> View;

    fn update(&mut self, view: &View, entry: &StackEntry);

    fn on_detach(&mut self, _view: &View, _entry: &StackEntry) {}

    fn on_pop(&mut self, _view: &View, _target: Option<&Route>) -> PopResult {
        PopResult::DoNothing
    }
}

/// Optional per-screen callbacks.
pub struct ViewHooks<T> {
    on_attach: Option<AttachHook<T>>,
    on_detach: Option<DetachHook<T>>,
    on_pop: Option<PopHook<T>>,
}

impl<T> Default for ViewHooks<T> {
    fn default() -> Self {
        Self {
            on_attach: None,
            on_detach: None,
            on_pop: None,
        }
    }
}

impl<T> ViewHooks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_attach(mut self, f: impl Fn(&NavController, &T, &StackEntry) + 'static) -> Self {
        self.on_attach = Some(Rc::new(f));
        self
    }

    pub fn on_detach(mut self, f: impl Fn(&T, &StackEntry) + 'static) -> Self {
        self.on_detach = Some(Rc::new(f));
        self
    }

    pub fn on_pop(mut self, f: impl Fn(&T, Option<&Route>) -> PopResult + 'static) -> Self {
        self.on_pop = Some(Rc::new(f));
        self
    }
}

/// Per-navigator arena: activation states, built screens and the pop handler
/// of the screen currently in front.
#[derive(Default)]
pub(crate) struct RouterState {
    entries: RefCell<EntryStore>,
    /// Latest build of each activation. Cached routes reuse theirs; uncached
    /// ones are released when their view detaches.
    slots: RefCell<HashMap<(Route, usize), Rc<dyn Any>>>,
    current_on_pop: RefCell<Option<PopHandler>>,
}

impl RouterState {
    pub(crate) fn entry(&self, route: &Route, position: usize) -> StackEntry {
        self.entries.borrow_mut().get_or_create(route, position)
    }

    pub(crate) fn existing_entry(&self, route: &Route, position: usize) -> Option<StackEntry> {
        self.entries.borrow().get(route, position)
    }

    fn cached_slot<T: 'static>(&self, route: &Route, position: usize) -> Option<Rc<T>> {
        let slot = self.slots.borrow().get(&(route.clone(), position)).cloned()?;
        slot.downcast::<T>().ok()
    }

    fn keep_slot<T: 'static>(&self, route: &Route, position: usize, slot: Rc<T>) {
        let replaced = self
            .slots
            .borrow_mut()
            .insert((route.clone(), position), slot);
        // dropped outside the borrow
        drop(replaced);
    }

    /// Drops the stored build of `(route, position)` if it is still `slot`.
    fn release_slot<T: 'static>(&self, route: &Route, position: usize, slot: &Rc<T>) {
        let key = (route.clone(), position);
        let mut slots = self.slots.borrow_mut();
        let same = slots
            .get(&key)
            .and_then(|kept| kept.clone().downcast::<T>().ok())
            .is_some_and(|kept| Rc::ptr_eq(&kept, slot));
        let released = if same { slots.remove(&key) } else { None };
        drop(slots);
        drop(released);
    }

    pub(crate) fn current_on_pop(&self) -> Option<PopHandler> {
        self.current_on_pop.borrow().clone()
    }

    fn set_current_on_pop(&self, handler: Option<PopHandler>) {
        *self.current_on_pop.borrow_mut() = handler;
    }

    /// Cancels every activation scope and drops cached screens.
    pub(crate) fn destroy(&self) {
        let entries = self.entries.borrow_mut().drain();
        for entry in entries {
            entry.cancel_scope();
        }
        let slots = std::mem::take(&mut *self.slots.borrow_mut());
        drop(slots);
        self.set_current_on_pop(None);
    }
}

/// Registration surface handed to the navigator's route builder.
///
/// Registering a route twice keeps the last registration.
pub struct NavigatorScope {
    name: String,
    controller: NavController,
    state: Rc<RouterState>,
    routes: HashMap<Route, Rc<RouteEntry>>,
}

impl NavigatorScope {
    pub(crate) fn new(name: String, controller: NavController) -> Self {
        Self {
            name,
            controller,
            state: Rc::new(RouterState::default()),
            routes: HashMap::new(),
        }
    }

    /// Name of the navigator being built.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controller(&self) -> &NavController {
        &self.controller
    }

    /// Plain view screen.
    pub fn nav_view(
        &mut self,
        route: impl Into<Route>,
        cached: bool,
        hooks: ViewHooks<View>,
        builder: impl Fn(&NavController, &StackEntry) -> View + 'static,
    ) {
        self.register(route, cached, hooks, builder);
    }

    /// Screen built as a typed binding; hooks receive the binding. Always
    /// cached.
    pub fn nav_view_binding<B: ViewBinding>(
        &mut self,
        route: impl Into<Route>,
        hooks: ViewHooks<B>,
        builder: impl Fn(&NavController, &StackEntry) -> B + 'static,
    ) {
        self.register(route, true, hooks, builder);
    }

    /// Screen driven by a [`ViewController`]. Always cached.
    pub fn nav_view_controller<C: ViewController>(
        &mut self,
        route: impl Into<Route>,
        builder: impl Fn(&NavController, &StackEntry) -> C + 'static,
    ) {
        let hooks = ViewHooks::<ControllerSlot<C>>::new()
            .on_attach(|_nav, slot, entry| {
                slot.with(|c| c.update(&slot.view, entry));
            })
            .on_detach(|slot, entry| {
                slot.with(|c| c.on_detach(&slot.view, entry));
            })
            .on_pop(|slot, target| {
                slot.with(|c| c.on_pop(&slot.view, target))
                    .unwrap_or(PopResult::DoNothing)
            });
        self.register(route, true, hooks, move |nav, entry| {
            let mut controller = builder(nav, entry);
            let view = controller.build_view(entry);
            ControllerSlot {
                controller: RefCell::new(controller),
                view,
            }
        });
    }

    /// General registration all the variants above go through.
    pub fn register<T: ViewBinding>(
        &mut self,
        route: impl Into<Route>,
        cached: bool,
        hooks: ViewHooks<T>,
        builder: impl Fn(&NavController, &StackEntry) -> T + 'static,
    ) {
        let route = route.into();
        let state = self.state.clone();
        let hooks = Rc::new(hooks);
        let key = route.clone();

        let build = move |nav: &NavController,
                          position: usize,
                          args: Option<Bundle>,
                          apply_args: bool|
              -> View {
            let entry = state.entry(&key, position);
            if apply_args {
                entry.set_args(args);
            }
            let reused = if cached {
                state.cached_slot::<T>(&key, position)
            } else {
                None
            };
            let slot = match reused {
                Some(slot) => {
                    slot.root().remove_from_parent();
                    log::trace!("reusing cached view for {key}_{position}");
                    slot
                }
                None => {
                    let slot = Rc::new(builder(nav, &entry));
                    state.keep_slot(&key, position, slot.clone());
                    slot
                }
            };
            bind_lifecycle(&state, nav, &slot, &entry, &hooks, cached);
            slot.root().clone()
        };

        let entry = Rc::new(RouteEntry::new(route.clone(), cached, Box::new(build)));
        if self.routes.insert(route.clone(), entry).is_some() {
            log::debug!("[{}] route `{route}` registered again", self.name);
        }
    }

    pub(crate) fn finish(self) -> RouteRegistry {
        RouteRegistry {
            routes: self.routes,
            state: self.state,
        }
    }
}

/// Wires attach/detach of a freshly materialized view to its activation.
///
/// Attach renews the activation's scope, makes the screen's pop hook current
/// and runs `on_attach`; the matching detach cancels the scope and runs
/// `on_detach`. Both callbacks are single-shot, and a rebuild of the same
/// activation retires the callbacks of any earlier build that never attached.
///
/// The pending attach callback holds the screen weakly: the screen owns its
/// root view, and the view owns the callback. [`RouterState`] keeps the
/// strong handle until the build is replaced or, for uncached routes, its
/// view detaches.
fn bind_lifecycle<T: ViewBinding>(
    state: &Rc<RouterState>,
    nav: &NavController,
    slot: &Rc<T>,
    entry: &StackEntry,
    hooks: &Rc<ViewHooks<T>>,
    cached: bool,
) {
    let weak_state = Rc::downgrade(state);
    let nav = nav.clone();
    let weak_slot: Weak<T> = Rc::downgrade(slot);
    let entry = entry.clone();
    let hooks = hooks.clone();
    let view = slot.root().clone();
    let binding = entry.next_binding();

    view.do_on_attach(move |view| {
        if !entry.is_current_binding(binding) {
            return;
        }
        let Some(slot) = weak_slot.upgrade() else {
            return;
        };
        if entry.renew_scope() {
            log::trace!(
                "scope renewed for {}_{}",
                entry.route(),
                entry.position()
            );
        }
        if let Some(state) = weak_state.upgrade() {
            let handler: PopHandler = {
                let slot = slot.clone();
                let hooks = hooks.clone();
                Rc::new(move |target: Option<&Route>| match &hooks.on_pop {
                    Some(on_pop) => on_pop(&slot, target),
                    None => PopResult::DoNothing,
                })
            };
            state.set_current_on_pop(Some(handler));
        }
        if let Some(on_attach) = &hooks.on_attach {
            on_attach(&nav, &slot, &entry);
        }

        view.do_on_detach(move |_| {
            entry.cancel_scope();
            if let Some(on_detach) = &hooks.on_detach {
                on_detach(&slot, &entry);
            }
            if !cached
                && let Some(state) = weak_state.upgrade()
            {
                state.release_slot(entry.route(), entry.position(), &slot);
            }
        });
    });
}

struct ControllerSlot<C> {
    controller: RefCell<C>,
    view: View,
}

impl<C: 'static> ViewBinding for ControllerSlot<C> {
    fn root(&self) -> &View {
        &self.view
    }
}

impl<C> ControllerSlot<C> {
    fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        match self.controller.try_borrow_mut() {
            Ok(mut c) => Some(f(&mut c)),
            Err(_) => {
                log::warn!("view controller re-entered while busy; call skipped");
                None
            }
        }
    }
}

/// Frozen route table of a built navigator.
pub(crate) struct RouteRegistry {
    routes: HashMap<Route, Rc<RouteEntry>>,
    state: Rc<RouterState>,
}

impl RouteRegistry {
    pub(crate) fn resolve(&self, route: &Route) -> Result<Rc<RouteEntry>> {
        self.routes
            .get(route)
            .cloned()
            .ok_or_else(|| NavError::UnknownRoute(route.clone()))
    }

    pub(crate) fn state(&self) -> &RouterState {
        &self.state
    }
}
