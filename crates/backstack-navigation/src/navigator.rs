use std::cell::{Cell, RefCell};
use std::rc::Rc;

use backstack_core::{AttachState, Dispose, Listeners, View};

use crate::container::{NavigationContainer, ViewContainer};
use crate::pop::resolve_pop;
use crate::registry::{NavigatorScope, RouteRegistry};
use crate::saved_state::{SavedStateRegistry, decode_stack, encode_stack};
use crate::{Bundle, NavController, PopHandler, PopResult, Result, Route, RouteEntry, StackEntry};

type RouteChangeListener = dyn Fn(Option<&Route>, &Route);
type PopOutListener = dyn Fn() -> bool;

/// Configures and builds a [`ViewNavigator`].
pub struct ViewNavigatorBuilder {
    name: String,
    init_route: Route,
    init_args: Option<Bundle>,
    container: Option<Rc<dyn ViewContainer>>,
    controller: Option<NavController>,
    saved_state: Option<Rc<dyn SavedStateRegistry>>,
}

impl ViewNavigatorBuilder {
    /// Arguments of the initial activation. Ignored when the stack is
    /// restored from saved state.
    pub fn init_args(mut self, args: Bundle) -> Self {
        self.init_args = Some(args);
        self
    }

    /// Defaults to a [`NavigationContainer`] with default animations.
    pub fn container(mut self, container: Rc<dyn ViewContainer>) -> Self {
        self.container = Some(container);
        self
    }

    /// Binds an existing controller instead of creating one.
    pub fn controller(mut self, controller: NavController) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn saved_state(mut self, registry: Rc<dyn SavedStateRegistry>) -> Self {
        self.saved_state = Some(registry);
        self
    }

    /// Registers routes with `routes`, then restores the saved stack or shows
    /// the initial route.
    ///
    /// Fails if the initial (or a restored) route is not registered, if the
    /// saved-state scope already holds a navigator of the same name, or if
    /// the restored state is malformed.
    pub fn build(self, routes: impl FnOnce(&mut NavigatorScope)) -> Result<ViewNavigator> {
        let controller = self.controller.unwrap_or_default();
        let container = self.container.unwrap_or_else(|| {
            Rc::new(NavigationContainer::new(format!("{}-container", self.name)))
        });

        let mut scope = NavigatorScope::new(self.name.clone(), controller.clone());
        routes(&mut scope);
        let registry = scope.finish();
        registry.resolve(&self.init_route)?;

        let inner = Rc::new(NavigatorInner {
            name: self.name,
            controller,
            registry,
            stack: RefCell::new(Vec::new()),
            container,
            route_listeners: Listeners::new(),
            pop_out_listeners: Listeners::new(),
            default_on_pop: RefCell::new(None),
            restore_pending: Cell::new(false),
            saved_state: self.saved_state,
            provider_registered: Cell::new(false),
            container_watch: RefCell::new(None),
        });

        if let Some(saved_state) = &inner.saved_state {
            let weak = Rc::downgrade(&inner);
            saved_state.register_provider(
                &inner.name,
                Box::new(move || {
                    weak.upgrade()
                        .map(|nav| nav.save_state())
                        .unwrap_or_default()
                }),
            )?;
            inner.provider_registered.set(true);
        }
        inner.controller.bind(&inner);

        let restored = inner
            .saved_state
            .as_ref()
            .and_then(|s| s.consume_restored_state(&inner.name));
        let resumed = match restored {
            Some(saved) => inner.restore(&saved)?,
            None => false,
        };
        if !resumed {
            inner.navigate_to(&self.init_route, self.init_args, false)?;
        }

        let weak = Rc::downgrade(&inner);
        let watch = inner
            .container
            .container()
            .add_attach_listener(move |_, state| {
                if let Some(nav) = weak.upgrade() {
                    nav.on_container_attach_changed(state);
                }
            });
        *inner.container_watch.borrow_mut() = Some(watch);

        Ok(ViewNavigator { inner })
    }
}

/// Back stack of routed screens rendered into a [`ViewContainer`].
///
/// Dropping the navigator cancels every activation's work scope, empties
/// the container and unregisters its saved-state provider.
pub struct ViewNavigator {
    inner: Rc<NavigatorInner>,
}

impl ViewNavigator {
    pub fn builder(name: impl Into<String>, init_route: impl Into<Route>) -> ViewNavigatorBuilder {
        ViewNavigatorBuilder {
            name: name.into(),
            init_route: init_route.into(),
            init_args: None,
            container: None,
            controller: None,
            saved_state: None,
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn controller(&self) -> NavController {
        self.inner.controller.clone()
    }

    pub fn container(&self) -> Rc<dyn ViewContainer> {
        self.inner.container.clone()
    }

    /// Root view to place in the host's hierarchy.
    pub fn container_view(&self) -> View {
        self.inner.container.container().clone()
    }

    pub fn view_stack_size(&self) -> usize {
        self.inner.view_stack_size()
    }

    pub fn current_route(&self) -> Option<Route> {
        self.inner.current_route()
    }

    pub fn current_view(&self) -> Option<View> {
        self.inner.container.current_view()
    }

    /// Routes on the stack, bottom first.
    pub fn routes(&self) -> Vec<Route> {
        self.inner
            .stack
            .borrow()
            .iter()
            .map(|e| e.route().clone())
            .collect()
    }

    /// State of the activation of `route` at `position`, if it was ever shown.
    pub fn entry(&self, route: impl Into<Route>, position: usize) -> Option<StackEntry> {
        self.inner
            .registry
            .state()
            .existing_entry(&route.into(), position)
    }

    pub fn navigate_to(&self, route: impl Into<Route>, args: Option<Bundle>) -> Result<bool> {
        self.inner.navigate_to(&route.into(), args, true)
    }

    pub fn pop(&self, force: bool) -> Result<bool> {
        self.inner.pop(force)
    }

    pub fn pop_to(
        &self,
        route: impl Into<Route>,
        force: bool,
        args: Option<Bundle>,
    ) -> Result<bool> {
        self.inner.pop_to(&route.into(), force, args)
    }

    /// Consulted on every unforced pop after the front screen's own handler
    /// returned [`PopResult::DoNothing`].
    pub fn set_default_pop_handler(&self, f: impl Fn(Option<&Route>) -> PopResult + 'static) {
        let handler: PopHandler = Rc::new(f);
        *self.inner.default_on_pop.borrow_mut() = Some(handler);
    }

    pub fn clear_default_pop_handler(&self) {
        self.inner.default_on_pop.borrow_mut().take();
    }

    /// `f(previous, current)` after every stack change.
    pub fn add_route_change_listener(
        &self,
        f: impl Fn(Option<&Route>, &Route) + 'static,
    ) -> Dispose {
        let listener: Rc<RouteChangeListener> = Rc::new(f);
        let id = self.inner.route_listeners.add(listener);
        let weak = Rc::downgrade(&self.inner);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.route_listeners.remove(id);
            }
        })
    }

    /// Called when a pop reaches the last screen. The pop counts as handled
    /// if any listener returns `true`.
    pub fn add_on_pop_out_listener(&self, f: impl Fn() -> bool + 'static) -> Dispose {
        let listener: Rc<PopOutListener> = Rc::new(f);
        let id = self.inner.pop_out_listeners.add(listener);
        let weak = Rc::downgrade(&self.inner);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.pop_out_listeners.remove(id);
            }
        })
    }

    /// Same bundle the saved-state provider hands out.
    pub fn save_state(&self) -> Bundle {
        self.inner.save_state()
    }
}

impl std::fmt::Debug for ViewNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewNavigator")
            .field("name", &self.inner.name)
            .field("routes", &self.routes())
            .finish()
    }
}

pub(crate) struct NavigatorInner {
    name: String,
    controller: NavController,
    registry: RouteRegistry,
    // bottom first
    stack: RefCell<Vec<Rc<RouteEntry>>>,
    container: Rc<dyn ViewContainer>,
    route_listeners: Listeners<RouteChangeListener>,
    pop_out_listeners: Listeners<PopOutListener>,
    default_on_pop: RefCell<Option<PopHandler>>,
    restore_pending: Cell<bool>,
    saved_state: Option<Rc<dyn SavedStateRegistry>>,
    provider_registered: Cell<bool>,
    container_watch: RefCell<Option<Dispose>>,
}

impl NavigatorInner {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn view_stack_size(&self) -> usize {
        self.stack.borrow().len()
    }

    pub(crate) fn current_route(&self) -> Option<Route> {
        self.top().map(|e| e.route().clone())
    }

    fn top(&self) -> Option<Rc<RouteEntry>> {
        self.stack.borrow().last().cloned()
    }

    fn is_cached_top(&self, route: &Route) -> bool {
        self.top()
            .is_some_and(|top| top.cached() && top.route() == route)
    }

    pub(crate) fn navigate_to(
        &self,
        route: &Route,
        args: Option<Bundle>,
        animate: bool,
    ) -> Result<bool> {
        if self.is_cached_top(route) {
            log::debug!("[{}] `{route}` already in front", self.name);
            return Ok(false);
        }
        let entry = self.registry.resolve(route)?;
        let previous = self.current_route();
        let position = self.view_stack_size();

        let view = entry.build_view(&self.controller, position, args, true);
        if animate && previous.is_some() {
            self.container.animate_change_view(view, true);
        } else {
            self.container.set_view(view);
        }
        self.stack.borrow_mut().push(entry);

        log::debug!(
            "[{}] navigate_to `{route}` (size {})",
            self.name,
            position + 1
        );
        self.notify_route_change(previous.as_ref(), route);
        Ok(true)
    }

    pub(crate) fn pop(&self, force: bool) -> Result<bool> {
        let (size, below) = {
            let stack = self.stack.borrow();
            let below = stack
                .len()
                .checked_sub(2)
                .map(|i| stack[i].route().clone());
            (stack.len(), below)
        };
        if size == 0 {
            return Ok(false);
        }

        if !force {
            match self.intercept(below.as_ref()) {
                PopResult::DoNothing => {}
                PopResult::Intercept => {
                    log::debug!("[{}] pop intercepted", self.name);
                    return Ok(true);
                }
                PopResult::Redirect(target) => {
                    log::debug!("[{}] pop redirected to `{target}`", self.name);
                    return self.pop_to(&target, true, None);
                }
            }
        }

        if size == 1 {
            let handled = self.pop_out_listeners.snapshot().iter().any(|l| l());
            log::debug!("[{}] pop out (handled: {handled})", self.name);
            return Ok(handled);
        }

        let (popped, top) = {
            let mut stack = self.stack.borrow_mut();
            let popped = stack.pop();
            (popped, stack.last().cloned())
        };
        let (Some(popped), Some(top)) = (popped, top) else {
            return Ok(false);
        };
        self.show_popped_to(&top, None);
        self.notify_route_change(Some(popped.route()), top.route());
        Ok(true)
    }

    pub(crate) fn pop_to(&self, route: &Route, force: bool, args: Option<Bundle>) -> Result<bool> {
        if self.is_cached_top(route) {
            log::debug!("[{}] `{route}` already in front", self.name);
            return Ok(false);
        }
        let target = self.registry.resolve(route)?;
        let present = {
            let stack = self.stack.borrow();
            let below_top = stack.len().saturating_sub(1);
            stack[..below_top].iter().any(|e| Rc::ptr_eq(e, &target))
        };
        if !present {
            log::warn!("[{}] pop_to `{route}`: not on the stack", self.name);
            return Ok(false);
        }

        if !force {
            match self.intercept(Some(route)) {
                PopResult::DoNothing => {}
                PopResult::Intercept => {
                    log::debug!("[{}] pop_to `{route}` intercepted", self.name);
                    return Ok(true);
                }
                PopResult::Redirect(redirect) => {
                    log::debug!("[{}] pop_to `{route}` redirected to `{redirect}`", self.name);
                    return self.pop_to(&redirect, true, args);
                }
            }
        }

        let previous = self.current_route();
        let top = {
            let mut stack = self.stack.borrow_mut();
            while stack.len() > 1 {
                stack.pop();
                if stack.last().is_some_and(|e| Rc::ptr_eq(e, &target)) {
                    break;
                }
            }
            stack.last().cloned()
        };
        let Some(top) = top else {
            return Ok(false);
        };
        self.show_popped_to(&top, args);
        self.notify_route_change(previous.as_ref(), top.route());
        Ok(true)
    }

    /// Rebuilds the new front activation and runs the pop transition.
    fn show_popped_to(&self, top: &RouteEntry, args: Option<Bundle>) {
        let position = self.view_stack_size() - 1;
        let apply = args.is_some();
        let view = top.build_view(&self.controller, position, args, apply);
        self.container.animate_change_view(view, false);
        log::debug!(
            "[{}] popped to `{}` (size {})",
            self.name,
            top.route(),
            position + 1
        );
    }

    fn intercept(&self, target: Option<&Route>) -> PopResult {
        let screen = self.registry.state().current_on_pop();
        let fallback = self.default_on_pop.borrow().clone();
        resolve_pop(screen, fallback, target)
    }

    fn notify_route_change(&self, previous: Option<&Route>, current: &Route) {
        for listener in self.route_listeners.snapshot() {
            listener(previous, current);
        }
    }

    fn save_state(&self) -> Bundle {
        let stack = self.stack.borrow();
        let state = self.registry.state();
        encode_stack(stack.iter().enumerate().map(|(position, e)| {
            let args = state
                .existing_entry(e.route(), position)
                .and_then(|entry| entry.args());
            (e.route(), position, args)
        }))
    }

    /// Returns `false` if the saved stack is empty and a fresh start is
    /// needed.
    fn restore(&self, saved: &Bundle) -> Result<bool> {
        let decoded = decode_stack(&self.name, saved)?;
        if decoded.is_empty() {
            return Ok(false);
        }
        let entries = decoded
            .iter()
            .map(|(route, _)| self.registry.resolve(route))
            .collect::<Result<Vec<_>>>()?;

        let state = self.registry.state();
        for (position, (route, args)) in decoded.into_iter().enumerate() {
            state.entry(&route, position).set_args(args);
        }
        let position = entries.len() - 1;
        let top = entries[position].clone();
        *self.stack.borrow_mut() = entries;

        let view = top.build_view(&self.controller, position, None, false);
        self.container.set_view(view);
        log::debug!(
            "[{}] restored {} entries, front `{}`",
            self.name,
            position + 1,
            top.route()
        );
        Ok(true)
    }

    fn on_container_attach_changed(&self, state: AttachState) {
        match state {
            AttachState::Detached => self.restore_pending.set(true),
            AttachState::Attached => {
                if !self.restore_pending.replace(false) {
                    return;
                }
                let Some(top) = self.top() else {
                    return;
                };
                let position = self.view_stack_size() - 1;
                let view = top.build_view(&self.controller, position, None, false);
                self.container.set_view(view);
                log::debug!("[{}] rebuilt `{}` after reattach", self.name, top.route());
            }
        }
    }
}

impl Drop for NavigatorInner {
    fn drop(&mut self) {
        if let Some(watch) = self.container_watch.get_mut().take() {
            watch.run();
        }
        if self.provider_registered.get()
            && let Some(saved_state) = &self.saved_state
        {
            saved_state.unregister_provider(&self.name);
        }
        self.container.clear();
        self.registry.state().destroy();
        log::debug!("[{}] navigator destroyed", self.name);
    }
}
