use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::navigator::NavigatorInner;
use crate::{Bundle, Result, Route};

/// Cloneable handle screens use to drive their navigator.
///
/// A controller may be created before its navigator and is bound when the
/// navigator is built. It holds the navigator weakly: once the navigator is
/// gone (or before it exists) every call is a no-op reporting `false`.
#[derive(Clone, Default)]
pub struct NavController {
    target: Rc<RefCell<Weak<NavigatorInner>>>,
}

impl NavController {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&self, navigator: &Rc<NavigatorInner>) {
        if let Some(previous) = self.navigator() {
            log::warn!(
                "controller moved from navigator `{}` to `{}`",
                previous.name(),
                navigator.name()
            );
        }
        *self.target.borrow_mut() = Rc::downgrade(navigator);
    }

    pub fn is_bound(&self) -> bool {
        self.navigator().is_some()
    }

    fn navigator(&self) -> Option<Rc<NavigatorInner>> {
        self.target.borrow().upgrade()
    }

    /// Pushes `route`. `Ok(false)` if the navigator is gone or `route` is
    /// already in front and cached.
    pub fn navigate_to(&self, route: impl Into<Route>, args: Option<Bundle>) -> Result<bool> {
        match self.navigator() {
            Some(nav) => nav.navigate_to(&route.into(), args, true),
            None => Ok(false),
        }
    }

    /// Pops the front screen; `force` skips pop interception.
    pub fn pop(&self, force: bool) -> Result<bool> {
        match self.navigator() {
            Some(nav) => nav.pop(force),
            None => Ok(false),
        }
    }

    /// Pops back to the nearest activation of `route` below the front one.
    pub fn pop_to(
        &self,
        route: impl Into<Route>,
        force: bool,
        args: Option<Bundle>,
    ) -> Result<bool> {
        match self.navigator() {
            Some(nav) => nav.pop_to(&route.into(), force, args),
            None => Ok(false),
        }
    }

    pub fn current_route(&self) -> Option<Route> {
        self.navigator()?.current_route()
    }

    pub fn view_stack_size(&self) -> usize {
        self.navigator().map_or(0, |nav| nav.view_stack_size())
    }
}

impl std::fmt::Debug for NavController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.navigator().map(|n| n.name().to_owned());
        f.debug_struct("NavController")
            .field("navigator", &name)
            .finish()
    }
}
