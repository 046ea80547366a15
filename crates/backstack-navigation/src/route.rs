use std::fmt;

use backstack_core::View;
use serde::{Deserialize, Serialize};

use crate::{Bundle, NavController};

/// Screen name, unique within one navigator.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Route {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Route {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Route> for Route {
    fn from(r: &Route) -> Self {
        r.clone()
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Route {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Route {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route({:?})", self.0)
    }
}

/// `(controller, stack position, args, apply args now)` -> view.
pub(crate) type ViewBuilderFn = dyn Fn(&NavController, usize, Option<Bundle>, bool) -> View;

/// One registered route: its caching policy and how to materialize its view.
///
/// Entries are created while the navigator is being built and never change
/// afterwards. The back stack holds shared references to them and compares
/// activations by entry identity.
pub struct RouteEntry {
    route: Route,
    cached: bool,
    build: Box<ViewBuilderFn>,
}

impl RouteEntry {
    pub(crate) fn new(route: Route, cached: bool, build: Box<ViewBuilderFn>) -> Self {
        Self {
            route,
            cached,
            build,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    /// Builds (or reuses, for cached routes) the view of the activation at
    /// `position`. `args` replace the activation's stored arguments only when
    /// `apply_args` is set.
    pub fn build_view(
        &self,
        nav: &NavController,
        position: usize,
        args: Option<Bundle>,
        apply_args: bool,
    ) -> View {
        (self.build)(nav, position, args, apply_args)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("route", &self.route)
            .field("cached", &self.cached)
            .finish()
    }
}
