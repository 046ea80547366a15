//! Persistence of back stacks across host process death.
//!
//! A navigator registers a provider under its name; the host collects every
//! provider's bundle with [`SavedStateStore::save_all`] and hands the result
//! back to [`SavedStateStore::restored`] on the next start.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Bundle, BundleValue, NavError, Result, Route};

pub(crate) const KEY_STACK: &str = "stack";

pub type StateProvider = Box<dyn Fn() -> Bundle>;

/// Key/value persistence scope shared by the navigators of one host screen.
pub trait SavedStateRegistry {
    /// Fails with [`NavError::DuplicateNavigator`] if `name` is taken.
    fn register_provider(&self, name: &str, provider: StateProvider) -> Result<()>;

    fn unregister_provider(&self, name: &str);

    /// Hands out the restored bundle for `name` at most once.
    fn consume_restored_state(&self, name: &str) -> Option<Bundle>;
}

#[derive(Default)]
pub struct SavedStateStore {
    providers: RefCell<HashMap<String, Rc<dyn Fn() -> Bundle>>>,
    restored: RefCell<HashMap<String, Bundle>>,
}

impl SavedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the output of a previous [`SavedStateStore::save_all`].
    /// Top-level values that are not bundles are ignored.
    pub fn restored(saved: Bundle) -> Self {
        let restored = saved
            .iter()
            .filter_map(|(name, value)| match value {
                BundleValue::Bundle(b) => Some((name.to_owned(), b.clone())),
                _ => {
                    log::warn!("ignoring saved state `{name}`: not a bundle");
                    None
                }
            })
            .collect();
        Self {
            providers: RefCell::default(),
            restored: RefCell::new(restored),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let saved: Bundle = serde_json::from_str(json)?;
        Ok(Self::restored(saved))
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.borrow().contains_key(name)
    }

    /// One nested bundle per registered provider, ordered by name.
    pub fn save_all(&self) -> Bundle {
        let mut providers: Vec<_> = self
            .providers
            .borrow()
            .iter()
            .map(|(name, p)| (name.clone(), p.clone()))
            .collect();
        providers.sort_by(|a, b| a.0.cmp(&b.0));
        providers
            .into_iter()
            .map(|(name, provider)| (name, BundleValue::Bundle(provider())))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.save_all())?)
    }
}

impl SavedStateRegistry for SavedStateStore {
    fn register_provider(&self, name: &str, provider: StateProvider) -> Result<()> {
        let mut providers = self.providers.borrow_mut();
        if providers.contains_key(name) {
            return Err(NavError::DuplicateNavigator(name.to_owned()));
        }
        providers.insert(name.to_owned(), Rc::from(provider));
        Ok(())
    }

    fn unregister_provider(&self, name: &str) {
        self.providers.borrow_mut().remove(name);
    }

    fn consume_restored_state(&self, name: &str) -> Option<Bundle> {
        self.restored.borrow_mut().remove(name)
    }
}

impl std::fmt::Debug for SavedStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.providers.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("SavedStateStore")
            .field("providers", &names)
            .field("restored", &self.restored.borrow().len())
            .finish()
    }
}

pub(crate) fn args_key(route: &Route, position: usize) -> String {
    format!("{route}_{position}")
}

/// `(route, position, args)` bottom-first -> persisted bundle.
pub(crate) fn encode_stack<'a>(
    stack: impl IntoIterator<Item = (&'a Route, usize, Option<Bundle>)>,
) -> Bundle {
    let mut routes = Vec::new();
    let mut args = Vec::new();
    for (route, position, entry_args) in stack {
        routes.push(route.as_str().to_owned());
        if let Some(entry_args) = entry_args {
            args.push((args_key(route, position), BundleValue::Bundle(entry_args)));
        }
    }
    let mut bundle = Bundle::new().with(KEY_STACK, routes);
    for (key, value) in args {
        log::trace!("saving args under `{key}`");
        bundle.put(key, value);
    }
    bundle
}

/// Restored stack, bottom-first, with each activation's saved args.
pub(crate) fn decode_stack(name: &str, saved: &Bundle) -> Result<Vec<(Route, Option<Bundle>)>> {
    let malformed = |reason: &str| NavError::MalformedState {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    let routes = match saved.get(KEY_STACK) {
        Some(BundleValue::StrArray(routes)) => routes,
        Some(_) => return Err(malformed("`stack` is not a string array")),
        None => return Err(malformed("missing `stack`")),
    };
    routes
        .iter()
        .enumerate()
        .map(|(position, route)| {
            let route = Route::from(route.as_str());
            let key = args_key(&route, position);
            let args = match saved.get(&key) {
                None => None,
                Some(BundleValue::Bundle(args)) => Some(args.clone()),
                Some(_) => return Err(malformed(&format!("`{key}` is not a bundle"))),
            };
            Ok((route, args))
        })
        .collect()
}
