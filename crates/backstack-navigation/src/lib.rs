//! # Routed view navigation
//!
//! A [`ViewNavigator`] keeps a back stack of named routes and shows the front
//! one in a [`ViewContainer`]. Screens are registered once while the
//! navigator is built and materialized lazily per activation, that is per
//! `(route, position)` pair on the stack.
//!
//! ```rust
//! use backstack_core::View;
//! use backstack_navigation::*;
//!
//! let nav = ViewNavigator::builder("main", "home")
//!     .build(|scope| {
//!         scope.nav_view("home", true, ViewHooks::new(), |_, _| View::new("home"));
//!         scope.nav_view("detail", false, ViewHooks::new(), |_, entry| {
//!             let id = entry.with_args(|a| a.and_then(|a| a.get_int("id")));
//!             View::new(format!("detail {id:?}"))
//!         });
//!     })
//!     .unwrap();
//!
//! let controller = nav.controller();
//! controller
//!     .navigate_to("detail", Some(Bundle::new().with("id", 7_i64)))
//!     .unwrap();
//! assert_eq!(nav.view_stack_size(), 2);
//! assert!(controller.pop(false).unwrap());
//! assert_eq!(nav.current_route().unwrap(), "home");
//! ```
//!
//! ## Pop interception
//!
//! The screen in front may answer a pop with [`PopResult::Intercept`] (keep
//! the stack) or [`PopResult::Redirect`] (pop to another route instead). A
//! navigator-wide default handler is asked when the screen does nothing.
//!
//! ## Work scopes
//!
//! Every activation owns a [`backstack_core::WorkScope`], live while its view
//! is attached and cancelled on detach. Revisiting a cached screen starts a
//! fresh scope.
//!
//! ## Saved state
//!
//! With a [`SavedStateRegistry`] the stack (routes bottom first plus each
//! activation's arguments) survives host process death; see
//! [`SavedStateStore`].

pub mod animation;
pub mod bundle;
pub mod container;
pub mod controller;
pub mod entry;
pub mod error;
pub(crate) mod navigator;
pub mod pop;
pub mod registry;
pub mod route;
pub mod saved_state;
pub mod tests;

pub use animation::{AnimationParams, AnimationParamsBuilder, NavAnimation};
pub use bundle::{Bundle, BundleValue};
pub use container::{NavigationContainer, ViewContainer};
pub use controller::NavController;
pub use entry::{EntryKey, EntryStore, StackEntry};
pub use error::{NavError, Result};
pub use navigator::{ViewNavigator, ViewNavigatorBuilder};
pub use pop::{PopHandler, PopResult};
pub use registry::{NavigatorScope, ViewBinding, ViewController, ViewHooks};
pub use route::{Route, RouteEntry};
pub use saved_state::{SavedStateRegistry, SavedStateStore, StateProvider};
