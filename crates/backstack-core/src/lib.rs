//! # Host primitives for stack navigation
//!
//! `backstack-core` is the small substrate the navigator in
//! `backstack-navigation` is written against. It makes no assumption about the
//! host toolkit beyond what is listed here:
//!
//! - [`View`]: an opaque, cloneable handle to a host view node with
//!   parent/child links, attach/detach notifications, size and a render
//!   [`Transform`].
//! - [`WorkScope`]: a cancellable unit of work. Cleanups registered with
//!   [`WorkScope::on_cancel`] or started with [`WorkScope::launch`] run once
//!   when the scope is cancelled.
//! - [`Dispose`]: run-once teardown guard returned by every subscription.
//! - [`Listeners`]: ordered observer registry.
//! - [`animation`]: easing curves, a pluggable [`animation::Clock`] and the
//!   frame-sampled [`animation::ProgressAnimator`].
//!
//! ## Work scopes
//!
//! ```rust
//! use backstack_core::*;
//!
//! let scope = WorkScope::new();
//! let stop = scope.launch(|token| {
//!     // cooperative work polls `token.is_cancelled()`
//!     Dispose::new(move || assert!(token.is_cancelled()))
//! });
//! assert!(stop.is_some());
//! scope.cancel();
//! assert!(!scope.is_active());
//! ```
//!
//! ## Views
//!
//! ```rust
//! use backstack_core::*;
//!
//! let root = View::new("root");
//! let child = View::new("child");
//! root.add_child(&child);
//! child.do_on_attach(|v| log::info!("{} attached", v.label()));
//! root.attach_to_window();
//! assert!(child.is_attached());
//! ```

pub mod animation;
pub mod dispose;
pub mod geometry;
pub mod listeners;
pub mod prelude;
pub mod scope;
pub mod view;

pub use dispose::*;
pub use geometry::*;
pub use listeners::*;
pub use scope::*;
pub use view::*;
