use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::Dispose;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
    static NEXT_SCOPE_ID: Cell<u64> = const { Cell::new(1) };
}

/// Shared flag polled by cooperative work to notice cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    fn cancel(&self) {
        self.0.set(true);
    }
}

/// Cancellable unit of work.
///
/// A scope is live from creation until [`WorkScope::cancel`] (or the last
/// handle drops). Cancelling runs every registered cleanup once, cancels child
/// scopes first, and flips the [`CancellationToken`] seen by work launched
/// inside it. A cancelled scope never becomes live again; callers create a new
/// one instead.
#[derive(Clone)]
pub struct WorkScope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    id: u64,
    token: CancellationToken,
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<WorkScope>>,
}

impl Default for WorkScope {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkScope {
    pub fn new() -> Self {
        let id = NEXT_SCOPE_ID.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        Self {
            inner: Rc::new(ScopeInner {
                id,
                token: CancellationToken::default(),
                disposers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        !self.inner.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Runs `f` with this scope installed as the current scope.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        CURRENT_SCOPE.with(|current| {
            let prev = current.replace(Some(Rc::downgrade(&self.inner)));
            let result = f();
            *current.borrow_mut() = prev;
            result
        })
    }

    /// Registers a cleanup for cancellation. Runs immediately if the scope is
    /// already cancelled.
    pub fn on_cancel(&self, f: impl FnOnce() + 'static) {
        if self.is_active() {
            self.inner.disposers.borrow_mut().push(Box::new(f));
        } else {
            f();
        }
    }

    /// Starts `work` bound to this scope.
    ///
    /// `work` receives the scope's token and returns the teardown that stops
    /// it; that teardown runs when the scope is cancelled. Returns `None`
    /// without starting anything if the scope is no longer live.
    pub fn launch(&self, work: impl FnOnce(CancellationToken) -> Dispose) -> Option<Dispose> {
        if !self.is_active() {
            log::debug!("launch on cancelled scope {} ignored", self.id());
            return None;
        }
        let stop = self.run(|| work(self.token()));
        let on_cancel = stop.clone();
        self.on_cancel(move || on_cancel.run());
        Some(stop)
    }

    pub fn child(&self) -> WorkScope {
        let child = WorkScope::new();
        if self.is_active() {
            self.inner.children.borrow_mut().push(child.clone());
        } else {
            child.cancel();
        }
        child
    }

    pub fn cancel(&self) {
        if !self.is_active() {
            return;
        }
        self.inner.token.cancel();
        log::trace!("work scope {} cancelled", self.id());

        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        for child in children {
            child.cancel();
        }

        let disposers = std::mem::take(&mut *self.inner.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }

    pub fn ptr_eq(&self, other: &WorkScope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for WorkScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkScope")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish()
    }
}

pub fn current_scope() -> Option<WorkScope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| WorkScope { inner }))
    })
}

/// Runs `f` now and ties the returned teardown to the current scope, if any.
pub fn scoped_effect(f: impl FnOnce() -> Dispose) -> Dispose {
    let d = f();
    if let Some(scope) = current_scope() {
        let d2 = d.clone();
        scope.on_cancel(move || d2.run());
    }
    d
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.token.cancel();
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.cancel();
        }

        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }
}
