use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::{Dispose, ListenerId, Listeners, Size, Transform};

pub type ViewId = u64;

thread_local! {
    static NEXT_VIEW_ID: Cell<ViewId> = const { Cell::new(1) };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachState {
    Attached,
    Detached,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutDirection {
    #[default]
    Ltr,
    Rtl,
}

pub type AttachListener = dyn Fn(&View, AttachState);

/// Opaque handle to a host view node.
///
/// Navigation only needs a small surface of the host toolkit: a parent/child
/// relation, attach/detach notifications, the node's size and a render
/// transform. Host content (a native widget, a binding) rides along in
/// `content` and is never inspected here.
#[derive(Clone)]
pub struct View(Rc<ViewInner>);

struct ViewInner {
    id: ViewId,
    label: String,
    content: Option<Rc<dyn Any>>,
    size: Cell<Size>,
    transform: Cell<Transform>,
    alpha: Cell<f32>,
    direction: Cell<LayoutDirection>,
    attached: Cell<bool>,
    parent: RefCell<Weak<ViewInner>>,
    children: RefCell<Vec<View>>,
    listeners: Listeners<AttachListener>,
    once_attach: RefCell<Vec<Box<dyn FnOnce(&View)>>>,
    once_detach: RefCell<Vec<Box<dyn FnOnce(&View)>>>,
}

impl View {
    pub fn new(label: impl Into<String>) -> Self {
        Self::build(label.into(), None)
    }

    pub fn with_content<T: Any>(label: impl Into<String>, content: T) -> Self {
        let content: Rc<dyn Any> = Rc::new(content);
        Self::build(label.into(), Some(content))
    }

    fn build(label: String, content: Option<Rc<dyn Any>>) -> Self {
        let id = NEXT_VIEW_ID.with(|n| {
            let id = n.get();
            n.set(id + 1);
            id
        });
        View(Rc::new(ViewInner {
            id,
            label,
            content,
            size: Cell::new(Size::default()),
            transform: Cell::new(Transform::identity()),
            alpha: Cell::new(1.0),
            direction: Cell::new(LayoutDirection::Ltr),
            attached: Cell::new(false),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            listeners: Listeners::new(),
            once_attach: RefCell::new(Vec::new()),
            once_detach: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> ViewId {
        self.0.id
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn content<T: Any>(&self) -> Option<Rc<T>> {
        self.0.content.clone().and_then(|c| c.downcast::<T>().ok())
    }

    pub fn ptr_eq(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn size(&self) -> Size {
        self.0.size.get()
    }

    pub fn set_size(&self, size: Size) {
        self.0.size.set(size);
    }

    pub fn width(&self) -> f32 {
        self.0.size.get().width
    }

    pub fn height(&self) -> f32 {
        self.0.size.get().height
    }

    pub fn transform(&self) -> Transform {
        self.0.transform.get()
    }

    pub fn set_transform(&self, t: Transform) {
        self.0.transform.set(t);
    }

    pub fn set_translation_x(&self, x: f32) {
        let mut t = self.0.transform.get();
        t.translate_x = x;
        self.0.transform.set(t);
    }

    pub fn translation_x(&self) -> f32 {
        self.0.transform.get().translate_x
    }

    pub fn alpha(&self) -> f32 {
        self.0.alpha.get()
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.0.alpha.set(alpha.clamp(0.0, 1.0));
    }

    pub fn layout_direction(&self) -> LayoutDirection {
        self.0.direction.get()
    }

    pub fn set_layout_direction(&self, dir: LayoutDirection) {
        self.0.direction.set(dir);
    }

    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    pub fn parent(&self) -> Option<View> {
        self.0.parent.borrow().upgrade().map(View)
    }

    pub fn is_child_of(&self, parent: &View) -> bool {
        self.parent().is_some_and(|p| p.ptr_eq(parent))
    }

    pub fn children(&self) -> Vec<View> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    /// Appends `child`, detaching it from any previous parent first.
    pub fn add_child(&self, child: &View) {
        if child.ptr_eq(self) {
            log::warn!("view {} cannot be its own child", self.id());
            return;
        }
        child.remove_from_parent();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
        if self.is_attached() {
            child.dispatch(AttachState::Attached);
        }
    }

    pub fn remove_child(&self, child: &View) -> bool {
        let removed = {
            let mut children = self.0.children.borrow_mut();
            match children.iter().position(|c| c.ptr_eq(child)) {
                Some(idx) => Some(children.remove(idx)),
                None => None,
            }
        };
        let Some(removed) = removed else {
            return false;
        };
        *removed.0.parent.borrow_mut() = Weak::new();
        if removed.is_attached() {
            removed.dispatch(AttachState::Detached);
        }
        true
    }

    /// Returns `false` if the view had no parent.
    pub fn remove_from_parent(&self) -> bool {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => false,
        }
    }

    /// Host entry point: the root of a view tree entered a window.
    pub fn attach_to_window(&self) {
        self.dispatch(AttachState::Attached);
    }

    /// Host entry point: the root of a view tree left its window.
    pub fn detach_from_window(&self) {
        self.dispatch(AttachState::Detached);
    }

    /// Runs `f` on the next attach, or right away if already attached.
    pub fn do_on_attach(&self, f: impl FnOnce(&View) + 'static) {
        if self.is_attached() {
            f(self);
        } else {
            self.0.once_attach.borrow_mut().push(Box::new(f));
        }
    }

    /// Runs `f` on the next detach.
    pub fn do_on_detach(&self, f: impl FnOnce(&View) + 'static) {
        self.0.once_detach.borrow_mut().push(Box::new(f));
    }

    pub fn add_attach_listener(&self, f: impl Fn(&View, AttachState) + 'static) -> Dispose {
        let id: ListenerId = self.0.listeners.add(Rc::new(f));
        let weak = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }

    pub fn attach_listener_count(&self) -> usize {
        self.0.listeners.len()
            + self.0.once_attach.borrow().len()
            + self.0.once_detach.borrow().len()
    }

    fn dispatch(&self, state: AttachState) {
        let attached = state == AttachState::Attached;
        if self.0.attached.get() == attached {
            return;
        }
        match state {
            AttachState::Attached => {
                self.0.attached.set(true);
                self.notify(state);
                for child in self.children() {
                    child.dispatch(state);
                }
            }
            AttachState::Detached => {
                for child in self.children() {
                    child.dispatch(state);
                }
                self.0.attached.set(false);
                self.notify(state);
            }
        }
    }

    fn notify(&self, state: AttachState) {
        for listener in self.0.listeners.snapshot() {
            listener(self, state);
        }
        let once = match state {
            AttachState::Attached => std::mem::take(&mut *self.0.once_attach.borrow_mut()),
            AttachState::Detached => std::mem::take(&mut *self.0.once_detach.borrow_mut()),
        };
        for f in once {
            f(self);
        }
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for View {}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id())
            .field("label", &self.label())
            .field("attached", &self.is_attached())
            .finish()
    }
}
