use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type ListenerId = u64;

/// Ordered observer registry.
///
/// Callbacks are handed out as a snapshot so a listener may add or remove
/// listeners (including itself) while being notified.
pub struct Listeners<F: ?Sized> {
    next_id: Cell<ListenerId>,
    entries: RefCell<Vec<(ListenerId, Rc<F>)>>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(1),
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> Listeners<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Rc<F>) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|(eid, _)| *eid == id) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<Rc<F>> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
