use std::cell::RefCell;
use std::rc::Rc;

use backstack_core::animation::{Clock, ProgressAnimator, SystemClock};
use backstack_core::{Transform, View};

use crate::animation::AnimationParams;

/// Host view that shows the navigator's front screen.
///
/// `set_view` swaps the shown view at once; `animate_change_view` transitions
/// from the current view to `view`, `forward` selecting push or pop
/// animations.
pub trait ViewContainer {
    fn container(&self) -> &View;

    fn current_view(&self) -> Option<View>;

    fn set_view(&self, view: View);

    fn animate_change_view(&self, view: View, forward: bool);

    /// Removes every shown view and stops any transition.
    fn clear(&self);

    fn is_animating(&self) -> bool {
        false
    }
}

/// Default [`ViewContainer`] driving transitions from the host's frame loop.
///
/// The host calls [`NavigationContainer::on_frame`] once per frame while
/// [`ViewContainer::is_animating`] is true. During a transition both the
/// outgoing and the incoming view are children of the container root.
pub struct NavigationContainer {
    root: View,
    current: RefCell<Option<View>>,
    params: RefCell<AnimationParams>,
    clock: Rc<dyn Clock>,
    animator: RefCell<Option<ProgressAnimator>>,
}

impl NavigationContainer {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_clock(label, Rc::new(SystemClock))
    }

    pub fn with_clock(label: impl Into<String>, clock: Rc<dyn Clock>) -> Self {
        Self {
            root: View::new(label),
            current: RefCell::new(None),
            params: RefCell::new(AnimationParams::default()),
            clock,
            animator: RefCell::new(None),
        }
    }

    pub fn with_animation_params(self, params: AnimationParams) -> Self {
        *self.params.borrow_mut() = params;
        self
    }

    pub fn set_animation_params(&self, params: AnimationParams) {
        *self.params.borrow_mut() = params;
    }

    pub fn animation_params(&self) -> AnimationParams {
        self.params.borrow().clone()
    }

    /// Advances the running transition. Returns `true` while one is still in
    /// flight.
    pub fn on_frame(&self) -> bool {
        let taken = self.animator.borrow_mut().take();
        let Some(mut animator) = taken else {
            return false;
        };
        if !animator.sample(self.clock.now()) {
            return self.is_animating();
        }
        let mut slot = self.animator.borrow_mut();
        if slot.is_none() {
            *slot = Some(animator);
        } else {
            drop(slot);
            animator.cancel();
        }
        true
    }

    fn cancel_transition(&self) {
        let running = self.animator.borrow_mut().take();
        if let Some(mut animator) = running {
            animator.cancel();
        }
    }

    fn change_view(&self, view: View, direction: Option<bool>) {
        self.cancel_transition();

        let old = self
            .current
            .borrow_mut()
            .take()
            .filter(|old| !old.ptr_eq(&view));
        let params = self.params.borrow().clone();

        let (old, forward) = match (old, direction) {
            (Some(old), Some(forward)) if params.is_enabled() => (old, forward),
            (old, _) => {
                if let Some(old) = old {
                    self.root.remove_child(&old);
                    reset(&old);
                }
                reset(&view);
                *self.current.borrow_mut() = Some(view.clone());
                self.root.add_child(&view);
                return;
            }
        };

        let (enter, exit) = if forward {
            (params.enter.clone(), params.exit.clone())
        } else {
            (params.pop_enter.clone(), params.pop_exit.clone())
        };

        let now = self.clock.now();
        let mut animator = ProgressAnimator::new(params.spec(), now);
        {
            let root = self.root.clone();
            let incoming = view.clone();
            let outgoing = old.clone();
            animator.on_update(move |progress| {
                let (width, height) = (root.width(), root.height());
                for anim in &enter {
                    anim.on_animate(&incoming, progress, width, height);
                }
                for anim in &exit {
                    anim.on_animate(&outgoing, progress, width, height);
                }
            });
        }
        {
            let root = self.root.clone();
            let incoming = view.clone();
            animator.on_end(move |end| {
                if old.is_child_of(&root) {
                    root.remove_child(&old);
                }
                reset(&old);
                reset(&incoming);
                log::trace!("transition to {} ended: {end:?}", incoming.label());
            });
        }

        *self.current.borrow_mut() = Some(view.clone());
        self.root.add_child(&view);
        if animator.sample(now) {
            *self.animator.borrow_mut() = Some(animator);
        }
    }
}

fn reset(view: &View) {
    view.set_transform(Transform::identity());
    view.set_alpha(1.0);
}

impl ViewContainer for NavigationContainer {
    fn container(&self) -> &View {
        &self.root
    }

    fn current_view(&self) -> Option<View> {
        self.current.borrow().clone()
    }

    fn set_view(&self, view: View) {
        self.change_view(view, None);
    }

    fn animate_change_view(&self, view: View, forward: bool) {
        self.change_view(view, Some(forward));
    }

    fn clear(&self) {
        self.cancel_transition();
        self.current.borrow_mut().take();
        for child in self.root.children() {
            self.root.remove_child(&child);
        }
    }

    fn is_animating(&self) -> bool {
        self.animator
            .borrow()
            .as_ref()
            .is_some_and(|a| a.is_running())
    }
}

impl std::fmt::Debug for NavigationContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationContainer")
            .field("root", &self.root)
            .field("current", &self.current.borrow())
            .field("animating", &self.is_animating())
            .finish()
    }
}
