use std::fmt;
use std::rc::Rc;

use backstack_core::animation::{AnimationSpec, Easing, Interpolate};
use backstack_core::{LayoutDirection, View};
use smallvec::{SmallVec, smallvec};
use web_time::Duration;

/// Transform applied to one view during a screen transition.
///
/// `progress` runs from 0 to 1 (already eased); `width` and `height` are the
/// container's size at the time of the frame.
pub trait NavAnimation {
    fn on_animate(&self, view: &View, progress: f32, width: f32, height: f32);
}

impl<F> NavAnimation for F
where
    F: Fn(&View, f32, f32, f32),
{
    fn on_animate(&self, view: &View, progress: f32, width: f32, height: f32) {
        self(view, progress, width, height)
    }
}

pub type NavAnimationRef = Rc<dyn NavAnimation>;
pub type AnimationList = SmallVec<[NavAnimationRef; 2]>;

fn direction_flag(view: &View) -> f32 {
    match view.layout_direction() {
        LayoutDirection::Ltr => 1.0,
        LayoutDirection::Rtl => -1.0,
    }
}

fn slide(from_side: f32, entering: bool) -> NavAnimationRef {
    Rc::new(move |view: &View, progress: f32, width: f32, _height: f32| {
        let distance = width * from_side * direction_flag(view);
        let (start, end) = if entering {
            (distance, 0.0)
        } else {
            (0.0, distance)
        };
        view.set_translation_x(start.interpolate(&end, progress));
    })
}

fn fade(entering: bool) -> NavAnimationRef {
    Rc::new(move |view: &View, progress: f32, _width: f32, _height: f32| {
        view.set_alpha(if entering { progress } else { 1.0 - progress });
    })
}

/// Pushed screen slides in from the trailing edge.
pub fn horizontal_enter() -> NavAnimationRef {
    slide(1.0, true)
}

/// Covered screen slides out toward the trailing edge.
pub fn horizontal_exit() -> NavAnimationRef {
    slide(1.0, false)
}

/// Revealed screen slides back in from the leading edge.
pub fn horizontal_pop_enter() -> NavAnimationRef {
    slide(-1.0, true)
}

/// Popped screen slides out toward the leading edge.
pub fn horizontal_pop_exit() -> NavAnimationRef {
    slide(-1.0, false)
}

pub fn fade_enter() -> NavAnimationRef {
    fade(true)
}

pub fn fade_exit() -> NavAnimationRef {
    fade(false)
}

/// Transition configuration of a [`crate::NavigationContainer`].
///
/// Animation is disabled when the duration is zero or any of the four lists is
/// empty.
#[derive(Clone)]
pub struct AnimationParams {
    pub duration: Duration,
    pub easing: Easing,
    pub enter: AnimationList,
    pub exit: AnimationList,
    pub pop_enter: AnimationList,
    pub pop_exit: AnimationList,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(400),
            easing: Easing::LINEAR_OUT_SLOW_IN,
            enter: smallvec![horizontal_enter(), fade_enter()],
            exit: smallvec![horizontal_exit(), fade_exit()],
            pop_enter: smallvec![horizontal_pop_enter(), fade_enter()],
            pop_exit: smallvec![horizontal_pop_exit(), fade_exit()],
        }
    }
}

impl AnimationParams {
    pub fn none() -> Self {
        Self {
            duration: Duration::ZERO,
            easing: Easing::Linear,
            enter: SmallVec::new(),
            exit: SmallVec::new(),
            pop_enter: SmallVec::new(),
            pop_exit: SmallVec::new(),
        }
    }

    pub fn builder() -> AnimationParamsBuilder {
        AnimationParamsBuilder::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.duration.is_zero()
            && !self.enter.is_empty()
            && !self.exit.is_empty()
            && !self.pop_enter.is_empty()
            && !self.pop_exit.is_empty()
    }

    pub fn spec(&self) -> AnimationSpec {
        AnimationSpec::tween(self.duration, self.easing)
    }
}

impl fmt::Debug for AnimationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationParams")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("enter", &self.enter.len())
            .field("exit", &self.exit.len())
            .field("pop_enter", &self.pop_enter.len())
            .field("pop_exit", &self.pop_exit.len())
            .finish()
    }
}

pub struct AnimationParamsBuilder {
    params: AnimationParams,
}

impl Default for AnimationParamsBuilder {
    fn default() -> Self {
        Self {
            params: AnimationParams {
                duration: Duration::from_millis(400),
                easing: Easing::LINEAR_OUT_SLOW_IN,
                ..AnimationParams::none()
            },
        }
    }
}

impl AnimationParamsBuilder {
    pub fn duration(mut self, duration: Duration) -> Self {
        self.params.duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.params.easing = easing;
        self
    }

    pub fn add_animations(
        mut self,
        enter: NavAnimationRef,
        exit: NavAnimationRef,
        pop_enter: NavAnimationRef,
        pop_exit: NavAnimationRef,
    ) -> Self {
        self.params.enter.push(enter);
        self.params.exit.push(exit);
        self.params.pop_enter.push(pop_enter);
        self.params.pop_exit.push(pop_exit);
        self
    }

    pub fn build(self) -> AnimationParams {
        self.params
    }
}
