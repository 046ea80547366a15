use std::cell::Cell;

use web_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// CSS-style cubic bezier through (0,0), (x1,y1), (x2,y2), (1,1).
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Easing {
    pub const FAST_OUT_SLOW_IN: Easing = Easing::CubicBezier {
        x1: 0.4,
        y1: 0.0,
        x2: 0.2,
        y2: 1.0,
    };
    pub const LINEAR_OUT_SLOW_IN: Easing = Easing::CubicBezier {
        x1: 0.0,
        y1: 0.0,
        x2: 0.2,
        y2: 1.0,
    };

    pub fn interpolate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn bezier_axis(p1: f32, p2: f32, s: f32) -> f32 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    ((a * s + b) * s + c) * s
}

fn bezier_axis_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    (3.0 * a * s + 2.0 * b) * s + c
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    const EPS: f32 = 1e-5;
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    // Newton first; the x curve is monotonic for x1, x2 in [0, 1].
    let mut s = t;
    for _ in 0..8 {
        let dx = bezier_axis(x1, x2, s) - t;
        if dx.abs() < EPS {
            return bezier_axis(y1, y2, s);
        }
        let slope = bezier_axis_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= dx / slope;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = t;
    for _ in 0..32 {
        let x = bezier_axis(x1, x2, s);
        if (x - t).abs() < EPS {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    bezier_axis(y1, y2, s)
}

#[derive(Clone, Copy, Debug)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub easing: Easing,
    pub delay: Duration,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(300),
            easing: Easing::EaseInOut,
            delay: Duration::ZERO,
        }
    }
}

impl AnimationSpec {
    pub fn tween(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            delay: Duration::ZERO,
        }
    }
}

pub trait Interpolate {
    fn interpolate(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock you can drive deterministically.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, t: Instant) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorEnd {
    Completed,
    Cancelled,
}

/// Samples eased progress from 0 to 1 over `spec.duration`.
///
/// The host's frame loop calls [`ProgressAnimator::sample`]; update callbacks
/// receive the eased progress. End callbacks fire exactly once, on completion
/// or on cancel, whichever comes first.
pub struct ProgressAnimator {
    spec: AnimationSpec,
    started_at: Instant,
    updates: Vec<Box<dyn FnMut(f32)>>,
    ends: Vec<Box<dyn FnOnce(AnimatorEnd)>>,
    finished: bool,
}

impl ProgressAnimator {
    pub fn new(spec: AnimationSpec, started_at: Instant) -> Self {
        Self {
            spec,
            started_at,
            updates: Vec::new(),
            ends: Vec::new(),
            finished: false,
        }
    }

    pub fn on_update(&mut self, f: impl FnMut(f32) + 'static) {
        self.updates.push(Box::new(f));
    }

    pub fn on_end(&mut self, f: impl FnOnce(AnimatorEnd) + 'static) {
        self.ends.push(Box::new(f));
    }

    pub fn is_running(&self) -> bool {
        !self.finished
    }

    /// Linear fraction of the duration elapsed at `now`, or `None` while
    /// still inside the start delay.
    pub fn fraction_at(&self, now: Instant) -> Option<f32> {
        let elapsed = now.saturating_duration_since(self.started_at);
        if elapsed < self.spec.delay {
            return None;
        }
        let running = elapsed - self.spec.delay;
        if self.spec.duration.is_zero() || running >= self.spec.duration {
            return Some(1.0);
        }
        Some(running.as_secs_f32() / self.spec.duration.as_secs_f32())
    }

    /// Returns `true` while the animation is still running.
    pub fn sample(&mut self, now: Instant) -> bool {
        if self.finished {
            return false;
        }
        let Some(fraction) = self.fraction_at(now) else {
            return true;
        };
        let eased = self.spec.easing.interpolate(fraction);
        for update in &mut self.updates {
            update(eased);
        }
        if fraction >= 1.0 {
            self.finish(AnimatorEnd::Completed);
            return false;
        }
        true
    }

    pub fn cancel(&mut self) {
        self.finish(AnimatorEnd::Cancelled);
    }

    fn finish(&mut self, end: AnimatorEnd) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.updates.clear();
        for f in std::mem::take(&mut self.ends) {
            f(end);
        }
    }
}
