pub use crate::animation::{
    AnimationSpec, AnimatorEnd, Clock, Easing, Interpolate, ManualClock, ProgressAnimator,
    SystemClock,
};
pub use crate::dispose::Dispose;
pub use crate::geometry::{Size, Transform};
pub use crate::listeners::{ListenerId, Listeners};
pub use crate::scope::{CancellationToken, WorkScope, current_scope, scoped_effect};
pub use crate::view::{AttachState, LayoutDirection, View, ViewId};
