use std::rc::Rc;

use crate::Route;

/// Decision returned by a pop handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopResult {
    /// Let the next handler (or the pop itself) proceed.
    DoNothing,
    /// Consume the pop; the stack stays as it is.
    Intercept,
    /// Pop to this route instead, bypassing further interception.
    Redirect(Route),
}

impl PopResult {
    pub fn redirect(route: impl Into<Route>) -> Self {
        PopResult::Redirect(route.into())
    }

    pub fn is_do_nothing(&self) -> bool {
        matches!(self, PopResult::DoNothing)
    }
}

/// Receives the route that would become current, `None` when popping out of
/// the navigator.
pub type PopHandler = Rc<dyn Fn(Option<&Route>) -> PopResult>;

/// Screen handler first, then the navigator-wide default; the first result
/// other than `DoNothing` wins.
pub(crate) fn resolve_pop(
    screen: Option<PopHandler>,
    fallback: Option<PopHandler>,
    target: Option<&Route>,
) -> PopResult {
    if let Some(handler) = screen {
        let result = handler(target);
        if !result.is_do_nothing() {
            return result;
        }
    }
    match fallback {
        Some(handler) => handler(target),
        None => PopResult::DoNothing,
    }
}
