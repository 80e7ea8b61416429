//! Conditions evaluated against polled remote state.

/// Result of evaluating a [`Condition`] against one observed state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The remote resource has converged.
    Satisfied,
    /// Not there yet; keep polling.
    Pending,
    /// The resource reached a state from which it will never converge.
    Failed(String),
}

/// Predicate over the observable state of a remote resource.
///
/// Implementations must be pure: the poller may evaluate a condition any
/// number of times and relies on the verdict depending only on `state`.
pub trait Condition<S: ?Sized> {
    /// Human readable name used in logs and diagnostics, for example
    /// `"pool fr-par/abc ready"`.
    fn describe(&self) -> String;

    /// Evaluates the condition against one observed state.
    fn evaluate(&self, state: &S) -> Verdict;
}

impl<S: ?Sized, C: Condition<S> + ?Sized> Condition<S> for &C {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn evaluate(&self, state: &S) -> Verdict {
        (**self).evaluate(state)
    }
}

/// Adapts a plain boolean closure into a [`Condition`] that never reports a
/// terminal failure.
#[derive(Clone, Debug)]
pub struct Predicate<F> {
    name: String,
    check: F,
}

impl<F> Predicate<F> {
    /// Wraps `check` under the diagnostic name `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

impl<S: ?Sized, F> Condition<S> for Predicate<F>
where
    F: Fn(&S) -> bool,
{
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn evaluate(&self, state: &S) -> Verdict {
        if (self.check)(state) {
            Verdict::Satisfied
        } else {
            Verdict::Pending
        }
    }
}
