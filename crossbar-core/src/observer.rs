/// A hook into a pulse loop: sees each event `E` and may answer with a
/// control action `A`.
///
/// The programming engine calls `observe` once per iteration. Returning
/// `None` keeps the loop running; returning `Some(action)` asks the engine
/// to act, for example by ending the current device's loop early. This is
/// how callers watch or cut short a long run without the engine growing
/// per-caller API surface.
///
/// Any `FnMut(&E) -> Option<A>` closure is an observer, and `()` is the
/// observer that never intervenes.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// Observer that ignores every event.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
