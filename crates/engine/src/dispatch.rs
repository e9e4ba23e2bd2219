/// Result of dispatching one UI event into a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The event was applied and the phase may have changed.
    Applied,
    /// The event was invalid in the current phase, or a request was already
    /// in flight. Guarded no-op; nothing changed.
    Ignored,
    /// A call failed. The machine is back in its pre-call phase and a notice
    /// was set; the student may re-trigger the same transition.
    Failed,
    /// The session is closed (abandoned mid-flight, terminal start failure,
    /// or already ended). Nothing was committed.
    Closed,
}
