//! Advisory cancellation signal with one-shot listener registration.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Listener = Box<dyn FnOnce() + Send>;

/// Handle returned by [`CancelSignal::listen`] for deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

#[derive(Default)]
struct SignalState {
    triggered: bool,
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// One-way cancellation primitive.
///
/// Once triggered it never resets; every registered listener fires at most
/// once. Cancellation is advisory — it flows caller to transport, never the
/// reverse.
#[derive(Clone, Default)]
pub struct CancelSignal {
    state: Arc<Mutex<SignalState>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().triggered
    }

    /// Trigger the signal and drain all listeners. Idempotent.
    pub fn cancel(&self) {
        let drained = {
            let mut state = self.state.lock();
            if state.triggered {
                return;
            }
            state.triggered = true;
            std::mem::take(&mut state.listeners)
        };
        for (_, listener) in drained {
            listener();
        }
    }

    /// Register a one-shot listener. Fires immediately when the signal has
    /// already been triggered.
    pub fn listen(&self, listener: impl FnOnce() + Send + 'static) -> ListenerId {
        let mut state = self.state.lock();
        if state.triggered {
            drop(state);
            listener();
            return ListenerId(0);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.listeners.push((id, Box::new(listener)));
        ListenerId(id)
    }

    /// Remove a listener that has not fired yet.
    pub fn unlisten(&self, id: ListenerId) {
        self.state
            .lock()
            .listeners
            .retain(|(listener_id, _)| *listener_id != id.0);
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("triggered", &self.is_cancelled())
            .finish()
    }
}
