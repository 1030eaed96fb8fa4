use std::sync::{Arc, Mutex, PoisonError};

pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot "host is ready" notification. Implementations invoke each
/// registered callback at most once and may never invoke it at all.
pub trait ActivationGate {
    fn on_ready(&self, callback: ReadyCallback);
}

enum GateState {
    Waiting(Vec<ReadyCallback>),
    Ready,
}

/// In-process gate fed by whatever detects readiness (a form submission, a
/// host event). Cloning shares the same signal.
#[derive(Clone)]
pub struct ReadinessSignal {
    state: Arc<Mutex<GateState>>,
}

impl Default for ReadinessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessSignal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::Waiting(Vec::new()))),
        }
    }

    /// Fires the signal. Returns false if it had already fired; repeated
    /// calls never re-run callbacks.
    pub fn signal(&self) -> bool {
        let pending = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *state, GateState::Ready) {
                GateState::Waiting(callbacks) => callbacks,
                GateState::Ready => return false,
            }
        };

        // Callbacks run outside the lock so they may register further callbacks.
        for callback in pending {
            callback();
        }
        true
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            GateState::Ready
        )
    }
}

impl ActivationGate for ReadinessSignal {
    fn on_ready(&self, callback: ReadyCallback) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let GateState::Waiting(callbacks) = &mut *state {
            callbacks.push(callback);
            return;
        }
        drop(state);
        callback();
    }
}

impl std::fmt::Debug for ReadinessSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessSignal")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, ReadyCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_callback_fires_once_on_signal() {
        let gate = ReadinessSignal::new();
        let (count, callback) = counter();
        gate.on_ready(callback);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(gate.signal());
        assert!(!gate.signal());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(gate.is_ready());
    }

    #[test]
    fn test_late_registration_runs_immediately() {
        let gate = ReadinessSignal::new();
        gate.signal();
        let (count, callback) = counter();
        gate.on_ready(callback);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_never_signalled_gate_never_fires() {
        let gate = ReadinessSignal::new();
        let (count, callback) = counter();
        gate.on_ready(callback);
        assert!(!gate.is_ready());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
