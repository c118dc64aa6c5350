//! Recording of state-change notifications.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tactus_core::{Clock, GestureRecognizer, GestureState, ManualClock, StateListener};

/// One notification observed by a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Name the recognizer was registered under.
    pub gesture: String,
    /// State reported.
    pub state: GestureState,
    /// Logical time of the notification.
    pub at: Duration,
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms {} -> {:?}", self.at.as_millis(), self.gesture, self.state)
    }
}

/// Shared, append-only log of state changes across recognizers.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Rc<RefCell<Vec<StateChange>>>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that appends every notification of one recognizer under
    /// `name`, stamped with `clock`.
    pub fn listener(&self, name: impl Into<String>, clock: ManualClock) -> StateListener {
        let name = name.into();
        let entries = Rc::clone(&self.entries);
        Box::new(move |recognizer: &GestureRecognizer| {
            entries.borrow_mut().push(StateChange {
                gesture: name.clone(),
                state: recognizer.state(),
                at: clock.now(),
            });
        })
    }

    /// Every recorded change in order.
    pub fn entries(&self) -> Vec<StateChange> {
        self.entries.borrow().clone()
    }

    /// States reported by `gesture`, in order.
    pub fn states_of(&self, gesture: &str) -> Vec<GestureState> {
        self.entries
            .borrow()
            .iter()
            .filter(|change| change.gesture == gesture)
            .map(|change| change.state)
            .collect()
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in self.entries.borrow().iter() {
            writeln!(f, "{change}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_records_per_gesture() {
        let transcript = Transcript::new();
        let clock = ManualClock::new();
        let mut tap = transcript.listener("tap", clock.clone());
        let mut pan = transcript.listener("pan", clock.clone());

        let recognizer = GestureRecognizer::tap();
        tap(&recognizer);
        clock.advance_ms(20);
        pan(&recognizer);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.states_of("tap"), vec![GestureState::Possible]);
        assert_eq!(transcript.entries()[1].at, Duration::from_millis(20));
        assert!(transcript.states_of("swipe").is_empty());
    }

    #[test]
    fn test_transcript_display_and_clear() {
        let transcript = Transcript::new();
        let mut listener = transcript.listener("pan", ManualClock::new());
        listener(&GestureRecognizer::pan());
        assert!(transcript.to_string().contains("pan -> Possible"));

        transcript.clear();
        assert!(transcript.is_empty());
    }
}
