use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tracing::debug;

/// Work a session can be asked to do in response to an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Rebuild frozen placements, then gate and validate.
    Refresh,
    /// Gate and validate only.
    Regate,
}

#[derive(Debug, Default)]
struct Queue {
    in_flight: bool,
    pending: VecDeque<Trigger>,
}

/// Cloneable posting end of a [`Dispatcher`], for UI callbacks.
#[derive(Clone, Debug, Default)]
pub struct TriggerHandle(Rc<RefCell<Queue>>);

impl TriggerHandle {
    /// Queues `trigger`. Returns false when it was dropped because a pass
    /// is running, or coalesced with an identical queued trigger.
    pub fn post(&self, trigger: Trigger) -> bool {
        let mut queue = self.0.borrow_mut();
        if queue.in_flight {
            debug!(?trigger, "pass in flight, dropping trigger");
            return false;
        }
        if queue.pending.contains(&trigger) {
            debug!(?trigger, "trigger already queued");
            return false;
        }
        queue.pending.push_back(trigger);
        true
    }

    pub fn pending(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn in_flight(&self) -> bool {
        self.0.borrow().in_flight
    }
}

/// Serialises passes: at most one runs at a time, queued triggers run one
/// after another.
#[derive(Clone, Debug, Default)]
pub struct Dispatcher {
    queue: TriggerHandle,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> TriggerHandle {
        self.queue.clone()
    }

    pub fn post(&self, trigger: Trigger) -> bool {
        self.queue.post(trigger)
    }

    /// Runs every queued trigger through `run`. Returns the number of passes
    /// run; zero when called from inside a pass.
    pub fn drain(&self, mut run: impl FnMut(Trigger)) -> usize {
        let mut passes = 0;
        loop {
            let next = {
                let mut queue = self.queue.0.borrow_mut();
                if queue.in_flight {
                    return passes;
                }
                let Some(trigger) = queue.pending.pop_front() else {
                    return passes;
                };
                queue.in_flight = true;
                trigger
            };
            run(next);
            self.queue.0.borrow_mut().in_flight = false;
            passes += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identical_triggers_coalesce() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.post(Trigger::Refresh));
        assert!(!dispatcher.post(Trigger::Refresh));
        assert!(dispatcher.post(Trigger::Regate));
        let mut seen = Vec::new();
        assert_eq!(dispatcher.drain(|t| seen.push(t)), 2);
        assert_eq!(seen, vec![Trigger::Refresh, Trigger::Regate]);
        assert_eq!(dispatcher.handle().pending(), 0);
    }

    #[test]
    fn triggers_posted_during_a_pass_are_dropped() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.handle();
        dispatcher.post(Trigger::Refresh);
        let mut accepted = Vec::new();
        let passes = dispatcher.drain(|_| {
            assert!(handle.in_flight());
            accepted.push(handle.post(Trigger::Regate));
        });
        assert_eq!(passes, 1);
        assert_eq!(accepted, vec![false]);
        assert!(!handle.in_flight());
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn nested_drain_runs_nothing() {
        let dispatcher = Dispatcher::new();
        let inner = dispatcher.clone();
        dispatcher.post(Trigger::Refresh);
        let mut nested = None;
        dispatcher.drain(|_| nested = Some(inner.drain(|_| {})));
        assert_eq!(nested, Some(0));
    }
}
