/// Busy flag plus request generations for user-triggered async actions
///
/// `start()` refuses while an action is already running, so a double click
/// cannot submit twice. The returned ticket clears the busy flag when dropped,
/// whichever way the action ends. `supersede()` moves the generation on;
/// results carried by an older ticket are then stale and should be discarded.
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Inner {
    busy: Cell<bool>,
    generation: Cell<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Rc<Inner>,
}

impl PartialEq for InFlight {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl InFlight {
    pub fn new() -> InFlight {
        InFlight::default()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.get()
    }

    /// `None` while another action holds the flag
    pub fn start(&self) -> Option<RequestTicket> {
        if self.inner.busy.replace(true) {
            return None;
        }

        let generation = self.inner.generation.get() + 1;
        self.inner.generation.set(generation);

        Some(RequestTicket {
            inner: Rc::clone(&self.inner),
            generation,
        })
    }

    /// Invalidate whatever is in flight (logout, view change, refresh)
    pub fn supersede(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.busy.set(false);
    }
}

#[derive(Debug)]
pub struct RequestTicket {
    inner: Rc<Inner>,
    generation: u64,
}

impl RequestTicket {
    /// False once a newer action started or the tracker was superseded
    pub fn is_current(&self) -> bool {
        self.inner.generation.get() == self.generation
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        // A superseded ticket must not release a newer action's flag
        if self.is_current() {
            self.inner.busy.set(false);
        }
    }
}

/// Generation counter without a busy flag, for loads that may legitimately
/// overlap (a refresh requested while the previous one is still running)
#[derive(Debug, Clone, Default)]
pub struct Generations {
    current: Rc<Cell<u64>>,
}

impl Generations {
    pub fn new() -> Generations {
        Generations::default()
    }

    pub fn next(&self) -> u64 {
        let next = self.current.get() + 1;
        self.current.set(next);
        next
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current.get() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_start_is_refused_while_busy() {
        let in_flight = InFlight::new();

        let ticket = in_flight.start();
        assert!(ticket.is_some());
        assert!(in_flight.is_busy());
        assert!(in_flight.start().is_none());
    }

    #[test]
    fn test_drop_releases_on_every_exit_path() {
        let in_flight = InFlight::new();

        let failing_action = || -> Result<(), String> {
            let _ticket = in_flight.start().ok_or("busy")?;
            Err("network down".to_string())
        };

        assert!(failing_action().is_err());
        assert!(!in_flight.is_busy());
        assert!(in_flight.start().is_some());
    }

    #[test]
    fn test_supersede_makes_ticket_stale() {
        let in_flight = InFlight::new();
        let stale = in_flight.start().unwrap();

        in_flight.supersede();

        assert!(!stale.is_current());
        assert!(!in_flight.is_busy());

        let fresh = in_flight.start().unwrap();
        drop(stale);

        // The stale ticket going away leaves the newer action busy
        assert!(in_flight.is_busy());
        assert!(fresh.is_current());
    }

    #[test]
    fn test_generations() {
        let generations = Generations::new();

        let first = generations.next();
        let second = generations.next();

        assert!(!generations.is_current(first));
        assert!(generations.is_current(second));
    }
}
