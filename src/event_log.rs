//! Day-indexed queues of pending state-machine transitions.
//!
//! A log is a fixed array of buckets, one per day, sized up front to cover every day on which
//! an event can fall (the simulation length plus the infectious period plus a margin). Buckets
//! are drained when their day is processed.
use std::mem;

use crate::people::PersonId;

#[derive(Debug, Default, Clone)]
pub struct EventLog {
    days: Vec<Vec<PersonId>>,
}

impl EventLog {
    #[must_use]
    pub fn with_days(days: usize) -> EventLog {
        EventLog {
            days: vec![Vec::new(); days],
        }
    }

    /// Number of days covered.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.days.len()
    }

    /// Queues `person_id` for `day`.
    ///
    /// # Panics
    ///
    /// Panics if `day` is beyond the range the log was sized for.
    pub fn schedule(&mut self, day: usize, person_id: PersonId) {
        let capacity = self.capacity();
        let Some(bucket) = self.days.get_mut(day) else {
            panic!("cannot schedule {person_id:?} on day {day}: log covers {capacity} days");
        };
        bucket.push(person_id);
    }

    /// Events queued for `day`, in scheduling order.
    #[must_use]
    pub fn pending(&self, day: usize) -> &[PersonId] {
        self.days.get(day).map(Vec::as_slice).unwrap_or_default()
    }

    /// Removes and returns the events queued for `day`.
    pub fn take(&mut self, day: usize) -> Vec<PersonId> {
        self.days.get_mut(day).map(mem::take).unwrap_or_default()
    }
}
