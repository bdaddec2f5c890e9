//! Generation-counted async work
//!
//! A [`Ticket`] is taken before work starts; bumping the [`Generation`]
//! (closing the viewer) turns every outstanding ticket stale, and results
//! arriving on a stale ticket come back as [`Outcome::Superseded`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Invalidate every ticket issued so far.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            generation: Arc::clone(&self.0),
            issued: self.current(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: Arc<AtomicU64>,
    issued: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Superseded,
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Superseded => None,
        }
    }
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.issued
    }

    /// Await `work`, discarding its result if the generation moved meanwhile.
    pub async fn run<F>(&self, work: F) -> Outcome<F::Output>
    where
        F: Future,
    {
        let value = work.await;
        if self.is_current() {
            Outcome::Completed(value)
        } else {
            Outcome::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_while_generation_is_unchanged() {
        let generation = Generation::new();
        let ticket = generation.ticket();
        assert_eq!(ticket.run(async { 7 }).await, Outcome::Completed(7));
    }

    #[tokio::test]
    async fn bump_supersedes_outstanding_work() {
        let generation = Generation::new();
        let ticket = generation.ticket();

        let bumper = generation.clone();
        let outcome = ticket
            .run(async move {
                bumper.bump();
                "late"
            })
            .await;

        assert_eq!(outcome, Outcome::Superseded);
        assert!(generation.ticket().is_current());
    }
}
