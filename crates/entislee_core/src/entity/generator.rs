//! Identifier token generation.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Produces globally unique tokens for new entity IDs.
///
/// Implementations must never hand out the same token twice.
pub trait IdGenerator: Send + Sync {
    /// Returns the next unique token.
    fn next_token(&self) -> Uuid;
}

/// Random version 4 UUID tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_token(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Monotonic tokens, for reproducible tests and tooling.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose first token is `start`.
    #[must_use]
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_token(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_is_unique() {
        let ids = RandomIdGenerator;
        assert_ne!(ids.next_token(), ids.next_token());
    }

    #[test]
    fn sequential_counts_up() {
        let ids = SequentialIdGenerator::starting_at(7);
        assert_eq!(ids.next_token(), Uuid::from_u128(7));
        assert_eq!(ids.next_token(), Uuid::from_u128(8));
    }

    #[test]
    fn sequential_is_unique_across_threads() {
        let ids = std::sync::Arc::new(SequentialIdGenerator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = std::sync::Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.next_token()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
