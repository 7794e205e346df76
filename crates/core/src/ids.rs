//! Identifier generation for master-data records.
//!
//! All CRUD tables share one injected [`IdGenerator`] so new records never
//! depend on the length of a particular collection.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    Sequential,
    Uuid,
}

impl IdStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Uuid => "uuid",
        }
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> EntityId;
}

/// Monotonic numeric identifiers.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self { next: AtomicU64::new(first) }
    }

    /// Continues after the largest numeric id in `existing`; non-numeric ids are ignored.
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a EntityId>) -> Self {
        let mut taken = existing
            .into_iter()
            .filter_map(|id| id.0.parse::<u64>().ok())
            .collect::<Vec<_>>();
        taken.sort_unstable();
        taken.dedup();

        let first = match taken.last() {
            None => 1,
            Some(&max) => max.checked_add(1).unwrap_or_else(|| lowest_free(&taken)),
        };
        Self::starting_at(first)
    }
}

/// Smallest positive value missing from the sorted, deduplicated `taken`.
fn lowest_free(taken: &[u64]) -> u64 {
    let mut candidate = 1;
    for &value in taken {
        if value > candidate {
            break;
        }
        if value == candidate {
            candidate += 1;
        }
    }
    candidate
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> EntityId {
        EntityId(self.next.fetch_add(1, Ordering::Relaxed).to_string())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> EntityId {
        EntityId(Uuid::new_v4().to_string())
    }
}

pub fn generator_for<'a>(
    strategy: IdStrategy,
    existing: impl IntoIterator<Item = &'a EntityId>,
) -> Arc<dyn IdGenerator> {
    match strategy {
        IdStrategy::Sequential => Arc::new(SequentialIdGenerator::after(existing)),
        IdStrategy::Uuid => Arc::new(UuidIdGenerator),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{generator_for, EntityId, IdGenerator, IdStrategy, SequentialIdGenerator};

    #[test]
    fn saturated_seed_falls_back_to_lowest_free_id() {
        let seeded = [EntityId::new("1"), EntityId::new("2"), EntityId::new(u64::MAX.to_string())];
        let generator = SequentialIdGenerator::after(seeded.iter());

        assert_eq!(generator.next_id(), EntityId::new("3"));
    }

    #[test]
    fn sequential_generator_continues_after_seeded_ids() {
        let seeded = [EntityId::new("3"), EntityId::new("12"), EntityId::new("BANK-X")];
        let generator = SequentialIdGenerator::after(seeded.iter());

        assert_eq!(generator.next_id(), EntityId::new("13"));
        assert_eq!(generator.next_id(), EntityId::new("14"));
    }

    #[test]
    fn sequential_generator_starts_at_one_without_numeric_ids() {
        let generator = SequentialIdGenerator::after(std::iter::empty());
        assert_eq!(generator.next_id().as_str(), "1");
    }

    #[test]
    fn uuid_strategy_produces_distinct_ids() {
        let generator = generator_for(IdStrategy::Uuid, std::iter::empty());
        let ids = (0..32).map(|_| generator.next_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 32);
    }
}
