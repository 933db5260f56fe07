// 🪑 Allocator - priority method apportionment
//
// Every entity holds one seat up front. Each remaining seat goes to the
// entity whose priority (population / mean(seats, seats + 1)) is highest.
//
// Tie-break: on exactly equal priorities the lexicographically smallest
// name wins. `assign_next` and `run` apply the same rule, so a run built
// from repeated `assign_next` calls and the heap-driven `run` agree seat
// for seat.

use crate::config::{MeanMode, RunConfig};
use crate::error::{ApportionError, Result};
use crate::registry::{Entity, Registry};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

// ============================================================================
// PRIORITY FUNCTION
// ============================================================================

/// Mean of the current and next seat counts
pub fn divisor(seats: u32, mode: MeanMode) -> f64 {
    let n = f64::from(seats);
    match mode {
        // two-value geometric mean, no log/exp round trip
        MeanMode::Geometric => (n * (n + 1.0)).sqrt(),
        MeanMode::Arithmetic => n + 0.5,
    }
}

/// Value of giving `entity` its next seat (seat number `seats + 1`)
pub fn priority(entity: &Entity, mode: MeanMode) -> f64 {
    entity.population() as f64 / divisor(entity.seats(), mode)
}

// ============================================================================
// CANDIDATE ORDERING
// ============================================================================

/// One entity's claim on the next seat
#[derive(Debug, Clone)]
struct Candidate<'a> {
    priority: f64,
    name: &'a str,
    idx: usize,
}

impl Ord for Candidate<'_> {
    // Greater = wins. Higher priority first, then the smaller name.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.name.cmp(self.name))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate<'_> {}

// ============================================================================
// ALLOCATION RECORDS
// ============================================================================

/// One seat granted beyond the baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// Global seat number this grant produced (baseline seats come first)
    pub seat_number: u64,
    pub name: String,
    /// Priority value that won the seat
    pub priority: f64,
    /// Entity's seat count after the grant
    pub seats: u32,
}

/// Result of a completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Seats granted beyond what the registry held when the run started
    pub steps: u64,
    pub total_seats: u64,
    /// Priority list in grant order; only filled by `run_traced`
    pub allocations: Vec<Allocation>,
}

impl RunOutcome {
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// Grant one seat to the highest-priority entity
///
/// Priorities are recomputed from scratch on every call.
pub fn assign_next(registry: &mut Registry, mode: MeanMode) -> Result<Allocation> {
    let view: &Registry = registry;
    let winner = (0..view.len())
        .map(|idx| {
            let entity = view.entity_at(idx);
            Candidate {
                priority: priority(entity, mode),
                name: entity.name(),
                idx,
            }
        })
        .max()
        .ok_or(ApportionError::EmptyRegistry)?;

    let (idx, won_with) = (winner.idx, winner.priority);
    let seat_number = registry.total_seats() + 1;
    Ok(grant(registry, idx, won_with, seat_number))
}

fn grant(registry: &mut Registry, idx: usize, priority: f64, seat_number: u64) -> Allocation {
    let entity = registry.grant_seat_at(idx);

    debug!(
        seat = seat_number,
        entity = %entity.name(),
        priority,
        seats = entity.seats(),
        "seat assigned"
    );

    Allocation {
        seat_number,
        name: entity.name().to_string(),
        priority,
        seats: entity.seats(),
    }
}

// ============================================================================
// RUN LOOP
// ============================================================================

/// Hand out seats until the registry holds `target_total_seats`
///
/// Fails with `InvalidTarget` before touching any entity when the target is
/// below the seats already held (at least one per entity). Calling again
/// with the same target is a no-op. No priority list is kept; use
/// `run_traced` for that.
pub fn run(registry: &mut Registry, config: &RunConfig) -> Result<RunOutcome> {
    execute(registry, config, None)
}

/// Same as `run`, also recording every grant in `RunOutcome::allocations`
pub fn run_traced(registry: &mut Registry, config: &RunConfig) -> Result<RunOutcome> {
    let mut allocations = Vec::new();
    let mut outcome = execute(registry, config, Some(&mut allocations))?;
    outcome.allocations = allocations;
    Ok(outcome)
}

fn execute(
    registry: &mut Registry,
    config: &RunConfig,
    trace: Option<&mut Vec<Allocation>>,
) -> Result<RunOutcome> {
    let target = u64::from(config.target_total_seats);
    let current = registry.total_seats();

    // one seat per entity at the very least, more after an earlier run
    let minimum = current.max(registry.len() as u64);
    if target < minimum {
        return Err(ApportionError::InvalidTarget {
            target: config.target_total_seats,
            minimum,
        });
    }

    let remaining = target - current;

    info!(
        entities = registry.len(),
        target_seats = target,
        remaining,
        mean = %config.mean_mode,
        "starting apportionment"
    );

    if remaining > 0 {
        allocate(registry, config.mean_mode, current, remaining, trace)?;
    }

    let outcome = RunOutcome {
        steps: remaining,
        total_seats: registry.total_seats(),
        allocations: Vec::new(),
    };

    info!(steps = outcome.steps, total = outcome.total_seats, "apportionment complete");

    Ok(outcome)
}

/// Max-heap with one live entry per entity
///
/// Only the winner's priority changes per step, so popping it and pushing
/// its new priority keeps every heap entry current.
fn allocate(
    registry: &mut Registry,
    mode: MeanMode,
    start: u64,
    remaining: u64,
    mut trace: Option<&mut Vec<Allocation>>,
) -> Result<()> {
    if registry.is_empty() {
        return Err(ApportionError::EmptyRegistry);
    }

    // Names are owned copies so the heap doesn't borrow the registry we mutate
    let names: Vec<String> = registry.iter_entities().map(|e| e.name().to_string()).collect();

    let mut heap: BinaryHeap<Candidate> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| Candidate {
            priority: priority(registry.entity_at(idx), mode),
            name: name.as_str(),
            idx,
        })
        .collect();

    for step in 1..=remaining {
        let Some(winner) = heap.pop() else {
            return Err(ApportionError::EmptyRegistry);
        };
        let seat_number = start + step;

        match trace.as_deref_mut() {
            Some(list) => list.push(grant(registry, winner.idx, winner.priority, seat_number)),
            None => {
                let entity = registry.grant_seat_at(winner.idx);
                debug!(
                    seat = seat_number,
                    entity = %entity.name(),
                    priority = winner.priority,
                    seats = entity.seats(),
                    "seat assigned"
                );
            }
        }

        heap.push(Candidate {
            priority: priority(registry.entity_at(winner.idx), mode),
            ..winner
        });
    }

    Ok(())
}
