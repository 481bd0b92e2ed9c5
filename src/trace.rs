//! Optional instrumentation of the iterative process.
//!
//! Every algorithm in this crate can record a [`Trace`]: the ordered history
//! of its internal state (one snapshot per iteration) together with
//! [`Counters`] of objective and gradient evaluations. Tracing is requested by
//! a flag on the `minimize` call; when it is disabled, no per-iteration
//! snapshot allocation happens.

use getset::CopyGetters;

/// Counters of function evaluations performed during a run.
///
/// Both counters are monotonically non-decreasing and are incremented once per
/// trial evaluation, including evaluations made by the line search on behalf
/// of the descent framework.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Counters {
    /// Number of objective evaluations.
    objective: usize,
    /// Number of gradient evaluations.
    gradient: usize,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count_objective(&mut self) {
        self.objective += 1;
    }

    pub(crate) fn count_gradient(&mut self) {
        self.gradient += 1;
    }
}

/// Recorded history of an algorithm run.
///
/// The snapshot type `S` depends on the algorithm: the current point for the
/// descent framework, the whole [`Simplex`](crate::algo::Simplex) for
/// Nelder-Mead and the whole [`Generation`](crate::population::Generation)
/// for the genetic algorithm. Snapshot ordering matches iteration order and
/// each snapshot is a complete, independently interpretable state, not a
/// diff.
#[derive(Debug, Clone)]
pub struct Trace<S> {
    snapshots: Vec<S>,
    counters: Counters,
}

impl<S> Trace<S> {
    pub(crate) fn from_parts(snapshots: Vec<S>, counters: Counters) -> Self {
        Self {
            snapshots,
            counters,
        }
    }

    /// Gets the per-iteration snapshots in iteration order.
    pub fn snapshots(&self) -> &[S] {
        &self.snapshots
    }

    /// Gets the evaluation counters of the whole run.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Gets the number of recorded iterations.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Determines whether no iteration was recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

pub(crate) fn assemble<S>(snapshots: Option<Vec<S>>, counters: Counters) -> Option<Trace<S>> {
    snapshots.map(|snapshots| Trace::from_parts(snapshots, counters))
}
