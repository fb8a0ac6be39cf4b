//! Predicted-versus-observed queue counter reconciliation.
//!
//! The tolerance policy mirrors the long-standing hardware test behaviour:
//!
//! - `slack = max(0, total_observed - total_sent)` is a single allowance for background traffic
//!   (broadcast, ICMP, ...) that the prediction does not model;
//! - queue 0 passes iff `observed >= predicted` (it absorbs any unhashed extra traffic);
//! - every other queue passes iff `predicted <= observed <= predicted + slack`.
//!
//! The slack is global and applied to every queue alike; it is not attributed to any queue.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::counts::QueueCounts;
use crate::predict::DEFAULT_QUEUE;
use crate::QueueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViolationKind {
    /// Fewer packets than predicted reached the queue.
    BelowPredicted,
    /// More packets reached the queue than the background-traffic slack can explain.
    AboveSlack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    pub queue: QueueId,
    pub predicted: u64,
    pub observed: u64,
    pub kind: ViolationKind,
}

/// Outcome of one reconciliation. Lists every violating queue, in ascending queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Verdict {
    pub passed: bool,
    pub total_sent: u64,
    pub total_observed: u64,
    pub slack: u64,
    pub violations: Vec<Violation>,
}

impl Verdict {
    /// `Ok(self)` when every queue passed, otherwise the violations as an error value.
    pub fn into_result(self) -> Result<Verdict, ReconciliationFailure> {
        if self.passed {
            Ok(self)
        } else {
            Err(ReconciliationFailure {
                slack: self.slack,
                violations: self.violations,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} queue(s) outside tolerance (slack {slack}): {}", .violations.len(), describe(.violations))]
pub struct ReconciliationFailure {
    pub slack: u64,
    pub violations: Vec<Violation>,
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("q{} predicted {} observed {}", v.queue, v.predicted, v.observed))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies the tolerance policy. Queues marked "don't care" are skipped by the per-queue checks
/// but their traffic still counts towards `total_observed`.
#[derive(Debug, Clone, Default)]
pub struct CounterReconciler {
    ignored: BTreeSet<QueueId>,
}

impl CounterReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignoring(mut self, queues: impl IntoIterator<Item = QueueId>) -> Self {
        self.ignored.extend(queues);
        self
    }

    pub fn reconcile(
        &self,
        predicted: &QueueCounts,
        observed: &QueueCounts,
        total_sent: u64,
    ) -> Verdict {
        let total_observed = observed.total();
        let slack = total_observed.saturating_sub(total_sent);

        let queues: BTreeSet<QueueId> = predicted
            .queues()
            .chain(observed.queues())
            .chain([DEFAULT_QUEUE])
            .filter(|queue| !self.ignored.contains(queue))
            .collect();

        let mut violations = Vec::new();
        for queue in queues {
            let want = predicted.get(queue);
            let got = observed.get(queue);
            let kind = if got < want {
                Some(ViolationKind::BelowPredicted)
            } else if queue != DEFAULT_QUEUE && got > want.saturating_add(slack) {
                Some(ViolationKind::AboveSlack)
            } else {
                None
            };
            if let Some(kind) = kind {
                tracing::warn!(
                    queue,
                    predicted = want,
                    observed = got,
                    slack,
                    ?kind,
                    "queue counter mismatch"
                );
                violations.push(Violation {
                    queue,
                    predicted: want,
                    observed: got,
                    kind,
                });
            }
        }

        let passed = violations.is_empty();
        if passed {
            tracing::info!(total_sent, total_observed, slack, "queue counters reconciled");
        }
        Verdict {
            passed,
            total_sent,
            total_observed,
            slack,
            violations,
        }
    }
}

/// [`CounterReconciler::reconcile`] without any ignored queues.
pub fn reconcile(predicted: &QueueCounts, observed: &QueueCounts, total_sent: u64) -> Verdict {
    CounterReconciler::new().reconcile(predicted, observed, total_sent)
}
