use nicval_rss::{QueueCounts, RingReport, Verdict};
use serde::Serialize;

/// Everything one validation pass found, for humans and for machine-readable archival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub predicted: QueueCounts,
    pub observed: QueueCounts,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rings: Option<RingReport>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.verdict.passed && self.rings.as_ref().map_or(true, RingReport::passed)
    }
}
