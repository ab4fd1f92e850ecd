use serde::Serialize;

use super::domain::ReviewStatus;

/// Per-status candidate counts for a single job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub total: usize,
    pub pending: usize,
    pub viewed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub contacted: usize,
}

impl PipelineStats {
    /// Full recount over a snapshot of statuses.
    pub fn recount<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ReviewStatus>,
    {
        statuses
            .into_iter()
            .fold(Self::default(), |mut stats, status| {
                stats.record(status);
                stats
            })
    }

    pub fn count(&self, status: ReviewStatus) -> usize {
        match status {
            ReviewStatus::Pending => self.pending,
            ReviewStatus::Viewed => self.viewed,
            ReviewStatus::Accepted => self.accepted,
            ReviewStatus::Rejected => self.rejected,
            ReviewStatus::Contacted => self.contacted,
        }
    }

    /// Sum of per-status counts equals the total.
    pub fn is_balanced(&self) -> bool {
        ReviewStatus::ALL
            .into_iter()
            .map(|status| self.count(status))
            .sum::<usize>()
            == self.total
    }

    pub(crate) fn record(&mut self, status: ReviewStatus) {
        self.total += 1;
        *self.slot(status) += 1;
    }

    pub(crate) fn shift(&mut self, from: ReviewStatus, to: ReviewStatus) {
        let source = self.slot(from);
        *source = source.saturating_sub(1);
        *self.slot(to) += 1;
    }

    fn slot(&mut self, status: ReviewStatus) -> &mut usize {
        match status {
            ReviewStatus::Pending => &mut self.pending,
            ReviewStatus::Viewed => &mut self.viewed,
            ReviewStatus::Accepted => &mut self.accepted,
            ReviewStatus::Rejected => &mut self.rejected,
            ReviewStatus::Contacted => &mut self.contacted,
        }
    }
}
