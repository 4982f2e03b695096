//! Swap request statistics

use crate::{DateRange, SwapRequest, SwapStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts over a set of swap requests created within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SwapStatistics {
    pub total: u64,
    /// Count per status; every status is present, zero included.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub by_status: BTreeMap<SwapStatus, u64>,
    pub pending: u64,
    pub validated: u64,
    /// validated / (total - pending), as a percentage rounded to one decimal.
    pub acceptance_rate: f64,
    pub period: String,
    pub range: DateRange,
}

impl SwapStatistics {
    /// Count the requests whose creation day falls in `range`.
    pub fn compute<'a>(requests: impl IntoIterator<Item = &'a SwapRequest>, range: DateRange) -> Self {
        let mut by_status: BTreeMap<SwapStatus, u64> =
            SwapStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let mut total = 0u64;

        for request in requests {
            if !range.contains(request.created_at) {
                continue;
            }
            total += 1;
            *by_status.entry(request.status).or_insert(0) += 1;
        }

        let pending = by_status.get(&SwapStatus::Pending).copied().unwrap_or(0);
        let validated = by_status
            .get(&SwapStatus::SupervisorValidated)
            .copied()
            .unwrap_or(0);

        Self {
            total,
            by_status,
            pending,
            validated,
            acceptance_rate: acceptance_rate(validated, total - pending),
            period: range.label(),
            range,
        }
    }

    pub fn count(&self, status: SwapStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

fn acceptance_rate(validated: u64, answered: u64) -> f64 {
    if answered == 0 {
        return 0.0;
    }
    let rate = validated as f64 / answered as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}
