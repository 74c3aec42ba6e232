//! Portfolio-level exposure ceilings applied to one timestep's batch of
//! requested sizes.
//!
//! Requests are first clipped to the per-instrument cap, then scaled by
//! `per_cluster_cap / cluster_total` when their cluster's requested total
//! exceeds the cluster cap, then by `global_cap / total` when the batch total
//! exceeds the global cap. Both totals are taken over the raw requests. The
//! two scale-downs are applied one after the other rather than solved
//! jointly, so a batch where both bind can end up tighter than strictly
//! necessary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioCaps {
    #[serde(alias = "globalCap")]
    pub global_cap: f64,
    #[serde(alias = "perInstrumentCap")]
    pub per_instrument_cap: f64,
    #[serde(alias = "perClusterCap")]
    pub per_cluster_cap: f64,
}

impl Default for PortfolioCaps {
    fn default() -> Self {
        Self {
            global_cap: 1.0,
            per_instrument_cap: 0.3,
            per_cluster_cap: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRequest {
    pub instrument: String,
    pub cluster: String,
    pub requested_size: f64,
}

impl ExposureRequest {
    pub fn new(
        instrument: impl Into<String>,
        cluster: impl Into<String>,
        requested_size: f64,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            cluster: cluster.into(),
            requested_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CappedExposure {
    pub instrument: String,
    pub cluster: String,
    pub requested_size: f64,
    pub applied_size: f64,
    pub cluster_scale: f64,
    pub global_scale: f64,
}

impl CappedExposure {
    pub fn was_scaled(&self) -> bool {
        self.cluster_scale < 1.0 || self.global_scale < 1.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureTotals {
    pub total: f64,
    pub clusters: BTreeMap<String, f64>,
}

impl ExposureTotals {
    pub fn from_requests(requests: &[ExposureRequest]) -> Self {
        let mut totals = Self::default();
        for request in requests {
            *totals.clusters.entry(request.cluster.clone()).or_insert(0.0) +=
                request.requested_size;
            totals.total += request.requested_size;
        }
        totals
    }

    pub fn cluster(&self, cluster: &str) -> f64 {
        self.clusters.get(cluster).copied().unwrap_or(0.0)
    }
}

pub fn enforce_portfolio_caps(
    requests: &[ExposureRequest],
    caps: &PortfolioCaps,
) -> Vec<CappedExposure> {
    let totals = ExposureTotals::from_requests(requests);
    let global_scale = scale_for(totals.total, caps.global_cap);

    requests
        .iter()
        .map(|request| {
            let cluster_scale = scale_for(totals.cluster(&request.cluster), caps.per_cluster_cap);
            let clipped = request.requested_size.min(caps.per_instrument_cap).max(0.0);
            let applied_size = clipped * cluster_scale * global_scale;

            CappedExposure {
                instrument: request.instrument.clone(),
                cluster: request.cluster.clone(),
                requested_size: request.requested_size,
                applied_size,
                cluster_scale,
                global_scale,
            }
        })
        .collect()
}

// Only divides once `total` is strictly above `cap`, so a zero total never
// reaches the division.
fn scale_for(total: f64, cap: f64) -> f64 {
    if total > cap {
        cap / total
    } else {
        1.0
    }
}
