use time::OffsetDateTime;

use super::Hub;

/// One row of the per-hub detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct HubRow {
    pub ts: OffsetDateTime,
    pub hub: Hub,
    pub lmp_total: Option<f64>,
    pub congestion: Option<f64>,
    pub energy: Option<f64>,
    pub loss: Option<f64>,
}

impl HubRow {
    pub fn empty(ts: OffsetDateTime, hub: Hub) -> Self {
        Self {
            ts,
            hub,
            lmp_total: None,
            congestion: None,
            energy: None,
            loss: None,
        }
    }
}

/// One row of the hub-averaged price + generation table.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub ts: OffsetDateTime,
    pub lmp_total: Option<f64>,
    pub congestion: Option<f64>,
    pub energy: Option<f64>,
    pub loss: Option<f64>,
    pub solar: Option<f64>,
    pub wind: Option<f64>,
    pub total_generation: Option<f64>,
    pub renewables_total: Option<f64>,
    /// Total generation minus renewables. Negative values are kept as-is.
    pub thermal_and_other: Option<f64>,
    /// System load; carried for reporting, not part of the CSV layout.
    pub total_load: Option<f64>,
}
