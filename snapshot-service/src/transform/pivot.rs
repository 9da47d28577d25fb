use std::collections::BTreeMap;

use oasis_client::{api::floor_to_slot, Field, Hub, HubRow, Observation, SeriesKey};
use time::OffsetDateTime;

use super::MergeError;

/// Price observations pivoted into one [`HubRow`] per (timestamp, hub).
///
/// The key order is the detail table's presentation order.
#[derive(Debug, Default)]
pub struct PricePivot {
    rows: BTreeMap<(OffsetDateTime, Hub), HubRow>,
}

impl PricePivot {
    /// Later observations for the same slot overwrite earlier ones.
    pub fn insert(&mut self, obs: Observation) -> Result<(), MergeError> {
        let ts = floor_to_slot(obs.ts);
        let hub = match obs.series_key {
            SeriesKey::Hub(hub) => hub,
            SeriesKey::System(series) => {
                return Err(MergeError::Inconsistent {
                    series,
                    field: obs.field,
                    ts,
                    reason: "price field on a non-hub series",
                })
            }
        };

        let row = self
            .rows
            .entry((ts, hub))
            .or_insert_with(|| HubRow::empty(ts, hub));

        let slot = match obs.field {
            Field::Lmp => &mut row.lmp_total,
            Field::Mcc => &mut row.congestion,
            Field::Mce => &mut row.energy,
            Field::Mcl => &mut row.loss,
            field => {
                return Err(MergeError::Inconsistent {
                    series: hub.to_string(),
                    field,
                    ts,
                    reason: "generation field routed to the price pivot",
                })
            }
        };
        *slot = Some(obs.value);
        Ok(())
    }

    /// Rows sorted by timestamp, then hub.
    pub fn into_rows(self) -> Vec<HubRow> {
        self.rows.into_values().collect()
    }
}

/// System-wide generation values for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRow {
    pub ts: OffsetDateTime,
    pub solar: Option<f64>,
    pub wind: Option<f64>,
    pub total_generation: Option<f64>,
    pub total_load: Option<f64>,
}

impl GenerationRow {
    fn empty(ts: OffsetDateTime) -> Self {
        Self {
            ts,
            solar: None,
            wind: None,
            total_generation: None,
            total_load: None,
        }
    }
}

/// Generation observations, resolved per (slot, field, series) and summed
/// across series into system totals.
#[derive(Debug, Default)]
pub struct GenerationPivot {
    latest: BTreeMap<(OffsetDateTime, Field, String), f64>,
}

impl GenerationPivot {
    /// Later observations for the same (slot, field, series) overwrite earlier ones.
    pub fn insert(&mut self, obs: Observation) -> Result<(), MergeError> {
        let ts = floor_to_slot(obs.ts);
        let series = match obs.series_key {
            SeriesKey::System(series) => series,
            SeriesKey::Hub(hub) => {
                return Err(MergeError::Inconsistent {
                    series: hub.to_string(),
                    field: obs.field,
                    ts,
                    reason: "generation field on a hub series",
                })
            }
        };
        if obs.field.is_price() {
            return Err(MergeError::Inconsistent {
                series,
                field: obs.field,
                ts,
                reason: "price field routed to the generation pivot",
            });
        }

        self.latest.insert((ts, obs.field, series), obs.value);
        Ok(())
    }

    /// One row per slot, sorted by timestamp.
    pub fn into_rows(self) -> Vec<GenerationRow> {
        let mut rows: BTreeMap<OffsetDateTime, GenerationRow> = BTreeMap::new();

        for ((ts, field, _series), value) in self.latest {
            let row = rows.entry(ts).or_insert_with(|| GenerationRow::empty(ts));
            let slot = match field {
                Field::Solar => &mut row.solar,
                Field::Wind => &mut row.wind,
                Field::TotalGeneration => &mut row.total_generation,
                Field::TotalLoad => &mut row.total_load,
                // rejected on insert
                Field::Lmp | Field::Mcc | Field::Mce | Field::Mcl => continue,
            };
            *slot = Some(slot.unwrap_or(0.0) + value);
        }

        rows.into_values().collect()
    }
}
