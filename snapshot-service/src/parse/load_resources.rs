use oasis_client::{api::FetchWindow, Field, Observation};

use super::{FeedParser, RecordError, Row, INTERVAL_START};

const TOTALS_ZONE: &str = "Caiso_Totals";

/// `ENE_SLRS`: system load and resource schedules per TAC zone.
///
/// Only the `Caiso_Totals` zone is used. The `Generation` schedule becomes
/// total generation and `Load` becomes total load; export/import schedules
/// are skipped. Payloads without a `SCHEDULE` column are read as generation.
pub struct LoadResourcesParser;

impl FeedParser for LoadResourcesParser {
    fn required_columns(&self) -> &'static [&'static str] {
        &[INTERVAL_START, "TAC_ZONE_NAME", "MW"]
    }

    fn parse_record(&self, row: &Row<'_>, window: &FetchWindow) -> Result<Vec<Observation>, RecordError> {
        if row.require("TAC_ZONE_NAME")? != TOTALS_ZONE {
            return Ok(Vec::new());
        }
        if row.get("SLRS_TYPE").is_some_and(|t| t != "ALL") {
            return Ok(Vec::new());
        }

        let field = match row.get("SCHEDULE").unwrap_or("Generation") {
            "Generation" => Field::TotalGeneration,
            "Load" => Field::TotalLoad,
            _ => return Ok(Vec::new()),
        };

        let value = row.f64("MW")?;
        let slots = row.slots(window)?;

        Ok(slots
            .into_iter()
            .map(|ts| Observation::system(TOTALS_ZONE, ts, field, value))
            .collect())
    }
}
