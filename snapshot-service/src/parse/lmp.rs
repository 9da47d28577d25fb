use oasis_client::{api::FetchWindow, Field, Hub, Observation};

use super::{FeedParser, RecordError, Row, INTERVAL_START};

/// `PRC_INTVL_LMP`: one record per (interval, node, LMP component).
pub struct IntervalLmpParser;

impl FeedParser for IntervalLmpParser {
    fn required_columns(&self) -> &'static [&'static str] {
        &[INTERVAL_START, "NODE", "LMP_TYPE", "MW"]
    }

    fn parse_record(&self, row: &Row<'_>, window: &FetchWindow) -> Result<Vec<Observation>, RecordError> {
        let Some(hub) = Hub::from_node(row.require("NODE")?) else {
            return Ok(Vec::new());
        };
        // MGHG and any future component types are not part of the snapshot.
        let Some(field) = Field::from_lmp_type(row.require("LMP_TYPE")?) else {
            return Ok(Vec::new());
        };

        let value = row.f64("MW")?;
        let slots = row.slots(window)?;

        Ok(slots
            .into_iter()
            .map(|ts| Observation::price(hub, ts, field, value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{csv, window};
    use super::super::parse_feed;
    use oasis_client::{FeedKind, Field, Hub, Observation};
    use time::macros::datetime;

    const HEADER: &str = "INTERVALSTARTTIME_GMT,INTERVALENDTIME_GMT,OPR_DT,NODE,MARKET_RUN_ID,LMP_TYPE,MW\n";

    #[test]
    fn components_map_to_hub_observations() {
        let body = format!(
            "{HEADER}\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_NP15_GEN-APND,RTM,LMP,42.1\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_NP15_GEN-APND,RTM,MCC,-1.25\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_ZP26_GEN-APND,RTM,MCL,0.8\n"
        );
        let parsed = parse_feed(FeedKind::IntervalLmp, &csv(&body), &window()).unwrap();

        assert_eq!(
            parsed.observations,
            vec![
                Observation::price(Hub::Np15, datetime!(2025-03-04 09:05 UTC), Field::Lmp, 42.1),
                Observation::price(Hub::Np15, datetime!(2025-03-04 09:05 UTC), Field::Mcc, -1.25),
                Observation::price(Hub::Zp26, datetime!(2025-03-04 09:05 UTC), Field::Mcl, 0.8),
            ]
        );
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn unknown_nodes_and_component_types_are_skipped() {
        let body = format!(
            "{HEADER}\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,MGHG,0\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,DLAP_PGAE-APND,RTM,LMP,39\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,40\n"
        );
        let parsed = parse_feed(FeedKind::IntervalLmp, &csv(&body), &window()).unwrap();

        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn malformed_values_are_dropped_and_counted() {
        let body = format!(
            "{HEADER}\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,n/a\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,MCE,\n\
             not-a-time,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,MCC,1.0\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,MCL,NaN\n\
             2025-03-04T09:05:00-00:00,2025-03-04T09:10:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,40\n"
        );
        let parsed = parse_feed(FeedKind::IntervalLmp, &csv(&body), &window()).unwrap();

        assert_eq!(parsed.dropped, 4);
        assert_eq!(parsed.observations.len(), 1);
    }

    #[test]
    fn intervals_before_window_start_are_skipped() {
        let body = format!(
            "{HEADER}\
             2025-03-04T08:55:00-00:00,2025-03-04T09:00:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,38\n\
             2025-03-04T09:00:00-00:00,2025-03-04T09:05:00-00:00,2025-03-04,TH_SP15_GEN-APND,RTM,LMP,39\n"
        );
        let parsed = parse_feed(FeedKind::IntervalLmp, &csv(&body), &window()).unwrap();

        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(parsed.observations[0].ts, datetime!(2025-03-04 09:00 UTC));
        assert_eq!(parsed.skipped, 1);
    }
}
