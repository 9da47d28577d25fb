use oasis_client::{api::FetchWindow, Field, Observation};

use super::{FeedParser, RecordError, Row, INTERVAL_START};

/// Series name used when a forecast record carries no trading hub.
const DEFAULT_REGION: &str = "CAISO";

/// `SLD_REN_FCST`: solar and wind forecast per trading hub and market run.
///
/// Only the real-time dispatch (`RTD`) run is kept. Records may cover a
/// coarser interval than the price grid; their value is repeated on every
/// 5-minute slot of the interval.
pub struct RenewableForecastParser;

impl FeedParser for RenewableForecastParser {
    fn required_columns(&self) -> &'static [&'static str] {
        &[INTERVAL_START, "MARKET_RUN_ID", "RENEWABLE_TYPE", "MW"]
    }

    fn parse_record(&self, row: &Row<'_>, window: &FetchWindow) -> Result<Vec<Observation>, RecordError> {
        if row.require("MARKET_RUN_ID")? != "RTD" {
            return Ok(Vec::new());
        }

        let field = match row.require("RENEWABLE_TYPE")? {
            "Solar" => Field::Solar,
            "Wind" => Field::Wind,
            _ => return Ok(Vec::new()),
        };

        let region = row.get("TRADING_HUB").unwrap_or(DEFAULT_REGION);
        let value = row.f64("MW")?;
        let slots = row.slots(window)?;

        Ok(slots
            .into_iter()
            .map(|ts| Observation::system(region, ts, field, value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{csv, window};
    use super::super::parse_feed;
    use oasis_client::{FeedKind, Field, Observation, SeriesKey};
    use time::macros::datetime;

    const HEADER: &str =
        "INTERVALSTARTTIME_GMT,INTERVALENDTIME_GMT,OPR_DT,OPR_HR,TRADING_HUB,RENEWABLE_TYPE,MARKET_RUN_ID,MW\n";

    #[test]
    fn only_real_time_dispatch_solar_and_wind_are_kept() {
        let body = format!(
            "{HEADER}\
             2025-03-04T09:00:00-00:00,2025-03-04T09:05:00-00:00,2025-03-04,2,NP15,Solar,RTD,1200.5\n\
             2025-03-04T09:00:00-00:00,2025-03-04T09:05:00-00:00,2025-03-04,2,NP15,Wind,RTD,300\n\
             2025-03-04T09:00:00-00:00,2025-03-04T10:00:00-00:00,2025-03-04,2,NP15,Solar,DAM,1100\n\
             2025-03-04T09:00:00-00:00,2025-03-04T09:05:00-00:00,2025-03-04,2,NP15,Geothermal,RTD,50\n"
        );
        let parsed = parse_feed(FeedKind::RenewableForecast, &csv(&body), &window()).unwrap();

        assert_eq!(
            parsed.observations,
            vec![
                Observation::system("NP15", datetime!(2025-03-04 09:00 UTC), Field::Solar, 1200.5),
                Observation::system("NP15", datetime!(2025-03-04 09:00 UTC), Field::Wind, 300.0),
            ]
        );
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn coarse_interval_is_held_across_window_slots() {
        // Window ends at 10:07:33, so only 09:45 .. 10:05 of this hour survive.
        let body = format!(
            "{HEADER}\
             2025-03-04T09:45:00-00:00,2025-03-04T10:45:00-00:00,2025-03-04,2,SP15,Wind,RTD,410\n"
        );
        let parsed = parse_feed(FeedKind::RenewableForecast, &csv(&body), &window()).unwrap();

        let slots: Vec<_> = parsed.observations.iter().map(|o| o.ts).collect();
        assert_eq!(
            slots,
            vec![
                datetime!(2025-03-04 09:45 UTC),
                datetime!(2025-03-04 09:50 UTC),
                datetime!(2025-03-04 09:55 UTC),
                datetime!(2025-03-04 10:00 UTC),
                datetime!(2025-03-04 10:05 UTC),
            ]
        );
        assert!(parsed.observations.iter().all(|o| o.value == 410.0));
    }

    #[test]
    fn missing_trading_hub_falls_back_to_system_series() {
        let body = "INTERVALSTARTTIME_GMT,RENEWABLE_TYPE,MARKET_RUN_ID,MW\n\
                    2025-03-04T09:10:00-00:00,Solar,RTD,900\n";
        let parsed = parse_feed(FeedKind::RenewableForecast, &csv(body), &window()).unwrap();

        assert_eq!(parsed.observations.len(), 1);
        assert_eq!(parsed.observations[0].series_key, SeriesKey::System("CAISO".to_string()));
    }
}
