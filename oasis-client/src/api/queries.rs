use std::fmt;

use crate::domain::Hub;

use super::FetchWindow;

/// The three OASIS reports combined in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// `PRC_INTVL_LMP`: real-time 5-minute LMP and its components per node.
    IntervalLmp,
    /// `SLD_REN_FCST`: solar and wind forecast per trading hub.
    RenewableForecast,
    /// `ENE_SLRS`: system load and resource schedules.
    LoadResources,
}

impl FeedKind {
    pub fn query_name(&self) -> &'static str {
        match self {
            FeedKind::IntervalLmp => "PRC_INTVL_LMP",
            FeedKind::RenewableForecast => "SLD_REN_FCST",
            FeedKind::LoadResources => "ENE_SLRS",
        }
    }

    fn market_run_id(&self) -> Option<&'static str> {
        match self {
            FeedKind::IntervalLmp | FeedKind::LoadResources => Some("RTM"),
            // RTD is selected client-side; the report rejects a market filter.
            FeedKind::RenewableForecast => None,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_name())
    }
}

/// Query string for one `SingleZip` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub kind: FeedKind,
    pub params: Vec<(&'static str, String)>,
}

impl FeedQuery {
    pub fn for_feed(kind: FeedKind, window: &FetchWindow) -> Self {
        let mut params = vec![
            ("queryname", kind.query_name().to_string()),
            ("startdatetime", window.oasis_start()),
            ("enddatetime", window.oasis_end()),
            ("version", "1".to_string()),
        ];

        if let Some(run) = kind.market_run_id() {
            params.push(("market_run_id", run.to_string()));
        }

        if kind == FeedKind::IntervalLmp {
            let nodes: Vec<&str> = Hub::ALL.iter().map(|h| h.node()).collect();
            params.push(("node", nodes.join(",")));
        }

        // 6 = zipped CSV
        params.push(("resultformat", "6".to_string()));

        Self { kind, params }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}
