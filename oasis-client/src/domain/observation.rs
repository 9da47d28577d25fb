use std::fmt;

use time::OffsetDateTime;

use super::Hub;

/// Measured quantity carried by an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Total locational marginal price.
    Lmp,
    /// Marginal congestion component.
    Mcc,
    /// Marginal energy component.
    Mce,
    /// Marginal loss component.
    Mcl,
    Solar,
    Wind,
    TotalGeneration,
    TotalLoad,
}

impl Field {
    /// Price fields are keyed by hub; everything else is a system-wide series.
    pub fn is_price(&self) -> bool {
        matches!(self, Field::Lmp | Field::Mcc | Field::Mce | Field::Mcl)
    }

    /// Maps an OASIS `LMP_TYPE` code to its price field.
    pub fn from_lmp_type(code: &str) -> Option<Field> {
        match code.trim() {
            "LMP" => Some(Field::Lmp),
            "MCC" => Some(Field::Mcc),
            "MCE" => Some(Field::Mce),
            "MCL" => Some(Field::Mcl),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::Lmp => "LMP",
            Field::Mcc => "MCC",
            Field::Mce => "MCE",
            Field::Mcl => "MCL",
            Field::Solar => "SOLAR",
            Field::Wind => "WIND",
            Field::TotalGeneration => "TOTAL_GEN",
            Field::TotalLoad => "TOTAL_LOAD",
        };
        f.write_str(s)
    }
}

/// Identity of the series an observation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    Hub(Hub),
    /// Non-hub series, e.g. a renewable forecast region or `Caiso_Totals`.
    System(String),
}


/// One normalized data point on the 5-minute grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub series_key: SeriesKey,
    pub ts: OffsetDateTime,
    pub field: Field,
    pub value: f64,
}

impl Observation {
    pub fn price(hub: Hub, ts: OffsetDateTime, field: Field, value: f64) -> Self {
        Self {
            series_key: SeriesKey::Hub(hub),
            ts,
            field,
            value,
        }
    }

    pub fn system(series: impl Into<String>, ts: OffsetDateTime, field: Field, value: f64) -> Self {
        Self {
            series_key: SeriesKey::System(series.into()),
            ts,
            field,
            value,
        }
    }
}
