//! Alignment and merge of the three feeds onto the 5-minute grid.

mod pivot;

use std::{cmp::Ordering, collections::BTreeMap};

use oasis_client::{CombinedRow, Field, HubRow, Observation};
use time::OffsetDateTime;

pub use pivot::{GenerationPivot, GenerationRow, PricePivot};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MergeError {
    #[error("inconsistent observation {field} for series '{series}' at {ts}: {reason}")]
    Inconsistent {
        series: String,
        field: Field,
        ts: OffsetDateTime,
        reason: &'static str,
    },
}

/// The two output tables of a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    /// One row per (timestamp, hub), sorted by timestamp then hub.
    pub detail: Vec<HubRow>,
    /// One row per timestamp seen in any feed, sorted by timestamp.
    pub combined: Vec<CombinedRow>,
}

/// Builds both tables from the union of all feeds' observations.
///
/// An empty input yields empty tables.
pub fn merge<I>(observations: I) -> Result<Tables, MergeError>
where
    I: IntoIterator<Item = Observation>,
{
    let mut prices = PricePivot::default();
    let mut generation = GenerationPivot::default();

    for obs in observations {
        if obs.field.is_price() {
            prices.insert(obs)?;
        } else {
            generation.insert(obs)?;
        }
    }

    let detail = prices.into_rows();
    let averages = hub_averages(&detail);
    let combined = outer_join(averages, generation.into_rows());

    Ok(Tables { detail, combined })
}

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

/// Hub-averaged prices for one slot.
#[derive(Debug, Clone, PartialEq)]
struct PriceMean {
    ts: OffsetDateTime,
    lmp_total: Option<f64>,
    congestion: Option<f64>,
    energy: Option<f64>,
    loss: Option<f64>,
}

/// Mean of each component over the hubs that reported it.
fn hub_averages(detail: &[HubRow]) -> Vec<PriceMean> {
    let mut by_ts: BTreeMap<OffsetDateTime, [Mean; 4]> = BTreeMap::new();

    for row in detail {
        let means = by_ts.entry(row.ts).or_default();
        means[0].push(row.lmp_total);
        means[1].push(row.congestion);
        means[2].push(row.energy);
        means[3].push(row.loss);
    }

    by_ts
        .into_iter()
        .map(|(ts, [lmp, mcc, mce, mcl])| PriceMean {
            ts,
            lmp_total: lmp.value(),
            congestion: mcc.value(),
            energy: mce.value(),
            loss: mcl.value(),
        })
        .collect()
}

/// Full outer join of two timestamp-sorted sequences.
fn outer_join(prices: Vec<PriceMean>, generation: Vec<GenerationRow>) -> Vec<CombinedRow> {
    let mut out = Vec::with_capacity(prices.len().max(generation.len()));
    let mut prices = prices.into_iter().peekable();
    let mut generation = generation.into_iter().peekable();

    loop {
        let order = match (prices.peek(), generation.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(p), Some(g)) => p.ts.cmp(&g.ts),
        };

        let (p, g) = match order {
            Ordering::Less => (prices.next(), None),
            Ordering::Greater => (None, generation.next()),
            Ordering::Equal => (prices.next(), generation.next()),
        };
        if let Some(row) = combine(p, g) {
            out.push(row);
        }
    }

    out
}

fn combine(price: Option<PriceMean>, generation: Option<GenerationRow>) -> Option<CombinedRow> {
    let ts = price.as_ref().map(|p| p.ts).or(generation.as_ref().map(|g| g.ts))?;

    let (lmp_total, congestion, energy, loss) = match price {
        Some(p) => (p.lmp_total, p.congestion, p.energy, p.loss),
        None => (None, None, None, None),
    };
    let (solar, wind, total_generation, total_load) = match generation {
        Some(g) => (g.solar, g.wind, g.total_generation, g.total_load),
        None => (None, None, None, None),
    };

    let renewables_total = solar.zip(wind).map(|(s, w)| s + w);
    let thermal_and_other = total_generation
        .zip(renewables_total)
        .map(|(total, renewables)| total - renewables);

    Some(CombinedRow {
        ts,
        lmp_total,
        congestion,
        energy,
        loss,
        solar,
        wind,
        total_generation,
        renewables_total,
        thermal_and_other,
        total_load,
    })
}
