pub mod hub;
pub mod observation;
pub mod rows;

pub use hub::Hub;
pub use observation::{Field, Observation, SeriesKey};
pub use rows::{CombinedRow, HubRow};
