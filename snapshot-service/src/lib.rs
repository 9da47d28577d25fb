pub mod config;
pub mod observability;
pub mod parse;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, Pipeline, RunReport};
pub use transform::{merge, Tables};
