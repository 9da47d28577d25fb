pub mod oasis;
pub mod payload_dir;

pub use oasis::OasisFeedSource;
pub use payload_dir::PayloadDirSource;
