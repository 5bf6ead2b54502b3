pub mod loaders;
pub mod paper;

pub use loaders::{load_urls, parse_urls};
pub use paper::{ArtifactKind, PaperId};
