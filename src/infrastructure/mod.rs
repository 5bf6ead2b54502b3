pub mod artifact_store;
pub mod js_executor;

pub use artifact_store::{ArtifactClaim, ArtifactStore};
pub use js_executor::JsExecutor;
