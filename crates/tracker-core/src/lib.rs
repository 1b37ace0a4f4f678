//! Row reconciliation against the tracker API.

pub mod dedup;
pub mod error;
pub mod observer;
pub mod options;
pub mod reconciler;
pub mod type_cache;
mod upsert;

pub use dedup::{DATE_FORMAT, parse_event_date, threshold_start};
pub use error::{DuplicateReason, ReconcileError, Result, RowFailure, RowStage, TypeCacheError};
pub use observer::{NoopObserver, PipelineEvent, PipelineObserver};
pub use options::{DuplicateStrategy, ReconcilerOptions};
pub use reconciler::{
    DuplicateCheck, EnrollmentOutcome, EntityResolution, RecordedEvent, Reconciler, RowOutcome,
};
pub use type_cache::TypeCache;
