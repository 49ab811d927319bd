//! Core release engine types.

mod bucket;
mod builder;
mod evaluate;
mod gate;
mod poller;
mod release;
mod validation;

pub use bucket::{BUCKET_COUNT, bucket, salt};
pub use builder::FeatureReleaseBuilder;
pub use evaluate::{Evaluation, Reason, evaluate};
pub use gate::{ReleaseGate, feature_release, init_feature_release, init_feature_release_remote};
pub use release::{DEFAULT_POLLING_INTERVAL_SECS, FeatureRelease};
pub use validation::{DocumentValidator, SchemaValidator, Validate};
