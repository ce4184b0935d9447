//! Core types for the SfM pipeline orchestrator.
//!
//! This crate holds everything the pipeline driver needs that does not talk
//! to a stage collaborator: the closed identifier enums for features,
//! matchers, retrieval descriptors and camera models, the resolved
//! [`RunConfig`], the feature/matcher compatibility validator, the
//! deterministic artifact layout, image-set discovery, and the error
//! taxonomy.

pub mod compat;
pub mod config;
pub mod error;
pub mod ids;
pub mod images;
pub mod layout;
pub mod output;

pub use compat::validate;
pub use config::{CameraMode, ReconstructionConfig, RunConfig};
pub use error::{IncompatibleConfig, PipelineError, StageError, StageId};
pub use ids::{
    CameraModel, FeatureId, MatcherId, MatcherWeights, PairingStrategy, RetrievalId, UnknownId,
};
pub use images::ImageSet;
pub use layout::{reuse_existing, ArtifactLayout};
pub use output::{OutputConfig, OutputGuard};
