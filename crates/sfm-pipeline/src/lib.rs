//! Pipeline driver and stage collaborator interfaces.
//!
//! The driver runs the stages of a structure-from-motion pipeline in
//! dependency order: feature extraction, image pairing, feature matching,
//! reconstruction, and bundle adjustment. Each stage is an external
//! collaborator behind a narrow trait; the driver only sequences them,
//! resolves artifact locations, decides per artifact whether to reuse a
//! cached file, and propagates the first failure.
//!
//! Exhaustive pairing is cheap enough to be implemented natively
//! ([`ExhaustivePairing`]); everything else ships as a subprocess-backed
//! collaborator in [`hloc`].

pub mod driver;
pub mod exhaustive;
pub mod hloc;
pub mod stage;

pub use driver::{DriverState, PipelineDriver, RunReport};
pub use exhaustive::ExhaustivePairing;
pub use stage::{
    BundleAdjustRequest, Collaborators, ExtractionRequest, FeatureExtraction, Matching,
    MatchingRequest, Pairing, PairingRequest, Reconstruction, ReconstructionRequest, StdioPolicy,
};
