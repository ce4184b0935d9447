//! Deterministic artifact locations.
//!
//! Every stage's output lives at a path derived only from the run root and
//! the run configuration, so two runs with identical config and root
//! resolve to identical paths. That determinism is what makes the
//! reuse-or-recompute policy safe.
//!
//! Layout, rooted at the image directory's parent:
//!
//! ```text
//! <root>/hloc/<feature_id>.h5      descriptors
//! <root>/hloc/<retrieval_id>.h5    retrieval descriptors
//! <root>/hloc/pairs.txt            pair list
//! <root>/hloc/matches.h5           matches
//! <root>/sparse/                   sparse model (reconstruction output)
//! ```
//!
//! The sparse model lives in a sibling directory of the 2D-artifact
//! subtree so model files never collide with the descriptor/match caches.

use crate::config::RunConfig;
use crate::ids::PairingStrategy;
use std::path::{Path, PathBuf};

/// Name of the 2D-artifact subdirectory.
pub const WORK_DIR_NAME: &str = "hloc";
/// Name of the sparse-model output subdirectory.
pub const SFM_DIR_NAME: &str = "sparse";
/// Fixed name of the pairs file inside the work directory.
pub const PAIRS_FILE_NAME: &str = "pairs.txt";
/// Fixed name of the matches file inside the work directory.
pub const MATCHES_FILE_NAME: &str = "matches.h5";

/// Resolved artifact locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Directory holding descriptors, pairs and matches.
    pub work_dir: PathBuf,
    /// Descriptor file, named after the active feature id. `None` when
    /// feature extraction is disabled.
    pub descriptors: Option<PathBuf>,
    /// Retrieval descriptor file, fixed-named per retrieval method. `None`
    /// unless the pairing strategy is retrieval.
    pub retrieval_descriptors: Option<PathBuf>,
    /// Pair list.
    pub pairs: PathBuf,
    /// Match file.
    pub matches: PathBuf,
    /// Sparse-model output directory.
    pub sfm_dir: PathBuf,
}

impl ArtifactLayout {
    /// Compute the layout for `config` under `root` (the image directory's
    /// parent). Pure; creates nothing on disk.
    pub fn resolve(root: &Path, config: &RunConfig) -> Self {
        let work_dir = root.join(WORK_DIR_NAME);
        let descriptors = config
            .feature
            .map(|f| work_dir.join(f.descriptor_file_name()));
        let retrieval_descriptors = match config.pairing {
            Some(PairingStrategy::Retrieval) => {
                Some(work_dir.join(config.retrieval.descriptor_file_name()))
            }
            _ => None,
        };
        Self {
            pairs: work_dir.join(PAIRS_FILE_NAME),
            matches: work_dir.join(MATCHES_FILE_NAME),
            sfm_dir: root.join(SFM_DIR_NAME),
            descriptors,
            retrieval_descriptors,
            work_dir,
        }
    }
}

/// Per-artifact reuse decision.
///
/// With `overwrite = false`, an existing artifact is reused and the owning
/// stage skipped for it; with `overwrite = true`, the stage always
/// recomputes. Applied independently per artifact, never globally per run,
/// so a user can regenerate matches while keeping descriptors.
pub fn reuse_existing(path: &Path, overwrite: bool) -> bool {
    !overwrite && path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FeatureId, RetrievalId};

    #[test]
    fn resolve_is_deterministic() {
        let config = RunConfig::default();
        let a = ArtifactLayout::resolve(Path::new("/data/scene"), &config);
        let b = ArtifactLayout::resolve(Path::new("/data/scene"), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn descriptor_path_follows_feature_id() {
        let config = RunConfig {
            feature: Some(FeatureId::Disk),
            ..RunConfig::default()
        };
        let layout = ArtifactLayout::resolve(Path::new("/data/scene"), &config);
        assert_eq!(
            layout.descriptors.unwrap(),
            Path::new("/data/scene/hloc/disk.h5")
        );
    }

    #[test]
    fn retrieval_descriptors_only_for_retrieval_pairing() {
        let retrieval = RunConfig {
            retrieval: RetrievalId::Eigenplaces,
            ..RunConfig::default()
        };
        let layout = ArtifactLayout::resolve(Path::new("/r"), &retrieval);
        assert_eq!(
            layout.retrieval_descriptors.unwrap(),
            Path::new("/r/hloc/eigenplaces.h5")
        );

        let exhaustive = RunConfig {
            pairing: Some(PairingStrategy::Exhaustive),
            ..RunConfig::default()
        };
        let layout = ArtifactLayout::resolve(Path::new("/r"), &exhaustive);
        assert_eq!(layout.retrieval_descriptors, None);

        let disabled = RunConfig {
            pairing: None,
            ..RunConfig::default()
        };
        let layout = ArtifactLayout::resolve(Path::new("/r"), &disabled);
        assert_eq!(layout.retrieval_descriptors, None);
    }

    #[test]
    fn sfm_dir_is_a_sibling_of_the_work_dir() {
        let layout = ArtifactLayout::resolve(Path::new("/r"), &RunConfig::default());
        assert_eq!(layout.work_dir, Path::new("/r/hloc"));
        assert_eq!(layout.sfm_dir, Path::new("/r/sparse"));
        assert_eq!(layout.pairs, Path::new("/r/hloc/pairs.txt"));
        assert_eq!(layout.matches, Path::new("/r/hloc/matches.h5"));
    }

    #[test]
    fn no_descriptor_path_without_feature() {
        let config = RunConfig {
            feature: None,
            ..RunConfig::default()
        };
        let layout = ArtifactLayout::resolve(Path::new("/r"), &config);
        assert_eq!(layout.descriptors, None);
    }

    #[test]
    fn reuse_requires_existing_file_and_no_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.h5");
        std::fs::write(&existing, b"x").unwrap();
        let missing = dir.path().join("b.h5");

        assert!(reuse_existing(&existing, false));
        assert!(!reuse_existing(&existing, true));
        assert!(!reuse_existing(&missing, false));
        assert!(!reuse_existing(&missing, true));
    }
}
