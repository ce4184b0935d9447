//! Feature/matcher compatibility validation.
//!
//! Certain learned feature descriptors are only numerically and
//! semantically compatible with certain matchers. The rules here are
//! whitelists: every combination they do not explicitly allow is rejected.
//! Validation is pure and runs before any filesystem or collaborator call,
//! so an incompatible configuration never starts expensive work.

use crate::config::RunConfig;
use crate::error::IncompatibleConfig;
use crate::ids::{FeatureId, MatcherId};

/// Validate the feature/matcher combination of a run configuration.
///
/// An unset feature or matcher (stage disabled) is exempt from all rules.
pub fn validate(config: &RunConfig) -> Result<(), IncompatibleConfig> {
    let (feature, matcher) = match (config.feature, config.matcher) {
        (Some(f), Some(m)) => (f, m),
        _ => return Ok(()),
    };

    let reject = |allowed: &'static str| {
        Err(IncompatibleConfig {
            feature,
            matcher,
            allowed,
        })
    };

    // r2d2 descriptors only work with the nearest-neighbor matchers.
    if feature == FeatureId::R2d2
        && !matches!(matcher, MatcherId::NnRatio | MatcherId::NnMutual)
    {
        return reject("NN-ratio, NN-mutual");
    }

    // The LightGlue and AdaLAM matchers are trained against specific
    // descriptor families.
    match matcher {
        MatcherId::SuperpointLightglue => {
            if !matches!(
                feature,
                FeatureId::SuperpointAachen | FeatureId::SuperpointMax | FeatureId::SuperpointInloc
            ) {
                return reject("superpoint_aachen, superpoint_max, superpoint_inloc");
            }
        }
        MatcherId::DiskLightglue => {
            if feature != FeatureId::Disk {
                return reject("disk");
            }
        }
        MatcherId::AlikedLightglue => {
            if feature != FeatureId::AlikedN16 {
                return reject("aliked-n16");
            }
        }
        MatcherId::Adalam => {
            if !matches!(feature, FeatureId::Sift | FeatureId::Sosnet) {
                return reject("sift, sosnet");
            }
        }
        MatcherId::Superglue
        | MatcherId::SuperglueFast
        | MatcherId::NnSuperpoint
        | MatcherId::NnRatio
        | MatcherId::NnMutual => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(feature: Option<FeatureId>, matcher: Option<MatcherId>) -> RunConfig {
        RunConfig {
            feature,
            matcher,
            ..RunConfig::default()
        }
    }

    #[test]
    fn r2d2_accepts_only_nn_matchers() {
        for matcher in MatcherId::ALL {
            let result = validate(&config(Some(FeatureId::R2d2), Some(matcher)));
            let compatible = matches!(matcher, MatcherId::NnRatio | MatcherId::NnMutual);
            assert_eq!(result.is_ok(), compatible, "r2d2 with {matcher}");
        }
    }

    #[test]
    fn superpoint_lightglue_accepts_only_superpoint_features() {
        for feature in FeatureId::ALL {
            let result = validate(&config(Some(feature), Some(MatcherId::SuperpointLightglue)));
            let compatible = matches!(
                feature,
                FeatureId::SuperpointAachen | FeatureId::SuperpointMax | FeatureId::SuperpointInloc
            );
            assert_eq!(result.is_ok(), compatible, "{feature} with superpoint+lightglue");
        }
    }

    #[test]
    fn disk_lightglue_accepts_only_disk() {
        for feature in FeatureId::ALL {
            let result = validate(&config(Some(feature), Some(MatcherId::DiskLightglue)));
            assert_eq!(result.is_ok(), feature == FeatureId::Disk, "{feature}");
        }
    }

    #[test]
    fn aliked_lightglue_accepts_only_aliked() {
        for feature in FeatureId::ALL {
            let result = validate(&config(Some(feature), Some(MatcherId::AlikedLightglue)));
            assert_eq!(result.is_ok(), feature == FeatureId::AlikedN16, "{feature}");
        }
    }

    #[test]
    fn adalam_accepts_only_sift_and_sosnet() {
        for feature in FeatureId::ALL {
            let result = validate(&config(Some(feature), Some(MatcherId::Adalam)));
            let compatible = matches!(feature, FeatureId::Sift | FeatureId::Sosnet);
            assert_eq!(result.is_ok(), compatible, "{feature}");
        }
    }

    #[test]
    fn disabled_stages_are_exempt() {
        assert!(validate(&config(Some(FeatureId::R2d2), None)).is_ok());
        assert!(validate(&config(None, Some(MatcherId::DiskLightglue))).is_ok());
        assert!(validate(&config(None, None)).is_ok());
    }

    #[test]
    fn unconstrained_matchers_accept_any_feature() {
        for feature in FeatureId::ALL {
            if feature == FeatureId::R2d2 {
                continue; // constrained from the feature side
            }
            for matcher in [
                MatcherId::Superglue,
                MatcherId::SuperglueFast,
                MatcherId::NnSuperpoint,
                MatcherId::NnRatio,
                MatcherId::NnMutual,
            ] {
                assert!(
                    validate(&config(Some(feature), Some(matcher))).is_ok(),
                    "{feature} with {matcher}"
                );
            }
        }
    }

    #[test]
    fn error_reports_offending_pair() {
        let err = validate(&config(Some(FeatureId::Disk), Some(MatcherId::SuperpointLightglue)))
            .unwrap_err();
        assert_eq!(err.feature, FeatureId::Disk);
        assert_eq!(err.matcher, MatcherId::SuperpointLightglue);
        assert_eq!(err.allowed, "superpoint_aachen, superpoint_max, superpoint_inloc");
    }
}
