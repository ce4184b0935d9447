//! Closed identifier enums for pipeline stage configurations.
//!
//! Every extractor, matcher and retrieval descriptor the orchestrator knows
//! about is a variant here. The driver and the compatibility validator
//! pattern-match these exhaustively, so adding a new backend is a compile
//! error until every consumer has decided what to do with it.
//!
//! All enums serialize to the same lowercase tokens the CLI accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown identifier token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{token}' (expected one of: {expected})")]
pub struct UnknownId {
    pub kind: &'static str,
    pub token: String,
    pub expected: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Feature extractors
// ─────────────────────────────────────────────────────────────────────────────

/// Local feature extractor configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    #[serde(rename = "superpoint_aachen")]
    SuperpointAachen,
    #[serde(rename = "superpoint_max")]
    SuperpointMax,
    #[serde(rename = "superpoint_inloc")]
    SuperpointInloc,
    #[serde(rename = "r2d2")]
    R2d2,
    #[serde(rename = "d2net-ss")]
    D2netSs,
    #[serde(rename = "sift")]
    Sift,
    #[serde(rename = "sosnet")]
    Sosnet,
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "aliked-n16")]
    AlikedN16,
}

impl FeatureId {
    pub const ALL: [FeatureId; 9] = [
        FeatureId::SuperpointAachen,
        FeatureId::SuperpointMax,
        FeatureId::SuperpointInloc,
        FeatureId::R2d2,
        FeatureId::D2netSs,
        FeatureId::Sift,
        FeatureId::Sosnet,
        FeatureId::Disk,
        FeatureId::AlikedN16,
    ];

    /// Stable token, also the extractor configuration name on the
    /// collaborator side.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureId::SuperpointAachen => "superpoint_aachen",
            FeatureId::SuperpointMax => "superpoint_max",
            FeatureId::SuperpointInloc => "superpoint_inloc",
            FeatureId::R2d2 => "r2d2",
            FeatureId::D2netSs => "d2net-ss",
            FeatureId::Sift => "sift",
            FeatureId::Sosnet => "sosnet",
            FeatureId::Disk => "disk",
            FeatureId::AlikedN16 => "aliked-n16",
        }
    }

    /// File name of the descriptor artifact produced by this extractor.
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.h5", self.as_str())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownId {
                kind: "feature extractor",
                token: s.to_string(),
                expected: "superpoint_aachen, superpoint_max, superpoint_inloc, r2d2, d2net-ss, sift, sosnet, disk, aliked-n16",
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// Global image descriptor configurations used for retrieval pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetrievalId {
    #[serde(rename = "dir")]
    Dir,
    #[serde(rename = "netvlad")]
    Netvlad,
    #[serde(rename = "openibl")]
    Openibl,
    #[serde(rename = "eigenplaces")]
    Eigenplaces,
}

impl RetrievalId {
    pub const ALL: [RetrievalId; 4] = [
        RetrievalId::Dir,
        RetrievalId::Netvlad,
        RetrievalId::Openibl,
        RetrievalId::Eigenplaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalId::Dir => "dir",
            RetrievalId::Netvlad => "netvlad",
            RetrievalId::Openibl => "openibl",
            RetrievalId::Eigenplaces => "eigenplaces",
        }
    }

    /// File name of the retrieval descriptor artifact.
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.h5", self.as_str())
    }
}

impl fmt::Display for RetrievalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownId {
                kind: "retrieval descriptor",
                token: s.to_string(),
                expected: "dir, netvlad, openibl, eigenplaces",
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matchers
// ─────────────────────────────────────────────────────────────────────────────

/// Static configuration record for a matcher backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Matcher configuration name on the collaborator side.
    pub conf_name: &'static str,
    /// Whether the backing model declares a weights option
    /// (indoor/outdoor profiles).
    pub has_weights: bool,
}

/// Feature matcher configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherId {
    #[serde(rename = "superpoint+lightglue")]
    SuperpointLightglue,
    #[serde(rename = "disk+lightglue")]
    DiskLightglue,
    #[serde(rename = "aliked+lightglue")]
    AlikedLightglue,
    #[serde(rename = "superglue")]
    Superglue,
    #[serde(rename = "superglue-fast")]
    SuperglueFast,
    #[serde(rename = "NN-superpoint")]
    NnSuperpoint,
    #[serde(rename = "NN-ratio")]
    NnRatio,
    #[serde(rename = "NN-mutual")]
    NnMutual,
    #[serde(rename = "adalam")]
    Adalam,
}

impl MatcherId {
    pub const ALL: [MatcherId; 9] = [
        MatcherId::SuperpointLightglue,
        MatcherId::DiskLightglue,
        MatcherId::AlikedLightglue,
        MatcherId::Superglue,
        MatcherId::SuperglueFast,
        MatcherId::NnSuperpoint,
        MatcherId::NnRatio,
        MatcherId::NnMutual,
        MatcherId::Adalam,
    ];

    pub fn as_str(&self) -> &'static str {
        self.config().conf_name
    }

    /// Static configuration record for this matcher.
    ///
    /// Only the SuperGlue variants take a weights profile; every other
    /// backend ships a single set of weights.
    pub fn config(&self) -> MatcherConfig {
        match self {
            MatcherId::SuperpointLightglue => MatcherConfig {
                conf_name: "superpoint+lightglue",
                has_weights: false,
            },
            MatcherId::DiskLightglue => MatcherConfig {
                conf_name: "disk+lightglue",
                has_weights: false,
            },
            MatcherId::AlikedLightglue => MatcherConfig {
                conf_name: "aliked+lightglue",
                has_weights: false,
            },
            MatcherId::Superglue => MatcherConfig {
                conf_name: "superglue",
                has_weights: true,
            },
            MatcherId::SuperglueFast => MatcherConfig {
                conf_name: "superglue-fast",
                has_weights: true,
            },
            MatcherId::NnSuperpoint => MatcherConfig {
                conf_name: "NN-superpoint",
                has_weights: false,
            },
            MatcherId::NnRatio => MatcherConfig {
                conf_name: "NN-ratio",
                has_weights: false,
            },
            MatcherId::NnMutual => MatcherConfig {
                conf_name: "NN-mutual",
                has_weights: false,
            },
            MatcherId::Adalam => MatcherConfig {
                conf_name: "adalam",
                has_weights: false,
            },
        }
    }
}

impl fmt::Display for MatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherId {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownId {
                kind: "matcher",
                token: s.to_string(),
                expected: "superpoint+lightglue, disk+lightglue, aliked+lightglue, superglue, superglue-fast, NN-superpoint, NN-ratio, NN-mutual, adalam",
            })
    }
}

/// Weight profile for matchers whose model declares a weights option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherWeights {
    #[serde(rename = "indoor")]
    Indoor,
    #[serde(rename = "outdoor")]
    Outdoor,
}

impl MatcherWeights {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherWeights::Indoor => "indoor",
            MatcherWeights::Outdoor => "outdoor",
        }
    }
}

impl fmt::Display for MatcherWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherWeights {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "indoor" => Ok(MatcherWeights::Indoor),
            "outdoor" => Ok(MatcherWeights::Outdoor),
            _ => Err(UnknownId {
                kind: "matcher weights",
                token: s.to_string(),
                expected: "indoor, outdoor",
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pairing strategy and camera model
// ─────────────────────────────────────────────────────────────────────────────

/// Strategy for selecting which image pairs are worth matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// All C(n, 2) unordered pairs.
    #[serde(rename = "exhaustive")]
    Exhaustive,
    /// Top-k nearest neighbors by global descriptor similarity.
    #[serde(rename = "retrieval")]
    Retrieval,
}

impl PairingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStrategy::Exhaustive => "exhaustive",
            PairingStrategy::Retrieval => "retrieval",
        }
    }
}

impl fmt::Display for PairingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairingStrategy {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exhaustive" => Ok(PairingStrategy::Exhaustive),
            "retrieval" => Ok(PairingStrategy::Retrieval),
            _ => Err(UnknownId {
                kind: "pairing strategy",
                token: s.to_string(),
                expected: "exhaustive, retrieval",
            }),
        }
    }
}

/// Camera model passed through to the reconstruction collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraModel {
    #[serde(rename = "SIMPLE_PINHOLE")]
    SimplePinhole,
    #[serde(rename = "PINHOLE")]
    Pinhole,
    #[serde(rename = "SIMPLE_RADIAL")]
    SimpleRadial,
    #[serde(rename = "RADIAL")]
    Radial,
    #[serde(rename = "OPENCV")]
    Opencv,
    #[serde(rename = "FISHEYE")]
    Fisheye,
}

impl CameraModel {
    pub const ALL: [CameraModel; 6] = [
        CameraModel::SimplePinhole,
        CameraModel::Pinhole,
        CameraModel::SimpleRadial,
        CameraModel::Radial,
        CameraModel::Opencv,
        CameraModel::Fisheye,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraModel::SimplePinhole => "SIMPLE_PINHOLE",
            CameraModel::Pinhole => "PINHOLE",
            CameraModel::SimpleRadial => "SIMPLE_RADIAL",
            CameraModel::Radial => "RADIAL",
            CameraModel::Opencv => "OPENCV",
            CameraModel::Fisheye => "FISHEYE",
        }
    }
}

impl fmt::Display for CameraModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraModel {
    type Err = UnknownId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownId {
                kind: "camera model",
                token: s.to_string(),
                expected: "SIMPLE_PINHOLE, PINHOLE, SIMPLE_RADIAL, RADIAL, OPENCV, FISHEYE",
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_tokens_roundtrip() {
        for id in FeatureId::ALL {
            assert_eq!(id.as_str().parse::<FeatureId>().unwrap(), id);
        }
    }

    #[test]
    fn matcher_tokens_roundtrip() {
        for id in MatcherId::ALL {
            assert_eq!(id.as_str().parse::<MatcherId>().unwrap(), id);
        }
    }

    #[test]
    fn camera_model_tokens_roundtrip() {
        for id in CameraModel::ALL {
            assert_eq!(id.as_str().parse::<CameraModel>().unwrap(), id);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "orb".parse::<FeatureId>().unwrap_err();
        assert_eq!(err.kind, "feature extractor");
        assert_eq!(err.token, "orb");
        assert!(err.to_string().contains("superpoint_aachen"));
    }

    #[test]
    fn only_superglue_variants_take_weights() {
        for id in MatcherId::ALL {
            let expected = matches!(id, MatcherId::Superglue | MatcherId::SuperglueFast);
            assert_eq!(id.config().has_weights, expected, "matcher {id}");
        }
    }

    #[test]
    fn descriptor_file_names() {
        assert_eq!(
            FeatureId::SuperpointAachen.descriptor_file_name(),
            "superpoint_aachen.h5"
        );
        assert_eq!(RetrievalId::Netvlad.descriptor_file_name(), "netvlad.h5");
    }

    #[test]
    fn serde_uses_cli_tokens() {
        let json = serde_json::to_string(&MatcherId::SuperpointLightglue).unwrap();
        assert_eq!(json, "\"superpoint+lightglue\"");
        let back: MatcherId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MatcherId::SuperpointLightglue);
    }
}
