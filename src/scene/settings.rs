use crate::error::precondition;
use crate::{HaarLayout, Result};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::path::Path;
use std::str::FromStr;

/// Domain in which transport and lighting are expressed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(rename_all = "kebab-case")]
pub enum Basis {
    /// One term per environment texel.
    #[default]
    Pixel,
    /// Haar wavelet coefficients of the environment texels.
    Haar,
}

impl Basis {
    /// Returns the wavelet layout for `basis_count` terms, if any.
    pub fn layout(self, basis_count: usize) -> Result<Option<HaarLayout>> {
        match self {
            Self::Pixel => Ok(None),
            Self::Haar => HaarLayout::for_len(basis_count).map(Some),
        }
    }
}

impl FromStr for Basis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "pixel" => Ok(Self::Pixel),
            "haar" => Ok(Self::Haar),
            _ => Err(format!("unknown basis '{}', expected pixel or haar", s)),
        }
    }
}

/// How lighting coefficients are ordered before truncation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(rename_all = "kebab-case")]
pub enum ImportancePolicy {
    /// By signed coefficient value.
    Naive,
    /// By coefficient value times the scene's mean response to that term.
    #[default]
    Weighted,
}

impl FromStr for ImportancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "naive" => Ok(Self::Naive),
            "weighted" => Ok(Self::Weighted),
            _ => Err(format!("unknown policy '{}', expected naive or weighted", s)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
    /// Side of each environment face after downsampling.
    #[default(8)]
    pub environment_resolution: usize,
    /// Number of environment faces, six for a cubemap.
    #[default(6)]
    pub faces: usize,
    pub basis: Basis,
    pub policy: ImportancePolicy,
    #[default(64)]
    pub top_k: usize,
    #[default(1)]
    pub min_terms: usize,
    #[default([1.0; 3])]
    pub tint: [f32; 3],
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Number of basis images, one per environment texel.
    pub fn basis_count(&self) -> usize {
        self.faces * self.environment_resolution * self.environment_resolution
    }

    /// Checks the settings and returns the wavelet layout they imply.
    pub fn validate(&self) -> Result<Option<HaarLayout>> {
        let resolution = self.environment_resolution;

        if resolution == 0 || !resolution.is_power_of_two() {
            return precondition(format!(
                "environment resolution {} is not a power of two",
                resolution
            ));
        }

        if self.faces == 0 {
            return precondition("environment needs at least one face");
        }

        if self.min_terms > self.basis_count() {
            return precondition(format!(
                "min_terms {} exceeds the {} basis terms",
                self.min_terms,
                self.basis_count()
            ));
        }

        if self.tint.iter().any(|t| !t.is_finite()) {
            return precondition("environment tint must be finite");
        }

        self.basis.layout(self.basis_count())
    }

    /// Clamps a requested term count to `[min_terms, basis_count]`.
    pub fn clamp_top_k(&self, top_k: usize) -> usize {
        top_k.max(self.min_terms).min(self.basis_count())
    }
}
