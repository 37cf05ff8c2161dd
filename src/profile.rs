//! # Scoring Profile
//!
//! Every constant of the risk heuristic as a named, overridable
//! configuration value, so operators can retune sensitivity without code
//! changes.
//!
//! - Loads from TOML (`config/scoring.toml` by default).
//! - `SCORING_PROFILE_PATH` overrides the location.
//! - Missing file or missing fields fall back to the documented defaults.
//! - Values are validated on load: unit-interval fields are clamped and
//!   tier thresholds must be strictly ordered.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_PROFILE_PATH: &str = "config/scoring.toml";
pub const ENV_PROFILE_PATH: &str = "SCORING_PROFILE_PATH";

/// Which scorer implementation the service runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    Heuristic,
    Logistic,
}

/// Weights, thresholds, and priors for the risk heuristic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringProfile {
    /// Prior zombie likelihood absent any signal.
    #[serde(default = "default_base_rate")]
    pub base_rate: f32,
    #[serde(default = "default_stopped_penalty")]
    pub stopped_penalty: f32,
    #[serde(default = "default_missing_owner_tag_penalty")]
    pub missing_owner_tag_penalty: f32,
    #[serde(default = "default_missing_environment_tag_penalty")]
    pub missing_environment_tag_penalty: f32,
    #[serde(default = "default_missing_name_tag_penalty")]
    pub missing_name_tag_penalty: f32,
    /// Resources older than this many days pick up the age penalty.
    #[serde(default = "default_age_threshold_days")]
    pub age_threshold_days: i64,
    #[serde(default = "default_age_penalty")]
    pub age_penalty: f32,
    /// Multiplier for `instance_size_score`.
    #[serde(default = "default_size_weight")]
    pub size_weight: f32,
    /// The size term earns a reason line once its contribution exceeds this.
    #[serde(default = "default_size_reason_min")]
    pub size_reason_min: f32,
    /// Multiplier for `region_zombie_rate`.
    #[serde(default = "default_region_weight")]
    pub region_weight: f32,
    #[serde(default = "default_region_reason_min")]
    pub region_reason_min: f32,
    /// Tier boundaries, lower edge inclusive.
    #[serde(default = "default_tier_high")]
    pub tier_high: f32,
    #[serde(default = "default_tier_medium")]
    pub tier_medium: f32,
    #[serde(default = "default_tier_low")]
    pub tier_low: f32,
    /// Running resources at or above this probability are reported at-risk.
    #[serde(default = "default_at_risk_min")]
    pub at_risk_min: f32,
    /// Region zombie-rate prior used when a region has no history.
    #[serde(default = "default_region_prior")]
    pub region_prior: f32,
    /// Scorer selection: the heuristic, or a coefficient-file model.
    #[serde(default = "default_scorer")]
    pub scorer: ScorerKind,
    /// Coefficient file for the logistic scorer.
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

fn default_base_rate() -> f32 {
    0.05
}
fn default_stopped_penalty() -> f32 {
    0.60
}
fn default_missing_owner_tag_penalty() -> f32 {
    0.15
}
fn default_missing_environment_tag_penalty() -> f32 {
    0.10
}
fn default_missing_name_tag_penalty() -> f32 {
    0.10
}
fn default_age_threshold_days() -> i64 {
    90
}
fn default_age_penalty() -> f32 {
    0.20
}
fn default_size_weight() -> f32 {
    0.20
}
fn default_size_reason_min() -> f32 {
    0.10
}
fn default_region_weight() -> f32 {
    0.15
}
fn default_region_reason_min() -> f32 {
    0.05
}
fn default_tier_high() -> f32 {
    0.70
}
fn default_tier_medium() -> f32 {
    0.40
}
fn default_tier_low() -> f32 {
    0.20
}
fn default_at_risk_min() -> f32 {
    0.50
}
fn default_region_prior() -> f32 {
    0.15
}
fn default_scorer() -> ScorerKind {
    ScorerKind::Heuristic
}
fn default_model_path() -> String {
    "config/model.json".to_string()
}

impl Default for ScoringProfile {
    fn default() -> Self {
        // An empty TOML document deserializes to all defaults.
        toml::from_str("").expect("defaults deserialize")
    }
}

impl ScoringProfile {
    /// Load from a TOML file; falls back to defaults on a missing or
    /// unreadable file (logged), matching how the service must stay up
    /// with a sane profile even when the config volume is absent.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(s) => match Self::from_toml_str(&s) {
                Ok(p) => p,
                Err(e) => {
                    warn!(path = %path.as_ref().display(), error = %e, "invalid scoring profile, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "scoring profile not readable, using defaults");
                Self::default()
            }
        }
    }

    /// Load using `SCORING_PROFILE_PATH` or the default location.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_PROFILE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROFILE_PATH));
        Self::load_from_file(path)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let profile: ScoringProfile = toml::from_str(s)?;
        Ok(profile.validated())
    }

    /// Force fields into their documented domain. Tier thresholds that are
    /// not strictly ordered revert to defaults rather than producing a
    /// tier function with unreachable bands.
    pub fn validated(mut self) -> Self {
        for (name, v) in [
            ("base_rate", &mut self.base_rate),
            ("stopped_penalty", &mut self.stopped_penalty),
            ("missing_owner_tag_penalty", &mut self.missing_owner_tag_penalty),
            (
                "missing_environment_tag_penalty",
                &mut self.missing_environment_tag_penalty,
            ),
            ("missing_name_tag_penalty", &mut self.missing_name_tag_penalty),
            ("age_penalty", &mut self.age_penalty),
            ("size_weight", &mut self.size_weight),
            ("size_reason_min", &mut self.size_reason_min),
            ("region_weight", &mut self.region_weight),
            ("region_reason_min", &mut self.region_reason_min),
            ("tier_high", &mut self.tier_high),
            ("tier_medium", &mut self.tier_medium),
            ("tier_low", &mut self.tier_low),
            ("at_risk_min", &mut self.at_risk_min),
            ("region_prior", &mut self.region_prior),
        ] {
            if !v.is_finite() || *v < 0.0 || *v > 1.0 {
                let fixed = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
                warn!(field = name, value = *v, clamped = fixed, "profile value out of range");
                *v = fixed;
            }
        }
        if self.age_threshold_days < 0 {
            warn!(value = self.age_threshold_days, "negative age_threshold_days reset to default");
            self.age_threshold_days = default_age_threshold_days();
        }
        if !(self.tier_low < self.tier_medium && self.tier_medium < self.tier_high) {
            warn!(
                high = self.tier_high,
                medium = self.tier_medium,
                low = self.tier_low,
                "tier thresholds not strictly ordered, reverting to defaults"
            );
            self.tier_high = default_tier_high();
            self.tier_medium = default_tier_medium();
            self.tier_low = default_tier_low();
        }
        self
    }
}
