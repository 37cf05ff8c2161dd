//! # Scorer Strategy
//! The seam where a trained classifier can replace the heuristic without
//! touching the input/output contract: both implement `Scorer`, selection
//! happens in configuration, and the orchestrator owns the instance
//! (no ambient global model state).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::assessment::{compose_summary, tier_for, Reason, ReasonKind, RiskAssessment, RiskTier};
use crate::engine;
use crate::features::ResourceFeatures;
use crate::profile::{ScorerKind, ScoringProfile};

/// Anything that turns features into an assessment.
pub trait Scorer: Send + Sync {
    fn assess(&self, features: &ResourceFeatures) -> RiskAssessment;
    fn name(&self) -> &'static str;
}

/// The default rule-based scorer; thin wrapper over `engine::assess`.
pub struct HeuristicScorer {
    profile: ScoringProfile,
}

impl HeuristicScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }
}

impl Scorer for HeuristicScorer {
    fn assess(&self, features: &ResourceFeatures) -> RiskAssessment {
        engine::assess(features, &self.profile)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Coefficients for the logistic scorer, one weight per input signal.
/// Tag signals are encoded as "missing" indicators so that positive
/// weights mean elevated risk, mirroring the heuristic's framing.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticCoefficients {
    pub bias: f32,
    pub is_stopped: f32,
    pub missing_owner_tag: f32,
    pub missing_environment_tag: f32,
    pub missing_name_tag: f32,
    /// Weight per year of age (days / 365).
    pub age_years: f32,
    pub instance_size_score: f32,
    pub region_zombie_rate: f32,
}

/// Coefficient-file-backed scorer: probability = sigmoid(w·x + b).
/// Reasons are the most impactful positive contributions.
pub struct LogisticScorer {
    coef: LogisticCoefficients,
    tier_high: f32,
    tier_medium: f32,
    tier_low: f32,
}

/// A contribution below this (on the logit scale) is not worth a reason
/// line.
const REASON_MIN_CONTRIBUTION: f32 = 0.05;

impl LogisticScorer {
    pub fn new(coef: LogisticCoefficients, profile: &ScoringProfile) -> Self {
        Self {
            coef,
            tier_high: profile.tier_high,
            tier_medium: profile.tier_medium,
            tier_low: profile.tier_low,
        }
    }

    /// Load coefficients from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P, profile: &ScoringProfile) -> anyhow::Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let coef: LogisticCoefficients = serde_json::from_slice(&bytes)?;
        Ok(Self::new(coef, profile))
    }
}

impl Scorer for LogisticScorer {
    fn assess(&self, features: &ResourceFeatures) -> RiskAssessment {
        let f = features.sanitized();
        let c = &self.coef;

        // (message, kind, contribution on the logit scale)
        let mut terms: Vec<(String, ReasonKind, f32)> = Vec::new();
        if f.is_stopped {
            terms.push(("resource is stopped".into(), ReasonKind::Lifecycle, c.is_stopped));
        }
        if !f.has_owner_tag {
            terms.push(("missing Owner tag".into(), ReasonKind::Tagging, c.missing_owner_tag));
        }
        if !f.has_environment_tag {
            terms.push((
                "missing Environment tag".into(),
                ReasonKind::Tagging,
                c.missing_environment_tag,
            ));
        }
        if !f.has_name_tag {
            terms.push(("missing Name tag".into(), ReasonKind::Tagging, c.missing_name_tag));
        }
        terms.push((
            format!("resource is {} days old", f.days_since_creation),
            ReasonKind::Age,
            c.age_years * (f.days_since_creation as f32 / 365.0),
        ));
        terms.push((
            "large instance size increases risk".into(),
            ReasonKind::Capacity,
            c.instance_size_score * f.instance_size_score,
        ));
        terms.push((
            "region has elevated historical zombie rate".into(),
            ReasonKind::Regional,
            c.region_zombie_rate * f.region_zombie_rate,
        ));

        let z: f32 = c.bias + terms.iter().map(|(_, _, w)| w).sum::<f32>();
        let probability = sigmoid(z).clamp(0.0, 1.0);
        let tier = tier_for(probability, self.tier_high, self.tier_medium, self.tier_low);

        // Most impactful positive contributions first.
        terms.retain(|(_, _, w)| *w > REASON_MIN_CONTRIBUTION);
        terms.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        let mut reasons: Vec<Reason> = terms
            .into_iter()
            .map(|(msg, kind, w)| Reason::new(msg).kind(kind).weighted(w))
            .collect();

        if reasons.is_empty() && tier != RiskTier::VeryLow {
            reasons.push(Reason::new("accumulated minor risk factors").kind(ReasonKind::Other));
        }

        let summary = compose_summary(tier, probability, &reasons);
        RiskAssessment {
            probability,
            tier,
            reasons,
            summary,
        }
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Build the configured scorer. An unreadable coefficient file logs a
/// warning and falls back to the heuristic so a scan never fails because
/// a model artifact is missing.
pub fn build_scorer(profile: &ScoringProfile) -> Box<dyn Scorer> {
    match profile.scorer {
        ScorerKind::Heuristic => Box::new(HeuristicScorer::new(profile.clone())),
        ScorerKind::Logistic => match LogisticScorer::from_file(&profile.model_path, profile) {
            Ok(s) => Box::new(s),
            Err(e) => {
                warn!(
                    path = %profile.model_path,
                    error = %e,
                    "could not load model coefficients, falling back to heuristic"
                );
                Box::new(HeuristicScorer::new(profile.clone()))
            }
        },
    }
}
