//! # Risk Assessment
//! Output types for the scoring engine: tier, reasons, and the composed
//! human-readable summary consumed by the dashboard (badge, percentage,
//! tooltip) and by the persistence layer for history/trend views.

use serde::{Deserialize, Serialize};

/// Coarse risk bucket derived from the continuous probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    High,
    Medium,
    Low,
    VeryLow,
}

impl RiskTier {
    /// Display label, e.g. "HIGH RISK".
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::High => "HIGH RISK",
            RiskTier::Medium => "MEDIUM RISK",
            RiskTier::Low => "LOW RISK",
            RiskTier::VeryLow => "VERY LOW RISK",
        }
    }

    /// Badge icon shown next to the label.
    pub fn icon(&self) -> &'static str {
        match self {
            RiskTier::High => "🚨",
            RiskTier::Medium => "⚠️",
            RiskTier::Low => "🟡",
            RiskTier::VeryLow => "✅",
        }
    }

    /// Badge color for UI consumers.
    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::High => "#ff6b6b",
            RiskTier::Medium => "#ffa500",
            RiskTier::Low => "#ffd93d",
            RiskTier::VeryLow => "#42d392",
        }
    }
}

/// Reason shown to the user (explainability). One entry per contributing
/// feature, in scoring order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    /// Human-readable description (e.g. "missing Owner tag").
    pub message: String,
    /// Optional contribution of this reason to the probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    /// Optional category, for consistent grouping in UI and tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ReasonKind>,
}

/// Coarse reason categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Lifecycle,
    Tagging,
    Age,
    Capacity,
    Regional,
    Other,
}

/// Complete assessment for one resource, including explainability.
/// This is the shape the API returns and the scan report embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Zombie probability in <0.0, 1.0>.
    pub probability: f32,
    pub tier: RiskTier,
    /// Ordered list of contributing reasons; empty only below the
    /// VERY_LOW boundary.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Reason>,
    /// Single composed sentence: icon + label + percentage + reasons.
    pub summary: String,
}

impl RiskAssessment {
    pub fn new(probability: f32, tier: RiskTier) -> Self {
        Self {
            probability: clamp01(probability),
            tier,
            reasons: Vec::new(),
            summary: String::new(),
        }
    }

    /// Append one reason (builder style).
    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reasons.push(reason);
        self
    }
}

impl Reason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            weight: None,
            kind: None,
        }
    }

    pub fn weighted(mut self, w: f32) -> Self {
        self.weight = Some(clamp01(w));
        self
    }

    pub fn kind(mut self, kind: ReasonKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Map a probability to its tier. Total and pure: every probability lands
/// in exactly one band, lower boundaries inclusive.
pub fn tier_for(probability: f32, high: f32, medium: f32, low: f32) -> RiskTier {
    if probability >= high {
        RiskTier::High
    } else if probability >= medium {
        RiskTier::Medium
    } else if probability >= low {
        RiskTier::Low
    } else {
        RiskTier::VeryLow
    }
}

/// Compose the one-line summary from tier, probability, and reasons.
/// Percentage is rounded to a whole number.
pub fn compose_summary(tier: RiskTier, probability: f32, reasons: &[Reason]) -> String {
    let pct = (clamp01(probability) * 100.0).round() as u32;
    if reasons.is_empty() {
        return format!(
            "{} {}: {}% chance of becoming a zombie. No elevated risk factors detected.",
            tier.icon(),
            tier.label(),
            pct
        );
    }
    let joined = reasons
        .iter()
        .map(|r| r.message.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} {}: {}% chance of becoming a zombie because {}.",
        tier.icon(),
        tier.label(),
        pct,
        joined
    )
}

pub(crate) fn clamp01(x: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}
