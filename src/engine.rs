//! # Risk Engine
//! Pure, testable logic that maps `(ResourceFeatures, ScoringProfile)` →
//! `RiskAssessment`. No I/O, suitable for unit tests and offline
//! evaluation.
//!
//! Policy: an additive heuristic over independent signals. Addition is
//! commutative, so evaluation order only fixes the order of the reason
//! list, not the numeric result.

use crate::assessment::{compose_summary, tier_for, Reason, ReasonKind, RiskAssessment};
use crate::features::ResourceFeatures;
use crate::profile::ScoringProfile;

/// Score one resource. Stateless and referentially transparent: identical
/// input always yields an identical assessment.
pub fn assess(features: &ResourceFeatures, profile: &ScoringProfile) -> RiskAssessment {
    // Out-of-range inputs are clamped, not rejected; the conversion
    // boundary already warned about them.
    let f = features.sanitized();

    let mut probability = profile.base_rate;
    let mut reasons: Vec<Reason> = Vec::new();

    // 1) Lifecycle: a stopped/idle resource is the dominant signal.
    if f.is_stopped {
        probability += profile.stopped_penalty;
        reasons.push(
            Reason::new("resource is stopped")
                .kind(ReasonKind::Lifecycle)
                .weighted(profile.stopped_penalty),
        );
    }

    // 2) Tag hygiene: unmanaged resources rot.
    if !f.has_owner_tag {
        probability += profile.missing_owner_tag_penalty;
        reasons.push(
            Reason::new("missing Owner tag")
                .kind(ReasonKind::Tagging)
                .weighted(profile.missing_owner_tag_penalty),
        );
    }
    if !f.has_environment_tag {
        probability += profile.missing_environment_tag_penalty;
        reasons.push(
            Reason::new("missing Environment tag")
                .kind(ReasonKind::Tagging)
                .weighted(profile.missing_environment_tag_penalty),
        );
    }
    if !f.has_name_tag {
        probability += profile.missing_name_tag_penalty;
        reasons.push(
            Reason::new("missing Name tag")
                .kind(ReasonKind::Tagging)
                .weighted(profile.missing_name_tag_penalty),
        );
    }

    // 3) Age: anything past the threshold picks up a fixed penalty.
    if f.days_since_creation > profile.age_threshold_days {
        probability += profile.age_penalty;
        reasons.push(
            Reason::new(format!("resource is {} days old", f.days_since_creation))
                .kind(ReasonKind::Age)
                .weighted(profile.age_penalty),
        );
    }

    // 4) Size: larger idle capacity wastes more. Only worth a reason line
    // once the contribution is material.
    let size_contribution = f.instance_size_score * profile.size_weight;
    probability += size_contribution;
    if size_contribution > profile.size_reason_min {
        reasons.push(
            Reason::new("large instance size increases risk")
                .kind(ReasonKind::Capacity)
                .weighted(size_contribution),
        );
    }

    // 5) Regional prior: regions with a zombie track record.
    let region_contribution = f.region_zombie_rate * profile.region_weight;
    probability += region_contribution;
    if region_contribution > profile.region_reason_min {
        reasons.push(
            Reason::new("region has elevated historical zombie rate")
                .kind(ReasonKind::Regional)
                .weighted(region_contribution),
        );
    }

    let probability = probability.clamp(0.0, 1.0);
    let tier = tier_for(probability, profile.tier_high, profile.tier_medium, profile.tier_low);

    // Invariant: any tier above VERY_LOW carries at least one reason.
    // With the default profile sub-threshold contributions cannot cross
    // the LOW boundary on their own, but a retuned profile can get here.
    if reasons.is_empty() && tier != crate::assessment::RiskTier::VeryLow {
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
