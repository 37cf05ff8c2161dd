//! # Resource Features
//! Normalized per-resource input for the scoring engine, plus the raw
//! inventory record shape emitted by providers and its conversion.
//!
//! The conversion boundary is where the input contract is enforced:
//! missing required fields are a typed error (never defaulted), while
//! out-of-range numeric values are clamped and logged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Supported resource classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Ec2,
    Ebs,
    Rds,
    Elb,
}

impl ResourceType {
    /// Case-insensitive parse of the extractor's type string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ec2" => Some(ResourceType::Ec2),
            "ebs" => Some(ResourceType::Ebs),
            "rds" => Some(ResourceType::Rds),
            "elb" => Some(ResourceType::Elb),
            _ => None,
        }
    }

    /// Report label, e.g. "EC2".
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Ec2 => "EC2",
            ResourceType::Ebs => "EBS",
            ResourceType::Rds => "RDS",
            ResourceType::Elb => "ELB",
        }
    }
}

/// One normalized feature record per resource per scan. Immutable input
/// to the scorer; produced by the conversion below or posted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceFeatures {
    pub resource_id: String,
    pub resource_type: ResourceType,
    /// Region the resource lives in, carried for reporting.
    #[serde(default = "default_region")]
    pub region: String,
    /// Days since creation. Signed on the wire; negative values are
    /// clamped to 0 at scoring time rather than rejected.
    pub days_since_creation: i64,
    pub has_name_tag: bool,
    pub has_owner_tag: bool,
    pub has_environment_tag: bool,
    pub is_stopped: bool,
    /// Size class in <0.0, 1.0>, monotone in instance size.
    pub instance_size_score: f32,
    /// Historical zombie fraction for the region in <0.0, 1.0>.
    pub region_zombie_rate: f32,
}

fn default_region() -> String {
    "unknown".to_string()
}

impl ResourceFeatures {
    /// Return a copy with all numeric fields forced into their documented
    /// domain. Clamping is logged once per field; repeated occurrences
    /// indicate an upstream extractor bug.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();
        if out.days_since_creation < 0 {
            warn!(
                resource = %out.resource_id,
                days = out.days_since_creation,
                "negative days_since_creation clamped to 0"
            );
            out.days_since_creation = 0;
        }
        out.instance_size_score = clamp_unit(&out.resource_id, "instance_size_score", out.instance_size_score);
        out.region_zombie_rate = clamp_unit(&out.resource_id, "region_zombie_rate", out.region_zombie_rate);
        out
    }
}

fn clamp_unit(resource: &str, field: &'static str, x: f32) -> f32 {
    if (0.0..=1.0).contains(&x) {
        return x;
    }
    let clamped = x.clamp(0.0, 1.0);
    warn!(%resource, field, value = x, "out-of-range value clamped to [0,1]");
    clamped
}

/// Contract violations at the conversion boundary. Fatal to the single
/// record; surfaced to the caller, never silently defaulted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("unknown resource type `{0}`")]
    UnknownResourceType(String),
    #[error("unparseable creation timestamp `{0}`")]
    InvalidTimestamp(String),
}

/// Raw inventory record as emitted by a provider: not yet normalized,
/// every field optional except what the contract requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResourceRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Provider-reported lifecycle state, e.g. "running", "stopped",
    /// "available" (unattached volume), "idle", "unused".
    #[serde(default)]
    pub state: Option<String>,
    /// e.g. "t3.medium", "db.t3.micro".
    #[serde(default)]
    pub instance_type: Option<String>,
    /// RFC 3339 creation/launch timestamp.
    #[serde(default)]
    pub launch_time: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Volume size, used for EBS cost estimation.
    #[serde(default)]
    pub size_gb: Option<f64>,
}

impl RawResourceRecord {
    /// Resource name from the Name tag, if any.
    pub fn name(&self) -> Option<&str> {
        self.tags.get("Name").map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Normalize into `ResourceFeatures`. `region_zombie_rate` is supplied
    /// by the caller (historical stats or prior); `now` makes the
    /// conversion deterministic and testable.
    pub fn to_features(
        &self,
        now: DateTime<Utc>,
        region_zombie_rate: f32,
    ) -> Result<ResourceFeatures, FeatureError> {
        let id = self
            .id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(FeatureError::MissingField("id"))?;
        let type_str = self
            .resource_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(FeatureError::MissingField("resource_type"))?;
        let resource_type = ResourceType::parse(type_str)
            .ok_or_else(|| FeatureError::UnknownResourceType(type_str.to_string()))?;

        let days_since_creation = match self.launch_time.as_deref() {
            Some(ts) => {
                let created = DateTime::parse_from_rfc3339(ts)
                    .map_err(|_| FeatureError::InvalidTimestamp(ts.to_string()))?;
                (now - created.with_timezone(&Utc)).num_days()
            }
            // Extractors omit launch time for resources AWS reports
            // without one; age contributes nothing then.
            None => 0,
        };

        let state = self.state.as_deref().unwrap_or("");
        Ok(ResourceFeatures {
            resource_id: id.to_string(),
            resource_type,
            region: self.region.clone().unwrap_or_else(default_region),
            days_since_creation,
            has_name_tag: has_tag(&self.tags, "Name"),
            has_owner_tag: has_tag(&self.tags, "Owner"),
            has_environment_tag: has_tag(&self.tags, "Environment"),
            is_stopped: is_idle_state(resource_type, state),
            instance_size_score: size_score(self.instance_type.as_deref().unwrap_or("")),
            region_zombie_rate,
        }
        .sanitized())
    }
}

fn has_tag(tags: &HashMap<String, String>, key: &str) -> bool {
    tags.get(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Whether the provider-reported state means "provisioned but not doing
/// work" for the given resource class.
pub fn is_idle_state(resource_type: ResourceType, state: &str) -> bool {
    let s = state.trim().to_ascii_lowercase();
    match resource_type {
        ResourceType::Ec2 => s == "stopped",
        ResourceType::Ebs => s == "available",
        ResourceType::Rds => s == "idle" || s == "stopped",
        ResourceType::Elb => s == "unused",
    }
}

/// Size class score: larger instances mean more waste when idle. Matches
/// on the size suffix (the part after the family dot), so "m5.2xlarge"
/// scores as 2xlarge, not as large.
pub fn size_score(instance_type: &str) -> f32 {
    let ty = instance_type.trim().to_ascii_lowercase();
    if ty.is_empty() {
        return 0.0;
    }
    let suffix = ty.rsplit('.').next().unwrap_or(&ty);
    match suffix {
        "nano" => 0.1,
        "micro" => 0.2,
        "small" => 0.3,
        "medium" => 0.4,
        "large" => 0.5,
        "xlarge" => 0.7,
        "2xlarge" => 0.8,
        "4xlarge" => 0.9,
        "8xlarge" | "12xlarge" | "16xlarge" | "24xlarge" => 1.0,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, ty: &str) -> RawResourceRecord {
        RawResourceRecord {
            id: Some(id.to_string()),
            resource_type: Some(ty.to_string()),
            region: Some("us-east-1".to_string()),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn size_score_uses_suffix_not_substring() {
        assert!((size_score("m5.2xlarge") - 0.8).abs() < 1e-6);
        assert!((size_score("t2.micro") - 0.2).abs() < 1e-6);
        assert!((size_score("db.t3.medium") - 0.4).abs() < 1e-6);
        assert!((size_score("c5.24xlarge") - 1.0).abs() < 1e-6);
        assert!((size_score("") - 0.0).abs() < 1e-6);
        // Unknown size class falls back to the middle of the range.
        assert!((size_score("weird.type") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn size_score_is_monotone_in_size_class() {
        let classes = [
            "t3.nano", "t3.micro", "t3.small", "t3.medium", "m5.large", "m5.xlarge",
            "m5.2xlarge", "m5.4xlarge", "m5.8xlarge",
        ];
        for pair in classes.windows(2) {
            assert!(
                size_score(pair[0]) < size_score(pair[1]),
                "{} should score below {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn missing_id_and_type_are_contract_violations() {
        let mut r = record("i-123", "ec2");
        r.id = None;
        assert_eq!(
            r.to_features(now(), 0.0).unwrap_err(),
            FeatureError::MissingField("id")
        );

        let mut r = record("i-123", "ec2");
        r.resource_type = None;
        assert_eq!(
            r.to_features(now(), 0.0).unwrap_err(),
            FeatureError::MissingField("resource_type")
        );

        let r = record("i-123", "lambda");
        assert!(matches!(
            r.to_features(now(), 0.0).unwrap_err(),
            FeatureError::UnknownResourceType(_)
        ));
    }

    #[test]
    fn conversion_derives_age_tags_and_state() {
        let mut r = record("i-123", "EC2");
        r.state = Some("stopped".to_string());
        r.instance_type = Some("t3.small".to_string());
        r.launch_time = Some("2026-02-01T00:00:00Z".to_string());
        r.tags.insert("Name".to_string(), "batch-runner".to_string());
        r.tags.insert("Owner".to_string(), "  ".to_string()); // blank value does not count

        let f = r.to_features(now(), 0.25).unwrap();
        assert_eq!(f.resource_type, ResourceType::Ec2);
        assert_eq!(f.days_since_creation, 120);
        assert!(f.has_name_tag);
        assert!(!f.has_owner_tag);
        assert!(!f.has_environment_tag);
        assert!(f.is_stopped);
        assert!((f.instance_size_score - 0.3).abs() < 1e-6);
        assert!((f.region_zombie_rate - 0.25).abs() < 1e-6);
    }

    #[test]
    fn future_launch_time_clamps_to_zero_days() {
        let mut r = record("i-clock-skew", "ec2");
        r.launch_time = Some("2026-06-03T00:00:00Z".to_string());
        let f = r.to_features(now(), 0.0).unwrap();
        assert_eq!(f.days_since_creation, 0);
    }

    #[test]
    fn idle_states_per_resource_class() {
        assert!(is_idle_state(ResourceType::Ec2, "stopped"));
        assert!(!is_idle_state(ResourceType::Ec2, "running"));
        assert!(is_idle_state(ResourceType::Ebs, "available"));
        assert!(!is_idle_state(ResourceType::Ebs, "in-use"));
        assert!(is_idle_state(ResourceType::Rds, "idle"));
        assert!(is_idle_state(ResourceType::Elb, "unused"));
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let f = ResourceFeatures {
            resource_id: "i-x".to_string(),
            resource_type: ResourceType::Ec2,
            region: "us-east-1".to_string(),
            days_since_creation: -5,
            has_name_tag: true,
            has_owner_tag: true,
            has_environment_tag: true,
            is_stopped: false,
            instance_size_score: 1.7,
            region_zombie_rate: -0.3,
        }
        .sanitized();
        assert_eq!(f.days_since_creation, 0);
        assert!((f.instance_size_score - 1.0).abs() < 1e-6);
        assert!((f.region_zombie_rate - 0.0).abs() < 1e-6);
    }
}
