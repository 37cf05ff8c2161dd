//! # Cost Estimation
//! Simplified monthly cost figures for flagged resources and the savings
//! summary shown at the top of a scan report. Prices are approximate
//! on-demand rates; production deployments would source the pricing API
//! via the extractor instead.

use std::collections::HashMap;

use serde::Serialize;

use crate::features::{RawResourceRecord, ResourceType};

const HOURS_PER_MONTH: f64 = 730.0;

/// Approximate monthly cost of keeping the resource provisioned.
pub fn monthly_cost(resource_type: ResourceType, record: &RawResourceRecord) -> f64 {
    match resource_type {
        ResourceType::Ec2 => {
            instance_hourly_rate(record.instance_type.as_deref().unwrap_or("")) * HOURS_PER_MONTH
        }
        ResourceType::Ebs => {
            let size_gb = record.size_gb.unwrap_or(0.0).max(0.0);
            size_gb * volume_gb_rate(record.instance_type.as_deref().unwrap_or("gp2"))
        }
        ResourceType::Rds => {
            rds_hourly_rate(record.instance_type.as_deref().unwrap_or("")) * HOURS_PER_MONTH
        }
        // Base hourly cost plus minimal LCU usage.
        ResourceType::Elb => 0.0225 * HOURS_PER_MONTH + 5.0,
    }
}

fn instance_hourly_rate(instance_type: &str) -> f64 {
    match instance_type.trim().to_ascii_lowercase().as_str() {
        "t2.micro" => 0.0116,
        "t2.small" => 0.023,
        "t2.medium" => 0.0464,
        "t3.micro" => 0.0104,
        "t3.small" => 0.0208,
        "t3.medium" => 0.0416,
        "m5.large" => 0.096,
        "m5.xlarge" => 0.192,
        "c5.large" => 0.085,
        "c5.xlarge" => 0.17,
        _ => 0.05,
    }
}

fn rds_hourly_rate(instance_class: &str) -> f64 {
    match instance_class.trim().to_ascii_lowercase().as_str() {
        "db.t3.micro" | "db.t2.micro" => 0.017,
        "db.t3.small" | "db.t2.small" => 0.034,
        "db.t3.medium" | "db.t2.medium" => 0.068,
        "db.m5.large" => 0.174,
        "db.m5.xlarge" => 0.348,
        "db.r5.large" => 0.24,
        "db.r5.xlarge" => 0.48,
        _ => 0.10,
    }
}

/// Per-GB/month storage rate by volume type.
fn volume_gb_rate(volume_type: &str) -> f64 {
    match volume_type.trim().to_ascii_lowercase().as_str() {
        "gp3" => 0.08,
        "io1" | "io2" => 0.125,
        "st1" => 0.045,
        "sc1" => 0.015,
        "standard" => 0.05,
        _ => 0.10, // gp2 and anything unrecognized
    }
}

/// Potential savings from cleaning up the flagged resources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostSummary {
    pub total_monthly_savings: f64,
    pub total_annual_savings: f64,
    /// Monthly cost per resource type label ("EC2", "EBS", ...).
    pub cost_by_type: HashMap<String, f64>,
    pub resource_count: usize,
}

/// Aggregate `(resource_type, monthly_cost)` pairs into a summary.
pub fn summarize(items: impl IntoIterator<Item = (ResourceType, f64)>) -> CostSummary {
    let mut summary = CostSummary::default();
    for (ty, cost) in items {
        summary.total_monthly_savings += cost;
        *summary.cost_by_type.entry(ty.label().to_string()).or_insert(0.0) += cost;
        summary.resource_count += 1;
    }
    summary.total_annual_savings = summary.total_monthly_savings * 12.0;
    summary
}
