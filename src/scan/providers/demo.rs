use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::features::RawResourceRecord;
use crate::scan::types::InventoryProvider;

/// Built-in sample inventory so a local run has something to scan
/// without wiring a real extractor.
pub struct DemoInventoryProvider;

fn record(
    id: &str,
    ty: &str,
    region: &str,
    state: &str,
    instance_type: Option<&str>,
    age_days: i64,
    tags: &[(&str, &str)],
) -> RawResourceRecord {
    let launch = Utc::now() - Duration::days(age_days);
    let mut r = RawResourceRecord {
        id: Some(id.to_string()),
        resource_type: Some(ty.to_string()),
        region: Some(region.to_string()),
        state: Some(state.to_string()),
        instance_type: instance_type.map(str::to_string),
        launch_time: Some(launch.to_rfc3339()),
        ..Default::default()
    };
    for (k, v) in tags {
        r.tags.insert(k.to_string(), v.to_string());
    }
    r
}

#[async_trait]
impl InventoryProvider for DemoInventoryProvider {
    async fn fetch_inventory(&self) -> Result<Vec<RawResourceRecord>> {
        let mut inventory = vec![
            record(
                "i-0f3a9d1c2b4e5f607",
                "ec2",
                "us-east-1",
                "stopped",
                Some("m5.xlarge"),
                140,
                &[],
            ),
            record(
                "i-0b1c2d3e4f5a69788",
                "ec2",
                "us-east-1",
                "running",
                Some("t3.medium"),
                200,
                &[("Name", "ci-runner"), ("Owner", "platform"), ("Environment", "staging")],
            ),
            record(
                "i-0a9b8c7d6e5f40312",
                "ec2",
                "us-west-2",
                "running",
                Some("c5.xlarge"),
                400,
                &[("Name", "experiment-7")],
            ),
            record(
                "vol-0123456789abcdef0",
                "ebs",
                "us-west-2",
                "available",
                Some("gp2"),
                95,
                &[("Name", "detached-scratch")],
            ),
            record(
                "db-legacy-reports",
                "rds",
                "us-east-1",
                "idle",
                Some("db.t3.medium"),
                300,
                &[("Name", "legacy-reports")],
            ),
            record(
                "elb-orphaned-ingress",
                "elb",
                "us-east-1",
                "unused",
                None,
                60,
                &[("Name", "orphaned-ingress")],
            ),
        ];
        // One protected resource, to exercise the protection path.
        inventory.push(record(
            "i-0production0000001",
            "ec2",
            "us-east-1",
            "stopped",
            Some("m5.large"),
            500,
            &[("Name", "prod-db-standby"), ("Environment", "production")],
        ));
        Ok(inventory)
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}
