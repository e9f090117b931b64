// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in resource declarations.
//!
//! Each resource is a thin [`ListerConfig`] value: method name, item path,
//! column mappings, primary key, continuation-token wiring. The engine never
//! special-cases a resource type; everything it needs is declared here.

use std::sync::Arc;

use serde_json::Value;

use crate::lister::{ConfigError, ListerConfig, SortOrder};

/// The resource catalog, in display order. Fails fast on a malformed
/// declaration, which is a programming error rather than a runtime condition.
pub fn builtin() -> Result<Vec<ListerConfig>, ConfigError> {
    Ok(vec![
        ec2_instances()?,
        s3_buckets()?,
        iam_users()?,
        events()?,
    ])
}

/// The name column prefers the `Name` tag and falls back to the instance id,
/// so untagged instances still get a usable row.
fn ec2_instances() -> Result<ListerConfig, ConfigError> {
    ListerConfig::builder(
        "ec2-instances",
        "EC2 Instances",
        "describe-instances",
        "Reservations[].Instances[]",
    )
    .computed_column("name", 16, Arc::new(instance_name))
    .column("state", 8, "State.Name")
    .column("type", 9, "InstanceType")
    .column("zone", 14, "Placement.AvailabilityZone")
    .hidden("instance_id", "InstanceId")
    .primary_key("instance_id")
    .sort("name", SortOrder::Ascending)
    .marker("NextToken", "NextToken")
    .build()
}

fn instance_name(record: &Value) -> String {
    record["Tags"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|tag| tag["Key"] == "Name")
        .and_then(|tag| tag["Value"].as_str())
        .or_else(|| record["InstanceId"].as_str())
        .unwrap_or_default()
        .to_owned()
}

fn s3_buckets() -> Result<ListerConfig, ConfigError> {
    ListerConfig::builder("s3-buckets", "S3 Buckets", "list-buckets", "Buckets[]")
        .column("name", 20, "Name")
        .column("created", 20, "CreationDate")
        .primary_key("name")
        .sort("name", SortOrder::Ascending)
        .build()
}

fn iam_users() -> Result<ListerConfig, ConfigError> {
    ListerConfig::builder("iam-users", "IAM Users", "list-users", "Users[]")
        .column("name", 14, "UserName")
        .column("created", 20, "CreateDate")
        .hidden("user_id", "UserId")
        .primary_key("user_id")
        .sort("name", SortOrder::Ascending)
        .marker("Marker", "Marker")
        .build()
}

/// Keyless event stream: every refresh replaces the whole list, newest first.
fn events() -> Result<ListerConfig, ConfigError> {
    ListerConfig::builder("events", "Events", "describe-events", "Events[]")
        .column("name", 30, "Message")
        .column("time", 20, "Timestamp")
        .sort("time", SortOrder::Descending)
        .build()
}
