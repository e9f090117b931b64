// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Built-in demo backend.
//!
//! A deterministic, in-memory paged dataset so the TUI is usable (and testable)
//! without credentials. Pages are small on purpose so pagination and partial
//! rendering are visible. One instance flips its state over time so the
//! recent-update highlight has something to show.

use std::time::Instant;

use serde_json::{json, Map, Value};

use super::{ApiClient, ApiError};

const INSTANCE_PAGE_SIZE: usize = 3;
const USER_PAGE_SIZE: usize = 4;

#[derive(Debug)]
pub struct DemoClient {
    started: Instant,
}

impl DemoClient {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn describe_instances(&self, params: &Map<String, Value>) -> Result<Value, ApiError> {
        let offset = page_offset(params, "NextToken", "describe-instances")?;
        let instances = self.instances();
        let (page, next) = slice_page(&instances, offset, INSTANCE_PAGE_SIZE);

        let mut document = json!({
            "Reservations": [{"ReservationId": format!("r-{offset}"), "Instances": page}]
        });
        if let Some(next) = next {
            document["NextToken"] = json!(next.to_string());
        }
        Ok(document)
    }

    fn instances(&self) -> Vec<Value> {
        // i-0004 flips between running and stopped every few seconds.
        let flapping = if self.started.elapsed().as_secs() / 7 % 2 == 0 {
            "running"
        } else {
            "stopped"
        };

        vec![
            instance("i-0001", "web-1", "t3.micro", "eu-central-1a", "running"),
            instance("i-0002", "web-2", "t3.micro", "eu-central-1b", "running"),
            instance("i-0003", "worker-1", "m5.large", "eu-central-1a", "running"),
            instance("i-0004", "worker-2", "m5.large", "eu-central-1b", flapping),
            instance("i-0005", "bastion", "t3.nano", "eu-central-1a", "stopped"),
        ]
    }

    fn list_buckets(&self) -> Value {
        json!({
            "Buckets": [
                {"Name": "cirrus-artifacts", "CreationDate": "2024-03-01T10:00:00Z"},
                {"Name": "cirrus-backups", "CreationDate": "2023-11-12T08:30:00Z"},
                {"Name": "cirrus-logs", "CreationDate": "2025-01-20T16:45:00Z"}
            ]
        })
    }

    fn list_users(&self, params: &Map<String, Value>) -> Result<Value, ApiError> {
        let offset = page_offset(params, "Marker", "list-users")?;
        let users = vec![
            user("alice", "AIDA0001", "2022-05-01T00:00:00Z"),
            user("bob", "AIDA0002", "2022-06-15T00:00:00Z"),
            user("carol", "AIDA0003", "2023-01-09T00:00:00Z"),
            user("deploy-bot", "AIDA0004", "2023-02-02T00:00:00Z"),
            user("erin", "AIDA0005", "2024-08-21T00:00:00Z"),
            user("frank", "AIDA0006", "2025-03-30T00:00:00Z"),
        ];
        let (page, next) = slice_page(&users, offset, USER_PAGE_SIZE);

        let mut document = json!({"Users": page});
        if let Some(next) = next {
            document["Marker"] = json!(next.to_string());
        }
        Ok(document)
    }

    fn describe_events(&self) -> Value {
        // Keyless resource: the lister for this method clears and fully
        // replaces on every refresh cycle.
        let tick = self.started.elapsed().as_secs() / 10;
        json!({
            "Events": [
                {"Message": format!("autoscaling heartbeat #{tick}"), "Timestamp": "2026-08-31T12:00:00Z"},
                {"Message": "instance i-0004 state changed", "Timestamp": "2026-08-31T11:58:10Z"},
                {"Message": "bucket cirrus-logs lifecycle transition", "Timestamp": "2026-08-31T11:40:00Z"},
                {"Message": "user deploy-bot access key rotated", "Timestamp": "2026-08-31T09:15:33Z"}
            ]
        })
    }
}

impl Default for DemoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient for DemoClient {
    fn call(&self, method: &str, params: &Map<String, Value>) -> Result<Value, ApiError> {
        match method {
            "describe-instances" => self.describe_instances(params),
            "list-buckets" => Ok(self.list_buckets()),
            "list-users" => self.list_users(params),
            "describe-events" => Ok(self.describe_events()),
            other => Err(ApiError::UnknownMethod {
                method: other.to_owned(),
            }),
        }
    }
}

fn instance(id: &str, name: &str, kind: &str, zone: &str, state: &str) -> Value {
    json!({
        "InstanceId": id,
        "InstanceType": kind,
        "State": {"Name": state},
        "Placement": {"AvailabilityZone": zone},
        "Tags": [
            {"Key": "Name", "Value": name},
            {"Key": "managed-by", "Value": "cirrus-demo"}
        ]
    })
}

fn user(name: &str, id: &str, created: &str) -> Value {
    json!({"UserName": name, "UserId": id, "CreateDate": created})
}

fn page_offset(
    params: &Map<String, Value>,
    arg: &str,
    method: &str,
) -> Result<usize, ApiError> {
    match params.get(arg) {
        None => Ok(0),
        Some(Value::String(token)) => token.parse().map_err(|_| ApiError::BadRequest {
            method: method.to_owned(),
            message: format!("invalid {arg}: {token:?}"),
        }),
        Some(other) => Err(ApiError::BadRequest {
            method: method.to_owned(),
            message: format!("invalid {arg}: {other}"),
        }),
    }
}

fn slice_page(items: &[Value], offset: usize, page_size: usize) -> (Vec<Value>, Option<usize>) {
    let end = (offset + page_size).min(items.len());
    let page = items.get(offset..end).unwrap_or_default().to_vec();
    let next = (end < items.len()).then_some(end);
    (page, next)
}
