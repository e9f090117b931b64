// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Paged listing API boundary.
//!
//! The engine only ever sees JSON-like documents; the actual transport (real
//! AWS SDK, local stub, test script) lives behind [`ApiClient`]. Calls may be
//! slow and are therefore only ever issued from lister worker threads, never
//! from the render loop.

use std::error::Error;
use std::fmt;

use serde_json::{Map, Value};

pub mod demo;

pub use demo::DemoClient;

/// A listing API: a named call taking keyword arguments and returning a JSON
/// document. Continuation tokens ride inside the returned document under a
/// per-resource field name.
pub trait ApiClient: Send + Sync {
    fn call(&self, method: &str, params: &Map<String, Value>) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    UnknownMethod { method: String },
    BadRequest { method: String, message: String },
    Transport { method: String, message: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod { method } => write!(f, "unknown API method: {method}"),
            Self::BadRequest { method, message } => {
                write!(f, "bad request to {method}: {message}")
            }
            Self::Transport { method, message } => {
                write!(f, "transport error calling {method}: {message}")
            }
        }
    }
}

impl Error for ApiError {}
