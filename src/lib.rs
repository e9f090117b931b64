// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cirrus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cirrus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cirrus, a terminal browser for AWS-style resources.
//!
//! The core of the crate is the generic async-list engine in [`lister`]: paginated
//! listing calls run on detached worker threads, stream partial pages to the UI
//! through a channel, and merge into the displayed rows without flicker.

pub mod api;
pub mod lister;
pub mod model;
pub mod query;
pub mod resources;
pub mod store;
pub mod trace;
pub mod tui;
