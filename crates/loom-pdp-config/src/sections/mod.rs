// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod policy;
mod router;

pub use policy::{PolicyConfig, PolicyConfigLayer};
pub use router::{RouterConfig, RouterConfigLayer};
