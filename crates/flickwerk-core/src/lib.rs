// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flickwerk — Core types, errors, and coordinate geometry shared across all
// crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod types;

pub use config::{EngineConfig, ScanConfig};
pub use error::FlickwerkError;
pub use types::*;
