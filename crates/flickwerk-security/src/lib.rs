// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flickwerk-security — Heuristic document safety checks for Flickwerk.
//
// Provides the byte-level PDF security scanner (active-content marker
// search producing a qualitative risk result) and SHA-256 integrity
// hashing for document fingerprints.

pub mod integrity;
pub mod scanner;

pub use integrity::{hash_bytes, verify_hash};
pub use scanner::{SecurityScanResult, SecurityScanner, ThreatKind};
