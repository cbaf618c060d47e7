// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Heuristic PDF security scanner.
//
// A static pass over a PDF's raw bytes looking for marker substrings
// associated with active content (script execution, auto-open actions,
// launch commands), plus an informational structure pass (encryption,
// author/creator metadata). The search runs over the raw byte buffer with
// no decoding step, so markers inside partially binary regions are still
// found; markers inside compressed object streams are not.
//
// This is a UX-facing heuristic, not a certified malware scanner: it
// favours availability over strict safety signalling, and every failure
// path degrades to a partial report instead of an error.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use flickwerk_core::config::ScanConfig;
use flickwerk_document::PatchDocument;

use crate::integrity::hash_bytes;

/// A category of active-content marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatKind {
    /// `/JavaScript` or `/JS` — embedded script execution.
    JavaScript,
    /// `/OpenAction` or `/AA` — actions that run on open or on events.
    AutoRunAction,
    /// `/Launch` — launches an external application or file.
    LaunchCommand,
}

impl ThreatKind {
    /// All categories, in report order.
    pub const ALL: [ThreatKind; 3] = [
        ThreatKind::JavaScript,
        ThreatKind::AutoRunAction,
        ThreatKind::LaunchCommand,
    ];

    /// The user-facing threat name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::JavaScript => "Contains JavaScript",
            Self::AutoRunAction => "Auto-Run Actions",
            Self::LaunchCommand => "Launch Command",
        }
    }

    /// Score penalty applied when this category is found.
    pub fn penalty(&self) -> i32 {
        match self {
            Self::JavaScript => 30,
            Self::AutoRunAction => 20,
            Self::LaunchCommand => 40,
        }
    }

    /// Byte patterns that flag this category.
    fn markers(&self) -> &'static [&'static [u8]] {
        match self {
            Self::JavaScript => &[b"/JavaScript", b"/JS"],
            Self::AutoRunAction => &[b"/OpenAction", b"/AA"],
            Self::LaunchCommand => &[b"/Launch"],
        }
    }
}

impl std::fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Embedded URIs are reported but are not a threat and carry no penalty.
const URI_MARKER: &[u8] = b"/URI";

/// The outcome of one scan. Created fresh per call; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityScanResult {
    /// True iff no threat markers were found.
    pub is_safe: bool,
    /// Threat categories found, in report order. Order carries no meaning.
    pub threats: Vec<ThreatKind>,
    /// Human-readable report lines, in a fixed order: encryption note,
    /// metadata notes, per-threat warnings, URI note, all-clear note.
    pub details: Vec<String>,
    /// 0–100; starts at 100 and accumulates per-category penalties.
    pub score: i32,
    /// SHA-256 of the scanned bytes, when the file was readable.
    pub fingerprint: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

impl SecurityScanResult {
    /// The details joined into one multi-line report.
    pub fn report(&self) -> String {
        self.details.join("\n")
    }
}

/// Heuristic scanner over PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct SecurityScanner {
    config: ScanConfig,
}

impl SecurityScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan a file on disk.
    ///
    /// Never errors: an unreadable file produces a partial report with no
    /// threats and an unchanged score.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn scan(&self, path: impl AsRef<Path>) -> SecurityScanResult {
        match tokio::fs::read(path.as_ref()).await {
            Ok(bytes) => self.scan_bytes(&bytes),
            Err(err) => {
                warn!(%err, "file unreadable; deep scan skipped");
                SecurityScanResult {
                    is_safe: true,
                    threats: Vec::new(),
                    details: vec![
                        "Could not perform deep scan: the file was unreadable.".to_string(),
                    ],
                    score: 100,
                    fingerprint: None,
                    scanned_at: Utc::now(),
                }
            }
        }
    }

    /// Scan an in-memory byte buffer. The synchronous core of [`scan`](Self::scan).
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn scan_bytes(&self, bytes: &[u8]) -> SecurityScanResult {
        let mut details = Vec::new();
        let mut threats = Vec::new();
        let mut score = 100i32;

        // Structure pass — informational only, never score-affecting.
        match PatchDocument::from_bytes(bytes) {
            Ok(document) => {
                if document.is_encrypted() {
                    details.push("Document is encrypted.".to_string());
                }
                let meta = document.metadata();
                if let Some(author) = meta.author {
                    details.push(format!("Author: {author}"));
                }
                if let Some(creator) = meta.creator {
                    details.push(format!("Creator: {creator}"));
                }
            }
            Err(err) => {
                debug!(%err, "structure pass failed; continuing with byte scan");
                details.push("Could not parse PDF structure; structural notes unavailable.".to_string());
            }
        }

        // Byte pass — skipped for very large files. A deliberate
        // performance/size tradeoff, not a security guarantee.
        if bytes.len() as u64 >= self.config.max_deep_scan_bytes {
            info!(
                bytes_len = bytes.len(),
                limit = self.config.max_deep_scan_bytes,
                "file too large for deep scan"
            );
            details.push("File too large for deep scan; active-content markers not checked.".to_string());
        } else {
            for threat in ThreatKind::ALL {
                if threat.markers().iter().any(|m| contains(bytes, m)) {
                    details.push(format!("Warning: {} marker found.", threat.display_name()));
                    threats.push(threat);
                    score -= threat.penalty();
                }
            }

            if contains(bytes, URI_MARKER) {
                details.push("Contains embedded URIs.".to_string());
            }

            if threats.is_empty() {
                details.push("No active content markers detected.".to_string());
            }
        }

        let result = SecurityScanResult {
            is_safe: threats.is_empty(),
            threats,
            details,
            score: score.clamp(0, 100),
            fingerprint: Some(hash_bytes(bytes)),
            scanned_at: Utc::now(),
        };
        info!(
            is_safe = result.is_safe,
            score = result.score,
            threat_count = result.threats.len(),
            "scan complete"
        );
        result
    }
}

/// Raw byte-pattern search, no decoding.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, Stream, dictionary};

    fn scanner() -> SecurityScanner {
        SecurityScanner::new()
    }

    /// Build a small, parseable PDF with lopdf; `decorate` gets the
    /// document before serialization.
    fn pdf_bytes(decorate: impl FnOnce(&mut Document)) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            b"0 0 m".to_vec(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        decorate(&mut doc);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("serialize test PDF");
        bytes
    }

    #[test]
    fn clean_document_is_safe_at_full_score() {
        let result = scanner().scan_bytes(&pdf_bytes(|_| {}));
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
        assert!(result.threats.is_empty());
        assert!(
            result
                .details
                .iter()
                .any(|d| d.contains("No active content markers")),
            "details: {:?}",
            result.details
        );
        assert!(result.fingerprint.is_some());
    }

    #[test]
    fn javascript_marker_scores_seventy() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /JavaScript\n");
        let result = scanner().scan_bytes(&bytes);
        assert!(!result.is_safe);
        assert_eq!(result.score, 70);
        assert_eq!(result.threats, vec![ThreatKind::JavaScript]);
    }

    #[test]
    fn short_js_marker_counts_as_javascript() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /JS\n");
        let result = scanner().scan_bytes(&bytes);
        assert_eq!(result.score, 70);
        assert_eq!(result.threats, vec![ThreatKind::JavaScript]);
    }

    #[test]
    fn auto_run_marker_scores_eighty() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /OpenAction\n");
        let result = scanner().scan_bytes(&bytes);
        assert_eq!(result.score, 80);
        assert_eq!(result.threats, vec![ThreatKind::AutoRunAction]);
    }

    #[test]
    fn launch_marker_scores_sixty() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /Launch\n");
        let result = scanner().scan_bytes(&bytes);
        assert_eq!(result.score, 60);
        assert_eq!(result.threats, vec![ThreatKind::LaunchCommand]);
    }

    #[test]
    fn stacked_threats_accumulate_to_ten() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /JavaScript /OpenAction /Launch\n");
        let result = scanner().scan_bytes(&bytes);
        assert_eq!(result.score, 100 - 30 - 20 - 40);
        assert_eq!(
            result.threats,
            vec![
                ThreatKind::JavaScript,
                ThreatKind::AutoRunAction,
                ThreatKind::LaunchCommand
            ]
        );
        assert!(!result.is_safe);
    }

    #[test]
    fn score_never_goes_below_zero() {
        let scanner = SecurityScanner::with_config(ScanConfig {
            max_deep_scan_bytes: 10 * 1024 * 1024,
        });
        // All penalties plus hypothetical future stacking stays clamped.
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"/JavaScript /JS /OpenAction /AA /Launch");
        let result = scanner.scan_bytes(&bytes);
        assert!(result.score >= 0);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn uri_is_informational_only() {
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /URI (https://example.org)\n");
        let result = scanner().scan_bytes(&bytes);
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
        assert!(
            result
                .details
                .iter()
                .any(|d| d.contains("embedded URIs")),
            "details: {:?}",
            result.details
        );
    }

    #[test]
    fn metadata_appears_in_details() {
        let bytes = pdf_bytes(|doc| {
            let info_id = doc.add_object(dictionary! {
                "Author" => Object::string_literal("Ada"),
                "Creator" => Object::string_literal("Flickwerk"),
            });
            doc.trailer.set("Info", Object::Reference(info_id));
        });
        let result = scanner().scan_bytes(&bytes);
        assert!(result.details.iter().any(|d| d == "Author: Ada"));
        assert!(result.details.iter().any(|d| d == "Creator: Flickwerk"));
    }

    #[test]
    fn details_keep_fixed_order() {
        // Markers ride inside a metadata string so the document still
        // parses and the structural notes appear alongside the warnings.
        let bytes = pdf_bytes(|doc| {
            let info_id = doc.add_object(dictionary! {
                "Author" => Object::string_literal("Ada"),
                "Subject" => Object::string_literal("/JavaScript /Launch /URI"),
            });
            doc.trailer.set("Info", Object::Reference(info_id));
        });
        let result = scanner().scan_bytes(&bytes);

        let position = |needle: &str| {
            result
                .details
                .iter()
                .position(|d| d.contains(needle))
                .unwrap_or_else(|| panic!("missing detail {needle}: {:?}", result.details))
        };
        // Metadata, then threats in table order, then the URI note.
        assert!(position("Author") < position("Contains JavaScript"));
        assert!(position("Contains JavaScript") < position("Launch Command"));
        assert!(position("Launch Command") < position("embedded URIs"));
    }

    #[test]
    fn unparseable_bytes_still_get_byte_scanned() {
        let result = scanner().scan_bytes(b"not a pdf at all /Launch");
        assert!(!result.is_safe);
        assert_eq!(result.score, 60);
        assert!(
            result
                .details
                .iter()
                .any(|d| d.contains("Could not parse PDF structure"))
        );
    }

    #[test]
    fn encrypted_document_with_no_markers_is_safe() {
        // Parseable or not, an encrypted document with no markers must come
        // back safe at full score.
        let bytes = pdf_bytes(|doc| {
            doc.trailer
                .set("Encrypt", Object::Dictionary(dictionary! {}));
        });
        let result = scanner().scan_bytes(&bytes);
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
        assert!(result.threats.is_empty());
    }

    #[test]
    fn oversized_file_skips_deep_scan() {
        // 11 MB of padding with an embedded marker: the deep scan is
        // skipped, so no threats and an unchanged score.
        let mut bytes = vec![b' '; 11 * 1024 * 1024];
        bytes[0..9].copy_from_slice(b"%PDF-1.4\n");
        bytes[1000..1011].copy_from_slice(b"/JavaScript");

        let result = scanner().scan_bytes(&bytes);
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
        assert!(result.threats.is_empty());
        assert!(
            result
                .details
                .iter()
                .any(|d| d.contains("too large for deep scan")),
            "details: {:?}",
            result.details
        );
    }

    #[test]
    fn small_limit_is_configurable() {
        let scanner = SecurityScanner::with_config(ScanConfig {
            max_deep_scan_bytes: 64,
        });
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"/JavaScript");
        let result = scanner.scan_bytes(&bytes);
        assert!(result.is_safe, "deep scan should have been skipped");
    }

    #[tokio::test]
    async fn unreadable_file_degrades_gracefully() {
        let result = scanner().scan("/nonexistent/definitely/missing.pdf").await;
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
        assert!(result.threats.is_empty());
        assert!(result.fingerprint.is_none());
        assert!(
            result
                .details
                .iter()
                .any(|d| d.contains("Could not perform deep scan"))
        );
    }

    #[tokio::test]
    async fn scan_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threat.pdf");
        let mut bytes = pdf_bytes(|_| {});
        bytes.extend_from_slice(b"\n% /Launch\n");
        std::fs::write(&path, &bytes).unwrap();

        let result = scanner().scan(&path).await;
        assert_eq!(result.score, 60);
        assert_eq!(result.threats, vec![ThreatKind::LaunchCommand]);
        assert_eq!(result.fingerprint, Some(hash_bytes(&bytes)));
    }

    #[test]
    fn marker_search_has_no_false_positive_on_prefixes() {
        // "/J" alone or "/Open" alone must not trip anything.
        let result = scanner().scan_bytes(b"%PDF-1.4 /J /Open /Laun");
        assert!(result.is_safe);
        assert_eq!(result.score, 100);
    }
}
