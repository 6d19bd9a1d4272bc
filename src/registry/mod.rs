//! Best-effort IP ownership annotation via the system `whois` utility
//!
//! Annotations are decoration for the human-readable report only. Lookup
//! failure of any kind (missing binary, network error, non-zero exit,
//! garbage output) degrades to an empty annotation and never aborts a run.

use std::process::Command;

/// Longest annotation emitted into a report line
const ANNOTATION_MAX_LEN: usize = 21;

/// Trait for registry annotation backends
///
/// The report renderer only needs a string per IP; tests substitute a
/// deterministic stub for the subprocess-backed implementation.
pub trait RegistryLookup {
    /// Annotation for an IP, or an empty string when nothing is known
    fn annotate(&self, ip: &str) -> String;
}

/// Registry lookup backed by the `whois` command-line utility
pub struct WhoisLookup;

impl WhoisLookup {
    pub fn new() -> Self {
        WhoisLookup
    }

    fn query(&self, ip: &str) -> Option<String> {
        let output = Command::new("whois").arg(ip).output().ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }
}

impl Default for WhoisLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryLookup for WhoisLookup {
    fn annotate(&self, ip: &str) -> String {
        match self.query(ip) {
            Some(stdout) => parse_whois_output(&stdout),
            None => {
                log::debug!("whois lookup failed for {}", ip);
                String::new()
            }
        }
    }
}

/// Pick country code and network name out of whois output
///
/// Field names are matched case-insensitively; the last occurrence wins,
/// mirroring how delegated registries append their own blocks.
fn parse_whois_output(stdout: &str) -> String {
    let mut country = "";
    let mut netname = "";

    for line in stdout.lines() {
        let lower = line.to_lowercase();
        if lower.starts_with("country") {
            if let Some(value) = line.split(':').nth(1) {
                country = value.trim();
            }
        } else if lower.starts_with("netname:") {
            if let Some(value) = line.split(':').nth(1) {
                netname = value.trim();
            }
        }
    }

    truncate_chars(&format!("{} {}", country.to_lowercase(), netname.to_lowercase()))
}

/// Cap the annotation length without splitting a UTF-8 character
fn truncate_chars(s: &str) -> String {
    s.chars().take(ANNOTATION_MAX_LEN).collect()
}
