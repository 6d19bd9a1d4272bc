//! Scanner for successful-login records in the mail log
//!
//! Each log line starts with a fixed 15-character syslog timestamp
//! ("Mon DD HH:MM:SS"). Lines are matched against an ordered rule table,
//! one rule per mail backend; the first structurally matching rule wins.
//! The scanner resumes after the newest timestamp already present in the
//! journal, so re-running over the same file inserts nothing new.

use crate::models::{Backend, LoginEvent};
use chrono::{Datelike, Local, NaiveDateTime};
use regex::Regex;
use std::io::{self, BufRead, Lines};
use std::sync::LazyLock;
use thiserror::Error;

/// Width of the leading syslog timestamp field
const TIMESTAMP_WIDTH: usize = 15;

static RE_TIMESTAMP_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-z]{2} [ \d]\d \d{2}:\d{2}:\d{2}$").expect("regex")
});

/// Errors that abort a scan
///
/// Individual unmatched or partially extractable lines are skipped silently;
/// only I/O failures and a garbled timestamp field are fatal, since the log
/// format is trusted.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unparseable timestamp field: {0:?}")]
    Timestamp(String),
}

/// One per-backend matching rule
///
/// `marker` identifies the backend's login-success line, `failure_marker` a
/// failed attempt. Field templates name the token prefix plus the delimiter
/// pair bounding the value; a `None` delimiter means the value runs to the
/// token's start or end.
struct PatternRule {
    marker: &'static str,
    failure_marker: &'static str,
    user_prefix: &'static str,
    user_delims: (Option<char>, Option<char>),
    ip_prefix: &'static str,
    ip_delims: (Option<char>, Option<char>),
    backend: Backend,
}

/// Rule order matters: rules are tried top to bottom per line.
const RULES: &[PatternRule] = &[
    // postfix/smtpd: "... client=mail.example.org[203.0.113.7], sasl_username=alice"
    PatternRule {
        marker: "sasl_username",
        failure_marker: "authentication failed",
        user_prefix: "sasl_username=",
        user_delims: (Some('='), None),
        ip_prefix: "client=",
        ip_delims: (Some('['), Some(']')),
        backend: Backend::Postfix,
    },
    // dovecot: "... imap-login: Login: user=<bob>, ... rip=198.51.100.4, lip=..."
    PatternRule {
        marker: "imap-login",
        failure_marker: "auth failed",
        user_prefix: "user=",
        user_delims: (Some('<'), Some('>')),
        ip_prefix: "rip=",
        ip_delims: (Some('='), Some(',')),
        backend: Backend::Dovecot,
    },
];

/// Lazy scanner over a mail log
///
/// Yields one `LoginEvent` per matching line; lines at or before the resume
/// cursor and lines matching no rule are skipped.
pub struct LogScanner<R: BufRead> {
    lines: Lines<R>,
    cursor: Option<NaiveDateTime>,
    year: i32,
}

impl<R: BufRead> LogScanner<R> {
    /// Scanner assuming log entries belong to the current calendar year
    ///
    /// Entries spanning a year boundary are misdated; known limitation of
    /// the year-less syslog timestamp.
    pub fn new(reader: R, cursor: Option<NaiveDateTime>) -> Self {
        Self::with_year(reader, cursor, Local::now().year())
    }

    /// Scanner with an explicit year, for deterministic tests
    pub fn with_year(reader: R, cursor: Option<NaiveDateTime>, year: i32) -> Self {
        LogScanner {
            lines: reader.lines(),
            cursor,
            year,
        }
    }
}

impl<R: BufRead> Iterator for LogScanner<R> {
    type Item = Result<LoginEvent, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };

            let timestamp = match parse_timestamp(&line, self.year) {
                Ok(ts) => ts,
                Err(e) => return Some(Err(e)),
            };

            // Already journalled in a previous run
            if let Some(cursor) = self.cursor {
                if timestamp <= cursor {
                    continue;
                }
            }

            let rule = match match_rule(&line) {
                Some(rule) => rule,
                None => continue,
            };

            if let Some(event) = extract_event(&line, timestamp, rule) {
                return Some(Ok(event));
            }
        }
    }
}

/// Parse the fixed leading timestamp field, prepending the given year
fn parse_timestamp(line: &str, year: i32) -> Result<NaiveDateTime, ScanError> {
    let field = line
        .get(..TIMESTAMP_WIDTH)
        .ok_or_else(|| ScanError::Timestamp(line.to_string()))?;

    if !RE_TIMESTAMP_FIELD.is_match(field) {
        return Err(ScanError::Timestamp(field.to_string()));
    }

    NaiveDateTime::parse_from_str(&format!("{} {}", year, field), "%Y %b %e %H:%M:%S")
        .map_err(|_| ScanError::Timestamp(field.to_string()))
}

/// Find the first rule structurally matching the line
///
/// A failure marker encountered while walking the rule list rejects the line
/// outright, even if a later rule would have matched.
fn match_rule(line: &str) -> Option<&'static PatternRule> {
    for rule in RULES {
        if line.contains(rule.failure_marker) {
            return None;
        }
        if line.contains(rule.marker) {
            return Some(rule);
        }
    }
    None
}

/// Pull username and IP out of a matched line
///
/// Both fields must extract non-empty or the line is discarded.
fn extract_event(line: &str, timestamp: NaiveDateTime, rule: &PatternRule) -> Option<LoginEvent> {
    let mut username = None;
    let mut ip = None;

    for token in line.split_whitespace() {
        if token.starts_with(rule.user_prefix) {
            username = extract_between(token, rule.user_delims.0, rule.user_delims.1);
        } else if token.starts_with(rule.ip_prefix) {
            ip = extract_between(token, rule.ip_delims.0, rule.ip_delims.1);
        }
    }

    let username = username.filter(|u| !u.is_empty())?;
    let ip = ip.filter(|i| !i.is_empty())?;

    Some(LoginEvent {
        timestamp,
        ip: normalize_ip(&ip),
        username,
        backend: rule.backend,
    })
}

/// Slice a token between a delimiter pair
///
/// `None` means the value extends to the token's start or end; a delimiter
/// that does not occur in the token fails the extraction. An open-ended
/// value sheds the trailing record separator the tokenizer leaves attached
/// when the field is not last on the line.
fn extract_between(token: &str, open: Option<char>, close: Option<char>) -> Option<String> {
    let start = match open {
        Some(c) => token.find(c)? + c.len_utf8(),
        None => 0,
    };
    let value = match close {
        Some(c) => {
            let end = token.find(c)?;
            if end < start {
                return None;
            }
            &token[start..end]
        }
        None => token[start..].trim_end_matches(','),
    };
    Some(value.to_string())
}

/// Fold IPv6 addresses to their /64 subnet
///
/// More than 4 colons means a full IPv6 address; keep the first 4 groups so
/// activity aggregates per subnet instead of per rotating interface address.
fn normalize_ip(ip: &str) -> String {
    if ip.matches(':').count() > 4 {
        let groups: Vec<&str> = ip.split(':').take(4).collect();
        format!("{}::/64", groups.join(":"))
    } else {
        ip.to_string()
    }
}
