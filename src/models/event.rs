use chrono::NaiveDateTime;

/// Timestamp format used in the journal; lexicographic order on the stored
/// text matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Which mail service produced a login record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// postfix/smtpd submission (SASL)
    Postfix,
    /// dovecot imap-login
    Dovecot,
}

impl Backend {
    /// Single-letter tag stored in the journal
    pub fn tag(&self) -> &'static str {
        match self {
            Backend::Postfix => "p",
            Backend::Dovecot => "d",
        }
    }

    /// Parse a journal tag back into a backend
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(Backend::Postfix),
            "d" => Some(Backend::Dovecot),
            _ => None,
        }
    }
}

/// One successful authentication extracted from the mail log
///
/// IPv6 addresses are already folded to their /64 prefix by the scanner, so
/// `ip` is either a plain IPv4 address or a `a:b:c:d::/64` subnet string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginEvent {
    pub timestamp: NaiveDateTime,
    pub ip: String,
    pub username: String,
    pub backend: Backend,
}

impl LoginEvent {
    /// Journal text form of the event timestamp
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}
