//! Whitelist policy: tier classification and rendering
//!
//! The directive is the machine-consumed `ignoreip_local` fragment; the
//! report is the commented, per-tier justification a human reviews before
//! promoting entries into the permanent fail2ban configuration.

use crate::persistence::UsageByIp;
use crate::registry::RegistryLookup;

/// IPs per directive line
const DIRECTIVE_WRAP: usize = 10;

/// Report tier of one IP, judged from its (username, count) pairs
///
/// Tiers are mutually exclusive and exhaustive: the hard/soft split
/// partitions multi-user IPs at 3 distinct users, and single-user IPs are
/// partitioned at 3 logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// More than 3 distinct usernames
    Hard,
    /// 2 to 3 distinct usernames
    Soft,
    /// Exactly 1 username with at least 3 logins
    Individual,
    /// Exactly 1 username with fewer than 3 logins; informational only
    Unused,
}

impl Tier {
    /// Classify one IP's usage
    pub fn classify(users: &[(String, i64)]) -> Tier {
        if users.len() > 3 {
            Tier::Hard
        } else if users.len() > 1 {
            Tier::Soft
        } else if users.first().map_or(0, |u| u.1) >= 3 {
            Tier::Individual
        } else {
            Tier::Unused
        }
    }
}

/// IPs selected for the directive, lexicographic order
///
/// An IP qualifies with at least 2 distinct users, or a single user with
/// more than 2 logins.
pub fn select_ips(usage: &UsageByIp) -> Vec<&str> {
    usage
        .iter()
        .filter(|(_, users)| users.len() > 1 || users.first().map_or(false, |u| u.1 > 2))
        .map(|(ip, _)| ip.as_str())
        .collect()
}

/// Render the `ignoreip_local` fragment
///
/// Selected IPs are space-separated, wrapped at 10 per line, with a trailing
/// count line for a quick sanity check when diffing drafts.
pub fn render_directive(selected: &[&str]) -> String {
    let mut out = String::from("\n\n[DEFAULT]\n\nignoreip_local =\n");
    for chunk in selected.chunks(DIRECTIVE_WRAP) {
        out.push_str("                 ");
        out.push_str(&chunk.join(" "));
        out.push_str(" \n");
    }
    out.push_str(&format!("# IPs count: {}\n", selected.len()));
    out
}

/// Render the tiered, annotated report
///
/// Every IP lands in exactly one tier; the registry annotation is
/// best-effort decoration and may be blank.
pub fn render_report(usage: &UsageByIp, registry: &dyn RegistryLookup) -> String {
    let mut hard = String::new();
    let mut soft = String::new();
    let mut individual = String::new();
    let mut unused = String::new();

    for (ip, users) in usage {
        let annotation = registry.annotate(ip);
        match Tier::classify(users) {
            Tier::Hard => hard.push_str(&format!(
                "    # {:<25} - {} - {:2} {}\n",
                ip,
                annotation,
                users.len(),
                format_breakdown(users)
            )),
            Tier::Soft => soft.push_str(&report_line(ip, &annotation, users)),
            Tier::Individual => individual.push_str(&report_line(ip, &annotation, users)),
            Tier::Unused => unused.push_str(&report_line(ip, &annotation, users)),
        }
    }

    let mut out = String::new();
    out.push_str("# File generated by f2b-whitelist.\n");
    out.push_str("# Check and copy IP addresses to gn-ignoreip.local.\n\n");
    out.push_str("# Hard whitelist\n\n");
    out.push_str(&hard);
    out.push_str("\n\n# soft whitelist\n\n");
    out.push_str(&soft);
    out.push_str("\n\n# individuals whitelist\n\n");
    out.push_str(&individual);
    out.push_str("\n\n# not used IPs to whitelist\n\n");
    out.push_str(&unused);
    out
}

fn report_line(ip: &str, annotation: &str, users: &[(String, i64)]) -> String {
    format!("    # {:<25} - {} - {}\n", ip, annotation, format_breakdown(users))
}

/// Raw (username, count) tuple list for operator traceability
fn format_breakdown(users: &[(String, i64)]) -> String {
    let pairs: Vec<String> = users
        .iter()
        .map(|(name, count)| format!("(\"{}\", {})", name, count))
        .collect();
    format!("[{}]", pairs.join(", "))
}
