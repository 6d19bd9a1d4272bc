//! End-to-end pipeline tests against temporary files
//!
//! These exercise the whole run: log scan, journal resume, pruning window,
//! classification, rendering, and the draft backup. A stub registry keeps
//! the report deterministic and offline.

use chrono::{Datelike, Local};
use f2b_whitelist::config::Config;
use f2b_whitelist::persistence::{JournalStore, SqliteJournal};
use f2b_whitelist::pipeline;
use f2b_whitelist::registry::RegistryLookup;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct StubRegistry;

impl RegistryLookup for StubRegistry {
    fn annotate(&self, _ip: &str) -> String {
        String::new()
    }
}

fn test_config(dir: &TempDir) -> Config {
    Config {
        log_path: dir.path().join("mail.log"),
        db_path: dir.path().join("journal.db"),
        draft_path: dir.path().join("ignoreip.draft"),
        records_max_age_days: 30,
    }
}

/// Log lines dated a few days back in the current year so they survive the
/// 30-day pruning window regardless of when the test runs.
fn recent_log() -> String {
    let now = Local::now();
    let stamp = now.format("%b %e");
    let mut log = String::new();
    for (hms, user, ip) in [
        ("01:00:01", "alice", "203.0.113.7"),
        ("01:00:02", "alice", "203.0.113.7"),
        ("01:00:03", "alice", "203.0.113.7"),
        ("01:00:04", "bob", "198.51.100.4"),
    ] {
        log.push_str(&format!(
            "{} {} mx postfix/smtpd[11]: client=host[{}], sasl_method=LOGIN, sasl_username={}\n",
            stamp, hms, ip, user
        ));
    }
    // A couple of lines the scanner must ignore
    log.push_str(&format!("{} 01:00:05 mx postfix/qmgr[7]: ABCDEF: removed\n", stamp));
    log.push_str(&format!(
        "{} 01:00:06 mx postfix/smtpd[11]: client=host[192.0.2.66], sasl_username=eve, authentication failed\n",
        stamp
    ));
    log
}

#[test]
fn test_full_run_produces_draft_and_journal() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, recent_log()).unwrap();

    let summary = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(summary.ingested, 4);
    assert_eq!(summary.selected, 1); // only alice's IP passes the >2 logins rule

    let draft = fs::read_to_string(&config.draft_path).unwrap();
    assert!(draft.contains("# individuals whitelist"));
    assert!(draft.contains("203.0.113.7"));
    assert!(draft.contains("ignoreip_local ="));
    assert!(draft.contains("# IPs count: 1"));
    // bob's IP shows up in the report but not in the directive selection
    assert!(draft.contains("198.51.100.4"));
    assert!(!draft.contains("192.0.2.66"));
}

#[test]
fn test_rerun_without_new_lines_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, recent_log()).unwrap();

    let first = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(first.ingested, 4);

    let second = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(second.ingested, 0);

    let journal = SqliteJournal::open(&config.db_path).unwrap();
    let usage = journal.aggregate().unwrap();
    let total: i64 = usage.values().flatten().map(|(_, c)| c).sum();
    assert_eq!(total, 4);
}

#[test]
fn test_appended_lines_ingest_incrementally() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, recent_log()).unwrap();

    pipeline::run(&config, &StubRegistry).unwrap();

    // Append one newer success
    let stamp = Local::now().format("%b %e");
    let mut log = fs::read_to_string(&config.log_path).unwrap();
    log.push_str(&format!(
        "{} 02:00:00 mx dovecot: imap-login: Login: user=<carol>, method=PLAIN, rip=198.51.100.9, lip=10.0.0.1\n",
        stamp
    ));
    fs::write(&config.log_path, log).unwrap();

    let summary = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(summary.ingested, 1);

    let draft = fs::read_to_string(&config.draft_path).unwrap();
    assert!(draft.contains("198.51.100.9"));
}

#[test]
fn test_second_run_backs_up_previous_draft() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, recent_log()).unwrap();

    pipeline::run(&config, &StubRegistry).unwrap();
    let first_draft = fs::read_to_string(&config.draft_path).unwrap();

    pipeline::run(&config, &StubRegistry).unwrap();

    let backup: PathBuf = {
        let mut name = config.draft_path.clone().into_os_string();
        name.push(".bak");
        name.into()
    };
    assert_eq!(fs::read_to_string(backup).unwrap(), first_draft);
}

#[test]
fn test_missing_log_is_created_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);

    let summary = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(summary.ingested, 0);
    assert!(config.log_path.exists());

    let draft = fs::read_to_string(&config.draft_path).unwrap();
    assert!(draft.contains("# IPs count: 0"));
}

#[test]
fn test_prune_removes_stale_events() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, "").unwrap();

    // Seed the journal directly with an event well past the window
    let journal = SqliteJournal::open(&config.db_path).unwrap();
    let old = Local::now().naive_local() - chrono::Duration::days(120);
    journal
        .append(&f2b_whitelist::models::LoginEvent {
            timestamp: old,
            ip: "192.0.2.200".to_string(),
            username: "stale".to_string(),
            backend: f2b_whitelist::models::Backend::Dovecot,
        })
        .unwrap();
    drop(journal);

    let summary = pipeline::run(&config, &StubRegistry).unwrap();
    assert_eq!(summary.pruned, 1);

    let draft = fs::read_to_string(&config.draft_path).unwrap();
    assert!(!draft.contains("192.0.2.200"));
}

#[test]
fn test_year_is_inferred_as_current() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    fs::write(&config.log_path, recent_log()).unwrap();

    pipeline::run(&config, &StubRegistry).unwrap();

    let journal = SqliteJournal::open(&config.db_path).unwrap();
    let max = journal.max_timestamp().unwrap().unwrap();
    assert_eq!(max.year(), Local::now().year());
}
