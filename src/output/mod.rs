//! Draft file writer
//!
//! The draft is the report followed by the directive in one document. The
//! previous draft is kept as a single-generation `.bak` sibling so an
//! operator can diff against the last run. Rename plus write is not atomic;
//! a crash mid-write leaves a partial draft, which the reviewing human
//! catches before anything is applied.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Write report and directive to the draft path, backing up any prior draft
pub fn persist(report: &str, directive: &str, path: &Path) -> io::Result<()> {
    if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup)?;
        log::debug!("Previous draft moved to {:?}", backup);
    }

    let mut document = String::with_capacity(report.len() + directive.len());
    document.push_str(report);
    document.push_str(directive);
    fs::write(path, document)?;
    Ok(())
}

/// Sibling path with a `.bak` suffix appended to the full file name
fn backup_path(path: &Path) -> std::path::PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    std::path::PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_creates_draft_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignoreip.draft");

        persist("# report\n", "directive\n", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# report\ndirective\n");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_previous_draft_becomes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignoreip.draft");

        persist("# old\n", "old directive\n", &path).unwrap();
        persist("# new\n", "new directive\n", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# new\nnew directive\n");
        assert_eq!(
            fs::read_to_string(backup_path(&path)).unwrap(),
            "# old\nold directive\n"
        );
    }

    #[test]
    fn test_backup_is_single_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ignoreip.draft");

        persist("one\n", "", &path).unwrap();
        persist("two\n", "", &path).unwrap();
        persist("three\n", "", &path).unwrap();

        // Only the immediately previous draft survives
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "two\n");
    }

    #[test]
    fn test_backup_suffix_appends_to_name() {
        let path = Path::new("/etc/fail2ban/jail.d/gn-ignoreip.draft");
        assert_eq!(
            backup_path(path),
            Path::new("/etc/fail2ban/jail.d/gn-ignoreip.draft.bak")
        );
    }
}
