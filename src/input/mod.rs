//! Mail-log input: scanning and event extraction

pub mod log_scanner;

pub use log_scanner::{LogScanner, ScanError};

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

/// Create the mail log empty if rsyslog has not produced it yet.
///
/// Mode 0o640 matches the rsyslog drop-in that normally owns the file.
pub fn ensure_log_file(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Ok(());
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }
    options.open(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_log_file_creates_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mail.log");

        ensure_log_file(&path).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);

        // Existing file is left alone
        std::fs::write(&path, "line\n").unwrap();
        ensure_log_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\n");
    }
}
