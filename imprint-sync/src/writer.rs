//! Digest-gated writer — the reconciliation unit for a single destination.
//!
//! ## `reconcile_file` — 5-step protocol
//!
//! 1. Create the parent directory chain (`0o755` on Unix).
//! 2. Open the destination read-write, creating it empty if absent.
//! 3. Stream its current contents through SHA-256.
//! 4. Compare with the expected digest → skip if identical.
//! 5. Write the content at offset 0, truncate to its length, flush.
//!
//! A skipped destination is never written to, so its mtime is preserved.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use imprint_core::{ContentDigest, ManifestEntry};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of reconciling an individual destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content differed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped — on-disk digest matches the expected digest.
    Unchanged { path: PathBuf },
    /// Dry-run mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// reconcile_file
// ---------------------------------------------------------------------------

/// Make `destination` hold exactly `content`, writing only when the current
/// digest differs from `expected`.
///
/// In dry-run mode nothing is created or modified.
pub fn reconcile_file(
    destination: &Path,
    content: &[u8],
    expected: &ContentDigest,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    if dry_run {
        return preview(destination, expected);
    }

    // Step 1: parent directory chain.
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            create_parent_dirs(parent)?;
        }
    }

    // Step 2: open, or create empty.
    let (mut file, created) = open_or_create(destination)?;

    // Steps 3 + 4: digest the current contents and compare.
    let current = digest_reader(&mut file).map_err(|e| io_err(destination, e))?;
    if !created && current == *expected {
        tracing::debug!("unchanged: {}", destination.display());
        return Ok(WriteResult::Unchanged {
            path: destination.to_path_buf(),
        });
    }

    // Step 5: overwrite from the start and drop any trailing bytes.
    overwrite(&mut file, content).map_err(|e| io_err(destination, e))?;

    tracing::info!("wrote: {}", destination.display());
    Ok(WriteResult::Written {
        path: destination.to_path_buf(),
    })
}

/// Reconcile one manifest entry into `base`.
pub fn reconcile_entry(
    entry: &ManifestEntry,
    base: &Path,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    reconcile_file(
        &entry.destination(base),
        entry.content(),
        entry.expected_digest(),
        dry_run,
    )
}

/// SHA-256 of the file at `path`, or `None` if it does not exist.
pub fn digest_file(path: &Path) -> Result<Option<ContentDigest>, SyncError> {
    match File::open(path) {
        Ok(mut file) => digest_reader(&mut file)
            .map(Some)
            .map_err(|e| io_err(path, e)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn preview(destination: &Path, expected: &ContentDigest) -> Result<WriteResult, SyncError> {
    let path = destination.to_path_buf();
    match digest_file(destination)? {
        Some(current) if current == *expected => {
            tracing::debug!("unchanged: {}", destination.display());
            Ok(WriteResult::Unchanged { path })
        }
        _ => {
            tracing::info!("[dry-run] would write: {}", destination.display());
            Ok(WriteResult::WouldWrite { path })
        }
    }
}

fn create_parent_dirs(dir: &Path) -> Result<(), SyncError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir).map_err(|e| io_err(dir, e))
}

fn open_or_create(path: &Path) -> Result<(File, bool), SyncError> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => Ok((file, false)),
        Err(err) if err.kind() == ErrorKind::NotFound => OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map(|file| (file, true))
            .map_err(|e| io_err(path, e)),
        Err(err) => Err(io_err(path, err)),
    }
}

fn digest_reader(reader: &mut impl Read) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher)?;
    Ok(ContentDigest::from_hasher(hasher))
}

fn overwrite(file: &mut File, content: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(content)?;
    file.set_len(content.len() as u64)?;
    file.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::TempDir;

    fn write_bytes(path: &Path, content: &[u8]) -> WriteResult {
        reconcile_file(path, content, &ContentDigest::of(content), false).unwrap()
    }

    #[test]
    fn absent_file_is_created_and_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".bashrc");
        let result = write_bytes(&path, b"alias ll='ls -l'\n");
        assert_eq!(result, WriteResult::Written { path: path.clone() });
        assert_eq!(fs::read(&path).unwrap(), b"alias ll='ls -l'\n");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".config").join("nvim").join("init.lua");
        write_bytes(&path, b"set number");
        assert!(path.exists());
    }

    #[test]
    #[cfg(unix)]
    fn parent_directories_use_mode_0755() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(".config").join("git");
        write_bytes(&dir.join("config"), b"[user]\n");
        for created in [tmp.path().join(".config"), dir] {
            let mode = fs::metadata(&created).unwrap().permissions().mode() & 0o777;
            // umask may clear bits but never adds any.
            assert_eq!(mode & !0o755, 0, "{} has mode {mode:o}", created.display());
            assert_eq!(mode & 0o700, 0o700);
        }
    }

    #[test]
    fn matching_digest_skips_and_preserves_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("same");
        fs::write(&path, b"same content").unwrap();
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        set_file_mtime(&path, old).unwrap();

        let result = write_bytes(&path, b"same content");
        assert!(matches!(result, WriteResult::Unchanged { .. }));
        let mtime = FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        assert_eq!(mtime, old, "mtime changed; file was rewritten");
    }

    #[test]
    fn longer_existing_content_is_truncated() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("long");
        fs::write(&path, b"a much longer legacy line\nwith a second line\n").unwrap();

        let result = write_bytes(&path, b"short\n");
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"short\n");
    }

    #[test]
    fn shorter_existing_content_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("short");
        fs::write(&path, b"x").unwrap();

        write_bytes(&path, b"replacement content");
        assert_eq!(fs::read(&path).unwrap(), b"replacement content");
    }

    #[test]
    fn second_reconcile_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("twice");
        assert!(matches!(write_bytes(&path, b"v1"), WriteResult::Written { .. }));
        assert!(matches!(write_bytes(&path, b"v1"), WriteResult::Unchanged { .. }));
        assert!(matches!(write_bytes(&path, b"v2"), WriteResult::Written { .. }));
    }

    #[test]
    fn empty_content_creates_empty_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty");
        let result = write_bytes(&path, b"");
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        assert!(matches!(write_bytes(&path, b""), WriteResult::Unchanged { .. }));
    }

    #[test]
    fn empty_content_truncates_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("was-full");
        fs::write(&path, b"content").unwrap();
        assert!(matches!(write_bytes(&path, b""), WriteResult::Written { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn dry_run_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".config").join("app").join("settings");
        let result =
            reconcile_file(&path, b"content", &ContentDigest::of(b"content"), true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!tmp.path().join(".config").exists(), "dry-run must not create dirs");
    }

    #[test]
    fn dry_run_reports_mismatch_without_writing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("existing");
        fs::write(&path, b"old").unwrap();

        let result = reconcile_file(&path, b"new", &ContentDigest::of(b"new"), true).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"old");

        let same = reconcile_file(&path, b"old", &ContentDigest::of(b"old"), true).unwrap();
        assert!(matches!(same, WriteResult::Unchanged { .. }));
    }

    #[test]
    fn parent_that_is_a_file_fails_with_path() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join(".config");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = reconcile_file(
            &blocker.join("app"),
            b"x",
            &ContentDigest::of(b"x"),
            false,
        )
        .unwrap_err();
        match err {
            SyncError::Io { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("expected Io error, got {other}"),
        }
        assert_eq!(fs::read(&blocker).unwrap(), b"not a directory");
    }

    #[test]
    fn destination_that_is_a_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("occupied");
        fs::create_dir(&dir).unwrap();
        let err = reconcile_file(&dir, b"x", &ContentDigest::of(b"x"), false).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
    }

    #[test]
    fn digest_file_of_missing_path_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(digest_file(&tmp.path().join("nope")).unwrap().is_none());
        let path = tmp.path().join("present");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(
            digest_file(&path).unwrap(),
            Some(ContentDigest::of(b"hello"))
        );
    }

    #[test]
    fn reconcile_entry_writes_dotted_destination() {
        let tmp = TempDir::new().unwrap();
        let entry = ManifestEntry::new("config/git/config", b"[user]\n".to_vec()).unwrap();
        reconcile_entry(&entry, tmp.path(), false).unwrap();
        assert_eq!(
            fs::read(tmp.path().join(".config").join("git").join("config")).unwrap(),
            b"[user]\n"
        );
    }
}
