//! Unified diff preview for `imprint diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use imprint_core::Manifest;

use crate::{error::io_err, SyncError};

/// A single destination diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub identifier: String,
    pub destination: PathBuf,
    pub unified_diff: String,
}

/// Compare each entry's captured content with what is on disk under `base`.
///
/// Entries whose destination already matches are omitted. No files are
/// written.
pub fn diff_manifest(manifest: &Manifest, base: &Path) -> Result<Vec<FileDiff>, SyncError> {
    let mut diffs = Vec::new();
    for entry in manifest {
        let destination = entry.destination(base);
        let existing = read_existing_or_empty(&destination)?;
        if existing == entry.content() {
            continue;
        }

        let suffix = entry.destination_suffix();
        let old_header = format!("a/{suffix}");
        let new_header = format!("b/{suffix}");
        let unified = match (
            std::str::from_utf8(&existing),
            std::str::from_utf8(entry.content()),
        ) {
            (Ok(old), Ok(new)) => TextDiff::from_lines(old, new)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string(),
            _ => format!("Binary files {old_header} and {new_header} differ\n"),
        };

        diffs.push(FileDiff {
            identifier: entry.identifier().to_string(),
            destination,
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<Vec<u8>, SyncError> {
    match std::fs::read(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use imprint_core::ManifestEntry;
    use tempfile::TempDir;

    use crate::writer::reconcile_entry;

    use super::*;

    fn manifest(files: &[(&str, &[u8])]) -> Manifest {
        let mut m = Manifest::new();
        for (path, content) in files {
            m.push(ManifestEntry::new(*path, content.to_vec()).expect("entry"))
                .expect("push");
        }
        m
    }

    #[test]
    fn no_diffs_after_reconcile() {
        let base = TempDir::new().expect("base");
        let m = manifest(&[("zshrc", b"export A=1\n"), ("config/git/config", b"[user]\n")]);
        for entry in &m {
            reconcile_entry(entry, base.path(), false).expect("reconcile");
        }
        let diffs = diff_manifest(&m, base.path()).expect("diff");
        assert!(diffs.is_empty(), "reconciled tree should have no diff");
    }

    #[test]
    fn local_edit_produces_unified_diff() {
        let base = TempDir::new().expect("base");
        let m = manifest(&[("zshrc", b"export A=1\nexport B=2\n")]);
        fs::write(base.path().join(".zshrc"), "export A=1\nexport B=3\n").expect("write");

        let diffs = diff_manifest(&m, base.path()).expect("diff");
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/.zshrc"));
        assert!(diff.contains("+++ b/.zshrc"));
        assert!(diff.contains("@@"));
        assert!(diff.contains("-export B=3"));
        assert!(diff.contains("+export B=2"));
    }

    #[test]
    fn missing_destination_diffs_against_empty() {
        let base = TempDir::new().expect("base");
        let m = manifest(&[("config/nvim/init.lua", b"vim.o.number = true\n")]);
        let diffs = diff_manifest(&m, base.path()).expect("diff");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].identifier, "configNvimInitLua");
        assert!(diffs[0].unified_diff.contains("+vim.o.number = true"));
        assert!(!base.path().join(".config").exists(), "diff must not write");
    }

    #[test]
    fn binary_content_yields_marker() {
        let base = TempDir::new().expect("base");
        let m = manifest(&[("blob", &[0xff, 0xfe, 0x00])]);
        let diffs = diff_manifest(&m, base.path()).expect("diff");
        assert_eq!(
            diffs[0].unified_diff,
            "Binary files a/.blob and b/.blob differ\n"
        );
    }
}
