//! Domain types for captured manifests.
//!
//! A [`Manifest`] is an ordered list of [`ManifestEntry`] values. Entries are
//! immutable once built; their content and digest always agree.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ManifestError;
use crate::normalize::normalize;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A manifest key derived from a relative path; also the symbol used for the
/// entry inside a generated program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize `path` and check that the result is a valid symbol:
    /// non-empty, starts with a letter, alphanumeric throughout.
    pub fn from_path(path: &str) -> Result<Self, ManifestError> {
        Self::parse(normalize(path)).map_err(|identifier| ManifestError::InvalidIdentifier {
            path: path.to_owned(),
            identifier,
        })
    }

    /// Accept an already-normalized identifier, returning it back on rejection.
    fn parse(raw: String) -> Result<Self, String> {
        let mut chars = raw.chars();
        let valid = match chars.next() {
            Some(first) => first.is_alphabetic() && chars.all(char::is_alphanumeric),
            None => false,
        };
        if valid {
            Ok(Self(raw))
        } else {
            Err(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Raw SHA-256 output. Always compared as bytes; hex is only a carrier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// SHA-256 of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(bytes))
    }

    /// Finalize a streaming hasher.
    pub fn from_hasher(hasher: Sha256) -> Self {
        Self(hasher.finalize().into())
    }

    /// Decode 64 hex characters. Upper- and lowercase are both accepted.
    pub fn from_hex(hex_digest: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_digest, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A single captured file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    identifier: Identifier,
    relative_path: String,
    content: Cow<'static, [u8]>,
    expected_digest: ContentDigest,
}

impl ManifestEntry {
    /// Build an entry from captured bytes, deriving identifier and digest.
    pub fn new(
        relative_path: impl Into<String>,
        content: impl Into<Cow<'static, [u8]>>,
    ) -> Result<Self, ManifestError> {
        let relative_path = relative_path.into();
        let content = content.into();
        let identifier = Identifier::from_path(&relative_path)?;
        let expected_digest = ContentDigest::of(&content);
        Ok(Self {
            identifier,
            relative_path,
            content,
            expected_digest,
        })
    }

    /// Rebuild an entry from its embedded form. The hex digest is decoded but
    /// not recomputed; call [`verify`](Self::verify) to check consistency.
    /// [`Manifest::from_embedded`] does.
    pub fn from_embedded(file: &EmbeddedFile) -> Result<Self, ManifestError> {
        let identifier = Identifier::parse(file.identifier.to_owned()).map_err(|identifier| {
            ManifestError::InvalidIdentifier {
                path: file.relative_path.to_owned(),
                identifier,
            }
        })?;
        let expected_digest =
            ContentDigest::from_hex(file.digest).map_err(|e| ManifestError::InvalidDigest {
                identifier: file.identifier.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            identifier,
            relative_path: file.relative_path.to_owned(),
            content: Cow::Borrowed(file.content),
            expected_digest,
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// `/`-separated path relative to the capture root.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn expected_digest(&self) -> &ContentDigest {
        &self.expected_digest
    }

    /// Path of the destination relative to the base directory: the captured
    /// path turned into a dotfile (`a/b.txt` → `.a/b.txt`).
    pub fn destination_suffix(&self) -> String {
        format!(".{}", self.relative_path)
    }

    /// `join(base, "." + relative_path)`.
    pub fn destination(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for segment in self.destination_suffix().split('/') {
            if !segment.is_empty() {
                path.push(segment);
            }
        }
        path
    }

    /// Recompute the digest from content and compare.
    pub fn verify(&self) -> Result<(), ManifestError> {
        if ContentDigest::of(&self.content) == self.expected_digest {
            Ok(())
        } else {
            Err(ManifestError::DigestMismatch {
                identifier: self.identifier.0.clone(),
            })
        }
    }
}

/// `const`-constructible entry embedded in a generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub identifier: &'static str,
    pub relative_path: &'static str,
    pub content: &'static [u8],
    /// Lowercase hex SHA-256 of `content`.
    pub digest: &'static str,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Ordered, collision-free set of entries.
///
/// Identifiers are unique ignoring case: they name payload files in a
/// generated package, which may be written to a case-insensitive filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<Identifier, usize>,
    folded: HashMap<String, usize>,
    destinations: HashSet<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, rejecting identifier and destination collisions.
    pub fn push(&mut self, entry: ManifestEntry) -> Result<(), ManifestError> {
        let folded = entry.identifier.0.to_lowercase();
        if let Some(&existing) = self.folded.get(&folded) {
            return Err(ManifestError::IdentifierCollision {
                identifier: entry.identifier.0.clone(),
                first: self.entries[existing].relative_path.clone(),
                second: entry.relative_path,
            });
        }
        let suffix = entry.destination_suffix();
        if !self.destinations.insert(suffix.clone()) {
            return Err(ManifestError::DuplicateDestination {
                destination: suffix,
            });
        }
        self.folded.insert(folded, self.entries.len());
        self.index
            .insert(entry.identifier.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Build a manifest from the static table of a generated program.
    ///
    /// Every entry's content is checked against its embedded digest; a
    /// payload edited after generation yields `DigestMismatch`.
    pub fn from_embedded(files: &[EmbeddedFile]) -> Result<Self, ManifestError> {
        let mut manifest = Self::new();
        for file in files {
            let entry = ManifestEntry::from_embedded(file)?;
            entry.verify()?;
            manifest.push(entry)?;
        }
        Ok(manifest)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn get(&self, identifier: &str) -> Option<&ManifestEntry> {
        self.index
            .get(&Identifier(identifier.to_owned()))
            .map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn digest_of_hello_matches_known_vector() {
        assert_eq!(ContentDigest::of(b"hello").to_hex(), HELLO_SHA256);
    }

    #[test]
    fn digest_hex_decoding_is_case_insensitive() {
        let lower = ContentDigest::from_hex(HELLO_SHA256).unwrap();
        let upper = ContentDigest::from_hex(&HELLO_SHA256.to_uppercase()).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.to_hex(), HELLO_SHA256);
    }

    #[test]
    fn digest_rejects_wrong_length() {
        assert!(ContentDigest::from_hex("abcd").is_err());
        assert!(ContentDigest::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn identifier_rejects_leading_digit_and_empty() {
        assert!(matches!(
            Identifier::from_path("2024/notes.md"),
            Err(ManifestError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            Identifier::from_path("..."),
            Err(ManifestError::InvalidIdentifier { .. })
        ));
        assert_eq!(
            Identifier::from_path("config/app.toml").unwrap().as_str(),
            "configAppToml"
        );
    }

    #[test]
    fn entry_destination_is_dotfile_under_base() {
        let entry = ManifestEntry::new("a/b.txt", b"X".to_vec()).unwrap();
        assert_eq!(entry.destination_suffix(), ".a/b.txt");
        assert_eq!(
            entry.destination(Path::new("/base")),
            PathBuf::from("/base/.a/b.txt")
        );
    }

    #[test]
    fn entry_digest_is_consistent_with_content() {
        let entry = ManifestEntry::new("hello", b"hello".to_vec()).unwrap();
        assert_eq!(entry.expected_digest().to_hex(), HELLO_SHA256);
        entry.verify().unwrap();
    }

    #[test]
    fn embedded_entry_with_wrong_digest_fails_verify() {
        let file = EmbeddedFile {
            identifier: "hello",
            relative_path: "hello",
            content: b"not hello",
            digest: HELLO_SHA256,
        };
        let entry = ManifestEntry::from_embedded(&file).unwrap();
        assert!(matches!(
            entry.verify(),
            Err(ManifestError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn embedded_entry_with_bad_hex_is_rejected() {
        let file = EmbeddedFile {
            identifier: "hello",
            relative_path: "hello",
            content: b"hello",
            digest: "not-hex",
        };
        assert!(matches!(
            ManifestEntry::from_embedded(&file),
            Err(ManifestError::InvalidDigest { .. })
        ));
    }

    #[test]
    fn manifest_rejects_identifier_collision() {
        let mut manifest = Manifest::new();
        manifest
            .push(ManifestEntry::new("a-b", b"1".to_vec()).unwrap())
            .unwrap();
        let err = manifest
            .push(ManifestEntry::new("a.b", b"2".to_vec()).unwrap())
            .unwrap_err();
        match err {
            ManifestError::IdentifierCollision {
                identifier,
                first,
                second,
            } => {
                assert_eq!(identifier, "aB");
                assert_eq!(first, "a-b");
                assert_eq!(second, "a.b");
            }
            other => panic!("expected collision, got {other:?}"),
        }
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn manifest_rejects_identifiers_differing_only_in_case() {
        let mut manifest = Manifest::new();
        manifest
            .push(ManifestEntry::new("a/b", b"1".to_vec()).unwrap())
            .unwrap();
        let err = manifest
            .push(ManifestEntry::new("ab", b"2".to_vec()).unwrap())
            .unwrap_err();
        match err {
            ManifestError::IdentifierCollision {
                identifier,
                first,
                second,
            } => {
                assert_eq!(identifier, "ab");
                assert_eq!(first, "a/b");
                assert_eq!(second, "ab");
            }
            other => panic!("expected collision, got {other:?}"),
        }
        assert_eq!(manifest.len(), 1);
        assert!(manifest.get("ab").is_none());
    }

    #[test]
    fn embedded_table_with_edited_content_is_rejected() {
        let files = [EmbeddedFile {
            identifier: "hello",
            relative_path: "hello",
            content: b"edited payload",
            digest: HELLO_SHA256,
        }];
        match Manifest::from_embedded(&files) {
            Err(ManifestError::DigestMismatch { identifier }) => assert_eq!(identifier, "hello"),
            other => panic!("expected digest mismatch, got {other:?}"),
        }
    }

    #[test]
    fn manifest_lookup_by_identifier() {
        let files = [
            EmbeddedFile {
                identifier: "hello",
                relative_path: "hello",
                content: b"hello",
                digest: HELLO_SHA256,
            },
        ];
        let manifest = Manifest::from_embedded(&files).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("hello").unwrap().content(), b"hello");
        assert!(manifest.get("missing").is_none());
    }
}
