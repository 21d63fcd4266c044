//! Identity hashing of local game images
//!
//! A provider's hash library maps MD5 digests of ROM/disc images to catalog
//! game ids. Different platforms hash different slices of the file, so each
//! image is tried against a fixed sequence of [`HashTransform`]s.
//!
//! **Algorithm:**
//! 1. Reject files above [`MAX_HASHABLE_FILE_SIZE`] before reading
//! 2. Read the file once
//! 3. Apply each transform (pure slice of the bytes) in [`TRIAL_ORDER`]
//! 4. MD5 the slice, lowercase hex
//!
//! All functions here are blocking; callers run them on the blocking pool.

pub mod archive;

use crate::catalog::ContentHashTable;
use crate::types::FetchError;
use md5::{Digest, Md5};
use std::borrow::Cow;
use std::path::Path;

/// Images larger than this are never hashed
pub const MAX_HASHABLE_FILE_SIZE: u64 = 800_000_000;

const COPIER_HEADER_LEN: usize = 512;
const BOOT_SECTOR_LEN: usize = 512;
const INES_HEADER_LEN: usize = 16;
const NES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
const FDS_MAGIC: [u8; 4] = [0x46, 0x44, 0x53, 0x1A];

/// Byte selection applied before digesting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashTransform {
    /// Whole file
    Generic,
    /// SNES: drop a 512-byte copier header when the file is longer than that
    CartridgeHeader,
    /// NES: drop the 16-byte iNES header when the magic is present
    NesHeader,
    /// Arcade: ASCII bytes of the file stem
    FileName,
    /// Famicom Disk System: drop the 16-byte fwNES header when the magic is present
    FdsHeader,
    /// Sega CD / Saturn: first 512 bytes only
    BootSector,
}

/// Trial sequence used by the resolver
pub const TRIAL_ORDER: [HashTransform; 6] = [
    HashTransform::Generic,
    HashTransform::CartridgeHeader,
    HashTransform::NesHeader,
    HashTransform::FileName,
    HashTransform::FdsHeader,
    HashTransform::BootSector,
];

impl HashTransform {
    pub fn label(self) -> &'static str {
        match self {
            HashTransform::Generic => "generic",
            HashTransform::CartridgeHeader => "snes",
            HashTransform::NesHeader => "nes",
            HashTransform::FileName => "arcade",
            HashTransform::FdsHeader => "famicom",
            HashTransform::BootSector => "sega_cd_saturn",
        }
    }

    /// Select the bytes to digest
    ///
    /// `stem` is the file name without extension, used by [`HashTransform::FileName`].
    pub fn apply<'a>(self, bytes: &'a [u8], stem: &str) -> Cow<'a, [u8]> {
        match self {
            HashTransform::Generic => Cow::Borrowed(bytes),
            HashTransform::CartridgeHeader => {
                if bytes.len() > COPIER_HEADER_LEN {
                    Cow::Borrowed(&bytes[COPIER_HEADER_LEN..])
                } else {
                    Cow::Borrowed(bytes)
                }
            }
            HashTransform::NesHeader => Cow::Borrowed(strip_magic_header(bytes, &NES_MAGIC)),
            HashTransform::FdsHeader => Cow::Borrowed(strip_magic_header(bytes, &FDS_MAGIC)),
            HashTransform::BootSector => Cow::Borrowed(&bytes[..bytes.len().min(BOOT_SECTOR_LEN)]),
            HashTransform::FileName => Cow::Owned(ascii_bytes(stem)),
        }
    }
}

impl std::fmt::Display for HashTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn strip_magic_header<'a>(bytes: &'a [u8], magic: &[u8; 4]) -> &'a [u8] {
    if bytes.len() >= INES_HEADER_LEN && bytes.starts_with(magic) {
        &bytes[INES_HEADER_LEN..]
    } else {
        bytes
    }
}

/// Non-ASCII characters become `?`
fn ascii_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }).collect()
}

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// Digest of already loaded bytes
pub fn identity_hash(bytes: &[u8], stem: &str, transform: HashTransform) -> String {
    md5_hex(&transform.apply(bytes, stem))
}

/// Read a file for hashing, enforcing the size limit
pub fn read_hashable(path: &Path) -> Result<Vec<u8>, FetchError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FetchError::FileUnavailable(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(FetchError::FileUnavailable(format!("{}: not a regular file", path.display())));
    }
    if metadata.len() > MAX_HASHABLE_FILE_SIZE {
        return Err(FetchError::FileUnavailable(format!(
            "{}: {} bytes exceeds hashing limit",
            path.display(),
            metadata.len()
        )));
    }
    std::fs::read(path).map_err(|e| FetchError::FileUnavailable(format!("{}: {}", path.display(), e)))
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Hash one file with one transform
///
/// Returns an empty string when the file cannot be hashed; the failure is logged.
pub fn compute_identity_hash(path: &Path, transform: HashTransform) -> String {
    match read_hashable(path) {
        Ok(bytes) => identity_hash(&bytes, &file_stem(path), transform),
        Err(e) => {
            tracing::warn!(path = %path.display(), transform = %transform, error = %e, "Identity hash failed");
            String::new()
        }
    }
}

/// Every transform's digest, in trial order
pub fn compute_all(path: &Path) -> Result<Vec<(HashTransform, String)>, FetchError> {
    let bytes = read_hashable(path)?;
    let stem = file_stem(path);
    Ok(TRIAL_ORDER
        .iter()
        .map(|&t| (t, identity_hash(&bytes, &stem, t)))
        .collect())
}

/// First transform whose digest is present in `table`
///
/// Digests are computed lazily; later transforms are skipped after a hit.
pub fn first_match(path: &Path, table: &ContentHashTable) -> Result<Option<(HashTransform, u32)>, FetchError> {
    let bytes = read_hashable(path)?;
    let stem = file_stem(path);

    for transform in TRIAL_ORDER {
        let digest = identity_hash(&bytes, &stem, transform);
        match table.lookup(&digest) {
            Some(id) => {
                tracing::info!(path = %path.display(), transform = %transform, hash = %digest, id, "Hash match");
                return Ok(Some((transform, id)));
            }
            None => {
                tracing::debug!(path = %path.display(), transform = %transform, hash = %digest, "No hash match");
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContentHashEntry;
    use tempfile::TempDir;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn test_md5_known_vectors() {
        assert_eq!(md5_hex(b""), EMPTY_MD5);
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_hash_is_deterministic() {
        let bytes: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        for transform in TRIAL_ORDER {
            assert_eq!(
                identity_hash(&bytes, "game", transform),
                identity_hash(&bytes, "game", transform)
            );
        }
    }

    #[test]
    fn test_cartridge_header_not_stripped_at_512() {
        let bytes = vec![7u8; 512];
        assert_eq!(
            identity_hash(&bytes, "x", HashTransform::CartridgeHeader),
            identity_hash(&bytes, "x", HashTransform::Generic)
        );
    }

    #[test]
    fn test_cartridge_header_stripped_above_512() {
        let mut bytes = vec![0u8; 512];
        bytes.extend_from_slice(b"payload");
        assert_eq!(HashTransform::CartridgeHeader.apply(&bytes, "x").as_ref(), b"payload");
    }

    #[test]
    fn test_nes_header() {
        let mut bytes = NES_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 12]);
        bytes.extend_from_slice(b"prg");
        assert_eq!(HashTransform::NesHeader.apply(&bytes, "x").as_ref(), b"prg");

        let plain = b"no header here".to_vec();
        assert_eq!(HashTransform::NesHeader.apply(&plain, "x").as_ref(), plain.as_slice());
    }

    #[test]
    fn test_fds_header() {
        let mut bytes = FDS_MAGIC.to_vec();
        bytes.extend_from_slice(&[1u8; 12]);
        bytes.extend_from_slice(b"disk");
        assert_eq!(HashTransform::FdsHeader.apply(&bytes, "x").as_ref(), b"disk");
        // NES magic is not FDS magic
        assert_eq!(HashTransform::NesHeader.apply(&bytes, "x").as_ref(), bytes.as_slice());
    }

    #[test]
    fn test_boot_sector() {
        let bytes: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        assert_eq!(HashTransform::BootSector.apply(&bytes, "x").len(), 512);

        let short = vec![3u8; 100];
        assert_eq!(HashTransform::BootSector.apply(&short, "x").as_ref(), short.as_slice());
    }

    #[test]
    fn test_file_name_transform() {
        assert_eq!(identity_hash(b"ignored", "abc", HashTransform::FileName), md5_hex(b"abc"));
        assert_eq!(HashTransform::FileName.apply(b"", "sf2é").as_ref(), b"sf2?");
    }

    #[test]
    fn test_compute_identity_hash_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(compute_identity_hash(&dir.path().join("nope.sfc"), HashTransform::Generic), "");
    }

    #[test]
    fn test_compute_all_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mslug.zip.bin");
        std::fs::write(&path, b"data").unwrap();

        let all = compute_all(&path).unwrap();
        let order: Vec<_> = all.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, TRIAL_ORDER.to_vec());
        assert_eq!(all[3].1, md5_hex(b"mslug.zip"));
    }

    #[test]
    fn test_first_match_prefers_earlier_transform() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.sfc");
        let mut bytes = vec![0u8; 512];
        bytes.extend_from_slice(b"rom body");
        std::fs::write(&path, &bytes).unwrap();

        let table = ContentHashTable::new(vec![
            ContentHashEntry { hash: md5_hex(&bytes[..512]), catalog_game_id: 99 },
            ContentHashEntry { hash: md5_hex(b"rom body").to_uppercase(), catalog_game_id: 42 },
        ]);
        assert_eq!(
            first_match(&path, &table).unwrap(),
            Some((HashTransform::CartridgeHeader, 42))
        );
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("disc.iso");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_HASHABLE_FILE_SIZE + 1).unwrap();

        let err = read_hashable(&path).unwrap_err();
        assert!(err.to_string().contains("exceeds hashing limit"));
        assert_eq!(compute_identity_hash(&path, HashTransform::Generic), "");
    }

    #[test]
    fn test_first_match_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game.bin");
        std::fs::write(&path, b"unknown").unwrap();
        let table = ContentHashTable::new(vec![]);
        assert_eq!(first_match(&path, &table).unwrap(), None);
    }
}
