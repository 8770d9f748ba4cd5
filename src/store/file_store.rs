//! File-backed cache of truncated trusted hashes.
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tokio::task;
use tracing::{debug, info};

use crate::{
    checkpoints::mainnet_genesis_seed,
    config::TRUNCATED_HASH_LEN,
    error::{Error, Result},
    hash::TruncatedHash,
};

/// Ordered trusted hashes (oldest first) mirrored to a flat file.
///
/// File layout: `len / 16` records back to back. Any other length is corrupt.
pub struct HashCache {
    path: PathBuf,
    hashes: Vec<TruncatedHash>,
}

impl HashCache {
    /// Open `path`, seeding it with the mainnet genesis record if it is
    /// missing or empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let seed = mainnet_genesis_seed()?;
        Self::open_with_seed(path, seed)
    }

    /// Open `path`, seeding a missing/empty file with `seed`.
    pub fn open_with_seed(path: impl Into<PathBuf>, seed: TruncatedHash) -> Result<Self> {
        let path = path.into();
        let len = match fs::metadata(&path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(Error::storage(&path, e)),
        };

        if len == 0 {
            let hashes = vec![seed];
            write_records(&path, &hashes).map_err(|e| Error::storage(&path, e))?;
            debug!(path = %path.display(), %seed, "seeded empty hash cache");
            return Ok(Self { path, hashes });
        }

        if len % TRUNCATED_HASH_LEN as u64 != 0 {
            return Err(Error::storage(
                &path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("length {len} is not a multiple of {TRUNCATED_HASH_LEN}"),
                ),
            ));
        }

        let data = fs::read(&path).map_err(|e| Error::storage(&path, e))?;
        let hashes: Vec<TruncatedHash> = data
            .chunks_exact(TRUNCATED_HASH_LEN)
            .filter_map(TruncatedHash::from_slice)
            .collect();
        debug!(path = %path.display(), records = hashes.len(), "loaded hash cache");
        Ok(Self { path, hashes })
    }

    /// Replace the whole list with the first `cap` of `new_hashes`.
    ///
    /// The file is rewritten first; memory is only swapped once the write
    /// succeeded, so a failed rewrite leaves the old view in place.
    pub async fn replace(&mut self, mut new_hashes: Vec<TruncatedHash>, cap: usize) -> Result<()> {
        new_hashes.truncate(cap);
        let path = self.path.clone();
        let hashes = task::spawn_blocking(move || {
            write_records(&path, &new_hashes)
                .map(|()| new_hashes)
                .map_err(|e| Error::storage(&path, e))
        })
        .await
        .map_err(|e| Error::storage(&self.path, io::Error::other(e)))??;

        info!(path = %self.path.display(), records = hashes.len(), "replaced trusted hash cache");
        self.hashes = hashes;
        Ok(())
    }

    /// Read-only view of the records, oldest first.
    pub fn get(&self) -> &[TruncatedHash] {
        &self.hashes
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True if no records are held (only after a sync returned nothing).
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sibling file the new records are staged in before the rename.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `hashes` to a staging file, flush and sync it, then rename it over
/// `path`. The target holds either the old or the new records, never a
/// partial rewrite.
fn write_records(path: &Path, hashes: &[TruncatedHash]) -> io::Result<()> {
    let tmp = staging_path(path);
    let written = write_file(&tmp, hashes).and_then(|()| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_file(path: &Path, hashes: &[TruncatedHash]) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for h in hashes {
        w.write_all(h.as_bytes())?;
    }
    w.flush()?;
    w.into_inner().map_err(|e| e.into_error())?.sync_all()
}
