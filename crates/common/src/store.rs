use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::fingerprint::Fingerprint;

const TEMP_EXTENSION: &str = "tmp";

#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    #[error("blob not found: {0}")]
    NotFound(Fingerprint),
    #[error("content store i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed blob storage for a single node.
///
/// Blobs live as one file per fingerprint directly under `dir`; the
///  directory listing is the only index. Two locks are involved:
///  - `blobs` serializes every write and removal on this store, and is
///    taken shared by reads and fresh existence probes
///  - `cache` guards the existence map and is never held across an await
///
/// The existence cache is unbounded and has no expiry. Entries are only
///  changed by this store's own mutations, so it stays authoritative as
///  long as nothing else touches `dir`.
#[derive(Debug)]
pub struct ContentStore {
    dir: PathBuf,
    blobs: RwLock<()>,
    cache: parking_lot::RwLock<HashMap<Fingerprint, bool>>,
}

impl ContentStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ContentStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened content store");
        Ok(Self {
            dir,
            blobs: RwLock::new(()),
            cache: parking_lot::RwLock::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `data` and return its fingerprint.
    ///
    /// Identical bytes always map to the same blob; a second call with
    ///  the same content does not rewrite it.
    pub async fn store(&self, data: &[u8]) -> Result<Fingerprint, ContentStoreError> {
        let fingerprint = Fingerprint::of(data);

        if self.cached(&fingerprint) == Some(true) {
            return Ok(fingerprint);
        }

        let _guard = self.blobs.write().await;
        let path = self.blob_path(&fingerprint);

        if fs::try_exists(&path).await? {
            self.set_cached(&fingerprint, true);
            return Ok(fingerprint);
        }

        persist(&path, data).await?;

        self.set_cached(&fingerprint, true);
        tracing::debug!(%fingerprint, size = data.len(), "stored blob");
        Ok(fingerprint)
    }

    /// Return the exact bytes stored under `fingerprint`.
    pub async fn retrieve(&self, fingerprint: &Fingerprint) -> Result<Bytes, ContentStoreError> {
        let _guard = self.blobs.read().await;
        match fs::read(self.blob_path(fingerprint)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ContentStoreError::NotFound(fingerprint.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the blob stored under `fingerprint`.
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), ContentStoreError> {
        let _guard = self.blobs.write().await;
        match fs::remove_file(self.blob_path(fingerprint)).await {
            Ok(()) => {
                self.set_cached(fingerprint, false);
                tracing::debug!(%fingerprint, "deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.set_cached(fingerprint, false);
                Err(ContentStoreError::NotFound(fingerprint.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read-through existence check.
    pub async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool, ContentStoreError> {
        if let Some(exists) = self.cached(fingerprint) {
            return Ok(exists);
        }

        // Hold the blob lock shared while probing and recording, so a
        //  concurrent store or delete cannot slip in between.
        let _guard = self.blobs.read().await;
        let exists = fs::try_exists(self.blob_path(fingerprint)).await?;
        self.set_cached(fingerprint, exists);
        Ok(exists)
    }

    /// Fingerprints of every blob currently on disk, sorted.
    ///  Temporary files and names that are not fingerprints are skipped.
    pub async fn fingerprints(&self) -> Result<Vec<Fingerprint>, ContentStoreError> {
        let _guard = self.blobs.read().await;
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut fingerprints = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(fingerprint) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<Fingerprint>().ok())
            {
                fingerprints.push(fingerprint);
            }
        }
        fingerprints.sort();
        Ok(fingerprints)
    }

    /// Number of entries currently held by the existence cache.
    pub fn cached_entries(&self) -> usize {
        self.cache.read().len()
    }

    fn blob_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.as_str())
    }

    fn cached(&self, fingerprint: &Fingerprint) -> Option<bool> {
        self.cache.read().get(fingerprint).copied()
    }

    fn set_cached(&self, fingerprint: &Fingerprint, exists: bool) {
        self.cache.write().insert(fingerprint.clone(), exists);
    }
}

/// Write `data` to a temporary sibling of `path`, then rename it into
///  place so a blob name never points at partial content. The temporary
///  file is removed if either step fails.
async fn persist(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = path.with_extension(TEMP_EXTENSION);
    let result = match write_file(&temp_path, data).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    fn setup() -> (ContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::open(temp_dir.path().join("blobs")).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (store, _temp) = setup();

        let fingerprint = store.store(b"hello").await.unwrap();
        assert_eq!(fingerprint, Fingerprint::of(b"hello"));

        let data = store.retrieve(&fingerprint).await.unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn test_empty_blob_round_trips() {
        let (store, _temp) = setup();

        let fingerprint = store.store(b"").await.unwrap();
        let data = store.retrieve(&fingerprint).await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_store_is_idempotent() {
        let (store, _temp) = setup();

        let first = store.store(b"same bytes").await.unwrap();
        let path = store.blob_path(&first);
        let written_at = std::fs::metadata(&path).unwrap().modified().unwrap();

        let second = store.store(b"same bytes").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.fingerprints().await.unwrap(), vec![first]);
        assert_eq!(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
            written_at
        );
    }

    #[tokio::test]
    async fn test_dedup_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("blobs");

        let fingerprint = ContentStore::open(&dir)
            .unwrap()
            .store(b"persisted")
            .await
            .unwrap();

        // A fresh instance has an empty cache and must find the blob on disk.
        let reopened = ContentStore::open(&dir).unwrap();
        assert_eq!(reopened.cached_entries(), 0);
        assert!(reopened.exists(&fingerprint).await.unwrap());
        assert_eq!(reopened.store(b"persisted").await.unwrap(), fingerprint);
        assert_eq!(reopened.fingerprints().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_missing() {
        let (store, _temp) = setup();

        let fingerprint = Fingerprint::of(b"never stored");
        match store.retrieve(&fingerprint).await {
            Err(ContentStoreError::NotFound(missing)) => assert_eq!(missing, fingerprint),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exists_lifecycle() {
        let (store, _temp) = setup();
        let fingerprint = Fingerprint::of(b"lifecycle");

        assert!(!store.exists(&fingerprint).await.unwrap());

        store.store(b"lifecycle").await.unwrap();
        assert!(store.exists(&fingerprint).await.unwrap());

        store.delete(&fingerprint).await.unwrap();
        assert!(!store.exists(&fingerprint).await.unwrap());

        // A second instance has no cache; its disk probe must agree.
        let probe = ContentStore::open(store.dir()).unwrap();
        assert!(!probe.exists(&fingerprint).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_populates_cache() {
        let (store, _temp) = setup();
        let fingerprint = Fingerprint::of(b"cached");

        assert_eq!(store.cached_entries(), 0);
        assert!(!store.exists(&fingerprint).await.unwrap());
        assert_eq!(store.cached_entries(), 1);

        // store must not trust a cached `false`
        store.store(b"cached").await.unwrap();
        assert!(store.exists(&fingerprint).await.unwrap());
        assert_eq!(store.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let (store, _temp) = setup();
        let fingerprint = Fingerprint::of(b"ghost");

        assert!(matches!(
            store.delete(&fingerprint).await,
            Err(ContentStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_after_delete_rewrites() {
        let (store, _temp) = setup();

        let fingerprint = store.store(b"again").await.unwrap();
        store.delete(&fingerprint).await.unwrap();
        assert!(store.retrieve(&fingerprint).await.is_err());

        store.store(b"again").await.unwrap();
        assert_eq!(&store.retrieve(&fingerprint).await.unwrap()[..], b"again");
    }

    #[tokio::test]
    async fn test_store_into_missing_dir_is_io_error() {
        let (store, _temp) = setup();
        std::fs::remove_dir_all(store.dir()).unwrap();

        assert!(matches!(
            store.store(b"x").await,
            Err(ContentStoreError::Io(_))
        ));
        // a failed write is not remembered as present
        assert_eq!(store.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_unreadable_blob_is_io_error() {
        let (store, _temp) = setup();
        let fingerprint = Fingerprint::of(b"x");
        std::fs::create_dir(store.blob_path(&fingerprint)).unwrap();

        assert!(matches!(
            store.retrieve(&fingerprint).await,
            Err(ContentStoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let (store, _temp) = setup();
        let path = store.blob_path(&Fingerprint::of(b"x"));
        // a file cannot be renamed over a non-empty directory
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"y").unwrap();

        assert!(persist(&path, b"x").await.is_err());
        assert!(!path.with_extension(TEMP_EXTENSION).exists());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_fingerprints_skips_foreign_files() {
        let (store, _temp) = setup();

        let fingerprint = store.store(b"indexed").await.unwrap();
        std::fs::write(store.dir().join("notes.txt"), b"x").unwrap();
        std::fs::write(
            store.dir().join(format!("{}.{}", Fingerprint::of(b"y"), TEMP_EXTENSION)),
            b"y",
        )
        .unwrap();

        assert_eq!(store.fingerprints().await.unwrap(), vec![fingerprint]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_stores() {
        let (store, _temp) = setup();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let data = format!("blob number {}", i).into_bytes();
                    let fingerprint = store.store(&data).await.unwrap();
                    (fingerprint, data)
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let mut fingerprints: Vec<_> = results.iter().map(|(f, _)| f.clone()).collect();
        fingerprints.sort();
        fingerprints.dedup();
        assert_eq!(fingerprints.len(), 32);

        for (fingerprint, data) in results {
            assert_eq!(store.retrieve(&fingerprint).await.unwrap().to_vec(), data);
        }
        assert_eq!(store.fingerprints().await.unwrap().len(), 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_identical_stores() {
        let (store, _temp) = setup();
        let store = Arc::new(store);
        let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let data = data.clone();
                tokio::spawn(async move { store.store(&data).await.unwrap() })
            })
            .collect();

        let results = futures::future::join_all(handles).await;
        let expected = Fingerprint::of(&data);
        for result in results {
            assert_eq!(result.unwrap(), expected);
        }

        assert_eq!(store.fingerprints().await.unwrap(), vec![expected.clone()]);
        assert_eq!(store.retrieve(&expected).await.unwrap().to_vec(), data);
    }
}
