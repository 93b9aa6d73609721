//! Unified byte-level file access for local paths, S3 URIs, and in-memory
//! test files.
//!
//! Everything this engine reads or writes (configuration, CSV tables, engine
//! snapshots, result files) is a whole file, so the surface here is
//! deliberately small: resolve a path string to an object store, then get or
//! put bytes. S3 stores are cached per (bucket, anonymous) pair because store
//! creation involves credential fetching; the in-memory store backs
//! `memory://` paths so tests never touch disk.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{aws::AmazonS3Builder, local::LocalFileSystem, ObjectStore, PutPayload};
use once_cell::sync::Lazy;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cache key for S3 stores that distinguishes authenticated from anonymous
/// access.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct S3CacheKey {
    bucket: String,
    anonymous: bool,
}

/// Global cache of S3 stores keyed by (bucket, anonymous).
///
/// Credentials resolve through the AWS provider chain (`from_env`), which
/// refreshes IAM role / ECS / EKS / SSO credentials transparently, so cached
/// stores stay valid.
static S3_STORE_CACHE: Lazy<DashMap<S3CacheKey, Arc<dyn ObjectStore>>> = Lazy::new(DashMap::new);

/// Global in-memory object store backing the `memory://` protocol.
static MEMORY_STORE: Lazy<Arc<InMemory>> = Lazy::new(|| Arc::new(InMemory::new()));

/// Registers a file in memory storage for use with `memory://` paths.
///
/// # Arguments
///
/// * `path` - Full path including the `memory://` prefix
/// * `data` - File contents
pub async fn register_memory_file(path: &str, data: Bytes) -> Result<(), BoxError> {
    let obj_path = ObjectPath::from(normalize_memory_path(path));
    MEMORY_STORE.put(&obj_path, PutPayload::from_bytes(data)).await?;
    Ok(())
}

/// Strips the `memory://` protocol prefix.
fn normalize_memory_path(path: &str) -> String {
    path.strip_prefix("memory://").unwrap_or(path).to_string()
}

/// Gets or creates a cached S3 store for the given bucket.
fn get_cached_s3_store(bucket: &str, anonymous: bool) -> Result<Arc<dyn ObjectStore>, BoxError> {
    let cache_key = S3CacheKey {
        bucket: bucket.to_string(),
        anonymous,
    };
    let entry = S3_STORE_CACHE.entry(cache_key);
    let store = entry.or_try_insert_with(|| create_s3_store(bucket, anonymous))?;
    Ok(Arc::clone(store.value()))
}

/// Creates an S3 store for a bucket, optionally with unsigned requests for
/// public buckets.
fn create_s3_store(bucket: &str, anonymous: bool) -> Result<Arc<dyn ObjectStore>, BoxError> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
    if anonymous {
        builder = builder.with_skip_signature(true);
    }
    Ok(Arc::new(builder.build()?))
}

/// Resolves a path string to an object store and an in-store path.
///
/// # Supported Path Formats
///
/// * **Memory**: `memory://path/to/file` (testing)
/// * **S3**: `s3://bucket/key`, with `?anon=true` for public buckets
/// * **Local**: absolute or relative filesystem paths
///
/// # Errors
///
/// Returns an error for malformed S3 URLs, credential failures on first
/// access to a bucket, or an unresolvable current directory for relative
/// paths.
pub async fn get_object_store(file_path: &str) -> Result<(Arc<dyn ObjectStore>, ObjectPath), BoxError> {
    if file_path.starts_with("memory://") {
        let store = Arc::clone(&MEMORY_STORE) as Arc<dyn ObjectStore>;
        let path = ObjectPath::from(normalize_memory_path(file_path));
        Ok((store, path))
    } else if file_path.starts_with("s3://") {
        let url = Url::parse(file_path)?;
        let bucket = url.host_str().ok_or("Invalid S3 URL - no bucket specified")?;
        let key = url.path().trim_start_matches('/');

        let anonymous = url
            .query_pairs()
            .any(|(k, v)| k == "anon" && (v == "true" || v == "1"));

        let store = get_cached_s3_store(bucket, anonymous)?;
        Ok((store, ObjectPath::from(key)))
    } else {
        use std::path::Path as StdPath;

        let std_path = StdPath::new(file_path);
        let absolute_path = if std_path.is_absolute() {
            std_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(std_path)
        };

        #[cfg(windows)]
        let (root, relative) = {
            let path_str = absolute_path.to_string_lossy();
            if let Some(pos) = path_str.find(":\\") {
                let root = format!("{}:\\", &path_str[..pos]);
                let relative = path_str[pos + 2..].trim_start_matches('\\').replace('\\', "/");
                (root, relative)
            } else {
                return Err("Invalid Windows path".into());
            }
        };

        #[cfg(not(windows))]
        let (root, relative) = {
            let path_str = absolute_path.to_string_lossy();
            ("/".to_string(), path_str.trim_start_matches('/').to_string())
        };

        let local_store = LocalFileSystem::new_with_prefix(root)?;
        let store: Arc<dyn ObjectStore> = Arc::new(local_store);
        Ok((store, ObjectPath::from(relative)))
    }
}

/// Reads a whole file into memory.
pub async fn read_bytes(file_path: &str) -> Result<Bytes, BoxError> {
    let (store, path) = get_object_store(file_path).await?;
    let result = store.get(&path).await?;
    Ok(result.bytes().await?)
}

/// Writes a whole file, replacing any previous contents.
///
/// Local directories in the path are created by the underlying store as
/// needed.
pub async fn write_bytes(file_path: &str, data: Bytes) -> Result<(), BoxError> {
    let (store, path) = get_object_store(file_path).await?;
    store.put(&path, PutPayload::from_bytes(data)).await?;
    Ok(())
}
