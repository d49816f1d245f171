//! # Artifact Store
//!
//! Materializes a job's base64 payload as a temporary file for the OS print
//! utility to read, and deletes it afterwards.
//!
//! ## Naming
//!
//! ```text
//! print_job_<job id>_<unix millis>_<8 hex>.pdf
//! ```
//!
//! The random suffix keeps rapid successive writes for the same job apart.
//! Characters outside `[A-Za-z0-9_-]` in the job id are replaced with `_`.
//!
//! ## Delayed Cleanup
//!
//! Some spoolers read the file after the print command has already returned.
//! With a non-zero cleanup delay the delete is deferred to a background task
//! instead of happening inline.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A payload written to disk for the duration of one print attempt.
///
/// Owned by a single dispatch; hand it back to [`ArtifactStore::remove`].
/// Dropped without being handed back (a cancelled request, a runtime
/// shutting down mid-print), it deletes its file synchronously.
#[derive(Debug, PartialEq, Eq)]
pub struct TempArtifact {
    /// Empty once ownership of the file has passed to `remove`
    path: PathBuf,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn release(&mut self) -> PathBuf {
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "deleted abandoned temp artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to delete temp artifact"),
        }
    }
}

/// Writes and deletes temporary print artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    cleanup_delay: Duration,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, cleanup_delay: Duration) -> Self {
        Self {
            dir: dir.into(),
            cleanup_delay,
        }
    }

    /// Store rooted in the system temporary directory.
    pub fn in_temp_dir(cleanup_delay: Duration) -> Self {
        Self::new(std::env::temp_dir(), cleanup_delay)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode `payload_base64` and write it to a fresh file.
    pub async fn write(&self, job_id: &str, payload_base64: &str) -> Result<TempArtifact> {
        let bytes = decode_payload(payload_base64)?;
        let path = self.dir.join(artifact_name(job_id));

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| BridgeError::Write(format!("cannot create {}: {}", path.display(), e)))?;

        // From here on the file is owned, so a cancelled write cleans up too.
        let artifact = TempArtifact { path };

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            return Err(BridgeError::Write(format!(
                "cannot write {}: {}",
                artifact.path().display(),
                e
            )));
        }

        debug!(path = %artifact.path().display(), bytes = bytes.len(), "wrote temp artifact");
        Ok(artifact)
    }

    /// Delete an artifact. Never fails: a missing file is ignored and any
    /// other filesystem error is logged.
    pub async fn remove(&self, mut artifact: TempArtifact) {
        let path = artifact.release();
        if self.cleanup_delay.is_zero() {
            remove_now(&path).await;
            return;
        }

        let delay = self.cleanup_delay;
        debug!(
            path = %path.display(),
            delay_ms = delay.as_millis() as u64,
            "deferring temp artifact removal"
        );
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            remove_now(&path).await;
        });
    }
}

async fn remove_now(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "deleted temp artifact"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to delete temp artifact"),
    }
}

/// Decode a payload, tolerating embedded whitespace and a `data:` URL prefix.
fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let payload = match payload.find(";base64,") {
        Some(idx) if payload.starts_with("data:") => &payload[idx + ";base64,".len()..],
        _ => payload,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| BridgeError::Write(format!("invalid base64 payload: {}", e)))?;
    if bytes.is_empty() {
        return Err(BridgeError::Write("document payload is empty".to_string()));
    }
    Ok(bytes)
}

fn artifact_name(job_id: &str) -> String {
    let id: String = job_id
        .chars()
        .take(64)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    format!(
        "print_job_{}_{}_{}.pdf",
        id,
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_BASE64: &str = "JVBERi0xLjQK";

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_write_decodes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        let artifact = store.write("42", PDF_BASE64).await.unwrap();

        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"%PDF-1.4\n");
        let name = artifact.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("print_job_42_"), "{}", name);
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_names_are_unique_and_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        let a = store.write("../../etc/x", PDF_BASE64).await.unwrap();
        let b = store.write("../../etc/x", PDF_BASE64).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(a.path().parent().unwrap(), dir.path());
        assert_eq!(files_in(dir.path()), 2);
    }

    #[tokio::test]
    async fn test_lenient_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        let artifact = store
            .write("1", "data:application/pdf;base64,JVBE\nRi0xLjQK")
            .await
            .unwrap();
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"%PDF-1.4\n");

        let unpadded = store.write("2", "JVBERi0").await.unwrap();
        assert_eq!(std::fs::read(unpadded.path()).unwrap(), b"%PDF-");
    }

    #[tokio::test]
    async fn test_bad_payload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        assert!(matches!(
            store.write("1", "JVBERi0...").await,
            Err(BridgeError::Write(_))
        ));
        assert!(matches!(store.write("1", "").await, Err(BridgeError::Write(_))));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("missing"), Duration::ZERO);

        let err = store.write("1", PDF_BASE64).await.unwrap_err();
        assert!(err.to_string().starts_with("write error:"));
    }

    #[tokio::test]
    async fn test_remove_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        let artifact = store.write("1", PDF_BASE64).await.unwrap();
        std::fs::remove_file(artifact.path()).unwrap();
        store.remove(artifact).await;

        let artifact = store.write("2", PDF_BASE64).await.unwrap();
        store.remove(artifact).await;
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_dropped_artifact_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::ZERO);

        let artifact = store.write("7", PDF_BASE64).await.unwrap();
        assert_eq!(files_in(dir.path()), 1);
        drop(artifact);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_delayed_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), Duration::from_millis(50));

        let artifact = store.write("1", PDF_BASE64).await.unwrap();
        let path = artifact.path().to_path_buf();
        store.remove(artifact).await;
        assert!(path.exists());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!path.exists());
    }
}
