use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

/// Disk-backed store for progress photographs. Files are addressed by an
/// opaque name generated at upload time; nothing else in the system ever
/// inspects their contents.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let path = self.resolve(file_name)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("Failed to create upload directory")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(file_name, size = bytes.len(), "Stored progress photo");
        Ok(())
    }

    pub async fn load(&self, file_name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.resolve(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Join the name onto the store root, rejecting anything that could
    /// escape it. Names are server-generated, so a failure here means a
    /// hand-crafted request.
    fn resolve(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        if file_name.is_empty()
            || file_name.contains(['/', '\\'])
            || file_name == "."
            || file_name == ".."
        {
            bail!("Invalid file name: {file_name:?}");
        }
        Ok(self.root.join(file_name))
    }
}

/// Best-effort content type from the file extension; photos are uploaded
/// as JPEG or PNG in practice.
pub fn content_type_for(file_name: &str) -> &'static str {
    match Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_path_traversal() {
        let store = FileStore::new("uploads");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("a/b.jpg").is_err());
        assert!(store.resolve("..").is_err());
        assert!(store.resolve("").is_err());
    }

    #[test]
    fn test_resolve_accepts_plain_names() {
        let store = FileStore::new("uploads");
        assert!(store.resolve("2024-01-01_abc.jpg").is_ok());
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("pic.JPG"), "image/jpeg");
        assert_eq!(content_type_for("pic.png"), "image/png");
        assert_eq!(content_type_for("pic"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("sf-files-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir);

        store.save("photo.jpg", b"jpeg bytes").await.unwrap();
        let loaded = store.load("photo.jpg").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(&b"jpeg bytes"[..]));

        assert!(store.load("missing.jpg").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
