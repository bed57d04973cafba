//! File system access used by the config locator, loader and writer

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Asynchronous file access
///
/// Not-found is reported as `Ok(false)` / `Ok(None)`; every other failure is
/// an error.
#[async_trait]
pub trait ConfigFs: Send + Sync {
    async fn is_file(&self, path: &Path) -> io::Result<bool>;

    async fn read_to_string(&self, path: &Path) -> io::Result<Option<String>>;

    /// Write `contents`, creating missing parent directories
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// [`ConfigFs`] backed by `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFs;

#[async_trait]
impl ConfigFs for TokioFs {
    async fn is_file(&self, path: &Path) -> io::Result<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFs;
        let path = dir.path().join("cspell.json");

        assert!(!fs.is_file(&path).await.unwrap());
        assert_eq!(fs.read_to_string(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFs;
        let path = dir.path().join(".vscode").join("cspell.json");

        fs.write(&path, "{}").await.unwrap();

        assert!(fs.is_file(&path).await.unwrap());
        assert!(!fs.is_file(dir.path()).await.unwrap());
        assert_eq!(fs.read_to_string(&path).await.unwrap().as_deref(), Some("{}"));
    }
}
