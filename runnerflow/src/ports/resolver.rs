//! Resolution of server-side paths to byte content.

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// Resolves a server-side logical path to its content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Reads the content behind `path`.
    async fn resolve(&self, path: &str) -> anyhow::Result<Bytes>;
}

/// Resolves relative paths under a root directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileResolver {
    root: PathBuf,
}

impl LocalFileResolver {
    /// Creates a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    bail!("path '{path}' escapes the resolver root");
                }
            }
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileResolver for LocalFileResolver {
    async fn resolve(&self, path: &str) -> anyhow::Result<Bytes> {
        let full = self.locate(path)?;
        let data = tokio::fs::read(&full)
            .await
            .with_context(|| format!("open {path}"))?;
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_resolves_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("tests")).unwrap();
        std::fs::write(dir.path().join("tests/sum.txt"), b"1 2 3").unwrap();

        let resolver = LocalFileResolver::new(dir.path());
        let data = resolver.resolve("tests/sum.txt").await.unwrap();

        assert_eq!(data.as_ref(), b"1 2 3");
    }

    #[tokio::test]
    async fn test_missing_file_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LocalFileResolver::new(dir.path());

        let err = resolver.resolve("nope.txt").await.unwrap_err();

        assert!(format!("{err:#}").starts_with("open nope.txt: "));
    }

    #[tokio::test]
    async fn test_rejects_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = LocalFileResolver::new(dir.path().join("inner"));

        let err = resolver.resolve("../secret").await.unwrap_err();

        assert!(err.to_string().contains("escapes the resolver root"));
    }

    #[tokio::test]
    async fn test_rejects_absolute_paths() {
        let resolver = LocalFileResolver::new("/srv/files");
        assert!(resolver.resolve("/etc/passwd").await.is_err());
    }
}
