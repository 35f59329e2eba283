//! Wrapping an upload into a single-entry archive.

use crate::context::UploadedFile;
use anyhow::{bail, Context};
use bytes::Bytes;
use std::fmt::Debug;

/// Builds an archive holding one uploaded file under a given entry name.
pub trait ArchiveBuilder: Send + Sync + Debug {
    /// Returns the archive bytes.
    fn build(&self, file: &UploadedFile, entry_name: &str) -> anyhow::Result<Bytes>;
}

/// Writes a ustar archive with the `tar` crate.
#[derive(Debug, Clone, Copy)]
pub struct TarArchiveBuilder {
    mode: u32,
}

impl Default for TarArchiveBuilder {
    fn default() -> Self {
        Self { mode: 0o644 }
    }
}

impl TarArchiveBuilder {
    /// Creates a builder writing entries with mode 0644.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the permission bits of the archived entry.
    #[must_use]
    pub const fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

impl ArchiveBuilder for TarArchiveBuilder {
    fn build(&self, file: &UploadedFile, entry_name: &str) -> anyhow::Result<Bytes> {
        if entry_name.is_empty() {
            bail!("archive entry name is empty");
        }

        let mut header = tar::Header::new_ustar();
        header.set_size(file.size() as u64);
        header.set_mode(self.mode);
        header.set_mtime(u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default());

        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append_data(&mut header, entry_name, file.bytes().as_ref())
            .with_context(|| format!("write tar header for {entry_name}"))?;
        let data = builder.into_inner().context("finish tar archive")?;

        Ok(Bytes::from(data))
    }
}
