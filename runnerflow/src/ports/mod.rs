//! Collaborator ports consumed by stages.
//!
//! Stages receive only the ports they need. Each port has a default
//! implementation; services can inject their own.

mod archive;
mod resolver;

pub use archive::{ArchiveBuilder, TarArchiveBuilder};
pub use resolver::{FileResolver, LocalFileResolver};

#[cfg(test)]
pub use resolver::MockFileResolver;
