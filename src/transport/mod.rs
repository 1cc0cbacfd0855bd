/// Filesystem listing and metadata helpers.
pub mod fs;
