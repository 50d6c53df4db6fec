//! Envelope constants for saved circuits.

pub const MAGIC: &str = "KEXR";

/// Current envelope version. Older files are rejected rather than migrated.
pub const FILE_VERSION: u32 = 1;
