//! Utility modules for the bridge.

pub mod version;

pub use version::{parse_version, HostRuntime, ParsedVersion};
