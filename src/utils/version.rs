//! Host runtime version reporting.
//!
//! Native backends receive the version of the host runtime in the `lv`
//! entry of `vwo_meta`, always normalized to `major.minor.patch`.

use std::fmt;

/// Parsed semantic version components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Maximum allowed value for version components.
const MAX_VERSION_COMPONENT: u32 = 999_999_999;

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse a semantic version string into numeric components.
///
/// ```
/// use fme_bridge::utils::version::parse_version;
///
/// let v = parse_version("v0.76.5-rc.1").unwrap();
/// assert_eq!(v.to_string(), "0.76.5");
/// assert!(parse_version("0.76").is_none());
/// ```
pub fn parse_version(version: &str) -> Option<ParsedVersion> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let parts: Vec<&str> = normalized.split('.').collect();
    if parts.len() < 3 {
        return None;
    }

    let component = |raw: &str| -> Option<u32> {
        let value = raw.parse::<u32>().ok()?;
        (value <= MAX_VERSION_COMPONENT).then_some(value)
    };

    // Patch might carry a pre-release suffix ("5-rc") or build metadata ("5+abc")
    let patch = parts[2]
        .split(['-', '+'])
        .next()
        .unwrap_or(parts[2]);

    Some(ParsedVersion {
        major: component(parts[0])?,
        minor: component(parts[1])?,
        patch: component(patch)?,
    })
}

/// The host runtime this bridge is embedded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRuntime {
    raw: String,
    version: Option<ParsedVersion>,
}

impl HostRuntime {
    /// Build from a version string; unparseable versions are kept for
    /// diagnostics but not reported to the backend.
    pub fn new(version: impl Into<String>) -> Self {
        let raw = version.into();
        let version = parse_version(&raw);
        Self { raw, version }
    }

    /// Build from numeric components, as host runtimes usually expose them.
    pub fn from_parts(major: u32, minor: u32, patch: u32) -> Self {
        let version = ParsedVersion {
            major,
            minor,
            patch,
        };
        Self {
            raw: version.to_string(),
            version: Some(version),
        }
    }

    /// A runtime with no version information.
    pub fn unknown() -> Self {
        Self {
            raw: String::new(),
            version: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn version(&self) -> Option<ParsedVersion> {
        self.version
    }

    /// The normalized version string forwarded in `vwo_meta`.
    pub fn meta_version(&self) -> Option<String> {
        self.version.map(|v| v.to_string())
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new(crate::SDK_VERSION)
    }
}
