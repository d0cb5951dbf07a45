//! Vendor:library:name:version identity tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity tag carried by cores and bus interfaces.
///
/// Serializes as `{"vendor", "library", "name", "version": [major, minor]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vlnv {
    pub vendor: String,
    pub library: String,
    pub name: String,
    pub version: (u32, u32),
}

/// A VLNV string that does not have four `:`-separated fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed VLNV '{0}': expected vendor:library:name:major.minor")]
pub struct VlnvParseError(pub String);

impl Vlnv {
    pub fn new(
        vendor: impl Into<String>,
        library: impl Into<String>,
        name: impl Into<String>,
        version: (u32, u32),
    ) -> Self {
        Self {
            vendor: vendor.into(),
            library: library.into(),
            name: name.into(),
            version,
        }
    }
}

impl FromStr for Vlnv {
    type Err = VlnvParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        let [vendor, library, name, version] = fields.as_slice() else {
            return Err(VlnvParseError(s.to_string()));
        };

        // Vivado writes "1.0", occasionally a bare "1"
        let (major, minor) = version.split_once('.').unwrap_or((*version, "0"));
        let major = major.parse().map_err(|_| VlnvParseError(s.to_string()))?;
        let minor = minor.parse().map_err(|_| VlnvParseError(s.to_string()))?;

        Ok(Self::new(*vendor, *library, *name, (major, minor)))
    }
}

impl fmt::Display for Vlnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}.{}",
            self.vendor, self.library, self.name, self.version.0, self.version.1
        )
    }
}
