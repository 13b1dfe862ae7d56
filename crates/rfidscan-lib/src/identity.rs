//! Reader identity: vendor and product strings, serial number, firmware version.

use std::fmt;

use serde::Serialize;

use crate::ops;
use crate::transport::{HidHandle, HidTransport, Result};

/// Decoded firmware version string.
///
/// The reader reports ten digits `PPppLLllBB`: product version, SpringProx
/// library version and build number, two digits per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub product: String,
    pub library: String,
    pub build: String,
}

impl VersionInfo {
    /// Decode a ten-character version string. Other lengths are not decoded.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 10 || !raw.is_ascii() {
            return None;
        }
        let trim = |s: &str| s.strip_prefix('0').unwrap_or(s).to_string();
        Some(VersionInfo {
            product: format!("{}.{}", trim(&raw[0..2]), &raw[2..4]),
            library: format!("{}.{}", trim(&raw[4..6]), &raw[6..8]),
            build: trim(&raw[8..10]),
        })
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (SpringProx LIB {}, build {})",
            self.product, self.library, self.build
        )
    }
}

/// Everything the reader says about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub vendor: String,
    pub product: String,
    pub serial: String,
    /// Version string exactly as reported.
    pub version: String,
    /// Decoded form of `version`, when it has the usual shape.
    pub decoded: Option<VersionInfo>,
}

impl Identity {
    /// Human-readable version: decoded if possible, raw otherwise.
    pub fn version_display(&self) -> String {
        match &self.decoded {
            Some(v) => v.to_string(),
            None => self.version.clone(),
        }
    }
}

/// Query vendor, product, serial and version in that order.
///
/// Stops at the first failing request.
pub fn read_identity(transport: &impl HidTransport, handle: HidHandle) -> Result<Identity> {
    let vendor = ops::vendor_name(transport, handle)?;
    let product = ops::product_name(transport, handle)?;
    let serial = ops::serial_number(transport, handle)?;
    let version = ops::version(transport, handle)?;
    let decoded = VersionInfo::parse(&version);
    Ok(Identity {
        vendor,
        product,
        serial,
        version,
        decoded,
    })
}
