//! Derives a PACK archive URL from a parsed PDSC document.

use crate::error::PdscError;
use crate::pdsc::PdscDocument;
use crate::version::largest_version;

/// `"<url><vendor>.<name>.<largest_version>.pack"`.
///
/// Fails when `<package>` is missing any of `url`, `vendor`, `name`, or a
/// non-empty `<releases>` list — callers log and skip the PDSC.
pub fn resolve(doc: &PdscDocument, source_url: &str) -> Result<String, PdscError> {
    let not_conforming = || PdscError::NotConforming {
        url: source_url.to_string(),
    };

    let url = doc.package_url().ok_or_else(not_conforming)?;
    let vendor = doc.package_vendor().ok_or_else(not_conforming)?;
    let name = doc.package_name().ok_or_else(not_conforming)?;
    let versions = doc.release_versions();
    let version = largest_version(versions.iter().map(String::as_str)).ok_or_else(not_conforming)?;

    Ok(format!("{url}{vendor}.{name}.{version}.pack"))
}
