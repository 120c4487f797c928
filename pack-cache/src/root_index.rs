//! Parses the top-level vendor list into the set of known PDSC URLs.

use roxmltree::Document;

use crate::error::{PdscError, RootIndexError};
use crate::fetch::Fetcher;

/// Fetches `vidx_url` and extracts the PDSC URL set from it.
///
/// The result is not cached here; [`crate::Engine`] caches it in memory for
/// its own lifetime so repeated `cache_descriptors`/`cache_everything` calls
/// against the same engine instance do not refetch the root index.
pub fn fetch(fetcher: &Fetcher, vidx_url: &str) -> Result<Vec<String>, RootIndexError> {
    let xml = fetcher.fetch(vidx_url)?;
    let xml = String::from_utf8_lossy(&xml);
    Ok(pdsc_urls(&xml, vidx_url)?)
}

/// Extracts `<url>/<name>` for every `<pdsc>` element in the root vendor
/// index, trimming a trailing slash on `url` and leading/trailing slashes on
/// `name` before joining them.
pub fn pdsc_urls(xml: &str, source_url: &str) -> Result<Vec<String>, PdscError> {
    let doc = Document::parse(xml).map_err(|source| PdscError::Xml {
        url: source_url.to_string(),
        source,
    })?;

    let urls = doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("pdsc"))
        .filter_map(|pdsc| {
            let url = pdsc.attribute("url")?.trim_end_matches('/');
            let name = pdsc.attribute("name")?.trim_matches('/');
            Some(format!("{url}/{name}"))
        })
        .collect();

    Ok(urls)
}
