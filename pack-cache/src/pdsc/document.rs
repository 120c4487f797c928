//! A thin, read-only wrapper over a parsed PDSC XML tree.

use roxmltree::{Document, Node};

use crate::error::PdscError;

/// A parsed `.pdsc` document, borrowed for the lifetime of its source text.
///
/// The outer `<package>` element is always the document's root element, per
/// CMSIS-Pack convention; this wrapper assumes that and does not defend
/// against a `<package>` nested under something else.
pub struct PdscDocument<'a> {
    doc: Document<'a>,
}

impl<'a> PdscDocument<'a> {
    /// Parses `xml`, which is assumed to be the content of a PDSC file
    /// fetched from `url` (used only to attribute parse errors).
    pub fn parse(xml: &'a str, url: &str) -> Result<Self, PdscError> {
        let doc = Document::parse(xml).map_err(|source| PdscError::Xml {
            url: url.to_string(),
            source,
        })?;
        Ok(PdscDocument { doc })
    }

    fn package(&self) -> Node<'a, 'a> {
        self.doc.root_element()
    }

    fn package_child_text(&self, tag: &str) -> Option<String> {
        self.package()
            .children()
            .find(|n| n.is_element() && n.has_tag_name(tag))
            .and_then(|n| n.text())
            .map(str::trim)
            .map(str::to_string)
    }

    /// `<package><url>`, with a trailing slash guaranteed.
    pub fn package_url(&self) -> Option<String> {
        let mut url = self.package_child_text("url")?;
        if !url.ends_with('/') {
            url.push('/');
        }
        Some(url)
    }

    pub fn package_vendor(&self) -> Option<String> {
        self.package_child_text("vendor")
    }

    pub fn package_name(&self) -> Option<String> {
        self.package_child_text("name")
    }

    /// The `version` attribute of every `<releases><release>` element.
    pub fn release_versions(&self) -> Vec<String> {
        let Some(releases) = self
            .package()
            .children()
            .find(|n| n.is_element() && n.has_tag_name("releases"))
        else {
            return Vec::new();
        };
        releases
            .children()
            .filter(|n| n.is_element() && n.has_tag_name("release"))
            .filter_map(|n| n.attribute("version"))
            .map(str::to_string)
            .collect()
    }

    /// Every `<device>` element anywhere under `<devices>`, regardless of
    /// nesting depth.
    pub fn devices(&self) -> Vec<Node<'a, 'a>> {
        self.doc
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("device"))
            .collect()
    }

    /// Every `<board>` element anywhere in the document.
    pub fn boards(&self) -> Vec<Node<'a, 'a>> {
        self.doc
            .descendants()
            .filter(|n| n.is_element() && n.has_tag_name("board"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
<package>
  <vendor>Acme</vendor>
  <name>Foo</name>
  <url>http://example.com/p</url>
  <releases>
    <release version="1.10"/>
    <release version="1.2"/>
  </releases>
  <devices>
    <family Dvendor="Acme" Dfamily="MyFamily">
      <device Dname="MyDevice"/>
    </family>
  </devices>
  <boards>
    <board name="MyBoard"><mounteddevice Dname="MyDevice"/></board>
  </boards>
</package>
"#;

    #[test]
    fn reads_package_header_fields() {
        let doc = PdscDocument::parse(SAMPLE, "http://example.com/p/Acme.Foo.pdsc").unwrap();
        assert_eq!(doc.package_url().as_deref(), Some("http://example.com/p/"));
        assert_eq!(doc.package_vendor().as_deref(), Some("Acme"));
        assert_eq!(doc.package_name().as_deref(), Some("Foo"));
        assert_eq!(doc.release_versions(), vec!["1.10", "1.2"]);
    }

    #[test]
    fn finds_devices_and_boards() {
        let doc = PdscDocument::parse(SAMPLE, "url").unwrap();
        assert_eq!(doc.devices().len(), 1);
        assert_eq!(doc.boards().len(), 1);
    }

    #[test]
    fn malformed_xml_is_reported() {
        let err = PdscDocument::parse("<package><devices>", "bad-url").unwrap_err();
        assert!(matches!(err, PdscError::Xml { .. }));
    }
}
