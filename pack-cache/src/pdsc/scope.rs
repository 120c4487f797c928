//! The three-element inheritance scope chain: family → subfamily → device.

use roxmltree::Node;

/// The ancestor chain for a single `<device>` element.
///
/// `parent` is the immediately enclosing `<family>` or `<subfamily>`;
/// `grandparent` is the enclosing `<family>` when `parent` is a
/// `<subfamily>`, and `None` when the device sits directly under its family.
pub struct Scope<'a> {
    pub device: Node<'a, 'a>,
    pub parent: Option<Node<'a, 'a>>,
    pub grandparent: Option<Node<'a, 'a>>,
}

impl<'a> Scope<'a> {
    pub fn for_device(device: Node<'a, 'a>) -> Self {
        let parent = device
            .parent()
            .filter(|n| n.is_element() && (n.has_tag_name("family") || n.has_tag_name("subfamily")));

        let grandparent = parent.and_then(|p| {
            if p.has_tag_name("subfamily") {
                p.parent()
                    .filter(|n| n.is_element() && n.has_tag_name("family"))
            } else {
                None
            }
        });

        Scope {
            device,
            parent,
            grandparent,
        }
    }

    /// Outermost-first: `[grandparent, parent, device]`, skipping absent
    /// ancestors. Used to fold sectioned attributes so that a device-level
    /// entry overrides its ancestors'.
    pub fn outermost_first(&self) -> Vec<Node<'a, 'a>> {
        [self.grandparent, self.parent, Some(self.device)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Innermost-first: `[device, parent, grandparent]`, skipping absent
    /// ancestors. Used for single-value picks where the first hit wins.
    pub fn innermost_first(&self) -> Vec<Node<'a, 'a>> {
        [Some(self.device), self.parent, self.grandparent]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn device_directly_under_family_has_no_grandparent() {
        let xml = r#"<devices><family><device Dname="D"/></family></devices>"#;
        let doc = Document::parse(xml).unwrap();
        let device = doc
            .descendants()
            .find(|n| n.has_tag_name("device"))
            .unwrap();
        let scope = Scope::for_device(device);
        assert!(scope.parent.unwrap().has_tag_name("family"));
        assert!(scope.grandparent.is_none());
    }

    #[test]
    fn device_under_subfamily_has_a_family_grandparent() {
        let xml =
            r#"<devices><family><subfamily><device Dname="D"/></subfamily></family></devices>"#;
        let doc = Document::parse(xml).unwrap();
        let device = doc
            .descendants()
            .find(|n| n.has_tag_name("device"))
            .unwrap();
        let scope = Scope::for_device(device);
        assert!(scope.parent.unwrap().has_tag_name("subfamily"));
        assert!(scope.grandparent.unwrap().has_tag_name("family"));
    }
}
