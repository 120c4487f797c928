//! Maps an absolute URL to a stable, protocol-free cache key.

/// Strips exactly one leading `<scheme>://` prefix from `url`.
///
/// Idempotent on already-canonicalized input: a string with no `://` is
/// returned unchanged. Injective across distinct URLs that share a host and
/// path but differ in scheme is *not* guaranteed (`http://h/p` and
/// `https://h/p` collide by design, matching the original cache's behavior).
pub fn canonicalize(url: &str) -> &str {
    match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_http() {
        assert_eq!(
            canonicalize("http://example.com/a/b.pdsc"),
            "example.com/a/b.pdsc"
        );
    }

    #[test]
    fn strips_https() {
        assert_eq!(canonicalize("https://example.com/a"), "example.com/a");
    }

    #[test]
    fn idempotent_on_already_canonical_input() {
        let once = canonicalize("http://example.com/a");
        let twice = canonicalize(once);
        assert_eq!(once, twice);
    }

    #[test]
    fn passes_through_urls_without_a_scheme() {
        assert_eq!(canonicalize("example.com/a"), "example.com/a");
    }
}
