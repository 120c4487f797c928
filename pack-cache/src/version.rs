//! "Loose" version ordering, as used by vendor PDSC `<release version=…>` lists.
//!
//! Versions are split into dot/punctuation-separated runs of digits or
//! letters. Runs of digits compare numerically; a numeric run always
//! outranks a non-numeric run at the same position (mirrors the original
//! cache's use of Python's `distutils.LooseVersion`).

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    // Declared before `Num` so the derived `Ord` ranks it lower: a non-numeric
    // run always sorts below a numeric run at the same position.
    Str(String),
    Num(u64),
}

/// A parsed "loose version", comparable with its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseVersion {
    raw: String,
    parts: Vec<Part>,
}

impl LooseVersion {
    pub fn parse(raw: &str) -> Self {
        let mut parts = Vec::new();
        let mut digits = String::new();
        let mut letters = String::new();

        macro_rules! flush {
            () => {
                if !digits.is_empty() {
                    parts.push(Part::Num(digits.parse().unwrap_or(0)));
                    digits.clear();
                }
                if !letters.is_empty() {
                    parts.push(Part::Str(std::mem::take(&mut letters)));
                }
            };
        }

        for c in raw.chars() {
            if c.is_ascii_digit() {
                if !letters.is_empty() {
                    parts.push(Part::Str(std::mem::take(&mut letters)));
                }
                digits.push(c);
            } else if c.is_alphanumeric() {
                if !digits.is_empty() {
                    parts.push(Part::Num(digits.parse().unwrap_or(0)));
                    digits.clear();
                }
                letters.push(c);
            } else {
                flush!();
            }
        }
        flush!();

        LooseVersion {
            raw: raw.to_string(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

/// Returns the largest element of `versions` under [`LooseVersion`] ordering.
///
/// `versions` must be non-empty.
pub fn largest_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .map(|v| (LooseVersion::parse(v), v))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_largest_numeric_version() {
        assert_eq!(
            largest_version(["1.0.0", "19.0.0", "2.0.0"]),
            Some("19.0.0")
        );
    }

    #[test]
    fn two_digit_minor_outranks_ten_digit_minor_lexically_smaller() {
        assert_eq!(largest_version(["1.2", "1.10"]), Some("1.10"));
    }

    #[test]
    fn single_version_is_its_own_largest() {
        assert_eq!(largest_version(["3.1.4"]), Some("3.1.4"));
    }

    #[test]
    fn shorter_prefix_version_is_smaller() {
        assert!(LooseVersion::parse("1.2") < LooseVersion::parse("1.2.0"));
    }

    #[test]
    fn numeric_run_outranks_non_numeric_run_at_same_position() {
        assert!(LooseVersion::parse("1.2") > LooseVersion::parse("1.beta"));
    }
}
