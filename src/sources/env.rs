//! Environment-supplied excluded prefix source.

use super::PrefixSource;
use ipnet::IpNet;
use tracing::error;

/// Static excluded-prefix source fed from an operator-supplied list.
///
/// Candidates are validated as CIDR exactly once, at construction; entries
/// that fail to parse are logged and dropped, the rest keep their relative
/// order. The resulting list never changes for the lifetime of the source,
/// which is what makes [`prefixes`](PrefixSource::prefixes) trivially safe
/// for concurrent readers.
///
/// # Examples
///
/// ```rust
/// use excluded_prefixes::sources::{EnvPrefixSource, PrefixSource};
///
/// let source = EnvPrefixSource::new(["10.96.0.0/12", "bogus", "fd00::/64"]);
/// assert_eq!(source.prefixes(), vec!["10.96.0.0/12", "fd00::/64"]);
/// ```
pub struct EnvPrefixSource {
    prefixes: Vec<String>,
}

impl EnvPrefixSource {
    /// Create a source from unchecked candidate strings.
    ///
    /// Never fails: invalid candidates are dropped, not rejected.
    pub fn new<I, S>(unchecked_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: validated_prefixes(unchecked_prefixes),
        }
    }
}

impl PrefixSource for EnvPrefixSource {
    fn prefixes(&self) -> Vec<String> {
        self.prefixes.clone()
    }
}

/// Keep only the candidates that parse as CIDR, preserving input order.
fn validated_prefixes<I, S>(prefixes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut validated = Vec::new();
    for prefix in prefixes {
        let prefix = prefix.as_ref();
        match prefix.parse::<IpNet>() {
            Ok(_) => validated.push(prefix.to_owned()),
            Err(err) => error!("Error parsing CIDR from {prefix}: {err}"),
        }
    }
    validated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_valid_prefixes_in_order() {
        let source = EnvPrefixSource::new(["10.0.0.0/16", "fd00::/64", "192.168.0.0/24"]);
        assert_eq!(
            source.prefixes(),
            vec!["10.0.0.0/16", "fd00::/64", "192.168.0.0/24"]
        );
    }

    #[test]
    fn test_drops_invalid_prefixes() {
        let source = EnvPrefixSource::new([
            "10.0.0.0/16",
            "not-a-cidr",
            "10.0.0.1",     // no prefix length
            "10.0.0.0/33",  // prefix length out of range
            "fd00::/64",
        ]);
        assert_eq!(source.prefixes(), vec!["10.0.0.0/16", "fd00::/64"]);
    }

    #[test]
    fn test_all_invalid_yields_empty() {
        let source = EnvPrefixSource::new(["", "garbage", "1.2.3.4/-1"]);
        assert!(source.prefixes().is_empty());
    }

    #[test]
    fn test_duplicates_are_permitted() {
        let source = EnvPrefixSource::new(["10.0.0.0/16", "10.0.0.0/16"]);
        assert_eq!(source.prefixes(), vec!["10.0.0.0/16", "10.0.0.0/16"]);
    }

    #[test]
    fn test_list_is_fixed_after_construction() {
        let source = EnvPrefixSource::new(["10.0.0.0/16"]);
        let first = source.prefixes();
        let second = source.prefixes();
        assert_eq!(first, second);
    }
}
