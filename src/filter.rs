// ABOUTME: Suppression predicate for stderr lines.
// ABOUTME: Drops lines that begin with one of a fixed set of literal prefixes.

/// Prefix of the nuisance line emitted by SSH clients on FIPS-enabled hosts.
pub const FIPS_NOISE: &str = "FIPS mode initialized";

/// Case-sensitive, byte-wise prefix filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionFilter {
    prefixes: Vec<Vec<u8>>,
}

impl SuppressionFilter {
    /// Build a filter from literal prefixes. Empty prefixes are ignored;
    /// config validation rejects them before they get here.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_vec())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// The default filter: only the FIPS banner.
    pub fn fips() -> Self {
        Self::new([FIPS_NOISE])
    }

    /// Whether `line` should be discarded.
    pub fn is_suppressed(&self, line: &[u8]) -> bool {
        self.prefixes.iter().any(|p| line.starts_with(p))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &[u8]> {
        self.prefixes.iter().map(Vec::as_slice)
    }
}

impl Default for SuppressionFilter {
    fn default() -> Self {
        Self::fips()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_banner_is_suppressed() {
        let filter = SuppressionFilter::fips();
        assert!(filter.is_suppressed(b"FIPS mode initialized\n"));
        assert!(filter.is_suppressed(b"FIPS mode initialized"));
    }

    #[test]
    fn banner_with_suffix_is_suppressed() {
        let filter = SuppressionFilter::fips();
        assert!(filter.is_suppressed(b"FIPS mode initialized: foo\n"));
    }

    #[test]
    fn banner_not_at_start_is_kept() {
        let filter = SuppressionFilter::fips();
        assert!(!filter.is_suppressed(b"something FIPS mode initialized\n"));
        assert!(!filter.is_suppressed(b" FIPS mode initialized\n"));
    }

    #[test]
    fn match_is_case_sensitive() {
        let filter = SuppressionFilter::fips();
        assert!(!filter.is_suppressed(b"fips mode initialized\n"));
        assert!(!filter.is_suppressed(b"FIPS MODE INITIALIZED\n"));
    }

    #[test]
    fn truncated_banner_is_kept() {
        let filter = SuppressionFilter::fips();
        assert!(!filter.is_suppressed(b"FIPS mode init\n"));
        assert!(!filter.is_suppressed(b"\n"));
        assert!(!filter.is_suppressed(b""));
    }

    #[test]
    fn non_utf8_lines_are_handled() {
        let filter = SuppressionFilter::fips();
        assert!(!filter.is_suppressed(&[0xff, 0xfe, b'\n']));
        let mut noisy = FIPS_NOISE.as_bytes().to_vec();
        noisy.extend_from_slice(&[0xff, b'\n']);
        assert!(filter.is_suppressed(&noisy));
    }

    #[test]
    fn multiple_prefixes() {
        let filter = SuppressionFilter::new(["FIPS mode initialized", "Warning: Permanently added"]);
        assert!(filter.is_suppressed(b"Warning: Permanently added 'host' to the list\n"));
        assert!(filter.is_suppressed(b"FIPS mode initialized\n"));
        assert!(!filter.is_suppressed(b"Permission denied (publickey).\n"));
    }

    #[test]
    fn empty_prefixes_are_dropped() {
        let filter = SuppressionFilter::new(["", FIPS_NOISE]);
        assert_eq!(filter.prefixes().count(), 1);
        assert!(!filter.is_suppressed(b"anything\n"));
    }
}
