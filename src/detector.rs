//! Listing announcement detection
//!
//! A fixed pattern over free text: `"<Venue> will list <Token Name> (<SYMBOL>)"`.
//! Stateless and deterministic.

use regex::Regex;

/// A recognised listing announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Upper-cased ticker captured from the parenthetical
    pub symbol: String,
    /// Human-readable token name preceding the parenthetical
    pub token_name: String,
}

/// Matches new-listing announcements for a single venue
pub struct ListingDetector {
    pattern: Regex,
}

impl ListingDetector {
    /// Create a detector for announcements by the given venue name.
    pub fn new(venue_name: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"{} will list (.*?)\s*\((\w+)\)",
            regex::escape(venue_name)
        ))
        .expect("listing pattern is valid");
        Self { pattern }
    }

    /// Return the announced listing, or `None` if the text is not an
    /// announcement.
    pub fn detect(&self, text: &str) -> Option<Listing> {
        let captures = self.pattern.captures(text)?;
        let token_name = captures.get(1)?.as_str().trim().to_string();
        let symbol = captures.get(2)?.as_str().to_uppercase();
        Some(Listing { symbol, token_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ListingDetector {
        ListingDetector::new("Binance")
    }

    #[test]
    fn test_detects_listing() {
        let listing = detector()
            .detect("Binance will list Foo (FOO)")
            .unwrap();
        assert_eq!(listing.symbol, "FOO");
        assert_eq!(listing.token_name, "Foo");
    }

    #[test]
    fn test_detects_multi_word_token_name() {
        let listing = detector()
            .detect("Binance will list Basic Attention Token (BAT) in the Innovation Zone")
            .unwrap();
        assert_eq!(listing.symbol, "BAT");
        assert_eq!(listing.token_name, "Basic Attention Token");
    }

    #[test]
    fn test_no_parenthetical_yields_none() {
        assert!(detector().detect("Binance will list Foo").is_none());
    }

    #[test]
    fn test_unrelated_text_yields_none() {
        assert!(detector()
            .detect("Bitcoin hits a new all time high")
            .is_none());
    }

    #[test]
    fn test_empty_parenthetical_yields_none() {
        assert!(detector().detect("Binance will list Foo ()").is_none());
    }

    #[test]
    fn test_other_venue_not_matched() {
        assert!(detector()
            .detect("Coinbase will list Foo (FOO)")
            .is_none());
    }

    #[test]
    fn test_symbol_upper_cased() {
        let listing = detector()
            .detect("Binance will list Foo (foo)")
            .unwrap();
        assert_eq!(listing.symbol, "FOO");
    }
}
