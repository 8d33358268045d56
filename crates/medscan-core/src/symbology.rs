//! # Symbology Detection
//!
//! Tells retail barcodes (the codes printed on device packaging) apart from
//! free-form QR text, so a host view can decide whether a scan is worth a
//! product lookup.
//!
//! ## Recognised Formats
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Format   Digits   Example          Check digit                         │
//! │  ──────   ──────   ──────────────   ──────────────────────────────      │
//! │  EAN-8    8        96385074         GS1 mod-10, weights 3,1 from right  │
//! │  UPC-A    12       036000291452     GS1 mod-10                          │
//! │  EAN-13   13       4006381333931    GS1 mod-10                          │
//! │  Text     -        anything else    -                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A numeric code with a wrong check digit is classified as `Text`: it is
//! almost always a misread.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Kind of code a payload looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Symbology {
    /// 8-digit EAN.
    Ean8,
    /// 12-digit UPC-A.
    UpcA,
    /// 13-digit EAN (GTIN-13).
    Ean13,
    /// Anything that is not a valid retail barcode.
    Text,
}

impl Symbology {
    /// Detects the symbology of a decoded payload.
    ///
    /// ## Example
    /// ```rust
    /// use medscan_core::Symbology;
    ///
    /// assert_eq!(Symbology::detect("4006381333931"), Symbology::Ean13);
    /// assert_eq!(Symbology::detect("4006381333932"), Symbology::Text);
    /// assert_eq!(Symbology::detect("https://example.com"), Symbology::Text);
    /// ```
    pub fn detect(payload: &str) -> Self {
        let payload = payload.trim();
        if !payload.bytes().all(|b| b.is_ascii_digit()) {
            return Symbology::Text;
        }

        let candidate = match payload.len() {
            8 => Symbology::Ean8,
            12 => Symbology::UpcA,
            13 => Symbology::Ean13,
            _ => return Symbology::Text,
        };

        if has_valid_check_digit(payload) {
            candidate
        } else {
            Symbology::Text
        }
    }

    /// Returns true for codes that identify a retail product.
    pub fn is_retail_barcode(&self) -> bool {
        !matches!(self, Symbology::Text)
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbology::Ean8 => write!(f, "EAN-8"),
            Symbology::UpcA => write!(f, "UPC-A"),
            Symbology::Ean13 => write!(f, "EAN-13"),
            Symbology::Text => write!(f, "text"),
        }
    }
}

/// GS1 mod-10 check over an all-digit string (last digit is the check digit).
fn has_valid_check_digit(digits: &str) -> bool {
    let values: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    let Some((check, body)) = values.split_last() else {
        return false;
    };

    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d * 3 } else { *d })
        .sum();

    (10 - sum % 10) % 10 == *check
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert_eq!(Symbology::detect("96385074"), Symbology::Ean8);
        assert_eq!(Symbology::detect("036000291452"), Symbology::UpcA);
        assert_eq!(Symbology::detect("4006381333931"), Symbology::Ean13);
        assert_eq!(Symbology::detect(" 4006381333931\n"), Symbology::Ean13);
    }

    #[test]
    fn test_bad_check_digit_is_text() {
        assert_eq!(Symbology::detect("96385075"), Symbology::Text);
        assert_eq!(Symbology::detect("036000291453"), Symbology::Text);
    }

    #[test]
    fn test_non_numeric_and_odd_lengths() {
        assert_eq!(Symbology::detect("ABC123"), Symbology::Text);
        assert_eq!(Symbology::detect("12345"), Symbology::Text);
        assert_eq!(Symbology::detect(""), Symbology::Text);
        assert!(!Symbology::Text.is_retail_barcode());
        assert!(Symbology::UpcA.is_retail_barcode());
    }

    #[test]
    fn test_display() {
        assert_eq!(Symbology::Ean13.to_string(), "EAN-13");
        assert_eq!(Symbology::Text.to_string(), "text");
    }
}
