//! Structured address produced from corrected OCR text.

use serde::{Serialize, Serializer};

/// Placeholder written for every component of an address the geocoder could not find.
pub const NOT_AVAILABLE: &str = "N/A";

/// Latitude or longitude of a geocoded address.
///
/// Serializes as a JSON number, or as `"N/A"` when the lookup found nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinate {
    Value(f64),
    NotAvailable,
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Coordinate::Value(v) => serializer.serialize_f64(*v),
            Coordinate::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinate::Value(v) => write!(f, "{}", v),
            Coordinate::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

/// Address record returned to the client and appended to the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressRecord {
    /// Corrected text the address was parsed from
    pub text: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
}

impl AddressRecord {
    /// Record for text the geocoder had no match for.
    pub fn not_available(text: &str) -> Self {
        Self {
            text: text.to_string(),
            street: NOT_AVAILABLE.to_string(),
            city: NOT_AVAILABLE.to_string(),
            state: NOT_AVAILABLE.to_string(),
            country: NOT_AVAILABLE.to_string(),
            postal_code: NOT_AVAILABLE.to_string(),
            latitude: Coordinate::NotAvailable,
            longitude: Coordinate::NotAvailable,
        }
    }
}

/// Outcome of turning corrected text into an address.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAddress {
    /// Geocoder returned a match
    Resolved(AddressRecord),
    /// Geocoder answered but found nothing; every component is `N/A`
    Unresolved(AddressRecord),
    /// Geocoder request failed
    Failed,
}

impl ParsedAddress {
    pub fn record(&self) -> Option<&AddressRecord> {
        match self {
            ParsedAddress::Resolved(r) | ParsedAddress::Unresolved(r) => Some(r),
            ParsedAddress::Failed => None,
        }
    }
}
