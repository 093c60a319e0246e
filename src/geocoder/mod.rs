//! Free-text to structured address lookup.

mod nominatim;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::{AddressRecord, Coordinate, ParsedAddress};

pub use nominatim::{NominatimGeocoder, DEFAULT_NOMINATIM_URL};

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid geocoder response: {0}")]
    InvalidResponse(String),

    #[error("Invalid geocoder URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Best match for a query, with address components already flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `text`. `Ok(None)` means the service had no match.
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;
}

/// Geocode corrected text into an address record.
///
/// Lookup errors are logged and collapsed into [`ParsedAddress::Failed`];
/// there is no retry.
pub async fn parse_address(geocoder: &dyn Geocoder, text: &str) -> ParsedAddress {
    match geocoder.geocode(text).await {
        Ok(Some(place)) => ParsedAddress::Resolved(AddressRecord {
            text: text.to_string(),
            street: place.street,
            city: place.city,
            state: place.state,
            country: place.country,
            postal_code: place.postal_code,
            latitude: Coordinate::Value(place.latitude),
            longitude: Coordinate::Value(place.longitude),
        }),
        Ok(None) => ParsedAddress::Unresolved(AddressRecord::not_available(text)),
        Err(e) => {
            warn!("Geocoding failed for '{}': {}", text, e);
            ParsedAddress::Failed
        }
    }
}
