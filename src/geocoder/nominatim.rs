//! Nominatim search API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use super::{GeocodeError, GeocodedPlace, Geocoder};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
}

/// Geocoder backed by a Nominatim instance.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    /// Minimum spacing between requests
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Wait until `min_interval` has passed since the previous request.
    ///
    /// The returned guard keeps other requests waiting while it is held.
    async fn throttle(&self) -> MutexGuard<'_, Option<Instant>> {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            tokio::time::sleep_until(last + self.min_interval).await;
        }
        *last_request = Some(Instant::now());
        last_request
    }

    fn search_url(&self, text: &str) -> Result<Url, GeocodeError> {
        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[
                ("q", text),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, text: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let url = self.search_url(text)?;

        // Held for the whole request so calls stay spaced out
        let _turn = self.throttle().await;

        debug!("Geocoding '{}'", text);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status { status, body });
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}

/// Map a `format=jsonv2` search response to the first match.
///
/// A match without address details counts as no match.
fn parse_search_response(body: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let Some(address) = place.address else {
        return Ok(None);
    };

    let latitude = parse_coordinate(&place.lat)?;
    let longitude = parse_coordinate(&place.lon)?;

    Ok(Some(GeocodedPlace {
        latitude,
        longitude,
        street: address.road.unwrap_or_default(),
        city: address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default(),
        state: address.state.unwrap_or_default(),
        country: address.country.unwrap_or_default(),
        postal_code: address.postcode.unwrap_or_default(),
    }))
}

fn parse_coordinate(value: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidResponse(format!("bad coordinate '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_match() {
        let body = r#"[{
            "place_id": 1,
            "lat": "51.5237629",
            "lon": "-0.1584743",
            "display_name": "221B, Baker Street, London",
            "address": {
                "house_number": "221B",
                "road": "Baker Street",
                "city": "London",
                "state": "England",
                "postcode": "NW1 6XE",
                "country": "United Kingdom",
                "country_code": "gb"
            }
        }]"#;

        let place = parse_search_response(body).unwrap().unwrap();
        assert_eq!(place.street, "Baker Street");
        assert_eq!(place.city, "London");
        assert_eq!(place.state, "England");
        assert_eq!(place.country, "United Kingdom");
        assert_eq!(place.postal_code, "NW1 6XE");
        assert!((place.latitude - 51.5237629).abs() < 1e-9);
        assert!((place.longitude + 0.1584743).abs() < 1e-9);
    }

    #[test]
    fn test_city_falls_back_to_town_then_village() {
        let town = r#"[{"lat": "1", "lon": "2", "address": {"town": "Ely", "village": "Stuntney"}}]"#;
        assert_eq!(parse_search_response(town).unwrap().unwrap().city, "Ely");

        let village = r#"[{"lat": "1", "lon": "2", "address": {"village": "Stuntney"}}]"#;
        let place = parse_search_response(village).unwrap().unwrap();
        assert_eq!(place.city, "Stuntney");
        assert_eq!(place.street, "");
    }

    #[test]
    fn test_empty_or_addressless_is_no_match() {
        assert!(parse_search_response("[]").unwrap().is_none());
        assert!(parse_search_response(r#"[{"lat": "1", "lon": "2"}]"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_response_is_error() {
        assert!(matches!(
            parse_search_response(r#"{"error": "oops"}"#),
            Err(GeocodeError::InvalidResponse(_))
        ));
        assert!(parse_search_response(r#"[{"lat": "north", "lon": "2", "address": {}}]"#).is_err());
    }

    #[tokio::test]
    async fn test_search_url_encodes_query() {
        let geocoder = NominatimGeocoder::new(
            "https://nominatim.example.org/",
            "addrscan-test",
            Duration::from_secs(5),
            Duration::ZERO,
        )
        .unwrap();

        let url = geocoder.search_url("10 Downing St, London").unwrap();
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("q".to_string(), "10 Downing St, London".to_string())));
        assert!(pairs.contains(&("addressdetails".to_string(), "1".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_min_interval() {
        let geocoder = NominatimGeocoder::new(
            "http://127.0.0.1:9",
            "addrscan-test",
            Duration::from_secs(5),
            Duration::from_secs(1),
        )
        .unwrap();

        let start = Instant::now();
        drop(geocoder.throttle().await);
        assert!(start.elapsed() < Duration::from_millis(1));

        drop(geocoder.throttle().await);
        assert!(start.elapsed() >= Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(3)).await;
        let before = Instant::now();
        drop(geocoder.throttle().await);
        assert!(before.elapsed() < Duration::from_millis(1));
    }
}
