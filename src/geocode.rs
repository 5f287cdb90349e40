use anyhow::{Context, Result};
use serde::Deserialize;

// Client identifier sent with every geocoding request, as Nominatim's
// usage policy requires.
const USER_AGENT: &str = concat!("raincheck/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

// Nominatim encodes coordinates as JSON strings.
#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

// Look up coordinates for a free-text place name on Nominatim (OpenStreetMap).
// https://nominatim.org/release-docs/latest/api/Search/
// Returns None when the provider has no match.
// Leave URL as None to use the default search API.
pub fn get_coordinates(city: &str, url: Option<&str>) -> Result<Option<Coordinates>> {
    let client = reqwest::blocking::Client::new();
    let url = url.unwrap_or("https://nominatim.openstreetmap.org/search");

    let req = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .query(&[("q", city), ("format", "jsonv2"), ("limit", "1")])
        .build()?;

    log::debug!("Sending request: {req:?}");

    let places: Vec<Place> = client.execute(req)?.error_for_status()?.json()?;
    let Some(place) = places.first() else {
        return Ok(None);
    };
    Ok(Some(Coordinates {
        latitude: place
            .lat
            .parse()
            .with_context(|| format!("Parsing latitude '{}'", place.lat))?,
        longitude: place
            .lon
            .parse()
            .with_context(|| format!("Parsing longitude '{}'", place.lon))?,
    }))
}
