use crate::geocode::Coordinates;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;

// Parallel per-day arrays from an Open-Meteo response. Both sequences are
// the same length as returned upstream; fields the response omits come
// back empty.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Daily {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub precipitation_sum: Vec<f64>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: Daily,
}

// Fetch the daily precipitation forecast for a coordinate and date range.
// https://open-meteo.com/en/docs
// Leave URL as None to use the default forecast API.
pub fn get_forecast(
    coords: Coordinates,
    start: NaiveDate,
    end: NaiveDate,
    url: Option<&str>,
) -> Result<Daily> {
    let client = reqwest::blocking::Client::new();
    let url = url.unwrap_or("https://api.open-meteo.com/v1/forecast");

    let req = client
        .get(url)
        .query(&[
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
            ("daily", "precipitation_sum".to_string()),
            ("timezone", "Europe/London".to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
        ])
        .build()?;

    log::debug!("Sending request: {req:?}");

    let res: ForecastResponse = client.execute(req)?.error_for_status()?.json()?;
    Ok(res.daily)
}
