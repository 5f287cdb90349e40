use crate::date;
use crate::forecast;
use crate::geocode;
use crate::store::{ForecastRecord, ForecastStore};

use anyhow::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};

const MENU: &str = "\
Please choose:
1. Show saved forecasts
2. Fetch a new forecast
3. List stored forecasts
4. Look up a date
5. Exit";

// Blank input defaults to tomorrow; unparseable input is None.
fn resolve_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        Some(date::tomorrow())
    } else {
        date::parse_date(text).ok()
    }
}

// App runs the interactive menu over a forecast store.
// Input and output are generic so tests can drive the loop with buffers.
// The URL overrides point the API clients at test servers; both are None
// in normal use.
pub struct App<R, W> {
    store: ForecastStore,
    input: R,
    output: W,
    geocode_url: Option<String>,
    forecast_url: Option<String>,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(
        store: ForecastStore,
        input: R,
        output: W,
        geocode_url: Option<String>,
        forecast_url: Option<String>,
    ) -> App<R, W> {
        App {
            store,
            input,
            output,
            geocode_url,
            forecast_url,
        }
    }

    // Run the menu loop until the user exits or input ends.
    // Errors inside a menu branch are printed and the loop continues.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(choice) = self.prompt(MENU)? else {
                break;
            };
            if choice == "5" {
                break;
            }
            let res = match choice.as_str() {
                "1" => self.show_saved(),
                "2" => self.fetch_new(),
                "3" => self.list_stored(),
                "4" => self.lookup(),
                _ => {
                    writeln!(self.output, "Invalid choice. Please try again.")?;
                    Ok(())
                }
            };
            if let Err(err) = res {
                writeln!(self.output, "Error: {err:#}")?;
            }
        }
        Ok(())
    }

    // Print a prompt and read one trimmed line. None means end of input.
    fn prompt(&mut self, msg: &str) -> Result<Option<String>> {
        writeln!(self.output, "{msg}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_entries(&mut self) -> Result<()> {
        for (date, record) in self.store.iter() {
            writeln!(self.output, "{date}: {record}")?;
        }
        Ok(())
    }

    fn show_saved(&mut self) -> Result<()> {
        self.store.load()?;
        if self.store.is_empty() {
            writeln!(self.output, "No saved forecasts.")?;
            return Ok(());
        }
        self.print_entries()
    }

    fn list_stored(&mut self) -> Result<()> {
        writeln!(self.output, "Weather forecasts for the known dates:")?;
        self.print_entries()
    }

    fn fetch_new(&mut self) -> Result<()> {
        let Some(city) = self.prompt("Enter a city name:")? else {
            return Ok(());
        };
        let Some(coords) = geocode::get_coordinates(&city, self.geocode_url.as_deref())? else {
            writeln!(self.output, "Location not found.")?;
            return Ok(());
        };
        writeln!(
            self.output,
            "The latitude and longitude of {city} are: {}, {}",
            coords.latitude, coords.longitude
        )?;

        writeln!(
            self.output,
            "Choose a start and end date; leave blank to default to tomorrow."
        )?;
        let Some(start) = self.prompt("Start date (yyyy-mm-dd):")? else {
            return Ok(());
        };
        let Some(end) = self.prompt("End date (yyyy-mm-dd):")? else {
            return Ok(());
        };
        let (Some(start), Some(end)) = (resolve_date(&start), resolve_date(&end)) else {
            writeln!(
                self.output,
                "Invalid date format entered. Please use yyyy-mm-dd format."
            )?;
            return Ok(());
        };

        // On failure the store is left untouched and nothing is saved.
        let daily =
            match forecast::get_forecast(coords, start, end, self.forecast_url.as_deref()) {
                Ok(daily) => daily,
                Err(err) => {
                    writeln!(self.output, "Failed to fetch weather data: {err:#}")?;
                    return Ok(());
                }
            };

        for (time, mm) in daily.time.iter().zip(&daily.precipitation_sum) {
            if *mm > 0.0 {
                writeln!(
                    self.output,
                    "On {time}, it will be raining in {city} and the precipitation sum will be {mm} mm"
                )?;
            } else {
                writeln!(self.output, "There's no rain in {city} on {time}")?;
            }
        }

        // The whole range is stored as one record keyed by its start date.
        self.store.insert(
            start,
            ForecastRecord {
                city,
                precipitation: daily.precipitation_sum,
                time: daily.time,
            },
        );
        self.store.save()?;
        Ok(())
    }

    fn lookup(&mut self) -> Result<()> {
        let Some(text) = self.prompt("Enter the date (yyyy-mm-dd) to look up:")? else {
            return Ok(());
        };
        match date::parse_date(&text).ok() {
            Some(date) if self.store.contains(date) => {
                let record = self.store.get(date)?;
                writeln!(self.output, "{date}: {record}")?;
            }
            _ => writeln!(
                self.output,
                "Weather forecast not found for the given date."
            )?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use std::io::Cursor;

    const LONDON: &str = r#"[{"lat": "51.5074456", "lon": "-0.1277653"}]"#;

    fn app(
        input: &str,
        tmp: &tempfile::TempDir,
        geocode_url: Option<String>,
        forecast_url: Option<String>,
    ) -> App<Cursor<String>, Vec<u8>> {
        let _ = env_logger::try_init();
        let store = ForecastStore::new(tmp.path().join("forecasts.json"));
        App::new(
            store,
            Cursor::new(input.to_string()),
            Vec::new(),
            geocode_url,
            forecast_url,
        )
    }

    fn output(app: &App<Cursor<String>, Vec<u8>>) -> String {
        String::from_utf8(app.output.clone()).unwrap()
    }

    fn geocode_server(body: &str) -> (Server, String) {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/geocode"))
                .respond_with(status_code(200).body(body.to_string())),
        );
        let url = server.url("/geocode").to_string();
        (server, url)
    }

    #[test]
    fn test_no_rain_line() {
        let (_geo, geo_url) = geocode_server(LONDON);
        let weather = Server::run();
        weather.expect(
            Expectation::matching(request::method_path("GET", "/forecast")).respond_with(
                status_code(200)
                    .body(r#"{"daily": {"time": ["2024-06-01"], "precipitation_sum": [0.0]}}"#),
            ),
        );
        let weather_url = weather.url("/forecast").to_string();

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(
            "2\nLondon\n2024-06-01\n2024-06-01\n5\n",
            &tmp,
            Some(geo_url),
            Some(weather_url),
        );
        app.run().unwrap();

        let out = output(&app);
        assert!(
            out.contains("The latitude and longitude of London are: 51.5074456, -0.1277653"),
            "{out}"
        );
        assert!(out.contains("There's no rain in London on 2024-06-01"), "{out}");

        // The result is persisted under the range's start date.
        let mut fresh = ForecastStore::new(tmp.path().join("forecasts.json"));
        fresh.load().unwrap();
        let record = fresh.get("2024-06-01".parse().unwrap()).unwrap();
        assert_eq!(record.city, "London");
        assert_eq!(record.precipitation, vec![0.0]);
    }

    #[test]
    fn test_rain_line() {
        let (_geo, geo_url) = geocode_server(LONDON);
        let weather = Server::run();
        weather.expect(
            Expectation::matching(request::method_path("GET", "/forecast")).respond_with(
                status_code(200).body(
                    r#"{"daily": {"time": ["2024-06-01", "2024-06-02"], "precipitation_sum": [1.2, 0.0]}}"#,
                ),
            ),
        );
        let weather_url = weather.url("/forecast").to_string();

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(
            "2\nLondon\n2024-06-01\n2024-06-02\n5\n",
            &tmp,
            Some(geo_url),
            Some(weather_url),
        );
        app.run().unwrap();

        let out = output(&app);
        assert!(
            out.contains(
                "On 2024-06-01, it will be raining in London and the precipitation sum will be 1.2 mm"
            ),
            "{out}"
        );
        assert!(out.contains("There's no rain in London on 2024-06-02"), "{out}");
    }

    #[test]
    fn test_fetch_transport_error_leaves_store_unchanged() {
        let (_geo, geo_url) = geocode_server(LONDON);
        let weather = Server::run();
        weather.expect(
            Expectation::matching(request::method_path("GET", "/forecast"))
                .respond_with(status_code(500)),
        );
        let weather_url = weather.url("/forecast").to_string();

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(
            "2\nLondon\n2024-06-01\n2024-06-01\n5\n",
            &tmp,
            Some(geo_url),
            Some(weather_url),
        );
        app.run().unwrap();

        let out = output(&app);
        assert!(out.contains("Failed to fetch weather data"), "{out}");
        assert!(app.store.is_empty());
        assert!(!tmp.path().join("forecasts.json").exists());
    }

    #[test]
    fn test_location_not_found() {
        let (_geo, geo_url) = geocode_server("[]");

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app("2\nNowhereville\n5\n", &tmp, Some(geo_url), None);
        app.run().unwrap();

        assert!(output(&app).contains("Location not found."));
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_invalid_date_aborts_before_fetch() {
        let (_geo, geo_url) = geocode_server(LONDON);
        // No expectations: any forecast request would fail the test.
        let weather = Server::run();
        let weather_url = weather.url("/forecast").to_string();

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(
            "2\nLondon\njunk\n2024-06-01\n5\n",
            &tmp,
            Some(geo_url),
            Some(weather_url),
        );
        app.run().unwrap();

        let out = output(&app);
        assert!(out.contains("Invalid date format entered"), "{out}");
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_blank_dates_default_to_tomorrow() {
        let (_geo, geo_url) = geocode_server(LONDON);
        let weather = Server::run();
        weather.expect(
            Expectation::matching(request::method_path("GET", "/forecast")).respond_with(
                status_code(200)
                    .body(r#"{"daily": {"time": ["2024-06-01"], "precipitation_sum": [0.0]}}"#),
            ),
        );
        let weather_url = weather.url("/forecast").to_string();

        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(
            "2\nLondon\n\n\n5\n",
            &tmp,
            Some(geo_url),
            Some(weather_url),
        );
        app.run().unwrap();

        assert!(app.store.contains(date::tomorrow()));
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app("4\n2024-06-01\n4\n2024-06-02\n4\njunk\n5\n", &tmp, None, None);
        app.store.insert(
            "2024-06-01".parse().unwrap(),
            ForecastRecord {
                city: "London".into(),
                precipitation: vec![2.5],
                time: vec!["2024-06-01".into()],
            },
        );
        app.run().unwrap();

        let out = output(&app);
        assert!(out.contains("2024-06-01: London: 2024-06-01=2.5mm"), "{out}");
        assert_eq!(
            str::matches(&out, "Weather forecast not found for the given date.").count(),
            2
        );
    }

    #[test]
    fn test_invalid_choice() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app("9\n5\n", &tmp, None, None);
        app.run().unwrap();
        assert!(output(&app).contains("Invalid choice. Please try again."));
    }

    #[test]
    fn test_end_of_input_exits() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app("", &tmp, None, None);
        app.run().unwrap();
    }
}
