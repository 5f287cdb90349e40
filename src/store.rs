use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

// One stored query result: the city name as entered by the user, plus
// parallel per-day sequences of dates and precipitation totals (mm).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct ForecastRecord {
    pub city: String,
    pub precipitation: Vec<f64>,
    pub time: Vec<String>,
}

impl std::fmt::Display for ForecastRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.city)?;
        for (time, mm) in self.time.iter().zip(&self.precipitation) {
            write!(f, " {time}={mm}mm")?;
        }
        Ok(())
    }
}

// ForecastStore maps dates to forecast records, backed by a single JSON
// object on disk:
// ```
// {"2024-06-01": {"city": "London", "precipitation": [0.0], "time": ["2024-06-01"]}}
// ```
// Keys are NaiveDate in memory and yyyy-mm-dd strings in the file, so
// entries survive a save/load cycle unchanged. At most one record is kept
// per date; inserting again overwrites.
#[derive(Debug)]
pub struct ForecastStore {
    path: PathBuf,
    data: BTreeMap<NaiveDate, ForecastRecord>,
}

impl ForecastStore {
    // Create an empty store backed by the given file. Nothing is read
    // until `load` is called.
    pub fn new(path: impl Into<PathBuf>) -> ForecastStore {
        ForecastStore {
            path: path.into(),
            data: BTreeMap::new(),
        }
    }

    // Replace the mapping with the contents of the backing file.
    // A missing file is not an error; the mapping is left unchanged.
    pub fn load(&mut self) -> Result<()> {
        log::debug!("Loading {:?}", self.path);
        let contents = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No forecast file at {:?}", self.path);
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("Open {:?}", self.path)),
        };
        self.data = serde_json::from_str(&contents)
            .with_context(|| format!("Parse {:?}", self.path))?;
        Ok(())
    }

    // Rewrite the backing file wholesale with the current mapping.
    pub fn save(&self) -> Result<()> {
        log::debug!("Saving {} records to {:?}", self.data.len(), self.path);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Create {parent:?}"))?;
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, contents).with_context(|| format!("Write {:?}", self.path))?;
        Ok(())
    }

    // Insert or overwrite the record for a date.
    pub fn insert(&mut self, date: NaiveDate, record: ForecastRecord) {
        self.data.insert(date, record);
    }

    // Return the record for a date, or an error if none is stored.
    pub fn get(&self, date: NaiveDate) -> Result<&ForecastRecord> {
        self.data
            .get(&date)
            .ok_or_else(|| anyhow!("No forecast stored for {date}"))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.data.contains_key(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Stored entries in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &ForecastRecord)> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaiveDate> {
        self.data.keys()
    }
}
