use crate::error::DatasetError;
use csv::StringRecord;
use serde::Deserialize;
use std::io::Read;
use tracing::{debug, info};

/// One spreadsheet line. Every field is kept as the raw cell text; columns
/// missing from the sheet (or from a short line) read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DataRow {
    #[serde(rename = "Institution", default)]
    pub institution: String,
    #[serde(rename = "Dokumentationens namn", default)]
    pub documentation: String,
    #[serde(
        rename = "Dokumentationens webbplats",
        alias = "Dokumentationens websplats",
        default
    )]
    pub url: String,
    #[serde(rename = "Kontaktperson", default)]
    pub contact: String,
    #[serde(rename = "Mejl till kontaktperson (om det ska synas)", default)]
    pub email: String,
    #[serde(rename = "Telefonnr till kontaktperson (om det ska synas)", default)]
    pub phone: String,
    #[serde(rename = "Latitud", default)]
    pub latitude: String,
    #[serde(rename = "Longitud", default)]
    pub longitude: String,
    #[serde(rename = "color", default)]
    pub color: String,
}

impl DataRow {
    /// Numeric (lat, lon) if both cells hold a finite number
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((parse_coordinate(&self.latitude)?, parse_coordinate(&self.longitude)?))
    }
}

/// Parse a coordinate cell. Accepts a decimal comma since the sheet is
/// edited with Swedish locale settings.
pub fn parse_coordinate(text: &str) -> Option<f64> {
    let value: f64 = text.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse CSV with a header row into rows, preserving order.
///
/// Short lines are padded with empty cells and cells past the header are
/// dropped, so every row sees exactly the header's columns. Any CSV error
/// rejects the whole dataset.
pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<DataRow>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut cells: StringRecord = record.iter().take(headers.len()).collect();
        while cells.len() < headers.len() {
            cells.push_field("");
        }
        rows.push(cells.deserialize(Some(&headers))?);
    }
    Ok(rows)
}

/// Download and parse the point dataset
pub async fn fetch_rows(client: &reqwest::Client, url: &str) -> Result<Vec<DataRow>, DatasetError> {
    debug!(url, "fetching dataset");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DatasetError::Status(status));
    }

    let body = response.bytes().await?;
    let rows = parse_rows(body.as_ref())?;
    info!(url, rows = rows.len(), "dataset loaded");
    Ok(rows)
}
