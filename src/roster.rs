//! Team membership CSV: local checks, upload, and download.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{BoardError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSummary {
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Checks that a roster has a `user` column and at least one member row.
pub fn validate_roster<R: std::io::Read>(reader: R) -> Result<RosterSummary> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| BoardError::InvalidCsv(err.to_string()))?
        .iter()
        .map(|column| column.trim().to_string())
        .collect();

    if !columns.iter().any(|column| column.eq_ignore_ascii_case("user")) {
        return Err(BoardError::InvalidCsv(
            "header row must contain a `user` column".to_string(),
        ));
    }

    let mut rows = 0;
    for (line, record) in reader.records().enumerate() {
        record.map_err(|err| BoardError::InvalidCsv(format!("row {}: {err}", line + 1)))?;
        rows += 1;
    }

    if rows == 0 {
        return Err(BoardError::InvalidCsv("no member rows".to_string()));
    }

    Ok(RosterSummary { columns, rows })
}

/// Flattens the server's `errors` payload, which may be a string or a list.
fn error_text(body: &Value) -> String {
    match body.get("errors") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => "no error details returned".to_string(),
    }
}

pub struct RosterClient {
    client: Client,
    url: Url,
}

impl RosterClient {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Posts the file as multipart field `csv`; returns the server's message.
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let summary = validate_roster(bytes.as_slice())?;
        tracing::info!(rows = summary.rows, path = %path.display(), "uploading team roster");

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster.csv".to_string());
        let part = Part::bytes(bytes).file_name(file_name).mime_str("text/csv")?;
        let form = Form::new().part("csv", part);

        let response = self.client.post(self.url.clone()).multipart(form).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("roster uploaded")
                .to_string();
            Ok(message)
        } else if body.is_object() {
            Err(BoardError::Rejected(error_text(&body)))
        } else {
            Err(BoardError::Http {
                status: status.as_u16(),
                url: self.url.to_string(),
            })
        }
    }

    /// Saves the current roster CSV to `out`; returns the number of bytes written.
    pub async fn download(&self, out: &Path) -> Result<usize> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BoardError::Http {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        std::fs::write(out, &bytes)?;
        tracing::info!(bytes = bytes.len(), out = %out.display(), "team roster downloaded");
        Ok(bytes.len())
    }
}
