use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::dates;
use crate::models::CourseRecord;

/// Course row as it appears in exported listings; dates stay as raw strings until parsed.
#[derive(Debug, Deserialize)]
struct RawCourse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    self_paced: bool,
}

impl From<RawCourse> for CourseRecord {
    fn from(raw: RawCourse) -> Self {
        CourseRecord {
            id: raw.id,
            display_name: raw.display_name,
            start: dates::parse_optional(raw.start.as_deref()),
            end: dates::parse_optional(raw.end.as_deref()),
            self_paced: raw.self_paced,
        }
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
        Missing(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Number(value) => value != 0,
        Flag::Text(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        ),
        Flag::Missing(()) => false,
    })
}

/// Accepts a bare array of courses or a `{"data": [...]}` envelope.
/// Rows that do not look like a course are skipped.
pub fn parse_json(body: &str) -> anyhow::Result<Vec<CourseRecord>> {
    let listing: Value = serde_json::from_str(body).context("course listing is not valid JSON")?;
    let rows = match listing {
        Value::Array(rows) => rows,
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => anyhow::bail!("course listing object has no `data` array"),
        },
        _ => anyhow::bail!("course listing must be a JSON array or an object with `data`"),
    };

    let mut courses = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<RawCourse>(row) {
            Ok(raw) => courses.push(CourseRecord::from(raw)),
            Err(err) => tracing::debug!(index, error = %err, "skipping malformed course entry"),
        }
    }
    Ok(courses)
}

pub fn parse_csv<R: std::io::Read>(reader: R) -> anyhow::Result<Vec<CourseRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut courses = Vec::new();

    for (line, result) in reader.deserialize::<RawCourse>().enumerate() {
        match result {
            Ok(row) => courses.push(CourseRecord::from(row)),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) => {
                tracing::debug!(row = line + 1, error = %err, "skipping malformed course row");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("invalid course row {}", line + 1));
            }
        }
    }

    Ok(courses)
}

/// Loads courses from a `.csv` file, or JSON for any other extension.
pub fn load_courses(path: &Path) -> anyhow::Result<Vec<CourseRecord>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let courses = if is_csv {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        parse_csv(file)?
    } else {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_json(&body)?
    };

    tracing::info!(count = courses.len(), path = %path.display(), "loaded courses");
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn reads_plain_json_array() {
        let courses = parse_json(
            r#"[
                {"id": "course-v1:X+ALG+2025", "display_name": "Algebra", "start": "2025-02-10T00:00:00Z", "end": null, "self_paced": false},
                {"display_name": "Drawing", "start": "2024-01-01", "self_paced": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].id.as_deref(), Some("course-v1:X+ALG+2025"));
        assert_eq!(courses[0].start, Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).single());
        assert_eq!(courses[0].end, None);
        assert!(courses[1].self_paced);
    }

    #[test]
    fn reads_data_envelope_and_name_alias() {
        let courses = parse_json(r#"{"data": [{"name": "Biology", "start": "2024-05-01"}]}"#).unwrap();
        assert_eq!(courses[0].name(), Some("Biology"));
        assert!(!courses[0].self_paced);
    }

    #[test]
    fn malformed_dates_do_not_fail_loading() {
        let courses =
            parse_json(r#"[{"display_name": "Odd", "start": "not-a-date", "end": "soon"}]"#).unwrap();
        assert_eq!(courses[0].start, None);
        assert_eq!(courses[0].end, None);
    }

    #[test]
    fn numeric_self_paced_flags_are_accepted() {
        let courses = parse_json(
            r#"[
                {"display_name": "A", "self_paced": 1},
                {"display_name": "B", "self_paced": 0},
                {"display_name": "C", "self_paced": "yes"},
                {"display_name": "D", "self_paced": null}
            ]"#,
        )
        .unwrap();
        let flags: Vec<bool> = courses.iter().map(|c| c.self_paced).collect();
        assert_eq!(flags, vec![true, false, true, false]);

        let data = "id,display_name,start,end,self_paced\n\
                    c1,Chemistry,2024-09-01,,1\n\
                    c2,Physics,2024-09-01,,0\n\
                    c3,Biology,2024-09-01,,TRUE\n";
        let courses = parse_csv(data.as_bytes()).unwrap();
        let flags: Vec<bool> = courses.iter().map(|c| c.self_paced).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn malformed_json_entries_are_skipped() {
        let courses = parse_json(
            r#"[
                {"display_name": 42, "start": "2024-05-01"},
                "not a course",
                {"display_name": "Kept", "self_paced": [true]},
                {"display_name": "Also kept"}
            ]"#,
        )
        .unwrap();
        let names: Vec<&str> = courses.iter().filter_map(|c| c.name()).collect();
        assert_eq!(names, vec!["Also kept"]);
    }

    #[test]
    fn reads_csv_rows() {
        let data = "id,display_name,start,end,self_paced\n\
                    c1,Chemistry,2024-09-01,2024-12-15,false\n\
                    c2,Painting,,,true\n";
        let courses = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].name(), Some("Chemistry"));
        assert_eq!(courses[1].start, None);
        assert!(courses[1].self_paced);
    }

    #[test]
    fn ragged_csv_still_fails() {
        let data = "id,display_name,start,end,self_paced\nc1,Chemistry\n";
        assert!(parse_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn rejects_non_listing_json() {
        assert!(parse_json(r#"{"courses": 3}"#).is_err());
        assert!(parse_json("[{").is_err());
    }

    #[test]
    fn loads_by_file_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("courses.CSV");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "display_name,start\nHistory,2024-02-01").unwrap();

        let json_path = dir.path().join("courses.json");
        std::fs::write(&json_path, r#"[{"display_name": "Music"}]"#).unwrap();

        assert_eq!(load_courses(&csv_path).unwrap()[0].name(), Some("History"));
        assert_eq!(load_courses(&json_path).unwrap()[0].name(), Some("Music"));
    }
}
