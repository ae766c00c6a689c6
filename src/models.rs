use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRecord {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub self_paced: bool,
}

impl CourseRecord {
    /// Name used for card titles and instructor lookups, if it is non-blank.
    pub fn name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    #[default]
    Status,
    Quarter,
}

const CURRENT_QUARTER_TITLE: &str = "Current modules and micro-degrees";
const UPCOMING_QUARTER_TITLE: &str = "Upcoming modules and micro-degrees";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket {
    Current,
    Upcoming,
    SelfPaced,
    Past,
    /// A quarter section; `position` 0 is the quarter containing now.
    Quarter { position: usize, label: String },
}

impl Bucket {
    pub fn heading(&self) -> String {
        match self {
            Bucket::Current => "Current courses".to_string(),
            Bucket::Upcoming => "Upcoming courses".to_string(),
            Bucket::SelfPaced => "Self paced courses".to_string(),
            Bucket::Past => "Past courses".to_string(),
            Bucket::Quarter { position, label } => {
                let title = if *position == 0 {
                    CURRENT_QUARTER_TITLE
                } else {
                    UPCOMING_QUARTER_TITLE
                };
                format!("{title}: {label}")
            }
        }
    }
}

/// A span of three calendar months. Months are zero-based (0 = January).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterWindow {
    pub index: u8,
    pub year: i32,
    pub start_month: u32,
    pub end_month: u32,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatusBuckets {
    pub current: Vec<CourseRecord>,
    pub upcoming: Vec<CourseRecord>,
    pub self_paced: Vec<CourseRecord>,
    pub past: Vec<CourseRecord>,
}

impl StatusBuckets {
    /// Buckets in display order, paired with their bucket tag.
    pub fn sections(&self) -> [(Bucket, &[CourseRecord]); 4] {
        [
            (Bucket::Current, self.current.as_slice()),
            (Bucket::Upcoming, self.upcoming.as_slice()),
            (Bucket::SelfPaced, self.self_paced.as_slice()),
            (Bucket::Past, self.past.as_slice()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct QuarterSection {
    pub quarter: QuarterWindow,
    pub position: usize,
    pub courses: Vec<CourseRecord>,
}

impl QuarterSection {
    pub fn bucket(&self) -> Bucket {
        Bucket::Quarter {
            position: self.position,
            label: self.quarter.label.clone(),
        }
    }
}
