use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{CourseRecord, QuarterSection, QuarterWindow};

pub const QUARTERS_SHOWN: usize = 4;

const QUARTER_NAMES: [(&str, &str); 4] = [
    ("January", "March"),
    ("April", "June"),
    ("July", "September"),
    ("October", "December"),
];

impl QuarterWindow {
    /// Builds quarter `index` (1..=4) of `year`; out-of-range indexes clamp to Q4.
    pub fn new(index: u8, year: i32) -> Self {
        let index = index.clamp(1, 4);
        let start_month = u32::from(index - 1) * 3;
        let (first, last) = QUARTER_NAMES[usize::from(index - 1)];
        QuarterWindow {
            index,
            year,
            start_month,
            end_month: start_month + 2,
            label: format!("{first} - {last} {year}"),
        }
    }

    pub fn containing(instant: DateTime<Utc>) -> Self {
        let index = (instant.month0() / 3 + 1) as u8;
        Self::new(index, instant.year())
    }

    pub fn next(&self) -> Self {
        if self.index >= 4 {
            Self::new(1, self.year + 1)
        } else {
            Self::new(self.index + 1, self.year)
        }
    }

    /// First instant of the window: day one of the start month at 00:00:00.
    pub fn opens_at(&self) -> Option<DateTime<Utc>> {
        NaiveDate::from_ymd_opt(self.year, self.start_month + 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Last second of the window: the day before the following month's first day, 23:59:59.
    pub fn closes_at(&self) -> Option<DateTime<Utc>> {
        let (year, month) = if self.end_month >= 11 {
            (self.year + 1, 1)
        } else {
            (self.year, self.end_month + 2)
        };
        let last_day = NaiveDate::from_ymd_opt(year, month, 1)? - Duration::days(1);
        last_day.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        match (self.opens_at(), self.closes_at()) {
            (Some(open), Some(close)) => instant >= open && instant <= close,
            _ => false,
        }
    }
}

/// The quarter containing `now` followed by the next `count - 1` quarters.
pub fn upcoming_quarters(now: DateTime<Utc>, count: usize) -> Vec<QuarterWindow> {
    let mut quarters = Vec::with_capacity(count);
    let mut quarter = QuarterWindow::containing(now);
    for _ in 0..count {
        let following = quarter.next();
        quarters.push(quarter);
        quarter = following;
    }
    quarters
}

/// Groups instructor-paced, named courses by the rolling quarter their start falls in.
///
/// Input order is kept inside each section and quarters with no courses are omitted.
pub fn classify_quarters(courses: &[CourseRecord], now: DateTime<Utc>) -> Vec<QuarterSection> {
    let quarters = upcoming_quarters(now, QUARTERS_SHOWN);
    let mut grouped: Vec<Vec<CourseRecord>> = vec![Vec::new(); quarters.len()];

    for course in courses {
        if course.self_paced || course.name().is_none() {
            tracing::debug!(id = ?course.id, "course not eligible for quarter listing");
            continue;
        }

        let Some(start) = course.start else {
            tracing::debug!(id = ?course.id, "course without start date dropped from quarters");
            continue;
        };

        match quarters.iter().position(|quarter| quarter.contains(start)) {
            Some(slot) => grouped[slot].push(course.clone()),
            None => tracing::debug!(id = ?course.id, %start, "course starts outside shown quarters"),
        }
    }

    quarters
        .into_iter()
        .zip(grouped)
        .enumerate()
        .filter(|(_, (_, courses))| !courses.is_empty())
        .map(|(position, (quarter, courses))| QuarterSection {
            quarter,
            position,
            courses,
        })
        .collect()
}
