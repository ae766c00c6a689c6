use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::models::{CourseRecord, StatusBuckets};

/// How long a self-paced course also counts as current after it opens.
pub const SELF_PACED_CURRENT_DAYS: i64 = 42;

pub fn classify_status(courses: &[CourseRecord], now: DateTime<Utc>) -> StatusBuckets {
    let mut buckets = StatusBuckets::default();

    for course in courses {
        if course.self_paced {
            buckets.self_paced.push(course.clone());
            if recently_opened(course.start, now) {
                buckets.current.push(course.clone());
            }
            continue;
        }

        match course.start {
            Some(start) if start > now => buckets.upcoming.push(course.clone()),
            Some(_) if course.end.map_or(true, |end| end >= now) => {
                buckets.current.push(course.clone())
            }
            _ => buckets.past.push(course.clone()),
        }
    }

    buckets
        .current
        .sort_by(|a, b| missing_last(a.start, b.start, false));
    buckets
        .upcoming
        .sort_by(|a, b| missing_last(a.start, b.start, false));
    buckets
        .self_paced
        .sort_by(|a, b| missing_last(a.start, b.start, true));
    buckets.past.sort_by(|a, b| {
        missing_last(a.end, b.end, true).then_with(|| missing_last(a.start, b.start, true))
    });

    buckets
}

fn recently_opened(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match start {
        Some(start) => start <= now && now - start <= Duration::days(SELF_PACED_CURRENT_DAYS),
        None => false,
    }
}

/// Orders present keys by direction; absent keys always go last.
fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
