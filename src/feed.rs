//! Paginated course-info feed used to attach instructor names to course cards.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::error::{BoardError, Result};

const USER_AGENT: &str = concat!("courseboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub data: Vec<FeedCourse>,
    #[serde(default)]
    pub links: Option<FeedLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedLinks {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedCourse {
    #[serde(default)]
    pub attributes: FeedAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instructor: Option<Vec<Person>>,
    #[serde(default)]
    pub creator: Option<Vec<Creator>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Creator {
    #[serde(default)]
    pub image: Option<CreatorImage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatorImage {
    #[serde(default)]
    pub license: Option<Vec<License>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct License {
    #[serde(default)]
    pub instructor: Option<Vec<Person>>,
}

impl FeedAttributes {
    /// Direct instructors first, then those credited on creator image licenses.
    /// Names are trimmed and deduplicated in first-seen order.
    pub fn instructor_names(&self) -> Vec<String> {
        let direct = self.instructor.iter().flatten();
        let licensed = self
            .creator
            .iter()
            .flatten()
            .filter_map(|creator| creator.image.as_ref())
            .filter_map(|image| image.license.as_ref())
            .flatten()
            .filter_map(|license| license.instructor.as_ref())
            .flatten();

        let mut names: Vec<String> = Vec::new();
        for person in direct.chain(licensed) {
            let Some(name) = person.name.as_deref().map(str::trim) else {
                continue;
            };
            if !name.is_empty() && !names.iter().any(|seen| seen == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

impl FeedPage {
    pub fn next_page(&self) -> Option<u32> {
        self.links
            .as_ref()
            .and_then(|links| links.next.as_deref())
            .and_then(page_from_link)
    }
}

/// Extracts the `page` query parameter from a continuation URL.
pub fn page_from_link(link: &str) -> Option<u32> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Page numbers already fetched during this session. Dropping it forgets them.
#[derive(Debug, Default)]
pub struct PageTracker {
    fetched: HashSet<u32>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.fetched.contains(&page)
    }

    /// Returns false when the page was already recorded.
    pub fn record(&mut self, page: u32) -> bool {
        self.fetched.insert(page)
    }

    pub fn len(&self) -> usize {
        self.fetched.len()
    }
}

/// Instructor names keyed by course name.
#[derive(Debug, Default)]
pub struct InstructorDirectory {
    by_course: BTreeMap<String, Vec<String>>,
}

impl InstructorDirectory {
    pub fn get(&self, course_name: &str) -> Option<&[String]> {
        self.by_course.get(course_name.trim()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_course.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_course.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.by_course.iter()
    }

    /// Adds names for every named course with instructors; earlier entries win.
    pub fn absorb(&mut self, courses: &[FeedCourse]) -> usize {
        let mut added = 0;
        for course in courses {
            let Some(name) = course
                .attributes
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
            else {
                continue;
            };
            if self.by_course.contains_key(name) {
                continue;
            }

            let instructors = course.attributes.instructor_names();
            if instructors.is_empty() {
                debug!(course = name, "no instructors listed");
                continue;
            }
            self.by_course.insert(name.to_string(), instructors);
            added += 1;
        }
        added
    }
}

pub trait PageSource {
    async fn fetch_page(&self, page: u32) -> Result<FeedPage>;
}

/// Feed endpoint reached over HTTP.
pub struct HttpFeed {
    client: Client,
    endpoint: Url,
}

impl HttpFeed {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

impl PageSource for HttpFeed {
    async fn fetch_page(&self, page: u32) -> Result<FeedPage> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BoardError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Follows `links.next` from `start_page`, fetching each page at most once per tracker.
///
/// Failures are logged and end the crawl; they never reach the caller.
/// Returns the number of pages fetched by this call.
#[instrument(skip_all, fields(start_page = start_page))]
pub async fn crawl_instructors<S: PageSource>(
    source: &S,
    tracker: &mut PageTracker,
    directory: &mut InstructorDirectory,
    start_page: u32,
) -> usize {
    let mut page = start_page.max(1);
    let mut fetched = 0;

    loop {
        if tracker.contains(page) {
            debug!(page, "page already fetched, skipping");
            break;
        }

        info!(page, "fetching course info page");
        let body = match source.fetch_page(page).await {
            Ok(body) => body,
            Err(err) => {
                error!(page, error = %err, "failed to fetch course info page");
                break;
            }
        };

        if body.data.is_empty() {
            warn!(page, "no course data on page");
            break;
        }

        tracker.record(page);
        fetched += 1;
        let added = directory.absorb(&body.data);
        debug!(page, added, "instructors collected");

        match body.next_page() {
            Some(next) if !tracker.contains(next) => page = next,
            _ => break,
        }
    }

    fetched
}
