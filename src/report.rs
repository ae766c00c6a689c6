use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::feed::InstructorDirectory;
use crate::models::{Bucket, CourseRecord, ListingMode, QuarterSection, StatusBuckets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ListingFormat {
    #[default]
    Markdown,
    Html,
}

/// Turns a single course into a card fragment.
pub trait CardRenderer {
    fn render_card(&self, course: &CourseRecord) -> String;
}

pub struct DefaultCard<'a> {
    pub format: ListingFormat,
    pub instructors: Option<&'a InstructorDirectory>,
}

impl<'a> DefaultCard<'a> {
    pub fn new(format: ListingFormat) -> Self {
        Self {
            format,
            instructors: None,
        }
    }

    pub fn with_instructors(mut self, directory: &'a InstructorDirectory) -> Self {
        self.instructors = Some(directory);
        self
    }

    fn instructors_for(&self, course: &CourseRecord) -> Option<String> {
        let directory = self.instructors?;
        let names = directory.get(course.name()?)?;
        Some(names.join(", "))
    }
}

impl CardRenderer for DefaultCard<'_> {
    fn render_card(&self, course: &CourseRecord) -> String {
        let title = course.name().unwrap_or("Untitled course");
        let start = course.start.map(|start| start.format("%b %d, %Y").to_string());
        let end = course.end.map(|end| end.format("%b %d, %Y").to_string());
        let instructors = self.instructors_for(course);

        match self.format {
            ListingFormat::Markdown => {
                let mut card = format!("- **{title}**");
                match (&start, &end) {
                    (Some(start), Some(end)) => {
                        let _ = write!(card, " ({start} to {end})");
                    }
                    (Some(start), None) => {
                        let _ = write!(card, " (starts {start})");
                    }
                    (None, Some(end)) => {
                        let _ = write!(card, " (ends {end})");
                    }
                    (None, None) => {}
                }
                if course.self_paced {
                    card.push_str(" [self paced]");
                }
                if let Some(names) = instructors {
                    let _ = write!(card, "\n  Instructors: {names}");
                }
                card
            }
            ListingFormat::Html => {
                let title = html_escape::encode_double_quoted_attribute(title);
                let mut card = format!(
                    "<article class=\"course\" aria-label=\"{title}\"><div class=\"course-info\"><h3 class=\"course-name\">{title}</h3>"
                );
                if let Some(start) = start {
                    let _ = write!(card, "<span class=\"course-date\">Starts: {start}</span>");
                }
                if let Some(names) = instructors {
                    let _ = write!(
                        card,
                        "<div class=\"course-instructors\">{}</div>",
                        html_escape::encode_text(&names)
                    );
                }
                card.push_str("</div></article>");
                card
            }
        }
    }
}

/// Empty output, or markup cut off before its closing `>`.
pub fn is_broken_card(markup: &str) -> bool {
    let trimmed = markup.trim();
    trimmed.is_empty() || (trimmed.starts_with('<') && !trimmed.ends_with('>'))
}

/// Renders each course, dropping cards the renderer failed to produce.
pub fn render_cards(renderer: &dyn CardRenderer, courses: &[CourseRecord]) -> Vec<String> {
    courses
        .iter()
        .filter_map(|course| {
            let card = renderer.render_card(course);
            if is_broken_card(&card) {
                tracing::debug!(id = ?course.id, "dropping broken course card");
                None
            } else {
                Some(card)
            }
        })
        .collect()
}

fn bucket_class(bucket: &Bucket) -> &'static str {
    match bucket {
        Bucket::Current => "current-courses",
        Bucket::Upcoming => "upcoming-courses",
        Bucket::SelfPaced => "self-paced-courses",
        Bucket::Past => "past-courses",
        Bucket::Quarter { .. } => "quarter",
    }
}

fn write_section(
    output: &mut String,
    format: ListingFormat,
    bucket: &Bucket,
    cards: &[String],
) {
    let heading = bucket.heading();
    match format {
        ListingFormat::Markdown => {
            let _ = writeln!(output);
            let _ = writeln!(output, "## {heading}");
            for card in cards {
                let _ = writeln!(output, "{card}");
            }
        }
        ListingFormat::Html => {
            let class = bucket_class(bucket);
            let heading = html_escape::encode_text(&heading);
            if let Bucket::Quarter { .. } = bucket {
                let _ = writeln!(output, "<div class=\"quarter-section\">");
                let _ = writeln!(output, "<h2 class=\"quarter-label\">{heading}</h2>");
                let _ = writeln!(output, "<ul class=\"courses-listing courses-list\">");
            } else {
                let _ = writeln!(output, "<h2 class=\"{class}-header\">{heading}</h2>");
                let _ = writeln!(output, "<ul class=\"{class}-listing\">");
            }
            for card in cards {
                let _ = writeln!(output, "<li class=\"courses-listing-item\">{card}</li>");
            }
            let _ = writeln!(output, "</ul>");
            if let Bucket::Quarter { .. } = bucket {
                let _ = writeln!(output, "</div>");
            }
        }
    }
}

fn write_header(output: &mut String, format: ListingFormat, mode: ListingMode, now: DateTime<Utc>) {
    let mode = match mode {
        ListingMode::Status => "status",
        ListingMode::Quarter => "quarter",
    };
    match format {
        ListingFormat::Markdown => {
            let _ = writeln!(output, "# Course Listing");
            let _ = writeln!(output, "Generated {} ({mode} view)", now.format("%Y-%m-%d %H:%M UTC"));
        }
        ListingFormat::Html => {
            let _ = writeln!(
                output,
                "<div class=\"courses\" data-view=\"{mode}\" data-generated=\"{}\">",
                now.to_rfc3339()
            );
        }
    }
}

fn write_footer(output: &mut String, format: ListingFormat, sections_written: usize) {
    match format {
        ListingFormat::Markdown if sections_written == 0 => {
            let _ = writeln!(output);
            let _ = writeln!(output, "No courses to show.");
        }
        ListingFormat::Markdown => {}
        ListingFormat::Html => {
            let _ = writeln!(output, "</div>");
        }
    }
}

pub fn build_status_listing(
    buckets: &StatusBuckets,
    renderer: &dyn CardRenderer,
    format: ListingFormat,
    now: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let mut written = 0;
    write_header(&mut output, format, ListingMode::Status, now);

    for (bucket, courses) in buckets.sections() {
        let cards = render_cards(renderer, courses);
        if cards.is_empty() {
            continue;
        }
        write_section(&mut output, format, &bucket, &cards);
        written += 1;
    }

    write_footer(&mut output, format, written);
    output
}

pub fn build_quarter_listing(
    sections: &[QuarterSection],
    renderer: &dyn CardRenderer,
    format: ListingFormat,
    now: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let mut written = 0;
    write_header(&mut output, format, ListingMode::Quarter, now);

    for section in sections {
        let cards = render_cards(renderer, &section.courses);
        if cards.is_empty() {
            continue;
        }
        write_section(&mut output, format, &section.bucket(), &cards);
        written += 1;
    }

    write_footer(&mut output, format, written);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::classify_status;
    use crate::feed::FeedCourse;
    use crate::quarter::classify_quarters;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap()
    }

    fn course(name: &str, start: Option<DateTime<Utc>>, self_paced: bool) -> CourseRecord {
        CourseRecord {
            id: Some(format!("course-v1:{name}")),
            display_name: Some(name.to_string()),
            start,
            end: None,
            self_paced,
        }
    }

    struct Truncating;

    impl CardRenderer for Truncating {
        fn render_card(&self, course: &CourseRecord) -> String {
            match course.name() {
                Some("Broken") => "<article class=\"course\"><div".to_string(),
                Some("Blank") => "   ".to_string(),
                Some(name) => format!("<article>{name}</article>"),
                None => String::new(),
            }
        }
    }

    #[test]
    fn detects_broken_cards() {
        assert!(is_broken_card(""));
        assert!(is_broken_card("<article><h3>Algebra</h3"));
        assert!(!is_broken_card("<article>Algebra</article>"));
        assert!(!is_broken_card("- **Algebra**"));
    }

    #[test]
    fn broken_cards_are_dropped_without_aborting() {
        let cards = render_cards(
            &Truncating,
            &[
                course("Broken", None, false),
                course("Algebra", None, false),
                course("Blank", None, false),
            ],
        );
        assert_eq!(cards, vec!["<article>Algebra</article>".to_string()]);
    }

    #[test]
    fn status_listing_skips_empty_buckets() {
        let now = at(2024, 11, 1);
        let buckets = classify_status(
            &[
                course("Chemistry", Some(at(2024, 10, 1)), false),
                course("Painting", None, true),
            ],
            now,
        );
        let listing = build_status_listing(
            &buckets,
            &DefaultCard::new(ListingFormat::Markdown),
            ListingFormat::Markdown,
            now,
        );

        assert!(listing.starts_with("# Course Listing"));
        assert!(listing.contains("## Current courses\n- **Chemistry** (starts Oct 01, 2024)"));
        assert!(listing.contains("## Self paced courses\n- **Painting** [self paced]"));
        assert!(!listing.contains("Upcoming courses"));
        assert!(!listing.contains("Past courses"));
    }

    #[test]
    fn quarter_listing_renders_html_sections() {
        let now = at(2024, 11, 15);
        let sections = classify_quarters(&[course("Algebra & Logic", Some(at(2025, 2, 10)), false)], now);
        let listing = build_quarter_listing(
            &sections,
            &DefaultCard::new(ListingFormat::Html),
            ListingFormat::Html,
            now,
        );

        assert!(listing.contains(
            "<h2 class=\"quarter-label\">Upcoming modules and micro-degrees: January - March 2025</h2>"
        ));
        assert!(listing.contains("aria-label=\"Algebra &amp; Logic\""));
        assert!(!listing.contains("October - December 2024"));
        assert!(listing.trim_end().ends_with("</div>"));
    }

    #[test]
    fn html_cards_escape_titles() {
        let card = DefaultCard::new(ListingFormat::Html)
            .render_card(&course("Say \"Hi\" & Bye", None, false));
        assert!(card.contains("aria-label=\"Say &quot;Hi&quot; &amp; Bye\""));
        assert!(!is_broken_card(&card));
    }

    #[test]
    fn empty_markdown_listing_says_so() {
        let now = at(2024, 11, 15);
        let listing = build_quarter_listing(
            &[],
            &DefaultCard::new(ListingFormat::Markdown),
            ListingFormat::Markdown,
            now,
        );
        assert!(listing.contains("No courses to show."));
    }

    #[test]
    fn cards_include_known_instructors() {
        let feed: Vec<FeedCourse> = serde_json::from_str(
            r#"[{"attributes": {"name": "Algebra", "instructor": [{"name": "Ada"}, {"name": "Emmy"}]}}]"#,
        )
        .unwrap();
        let mut directory = InstructorDirectory::default();
        directory.absorb(&feed);

        let renderer = DefaultCard::new(ListingFormat::Html).with_instructors(&directory);
        let card = renderer.render_card(&course("Algebra", None, false));
        assert!(card.contains("<div class=\"course-instructors\">Ada, Emmy</div>"));

        let plain = DefaultCard::new(ListingFormat::Markdown).with_instructors(&directory);
        assert!(plain
            .render_card(&course("Algebra", None, false))
            .ends_with("Instructors: Ada, Emmy"));
    }
}
