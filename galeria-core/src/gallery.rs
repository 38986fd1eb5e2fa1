//! Gallery view model
//!
//! Search filtering, date grouping and tap routing for the grid, list and
//! by-date layouts. Callers pass the time zone so the same records group
//! the same way in tests and on the device.

use crate::media::{MediaRecord, MediaType};
use chrono::{Days, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
    Date,
}

/// Which viewer a tapped item opens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerTarget<'a> {
    Video(&'a MediaRecord),
    Image(&'a MediaRecord),
}

pub fn open_target(record: &MediaRecord) -> ViewerTarget<'_> {
    match record.media_type {
        MediaType::Video => ViewerTarget::Video(record),
        MediaType::Image => ViewerTarget::Image(record),
    }
}

fn local_day<Tz: TimeZone>(record: &MediaRecord, tz: &Tz) -> NaiveDate {
    record.created_at.with_timezone(tz).date_naive()
}

/// Short localized date (`dd/mm/yyyy`) used for search and list subtitles.
pub fn date_string<Tz: TimeZone>(record: &MediaRecord, tz: &Tz) -> String {
    local_day(record, tz).format("%d/%m/%Y").to_string()
}

/// Case-insensitive substring match against the file name or the date
/// string. An empty query keeps everything.
pub fn filter<'a, Tz: TimeZone>(
    items: &'a [MediaRecord],
    query: &str,
    tz: &Tz,
) -> Vec<&'a MediaRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| {
            item.filename.to_lowercase().contains(&needle)
                || date_string(item, tz).contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Yesterday,
    On(NaiveDate),
}

impl DayLabel {
    pub fn for_day(day: NaiveDate, today: NaiveDate) -> Self {
        if day == today {
            DayLabel::Today
        } else if today.checked_sub_days(Days::new(1)) == Some(day) {
            DayLabel::Yesterday
        } else {
            DayLabel::On(day)
        }
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayLabel::Today => write!(f, "Today"),
            DayLabel::Yesterday => write!(f, "Yesterday"),
            DayLabel::On(day) => write!(f, "{}", day.format("%A, %-d %B %Y")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateSection<'a> {
    pub day: NaiveDate,
    pub label: DayLabel,
    pub items: Vec<&'a MediaRecord>,
}

/// Bucket by calendar day of `created_at`, newest day first. Items keep
/// their input order within a day.
pub fn group_by_date<'a, Tz: TimeZone>(
    items: &[&'a MediaRecord],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DateSection<'a>> {
    let mut days: BTreeMap<NaiveDate, Vec<&'a MediaRecord>> = BTreeMap::new();
    for item in items {
        days.entry(local_day(item, tz)).or_default().push(*item);
    }

    days.into_iter()
        .rev()
        .map(|(day, items)| DateSection {
            day,
            label: DayLabel::for_day(day, today),
            items,
        })
        .collect()
}

/// `"<date> • <type>"` under each row of the list view.
pub fn list_subtitle<Tz: TimeZone>(record: &MediaRecord, tz: &Tz) -> String {
    format!("{} • {}", date_string(record, tz), record.media_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::path::PathBuf;

    fn record(id: &str, filename: &str, created_at: &str) -> MediaRecord {
        let created_at: DateTime<Utc> = created_at.parse().unwrap();
        MediaRecord {
            id: id.to_string(),
            source_uri: String::new(),
            local_uri: PathBuf::from(format!("/m/{}", filename)),
            media_type: crate::media::type_from_filename(filename),
            filename: filename.to_string(),
            created_at,
            saved_at: created_at,
            file_size: 0,
            width: None,
            height: None,
            duration_ms: None,
            thumbnail_uri: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filter_by_name_and_date() {
        let items = vec![
            record("1", "Beach.JPG", "2026-10-18T10:00:00Z"),
            record("2", "clip.mov", "2026-09-01T10:00:00Z"),
        ];

        let hits = filter(&items, "beach", &Utc);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");

        let hits = filter(&items, "01/09", &Utc);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");

        assert_eq!(filter(&items, "  ", &Utc).len(), 2);
        assert!(filter(&items, "nothing", &Utc).is_empty());
    }

    #[test]
    fn test_group_by_date_newest_first_with_labels() {
        let items = vec![
            record("a", "a.jpg", "2026-10-10T08:00:00Z"),
            record("b", "b.jpg", "2026-10-18T09:00:00Z"),
            record("c", "c.jpg", "2026-10-17T23:00:00Z"),
            record("d", "d.jpg", "2026-10-18T01:00:00Z"),
        ];
        let refs: Vec<&MediaRecord> = items.iter().collect();

        let sections = group_by_date(&refs, day(2026, 10, 18), &Utc);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].label, DayLabel::Today);
        assert_eq!(
            sections[0].items.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "d"]
        );
        assert_eq!(sections[1].label, DayLabel::Yesterday);
        assert_eq!(sections[2].label, DayLabel::On(day(2026, 10, 10)));
        assert_eq!(sections[2].label.to_string(), "Saturday, 10 October 2026");
    }

    #[test]
    fn test_tap_routes_by_type() {
        let video = record("v", "v.mp4", "2026-10-18T10:00:00Z");
        let image = record("i", "i.png", "2026-10-18T10:00:00Z");
        assert!(matches!(open_target(&video), ViewerTarget::Video(_)));
        assert!(matches!(open_target(&image), ViewerTarget::Image(_)));
    }

    #[test]
    fn test_list_subtitle() {
        let video = record("v", "v.mp4", "2026-10-18T10:00:00Z");
        assert_eq!(list_subtitle(&video, &Utc), "18/10/2026 • video");
    }
}
