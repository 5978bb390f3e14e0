use crate::helpers::format_timestamp;
use crate::models::{HistoryEntry, MediaItem};

const DAY: i64 = 24 * 60 * 60;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

pub const JUST_NOW: &str = "Just now";

/// Age buckets in display order, as half-open `[lo, hi)` ranges in seconds.
const GROUPS: [(&str, i64, i64); 5] = [
    ("Last 24 hours", 0, DAY),
    ("Last 7 days", DAY, WEEK),
    ("Last 30 days", WEEK, MONTH),
    ("Last 365 days", MONTH, YEAR),
    ("Long time ago", YEAR, i64::MAX),
];

/// Rows shown in demo mode: one header and four files.
pub fn demo_seed() -> Vec<MediaItem> {
    vec![
        MediaItem::group("January"),
        MediaItem::item("o-astronauta-de-marmore.mp3", "13/10/25, 16:24:20"),
        MediaItem::item("voce-nao-me-ensinou-a-te-esquecer.mp3", "13/10/25, 16:24:20"),
        MediaItem::item("test.mp3", "13/10/25, 16:24:36"),
        MediaItem::item("test.mp3", "13/10/25, 16:25:21"),
    ]
}

/// Newest first, bucketed by age relative to `now`; empty buckets are skipped.
pub fn group_history(entries: &[HistoryEntry], now: i64) -> Vec<MediaItem> {
    let mut sorted: Vec<&HistoryEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.ts.cmp(&a.ts).then(b.id.cmp(&a.id)));

    let mut buckets: Vec<Vec<MediaItem>> = vec![Vec::new(); GROUPS.len()];
    for e in sorted {
        // clock skew: future timestamps count as brand new
        let age = (now - e.ts).max(0);
        if let Some(idx) = GROUPS.iter().position(|(_, lo, hi)| *lo <= age && age < *hi) {
            buckets[idx].push(MediaItem::item(&e.file, &format_timestamp(e.ts)).with_source(e));
        }
    }

    let mut out = Vec::new();
    for ((label, _, _), rows) in GROUPS.iter().zip(buckets) {
        if rows.is_empty() {
            continue;
        }
        out.push(MediaItem::group(label));
        out.extend(rows);
    }
    out
}

/// Put a fresh item at the top, under a single "Just now" header.
pub fn insert_just_now(rows: &mut Vec<MediaItem>, item: MediaItem) {
    let has_header = rows
        .first()
        .map(|r| r.is_group && r.title == JUST_NOW)
        .unwrap_or(false);
    if has_header {
        rows.insert(1, item);
    } else {
        rows.insert(0, item);
        rows.insert(0, MediaItem::group(JUST_NOW));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, file: &str, ts: i64) -> HistoryEntry {
        HistoryEntry { id, file: file.into(), url: format!("https://example.com/{}", id), ts }
    }

    #[test]
    fn demo_seed_has_one_header_and_four_files() {
        let rows = demo_seed();
        assert_eq!(rows.len(), 5);
        assert!(rows[0].is_group);
        assert_eq!(rows[0].title, "January");
        assert!(rows[1..].iter().all(|r| !r.is_group && !r.timestamp.is_empty()));
    }

    #[test]
    fn groups_by_age_and_skips_empty_buckets() {
        let now = 1_000 * DAY;
        let rows = group_history(
            &[
                entry(1, "old.mp3", now - 2 * YEAR),
                entry(2, "today.mp3", now - 60),
                entry(3, "week.mp3", now - 3 * DAY),
            ],
            now,
        );
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Last 24 hours", "today.mp3", "Last 7 days", "week.mp3", "Long time ago", "old.mp3"]
        );
        assert_eq!(rows[1].url.as_deref(), Some("https://example.com/2"));
        assert_eq!(rows[1].history_id, Some(2));
    }

    #[test]
    fn newest_first_within_bucket() {
        let now = 100 * DAY;
        let rows = group_history(&[entry(1, "a.mp3", now - 500), entry(2, "b.mp3", now - 10)], now);
        assert_eq!(rows[1].title, "b.mp3");
        assert_eq!(rows[2].title, "a.mp3");
    }

    #[test]
    fn future_timestamps_land_in_first_bucket() {
        let now = 100 * DAY;
        let rows = group_history(&[entry(1, "skew.mp3", now + 3_600)], now);
        assert_eq!(rows[0].title, "Last 24 hours");
    }

    #[test]
    fn bucket_boundaries_are_half_open() {
        let now = 100 * DAY;
        let rows = group_history(&[entry(1, "edge.mp3", now - DAY)], now);
        assert_eq!(rows[0].title, "Last 7 days");
    }

    #[test]
    fn just_now_header_is_added_once() {
        let mut rows = demo_seed();
        insert_just_now(&mut rows, MediaItem::item("first.mp3", "x"));
        insert_just_now(&mut rows, MediaItem::item("second.mp3", "y"));
        assert_eq!(rows[0], MediaItem::group(JUST_NOW));
        assert_eq!(rows[1].title, "second.mp3");
        assert_eq!(rows[2].title, "first.mp3");
        assert_eq!(rows[3].title, "January");
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn just_now_on_empty_list() {
        let mut rows = Vec::new();
        insert_just_now(&mut rows, MediaItem::item("a.mp3", "x"));
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_group);
    }
}
