//! Practice statistics over session history.
//!
//! Sessions are bucketed by the calendar day they started on in the time
//! zone of `now`, so an evening session counts for that evening and not
//! for the next UTC day. The CLI passes `Local::now()`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use super::record::{SessionKind, SessionRecord};

/// Length of the windows compared week over week.
const WEEK_DAYS: u32 = 7;

/// Aggregates over a window of days ending today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    pub days: u32,
    pub total_sessions: u32,
    pub total_duration_seconds: u64,
    pub avg_session_seconds: f64,
    /// Most frequent breathing pattern
    pub most_used_pattern: Option<String>,
    /// Sessions per day, oldest first
    pub sessions_per_day: Vec<u32>,
    /// Active seconds per day, oldest first
    pub duration_per_day: Vec<u64>,
    /// Breathing sessions per pattern
    pub pattern_distribution: BTreeMap<String, u32>,
    pub breathing_sessions: u32,
    pub focus_sessions: u32,
    pub focus_duration_seconds: u64,
}

impl PeriodStats {
    /// Computes statistics for the `days` days ending on the day of `now`.
    ///
    /// Sessions outside the window are ignored. Focus sessions count toward
    /// the totals and the per-day series but not toward pattern usage.
    pub fn compute<Tz: TimeZone>(records: &[SessionRecord], now: &DateTime<Tz>, days: u32) -> Self {
        let days = days.max(1);
        let tz = now.timezone();
        let today = now.date_naive();
        let first_day = today - Duration::days(i64::from(days) - 1);

        let mut sessions_per_day = vec![0u32; days as usize];
        let mut duration_per_day = vec![0u64; days as usize];
        let mut pattern_distribution: BTreeMap<String, u32> = BTreeMap::new();
        let mut focus_sessions = 0;
        let mut focus_duration_seconds = 0;

        for record in records {
            let day = record.day_in(&tz);
            if day < first_day || day > today {
                continue;
            }
            let index = (day - first_day).num_days() as usize;
            sessions_per_day[index] += 1;
            duration_per_day[index] += record.duration_seconds;

            match record.kind {
                SessionKind::Breathing => {
                    *pattern_distribution
                        .entry(record.pattern_id.clone())
                        .or_default() += 1;
                }
                SessionKind::Focus => {
                    focus_sessions += 1;
                    focus_duration_seconds += record.duration_seconds;
                }
            }
        }

        let total_sessions: u32 = sessions_per_day.iter().sum();
        let total_duration_seconds: u64 = duration_per_day.iter().sum();
        let avg_session_seconds = if total_sessions > 0 {
            total_duration_seconds as f64 / f64::from(total_sessions)
        } else {
            0.0
        };
        let most_used_pattern = most_used(&pattern_distribution).map(|(p, _)| p.to_string());

        Self {
            days,
            total_sessions,
            total_duration_seconds,
            avg_session_seconds,
            most_used_pattern,
            sessions_per_day,
            duration_per_day,
            breathing_sessions: total_sessions - focus_sessions,
            pattern_distribution,
            focus_sessions,
            focus_duration_seconds,
        }
    }
}

/// Most frequent entry. Ties go to the alphabetically first key.
fn most_used(distribution: &BTreeMap<String, u32>) -> Option<(&str, u32)> {
    let mut best: Option<(&str, u32)> = None;
    for (pattern, &count) in distribution {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((pattern.as_str(), count));
        }
    }
    best
}

// ============================================================================
// Streaks
// ============================================================================

fn practice_days<Tz: TimeZone>(records: &[SessionRecord], tz: &Tz) -> BTreeSet<NaiveDate> {
    records.iter().map(|r| r.day_in(tz)).collect()
}

/// Consecutive practice days ending today, or yesterday if today has no
/// session yet. A gap of a full day resets the streak.
pub fn current_streak<Tz: TimeZone>(records: &[SessionRecord], now: &DateTime<Tz>) -> u32 {
    let days = practice_days(records, &now.timezone());
    let today = now.date_naive();

    let yesterday = today - Duration::days(1);
    let mut day = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive practice days anywhere in the history.
pub fn longest_streak<Tz: TimeZone>(records: &[SessionRecord], tz: &Tz) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in practice_days(records, tz) {
        run = match previous {
            Some(prev) if day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

// ============================================================================
// PracticeSummary
// ============================================================================

/// The most used breathing pattern of the past week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoritePattern {
    pub id: String,
    pub name: String,
    /// Sessions with this pattern across the whole history
    pub count: u32,
}

/// Headline numbers across the whole history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSummary {
    pub today_sessions: u32,
    pub today_seconds: u64,
    /// Practice time in the 7 days ending today
    pub this_week_seconds: u64,
    /// Practice time in the 7 days before that
    pub last_week_seconds: u64,
    /// Week-over-week change in practice time, in whole percent
    pub improvement_percent: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub favorite_pattern: Option<FavoritePattern>,
}

impl PracticeSummary {
    pub fn compute<Tz: TimeZone>(records: &[SessionRecord], now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let this_week_start = today - Duration::days(i64::from(WEEK_DAYS) - 1);
        let last_week_start = this_week_start - Duration::days(i64::from(WEEK_DAYS));

        let mut today_sessions = 0;
        let mut today_seconds = 0;
        let mut this_week_seconds = 0;
        let mut last_week_seconds = 0;

        for record in records {
            let day = record.day_in(&tz);
            if day == today {
                today_sessions += 1;
                today_seconds += record.duration_seconds;
            }
            if (this_week_start..=today).contains(&day) {
                this_week_seconds += record.duration_seconds;
            } else if (last_week_start..this_week_start).contains(&day) {
                last_week_seconds += record.duration_seconds;
            }
        }

        Self {
            today_sessions,
            today_seconds,
            this_week_seconds,
            last_week_seconds,
            improvement_percent: improvement_percent(this_week_seconds, last_week_seconds),
            current_streak: current_streak(records, now),
            longest_streak: longest_streak(records, &tz),
            favorite_pattern: favorite_pattern(records, now),
        }
    }
}

/// Relative change from `last` to `this`. Any practice after an empty week
/// counts as 100%.
fn improvement_percent(this: u64, last: u64) -> i64 {
    if last > 0 {
        ((this as f64 - last as f64) / last as f64 * 100.0).round() as i64
    } else if this > 0 {
        100
    } else {
        0
    }
}

fn favorite_pattern<Tz: TimeZone>(
    records: &[SessionRecord],
    now: &DateTime<Tz>,
) -> Option<FavoritePattern> {
    let week = PeriodStats::compute(records, now, WEEK_DAYS);
    let id = week.most_used_pattern?;

    let mut matching = records
        .iter()
        .filter(|r| r.kind == SessionKind::Breathing && r.pattern_id == id);
    let name = matching.next().map(|r| r.pattern_name.clone())?;
    let count = 1 + matching.count() as u32;

    Some(FavoritePattern { id, name, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::record::SessionEnd;
    use chrono::{FixedOffset, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap()
    }

    fn record(days_ago: i64, pattern_id: &str, seconds: f64) -> SessionRecord {
        let start = Utc.with_ymd_and_hms(2026, 5, 20, 9, 0, 0).unwrap() - Duration::days(days_ago);
        SessionRecord::new(
            pattern_id,
            pattern_id,
            start,
            start,
            seconds,
            4,
            SessionEnd::Completed,
        )
    }

    fn focus(days_ago: i64, seconds: f64) -> SessionRecord {
        let start = Utc.with_ymd_and_hms(2026, 5, 20, 10, 0, 0).unwrap() - Duration::days(days_ago);
        SessionRecord::focus(start, start, seconds, SessionEnd::Completed)
    }

    mod period_stats_tests {
        use super::*;

        #[test]
        fn test_empty_history() {
            let stats = PeriodStats::compute(&[], &now(), 7);

            assert_eq!(stats.total_sessions, 0);
            assert_eq!(stats.avg_session_seconds, 0.0);
            assert!(stats.most_used_pattern.is_none());
            assert_eq!(stats.sessions_per_day, vec![0; 7]);
        }

        #[test]
        fn test_weekly_stats() {
            let records = vec![
                record(0, "box", 120.0),
                record(0, "4-7-8", 60.0),
                record(2, "box", 90.0),
                record(6, "4-6", 30.0),
                record(7, "box", 600.0),
            ];

            let stats = PeriodStats::compute(&records, &now(), 7);

            assert_eq!(stats.total_sessions, 4);
            assert_eq!(stats.total_duration_seconds, 300);
            assert_eq!(stats.avg_session_seconds, 75.0);
            assert_eq!(stats.most_used_pattern, Some("box".to_string()));
            assert_eq!(stats.sessions_per_day, vec![1, 0, 0, 0, 1, 0, 2]);
            assert_eq!(stats.duration_per_day, vec![30, 0, 0, 0, 90, 0, 180]);
            assert_eq!(stats.pattern_distribution.get("box"), Some(&2));
        }

        #[test]
        fn test_most_used_tie_breaks_alphabetically() {
            let records = vec![record(0, "coherent", 60.0), record(1, "box", 60.0)];

            let stats = PeriodStats::compute(&records, &now(), 30);
            assert_eq!(stats.most_used_pattern, Some("box".to_string()));
        }

        #[test]
        fn test_zero_days_means_today_only() {
            let records = vec![record(0, "box", 60.0), record(1, "box", 60.0)];

            let stats = PeriodStats::compute(&records, &now(), 0);
            assert_eq!(stats.days, 1);
            assert_eq!(stats.total_sessions, 1);
        }

        #[test]
        fn test_focus_sessions_split_from_breathing() {
            let records = vec![
                record(0, "box", 120.0),
                focus(0, 1500.0),
                focus(1, 900.0),
                focus(1, 900.0),
            ];

            let stats = PeriodStats::compute(&records, &now(), 7);

            assert_eq!(stats.total_sessions, 4);
            assert_eq!(stats.breathing_sessions, 1);
            assert_eq!(stats.focus_sessions, 3);
            assert_eq!(stats.focus_duration_seconds, 3300);
            assert_eq!(stats.total_duration_seconds, 3420);
            assert_eq!(stats.most_used_pattern, Some("box".to_string()));
            assert!(!stats.pattern_distribution.contains_key("focus"));
        }

        #[test]
        fn test_evening_session_counts_for_local_day() {
            // 20:30 in UTC-5 on May 20 is 01:30 UTC on May 21.
            let tz = FixedOffset::west_opt(5 * 3600).unwrap();
            let start = tz.with_ymd_and_hms(2026, 5, 20, 20, 30, 0).unwrap();
            let records = vec![SessionRecord::new(
                "box",
                "Box Breathing",
                start.with_timezone(&Utc),
                start.with_timezone(&Utc),
                64.0,
                4,
                SessionEnd::Completed,
            )];
            let local_now = tz.with_ymd_and_hms(2026, 5, 20, 21, 0, 0).unwrap();

            let stats = PeriodStats::compute(&records, &local_now, 7);

            assert_eq!(stats.total_sessions, 1);
            assert_eq!(stats.sessions_per_day[6], 1);
            assert_eq!(current_streak(&records, &local_now), 1);
        }
    }

    mod streak_tests {
        use super::*;

        #[test]
        fn test_no_sessions() {
            assert_eq!(current_streak(&[], &now()), 0);
            assert_eq!(longest_streak(&[], &Utc), 0);
        }

        #[test]
        fn test_streak_including_today() {
            let records = vec![
                record(0, "box", 60.0),
                record(0, "box", 60.0),
                record(1, "box", 60.0),
                record(2, "box", 60.0),
                record(4, "box", 60.0),
            ];
            assert_eq!(current_streak(&records, &now()), 3);
        }

        #[test]
        fn test_streak_ending_yesterday() {
            let records = vec![record(1, "box", 60.0), record(2, "box", 60.0)];
            assert_eq!(current_streak(&records, &now()), 2);
        }

        #[test]
        fn test_gap_resets_streak() {
            let records = vec![record(2, "box", 60.0), record(3, "box", 60.0)];
            assert_eq!(current_streak(&records, &now()), 0);
        }

        #[test]
        fn test_night_and_next_morning_are_two_local_days() {
            let tz = FixedOffset::west_opt(5 * 3600).unwrap();
            let evening = tz.with_ymd_and_hms(2026, 5, 19, 22, 0, 0).unwrap();
            let morning = tz.with_ymd_and_hms(2026, 5, 20, 7, 0, 0).unwrap();
            let records: Vec<SessionRecord> = [evening, morning]
                .iter()
                .map(|t| {
                    let t = t.with_timezone(&Utc);
                    SessionRecord::new("box", "Box", t, t, 60.0, 1, SessionEnd::Completed)
                })
                .collect();

            // Both start on May 20 in UTC.
            assert_eq!(current_streak(&records, &now()), 1);
            assert_eq!(current_streak(&records, &morning), 2);
            assert_eq!(longest_streak(&records, &tz), 2);
        }

        #[test]
        fn test_longest_streak_finds_earlier_run() {
            let records = vec![
                record(0, "box", 60.0),
                record(1, "box", 60.0),
                record(5, "box", 60.0),
                record(6, "box", 60.0),
                record(6, "box", 60.0),
                record(7, "box", 60.0),
                record(8, "box", 60.0),
                record(12, "box", 60.0),
            ];
            assert_eq!(current_streak(&records, &now()), 2);
            assert_eq!(longest_streak(&records, &Utc), 4);
        }

        #[test]
        fn test_focus_days_count_toward_streaks() {
            let records = vec![record(0, "box", 60.0), focus(1, 600.0)];
            assert_eq!(current_streak(&records, &now()), 2);
            assert_eq!(longest_streak(&records, &Utc), 2);
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_empty_history() {
            let summary = PracticeSummary::compute(&[], &now());

            assert_eq!(summary.today_sessions, 0);
            assert_eq!(summary.today_seconds, 0);
            assert_eq!(summary.improvement_percent, 0);
            assert_eq!(summary.longest_streak, 0);
            assert!(summary.favorite_pattern.is_none());
        }

        #[test]
        fn test_today_totals() {
            let records = vec![
                record(0, "box", 96.0),
                focus(0, 1500.0),
                record(1, "box", 64.0),
            ];

            let summary = PracticeSummary::compute(&records, &now());

            assert_eq!(summary.today_sessions, 2);
            assert_eq!(summary.today_seconds, 1596);
        }

        #[test]
        fn test_week_over_week_improvement() {
            let records = vec![
                record(0, "box", 300.0),
                record(6, "box", 300.0),
                record(7, "box", 200.0),
                record(13, "box", 200.0),
                record(14, "box", 900.0),
            ];

            let summary = PracticeSummary::compute(&records, &now());

            assert_eq!(summary.this_week_seconds, 600);
            assert_eq!(summary.last_week_seconds, 400);
            assert_eq!(summary.improvement_percent, 50);
        }

        #[test]
        fn test_improvement_rounds_and_goes_negative() {
            assert_eq!(improvement_percent(200, 300), -33);
            assert_eq!(improvement_percent(0, 300), -100);
            assert_eq!(improvement_percent(120, 0), 100);
            assert_eq!(improvement_percent(0, 0), 0);
        }

        #[test]
        fn test_favorite_pattern_counts_all_history() {
            let records = vec![
                record(0, "box", 60.0),
                record(1, "box", 60.0),
                record(2, "4-6", 60.0),
                record(20, "box", 60.0),
                record(21, "4-6", 60.0),
                record(22, "4-6", 60.0),
                record(23, "4-6", 60.0),
            ];

            let summary = PracticeSummary::compute(&records, &now());

            let favorite = summary.favorite_pattern.unwrap();
            assert_eq!(favorite.id, "box");
            assert_eq!(favorite.name, "box");
            assert_eq!(favorite.count, 3);
        }

        #[test]
        fn test_favorite_ignores_focus_sessions() {
            let records = vec![focus(0, 600.0), focus(1, 600.0), record(2, "coherent", 60.0)];

            let summary = PracticeSummary::compute(&records, &now());
            assert_eq!(summary.favorite_pattern.unwrap().id, "coherent");
        }

        #[test]
        fn test_streaks_in_summary() {
            let records = vec![
                record(1, "box", 60.0),
                record(4, "box", 60.0),
                record(5, "box", 60.0),
                record(6, "box", 60.0),
            ];

            let summary = PracticeSummary::compute(&records, &now());
            assert_eq!(summary.current_streak, 1);
            assert_eq!(summary.longest_streak, 3);
        }
    }
}
