//! Display utilities for the Breath Coach CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Session status, breathing or focus
//! - The pattern catalog, focus presets and practice history
//!
//! Each `show_*` function prints what the matching `render_*` function
//! builds, so the text can be tested without capturing stdout.

use std::fmt::Write as _;

use crate::history::{PeriodStats, PracticeSummary};
use crate::patterns::BreathingPattern;
use crate::types::{IpcResponse, ResponseData};

const PROGRESS_BAR_WIDTH: usize = 20;
const CHART_WIDTH: usize = 30;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for session start.
    pub fn show_start_success(response: &IpcResponse) {
        print!("{}", Self::render_command_result("*", response));
    }

    /// Shows a success message for focus start.
    pub fn show_focus_success(response: &IpcResponse) {
        print!("{}", Self::render_command_result("*", response));
    }

    /// Shows the preset focus lengths.
    pub fn show_focus_presets(presets: &[u32], default_minutes: u32) {
        print!("{}", Self::render_focus_presets(presets, default_minutes));
    }

    /// Shows a success message for session pause.
    pub fn show_pause_success(response: &IpcResponse) {
        print!("{}", Self::render_command_result("||", response));
    }

    /// Shows a success message for session resume.
    pub fn show_resume_success(response: &IpcResponse) {
        print!("{}", Self::render_command_result(">", response));
    }

    /// Shows a success message for session stop.
    pub fn show_stop_success(response: &IpcResponse) {
        print!("{}", Self::render_stop(response));
    }

    /// Shows the current session status.
    pub fn show_status(response: &IpcResponse) {
        print!("{}", Self::render_status(response));
    }

    /// Shows the pattern catalog.
    pub fn show_patterns(patterns: &[BreathingPattern]) {
        print!("{}", Self::render_patterns(patterns));
    }

    /// Shows practice statistics.
    pub fn show_history(stats: &PeriodStats, summary: &PracticeSummary) {
        print!("{}", Self::render_history(stats, summary));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    fn render_command_result(marker: &str, response: &IpcResponse) -> String {
        let mut out = format!("{} {}\n", marker, response.message);
        if let Some(data) = &response.data {
            if let Some(phase) = &data.phase {
                let _ = writeln!(out, "  Phase: {}", Self::phase_label(phase));
            }
            if let Some(remaining) = data.remaining_seconds {
                if Self::is_focus(data) {
                    let _ = writeln!(out, "  Remaining: {}", Self::format_clock(u64::from(remaining)));
                } else {
                    let _ = writeln!(out, "  Remaining: {}s", remaining);
                }
            }
            if let Some(rounds) = Self::format_rounds(data) {
                let _ = writeln!(out, "  Rounds: {}", rounds);
            }
        }
        out
    }

    fn render_stop(response: &IpcResponse) -> String {
        let mut out = format!("[] {}\n", response.message);
        if let Some(total) = response.data.as_ref().and_then(|d| d.total_seconds) {
            let (minutes, seconds) = Self::format_time(total.max(0.0).round() as u32);
            let _ = writeln!(out, "  Active time: {}:{:02}", minutes, seconds);
        }
        out
    }

    fn render_status(response: &IpcResponse) -> String {
        let mut out = String::from("Breath Coach status\n");
        out.push_str("───────────────────\n");

        let Some(data) = &response.data else {
            out.push_str("No session information available\n");
            return out;
        };

        let phase = data.phase.as_deref().unwrap_or("idle");
        if phase == "idle" {
            out.push_str("State: idle\n");
            if let Some(pattern) = &data.pattern_id {
                let _ = writeln!(out, "Next pattern: {}", pattern);
            }
            return out;
        }

        let paused = if data.paused == Some(true) { " (paused)" } else { "" };
        if Self::is_focus(data) {
            let _ = writeln!(out, "Focus{}", paused);
            if let Some(progress) = data.phase_progress {
                let remaining = u64::from(data.remaining_seconds.unwrap_or(0));
                let _ = writeln!(
                    out,
                    "{} {} left",
                    Self::progress_bar(progress),
                    Self::format_clock(remaining)
                );
            }
            if let Some(duration) = data.duration_seconds {
                let _ = writeln!(out, "Length: {} min", duration / 60);
            }
            return out;
        }

        let _ = writeln!(out, "Phase: {}{}", Self::phase_label(phase), paused);

        if let Some(progress) = data.phase_progress {
            let remaining = data.remaining_seconds.unwrap_or(0);
            let _ = writeln!(out, "{} {}s", Self::progress_bar(progress), remaining);
        }
        if let Some(rounds) = Self::format_rounds(data) {
            let _ = writeln!(out, "Rounds: {}", rounds);
        }
        if let Some(pattern) = &data.pattern_id {
            let _ = writeln!(out, "Pattern: {}", pattern);
        }
        if let Some(total) = data.total_seconds {
            let (minutes, seconds) = Self::format_time(total.max(0.0) as u32);
            let _ = writeln!(out, "Elapsed: {}:{:02}", minutes, seconds);
        }
        out
    }

    fn render_patterns(patterns: &[BreathingPattern]) -> String {
        let mut out = String::new();
        for pattern in patterns {
            let _ = writeln!(
                out,
                "{:<10} {:<22} {:<22} {:>4.1} bpm  {}-{} rounds",
                pattern.id,
                pattern.name,
                Self::format_timing(pattern),
                pattern.breaths_per_minute(),
                pattern.recommended_rounds.min,
                pattern.recommended_rounds.max,
            );
            let _ = writeln!(out, "{:<10} {}", "", pattern.description);
        }
        out
    }

    fn render_focus_presets(presets: &[u32], default_minutes: u32) -> String {
        let mut out = String::new();
        for &minutes in presets {
            let marker = if minutes == default_minutes { " (default)" } else { "" };
            let _ = writeln!(out, "{:>3} min{}", minutes, marker);
        }
        if !presets.contains(&default_minutes) {
            let _ = writeln!(out, "{:>3} min (default)", default_minutes);
        }
        out
    }

    fn render_history(stats: &PeriodStats, summary: &PracticeSummary) -> String {
        let mut out = format!("Last {} days\n", stats.days);
        out.push_str("─────────────\n");

        let _ = writeln!(out, "Sessions: {}", stats.total_sessions);
        let _ = writeln!(out, "Total time: {}", Self::format_clock(stats.total_duration_seconds));
        if stats.focus_sessions > 0 {
            let _ = writeln!(
                out,
                "  Breathing: {}, focus: {} ({})",
                stats.breathing_sessions,
                stats.focus_sessions,
                Self::format_clock(stats.focus_duration_seconds)
            );
        }

        if stats.total_sessions > 0 {
            let average = stats.avg_session_seconds.round() as u64;
            let _ = writeln!(out, "Average session: {}", Self::format_clock(average));
            if let Some(pattern) = &stats.most_used_pattern {
                let _ = writeln!(out, "Most used pattern: {}", pattern);
            }
        }

        out.push('\n');
        let _ = writeln!(
            out,
            "Today: {} sessions, {}",
            summary.today_sessions,
            Self::format_clock(summary.today_seconds)
        );
        let _ = writeln!(
            out,
            "Streak: {} days (longest {})",
            summary.current_streak, summary.longest_streak
        );
        let _ = writeln!(
            out,
            "This week: {} ({:+}% vs last week)",
            Self::format_clock(summary.this_week_seconds),
            summary.improvement_percent
        );
        if let Some(favorite) = &summary.favorite_pattern {
            let _ = writeln!(
                out,
                "Favorite pattern: {} ({} sessions)",
                favorite.name, favorite.count
            );
        }

        let busiest = stats.sessions_per_day.iter().copied().max().unwrap_or(0);
        if busiest > 0 {
            out.push('\n');
            let len = stats.sessions_per_day.len();
            for (i, count) in stats.sessions_per_day.iter().enumerate() {
                let days_ago = len - 1 - i;
                let width = (*count as usize * CHART_WIDTH).div_ceil(busiest as usize);
                let _ = writeln!(out, "{:>4} {} {}", format!("-{}d", days_ago), "#".repeat(width), count);
            }
        }
        out
    }

    /// Human label for a phase tag.
    fn phase_label(phase: &str) -> &str {
        match phase {
            "inhale" => "Breathe in",
            "hold_in" | "hold_out" => "Hold",
            "exhale" => "Breathe out",
            "idle" => "Idle",
            "focus" => "Focus",
            other => other,
        }
    }

    fn is_focus(data: &ResponseData) -> bool {
        data.kind.as_deref() == Some("focus")
    }

    /// Formats seconds as `m:ss`.
    fn format_clock(total_seconds: u64) -> String {
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Formats completed and target rounds as `n/target`.
    fn format_rounds(data: &ResponseData) -> Option<String> {
        let done = data.cycle_count?;
        Some(match data.target_rounds {
            Some(target) => format!("{}/{}", done, target),
            None => done.to_string(),
        })
    }

    /// Formats a pattern as `in-hold-out-hold`, omitting zero holds.
    fn format_timing(pattern: &BreathingPattern) -> String {
        let mut parts = vec![Self::format_seconds(pattern.inhale)];
        if pattern.hold_in > 0.0 {
            parts.push(Self::format_seconds(pattern.hold_in));
        }
        parts.push(Self::format_seconds(pattern.exhale));
        if pattern.hold_out > 0.0 {
            parts.push(Self::format_seconds(pattern.hold_out));
        }
        parts.join("-")
    }

    fn format_seconds(seconds: f64) -> String {
        if seconds.fract() == 0.0 {
            format!("{}", seconds as u32)
        } else {
            format!("{:.1}", seconds)
        }
    }

    fn progress_bar(progress: f64) -> String {
        let filled = (progress.clamp(0.0, 1.0) * PROGRESS_BAR_WIDTH as f64).round() as usize;
        format!(
            "[{}{}]",
            "=".repeat(filled),
            " ".repeat(PROGRESS_BAR_WIDTH - filled)
        )
    }

    /// Formats seconds as (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================
