//! Breathing pattern catalog.
//!
//! Patterns are static data: a name, four phase durations in seconds
//! and a recommended round range. A zero duration skips the phase.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::types::BreathingPhase;

/// Pattern used when nothing else is configured.
pub const DEFAULT_PATTERN_ID: &str = "4-7-8";

/// Target rounds used when nothing else is configured.
pub const DEFAULT_TARGET_ROUNDS: u32 = 4;

// ============================================================================
// PhaseDurations
// ============================================================================

/// Phase duration lookup table, indexed by phase.
///
/// Every entry is finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDurations([f64; 4]);

impl PhaseDurations {
    /// Builds a table, clamping negative, NaN and infinite values to zero.
    pub fn new(inhale: f64, hold_in: f64, exhale: f64, hold_out: f64) -> Self {
        Self([inhale, hold_in, exhale, hold_out].map(sanitize))
    }

    /// Duration of `phase` in seconds. `Idle` has no duration.
    pub fn get(&self, phase: BreathingPhase) -> f64 {
        phase.slot().map_or(0.0, |slot| self.0[slot])
    }

    /// Length of one full round in seconds.
    pub fn cycle_seconds(&self) -> f64 {
        self.0.iter().sum()
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

// ============================================================================
// BreathingPattern
// ============================================================================

/// Recommended round count range for a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRange {
    pub min: u32,
    pub max: u32,
}

/// A named configuration of phase durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingPattern {
    /// Unique pattern identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Compact display name
    pub name_short: String,
    /// One-line description
    pub description: String,
    /// Inhale duration in seconds
    pub inhale: f64,
    /// Hold after inhale in seconds
    pub hold_in: f64,
    /// Exhale duration in seconds
    pub exhale: f64,
    /// Hold after exhale in seconds
    pub hold_out: f64,
    /// Recommended number of rounds
    pub recommended_rounds: RoundRange,
}

impl BreathingPattern {
    /// Returns the sanitized duration table for this pattern.
    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations::new(self.inhale, self.hold_in, self.exhale, self.hold_out)
    }

    /// Duration of `phase` in seconds, after sanitizing.
    pub fn duration_of(&self, phase: BreathingPhase) -> f64 {
        self.durations().get(phase)
    }

    /// Length of one full round in seconds.
    pub fn cycle_seconds(&self) -> f64 {
        self.durations().cycle_seconds()
    }

    /// Breaths per minute, or zero for a pattern with no duration.
    pub fn breaths_per_minute(&self) -> f64 {
        let cycle = self.cycle_seconds();
        if cycle > 0.0 {
            60.0 / cycle
        } else {
            0.0
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

fn pattern(
    id: &str,
    name: &str,
    name_short: &str,
    description: &str,
    timings: [f64; 4],
    rounds: (u32, u32),
) -> BreathingPattern {
    let [inhale, hold_in, exhale, hold_out] = timings;
    BreathingPattern {
        id: id.to_string(),
        name: name.to_string(),
        name_short: name_short.to_string(),
        description: description.to_string(),
        inhale,
        hold_in,
        exhale,
        hold_out,
        recommended_rounds: RoundRange {
            min: rounds.0,
            max: rounds.1,
        },
    }
}

/// Returns the built-in pattern catalog.
pub fn builtin_patterns() -> &'static [BreathingPattern] {
    static CATALOG: OnceLock<Vec<BreathingPattern>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            pattern(
                "4-7-8",
                "4-7-8 Relaxation",
                "4-7-8",
                "Calms nervous system, helps sleep",
                [4.0, 7.0, 8.0, 0.0],
                (3, 6),
            ),
            pattern(
                "box",
                "Box Breathing",
                "Box 4-4-4-4",
                "Navy SEAL technique for focus",
                [4.0, 4.0, 4.0, 4.0],
                (4, 8),
            ),
            pattern(
                "4-6",
                "Relaxing Ratio",
                "4-6",
                "Simple calming breath",
                [4.0, 0.0, 6.0, 0.0],
                (12, 30),
            ),
            pattern(
                "5-5",
                "Equal Breath",
                "5-5",
                "Sama Vritti - balanced energy",
                [5.0, 0.0, 5.0, 0.0],
                (12, 30),
            ),
            pattern(
                "6-6",
                "Deep Equal Breath",
                "6-6",
                "Deeper relaxation",
                [6.0, 0.0, 6.0, 0.0],
                (10, 25),
            ),
            pattern(
                "2-4",
                "Quick Calm",
                "2-4",
                "Fast stress relief",
                [2.0, 0.0, 4.0, 0.0],
                (10, 30),
            ),
            pattern(
                "3-6",
                "Gentle Exhale",
                "3-6",
                "Soft extended exhale",
                [3.0, 0.0, 6.0, 0.0],
                (12, 30),
            ),
            pattern(
                "4-8",
                "1:2 Ratio",
                "4-8",
                "Classic relaxation ratio",
                [4.0, 0.0, 8.0, 0.0],
                (5, 25),
            ),
            pattern(
                "coherent",
                "Coherent Breathing",
                "5.5-5.5",
                "Heart-brain synchronization",
                [5.5, 0.0, 5.5, 0.0],
                (27, 54),
            ),
        ]
    })
}

/// Looks up a built-in pattern by id.
pub fn find_pattern(id: &str) -> Option<&'static BreathingPattern> {
    builtin_patterns().iter().find(|p| p.id == id)
}

/// Returns the default pattern (4-7-8).
pub fn default_pattern() -> &'static BreathingPattern {
    &builtin_patterns()[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let patterns = builtin_patterns();
        assert_eq!(patterns.len(), 9);
        for (i, a) in patterns.iter().enumerate() {
            for b in &patterns[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_default_pattern() {
        let pattern = default_pattern();
        assert_eq!(pattern.id, DEFAULT_PATTERN_ID);
        assert_eq!(pattern.duration_of(BreathingPhase::HoldIn), 7.0);
        assert_eq!(pattern.duration_of(BreathingPhase::HoldOut), 0.0);
    }

    #[test]
    fn test_find_pattern() {
        let coherent = find_pattern("coherent").unwrap();
        assert_eq!(coherent.inhale, 5.5);
        assert_eq!(coherent.recommended_rounds, RoundRange { min: 27, max: 54 });
        assert!(find_pattern("wim-hof").is_none());
    }

    #[test]
    fn test_idle_has_no_duration() {
        assert_eq!(default_pattern().duration_of(BreathingPhase::Idle), 0.0);
    }

    #[test]
    fn test_invalid_durations_clamp_to_zero() {
        let d = PhaseDurations::new(-3.0, f64::NAN, f64::INFINITY, 2.5);
        assert_eq!(d.get(BreathingPhase::Inhale), 0.0);
        assert_eq!(d.get(BreathingPhase::HoldIn), 0.0);
        assert_eq!(d.get(BreathingPhase::Exhale), 0.0);
        assert_eq!(d.get(BreathingPhase::HoldOut), 2.5);
    }

    #[test]
    fn test_cycle_seconds_and_bpm() {
        let box_breathing = find_pattern("box").unwrap();
        assert_eq!(box_breathing.cycle_seconds(), 16.0);
        assert!((box_breathing.breaths_per_minute() - 3.75).abs() < 1e-9);

        let empty = pattern("empty", "Empty", "0", "", [0.0; 4], (1, 1));
        assert_eq!(empty.breaths_per_minute(), 0.0);
    }
}
