//! Player-timed press windows.
//!
//! A minigame stage runs a short cycle once a session starts. The operator
//! presses somewhere inside it; the tick of the press maps to a score in
//! `[0, 1]` through a piecewise curve anchored on the good and perfect
//! ranges of a [`TimingWindow`]. A session nobody presses resolves itself at
//! the end of the cycle.

use crate::fixed::{Fixed64, clamp_unit};
use crate::id::ActorId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Score curve
// ---------------------------------------------------------------------------

/// Coefficients of the four scoring branches.
///
/// With `pc` and `gc` the centres of the perfect and good ranges:
/// - perfect: `1 - |t - pc| / perfect_divisor * perfect_penalty`
/// - good: `good_base + good_bonus * (1 - |t - gc| / good_divisor)`
/// - early: `early_base + t / good_start * early_bonus`
/// - late: `max(late_floor, late_base - (t - good_end) / late_divisor * late_penalty)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCurve {
    pub perfect_penalty: Fixed64,
    pub perfect_divisor: Fixed64,
    pub good_base: Fixed64,
    pub good_bonus: Fixed64,
    pub good_divisor: Fixed64,
    pub early_base: Fixed64,
    pub early_bonus: Fixed64,
    pub late_base: Fixed64,
    pub late_floor: Fixed64,
    pub late_penalty: Fixed64,
    pub late_divisor: Fixed64,
}

impl Default for ScoreCurve {
    fn default() -> Self {
        Self {
            perfect_penalty: Fixed64::from_num(0.1),
            perfect_divisor: Fixed64::from_num(10),
            good_base: Fixed64::from_num(0.6),
            good_bonus: Fixed64::from_num(0.3),
            good_divisor: Fixed64::from_num(15),
            early_base: Fixed64::from_num(0.2),
            early_bonus: Fixed64::from_num(0.3),
            late_base: Fixed64::from_num(0.5),
            late_floor: Fixed64::from_num(0.1),
            late_penalty: Fixed64::from_num(0.4),
            late_divisor: Fixed64::from_num(20),
        }
    }
}

// ---------------------------------------------------------------------------
// Timing window
// ---------------------------------------------------------------------------

/// Where a cycle tick falls relative to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingZone {
    Early,
    Good,
    Perfect,
    Late,
}

/// Tick ranges of one press cycle. `perfect ⊆ good ⊆ [0, cycle_length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindow {
    pub cycle_length: u32,
    pub good_start: u32,
    pub good_end: u32,
    pub perfect_start: u32,
    pub perfect_end: u32,
    pub curve: ScoreCurve,
}

impl TimingWindow {
    /// Tablet press: 60-tick cycle, good 20..=40, perfect 25..=35.
    pub fn pill_press() -> Self {
        Self {
            cycle_length: 60,
            good_start: 20,
            good_end: 40,
            perfect_start: 25,
            perfect_end: 35,
            curve: ScoreCurve::default(),
        }
    }

    /// Cooker: 80-tick cycle, good 28..=52, perfect 35..=45, flatter falloff.
    pub fn cooker() -> Self {
        Self {
            cycle_length: 80,
            good_start: 28,
            good_end: 52,
            perfect_start: 35,
            perfect_end: 45,
            curve: ScoreCurve {
                perfect_penalty: Fixed64::from_num(0.05),
                good_divisor: Fixed64::from_num(20),
                late_divisor: Fixed64::from_num(30),
                ..ScoreCurve::default()
            },
        }
    }

    /// Whether the ranges nest properly and every divisor is positive.
    pub fn is_valid(&self) -> bool {
        let c = &self.curve;
        self.cycle_length > 0
            && self.good_start <= self.perfect_start
            && self.perfect_start <= self.perfect_end
            && self.perfect_end <= self.good_end
            && self.good_end <= self.cycle_length
            && c.perfect_divisor > Fixed64::ZERO
            && c.good_divisor > Fixed64::ZERO
            && c.late_divisor > Fixed64::ZERO
    }

    pub fn zone(&self, tick: u32) -> TimingZone {
        if (self.perfect_start..=self.perfect_end).contains(&tick) {
            TimingZone::Perfect
        } else if (self.good_start..=self.good_end).contains(&tick) {
            TimingZone::Good
        } else if tick < self.good_start {
            TimingZone::Early
        } else {
            TimingZone::Late
        }
    }

    fn centre(start: u32, end: u32) -> Fixed64 {
        (Fixed64::from_num(start) + Fixed64::from_num(end)) / Fixed64::from_num(2)
    }

    /// Score of a press at `tick`, clamped to `[0, 1]`.
    pub fn score(&self, tick: u32) -> Fixed64 {
        let c = &self.curve;
        let one = Fixed64::from_num(1);
        let t = Fixed64::from_num(tick);
        let raw = match self.zone(tick) {
            TimingZone::Perfect => {
                let distance = (t - Self::centre(self.perfect_start, self.perfect_end)).abs();
                one - distance / c.perfect_divisor * c.perfect_penalty
            }
            TimingZone::Good => {
                let distance = (t - Self::centre(self.good_start, self.good_end)).abs();
                c.good_base + c.good_bonus * (one - distance / c.good_divisor)
            }
            TimingZone::Early => {
                // tick < good_start, so good_start > 0 here.
                c.early_base + t / Fixed64::from_num(self.good_start) * c.early_bonus
            }
            TimingZone::Late => {
                let over = Fixed64::from_num(tick - self.good_end);
                (c.late_base - over / c.late_divisor * c.late_penalty).max(c.late_floor)
            }
        };
        clamp_unit(raw)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A running press cycle, owned by the stage that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameSession {
    pub actor: ActorId,
    pub cycle_tick: u32,
}

impl MinigameSession {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            cycle_tick: 0,
        }
    }

    /// Advance one tick. Returns `true` once the cycle has run out.
    pub fn advance(&mut self, window: &TimingWindow) -> bool {
        self.cycle_tick = self.cycle_tick.saturating_add(1).min(window.cycle_length);
        self.cycle_tick >= window.cycle_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    #[test]
    fn presets_are_valid() {
        assert!(TimingWindow::pill_press().is_valid());
        assert!(TimingWindow::cooker().is_valid());
    }

    #[test]
    fn inverted_ranges_are_invalid() {
        let mut w = TimingWindow::pill_press();
        w.perfect_start = 15;
        assert!(!w.is_valid());
        let mut w = TimingWindow::pill_press();
        w.good_end = 70;
        assert!(!w.is_valid());
    }

    #[test]
    fn press_at_centre_is_perfect() {
        let w = TimingWindow::pill_press();
        assert_eq!(w.zone(30), TimingZone::Perfect);
        let s = w.score(30);
        assert!(s >= f(0.9) && s <= f(1.0));
        assert_eq!(s, f(1.0));
    }

    #[test]
    fn perfect_edges_stay_above_point_nine() {
        let w = TimingWindow::pill_press();
        assert!(w.score(25) >= f(0.9));
        assert!(w.score(35) >= f(0.9));
    }

    #[test]
    fn early_press_ramps_up() {
        let w = TimingWindow::pill_press();
        assert_eq!(w.zone(5), TimingZone::Early);
        let s = w.score(5);
        assert!(s >= f(0.2) && s <= f(0.5), "score {s}");
        assert_eq!(w.score(0), f(0.2));
        assert!(w.score(10) > w.score(5));
    }

    #[test]
    fn good_range_outside_perfect() {
        let w = TimingWindow::pill_press();
        assert_eq!(w.zone(22), TimingZone::Good);
        let s = w.score(22);
        assert!(s > f(0.6) && s < f(0.9), "score {s}");
    }

    #[test]
    fn good_branch_measures_from_good_centre() {
        let w = TimingWindow {
            cycle_length: 60,
            good_start: 10,
            good_end: 50,
            perfect_start: 12,
            perfect_end: 20,
            ..TimingWindow::pill_press()
        };
        assert!(w.is_valid());
        assert_eq!(w.zone(30), TimingZone::Good);
        assert_eq!(w.score(30), w.curve.good_base + w.curve.good_bonus);
        assert_eq!(w.score(25), w.score(35));
        assert!(w.score(30) > w.score(22));
    }

    #[test]
    fn late_press_decays_to_floor() {
        let w = TimingWindow::pill_press();
        assert_eq!(w.zone(41), TimingZone::Late);
        // tick 60: 0.5 - 20/20 * 0.4 = 0.1
        let end = w.score(60);
        assert!((end - f(0.1)).abs() < f(0.0001), "score {end}");
        assert!(w.score(45) > end);
    }

    #[test]
    fn cooker_curve_is_flatter_in_perfect_range() {
        let w = TimingWindow::cooker();
        assert_eq!(w.score(40), f(1.0));
        // 1 - 5/10 * 0.05 = 0.975
        assert!((w.score(45) - f(0.975)).abs() < f(0.0001));
        assert_eq!(w.zone(30), TimingZone::Good);
        assert_eq!(w.zone(60), TimingZone::Late);
    }

    #[test]
    fn session_times_out_at_cycle_end() {
        let w = TimingWindow::pill_press();
        let mut s = MinigameSession::new(ActorId(1));
        for _ in 0..59 {
            assert!(!s.advance(&w));
        }
        assert!(s.advance(&w));
        assert_eq!(s.cycle_tick, 60);
        assert!(s.advance(&w));
        assert_eq!(s.cycle_tick, 60);
    }
}
