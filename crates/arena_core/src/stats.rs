//! Team combat statistics and derived summaries.
//!
//! The combat record is shared by every unit of a team: leaders read the
//! kill differential, castles read the effectiveness multipliers and how
//! recently the team fought.

use serde::{Deserialize, Serialize};

use crate::components::Skills;
use crate::tuning::{EFFECTIVENESS_STEP, RECENT_COMBAT_TICKS, STALE_COMBAT_TICKS};

/// Cumulative combat record of one team.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamCombatStats {
    /// Arrows loosed.
    pub attacks_launched: u32,
    /// Arrows that struck a unit or castle.
    pub arrows_hit: u32,
    /// Arrows that fell short or ran out of range.
    pub arrows_missed: u32,
    /// Enemy units killed.
    pub units_killed: u32,
    /// Own units lost.
    pub units_lost: u32,
    /// Total damage dealt.
    pub damage_dealt: u32,
    /// Tick of the last shot fired, hit landed or unit lost.
    pub last_combat_tick: Option<u64>,
    /// Scales fighter spawn weight.
    pub knight_effectiveness: f32,
    /// Scales worker spawn weight.
    pub worker_effectiveness: f32,
}

impl Default for TeamCombatStats {
    fn default() -> Self {
        Self {
            attacks_launched: 0,
            arrows_hit: 0,
            arrows_missed: 0,
            units_killed: 0,
            units_lost: 0,
            damage_dealt: 0,
            last_combat_tick: None,
            knight_effectiveness: 1.0,
            worker_effectiveness: 1.0,
        }
    }
}

/// How long ago a team last fought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatRecency {
    /// Within the last ten seconds.
    Recent,
    /// Between ten and thirty seconds ago.
    Lingering,
    /// Longer ago, or never.
    Peaceful,
}

impl TeamCombatStats {
    /// Kills minus losses.
    #[must_use]
    pub fn kill_differential(&self) -> i64 {
        i64::from(self.units_killed) - i64::from(self.units_lost)
    }

    /// Share of loosed arrows that struck something.
    #[must_use]
    pub fn hit_rate(&self) -> f32 {
        if self.attacks_launched == 0 {
            0.0
        } else {
            self.arrows_hit as f32 / self.attacks_launched as f32
        }
    }

    /// Mark combat at `tick`.
    pub fn record_combat(&mut self, tick: u64) {
        self.last_combat_tick = Some(tick);
    }

    /// Classify the time since the last combat.
    #[must_use]
    pub fn recency(&self, now: u64) -> CombatRecency {
        match self.last_combat_tick {
            Some(t) if now.saturating_sub(t) < RECENT_COMBAT_TICKS => CombatRecency::Recent,
            Some(t) if now.saturating_sub(t) <= STALE_COMBAT_TICKS => CombatRecency::Lingering,
            _ => CombatRecency::Peaceful,
        }
    }

    /// Whether this team fought within the recent window.
    #[must_use]
    pub fn in_recent_combat(&self, now: u64) -> bool {
        self.attacks_launched > 0 && self.recency(now) == CombatRecency::Recent
    }

    /// Grow knight effectiveness after killing an enemy fighter.
    pub fn reward_knights(&mut self) {
        self.knight_effectiveness *= 1.0 + EFFECTIVENESS_STEP;
    }

    /// Shrink knight effectiveness after losing a fighter.
    pub fn penalize_knights(&mut self) {
        self.knight_effectiveness *= 1.0 - EFFECTIVENESS_STEP;
    }

    /// Shrink worker effectiveness after losing a worker.
    pub fn penalize_workers(&mut self) {
        self.worker_effectiveness *= 1.0 - EFFECTIVENESS_STEP;
    }
}

/// Aggregate view of one team, as shown on a stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamSummary {
    /// Living units.
    pub unit_count: usize,
    /// Standing castles.
    pub castle_count: usize,
    /// Food stored in castles.
    pub stored_food: u32,
    /// Food carried by workers.
    pub carried_food: u32,
    /// Units with leader skill above the leadership threshold.
    pub strategic_leaders: usize,
    /// Units near the centre of the orchard.
    pub units_near_resources: usize,
    /// Mean energy.
    pub average_energy: f32,
    /// Units asleep.
    pub sleeping: usize,
    /// Awake units running.
    pub running: usize,
    /// Units below the critical energy threshold.
    pub exhausted: usize,
    /// Mean skills.
    pub average_skills: Skills,
    /// Summed fighter skill.
    pub threat: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recency_windows() {
        let mut stats = TeamCombatStats::default();
        assert_eq!(stats.recency(0), CombatRecency::Peaceful);

        stats.record_combat(1000);
        assert_eq!(stats.recency(1000), CombatRecency::Recent);
        assert_eq!(stats.recency(1000 + RECENT_COMBAT_TICKS), CombatRecency::Lingering);
        assert_eq!(stats.recency(1000 + STALE_COMBAT_TICKS + 1), CombatRecency::Peaceful);
    }

    #[test]
    fn test_in_recent_combat_needs_an_attack() {
        let mut stats = TeamCombatStats::default();
        stats.record_combat(10);
        assert!(!stats.in_recent_combat(20));
        stats.attacks_launched = 1;
        assert!(stats.in_recent_combat(20));
    }

    #[test]
    fn test_effectiveness_adjustments() {
        let mut stats = TeamCombatStats::default();
        stats.reward_knights();
        assert!((stats.knight_effectiveness - 1.05).abs() < 1e-6);
        stats.penalize_knights();
        assert!((stats.knight_effectiveness - 0.9975).abs() < 1e-6);
        stats.penalize_workers();
        assert!((stats.worker_effectiveness - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_hit_rate_and_differential() {
        let stats = TeamCombatStats {
            attacks_launched: 4,
            arrows_hit: 1,
            units_killed: 2,
            units_lost: 5,
            ..TeamCombatStats::default()
        };
        assert!((stats.hit_rate() - 0.25).abs() < 1e-6);
        assert_eq!(stats.kill_differential(), -3);
        assert_eq!(TeamCombatStats::default().hit_rate(), 0.0);
    }
}
