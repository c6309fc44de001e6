//! Entity storage and the spatial queries shared by every system.
//!
//! The world owns all arenas. Systems receive it by reference and look
//! entities up by key; a stale key resolves to `None`.

use rand::Rng;
use slotmap::SlotMap;

use crate::animals::Animal;
use crate::components::{AnimalId, AppleId, CastleId, MovementMode, Skills, UnitId, Waypoint};
use crate::config::WorldConfig;
use crate::economy::{Apple, Tree};
use crate::factions::{PerTeam, Team};
use crate::math::Vec2;
use crate::memory::BadMemory;
use crate::perception;
use crate::production::Castle;
use crate::stats::{TeamCombatStats, TeamSummary};
use crate::tuning::{
    BUILD_PROTECTION_RADIUS, CRITICAL_ENERGY_THRESHOLD, DOMINANT_SKILL_THRESHOLD,
    LEADERSHIP_THRESHOLD, RESOURCE_CONTROL_ZONE,
};
use crate::unit::{Unit, UnitSpawn};

/// Reach of the alternate waypoint rolled for new units.
const SPAWN_ALT_WAYPOINT_RANGE: f32 = 200.0;

/// All simulation state apart from the random source.
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) tick: u64,
    pub(crate) units: SlotMap<UnitId, Unit>,
    pub(crate) castles: SlotMap<CastleId, Castle>,
    pub(crate) trees: Vec<Tree>,
    pub(crate) apples: SlotMap<AppleId, Apple>,
    pub(crate) animals: SlotMap<AnimalId, Animal>,
    pub(crate) memories: Vec<BadMemory>,
    pub(crate) stats: PerTeam<TeamCombatStats>,
    pub(crate) attack_mode: PerTeam<bool>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            tick: 0,
            units: SlotMap::with_key(),
            castles: SlotMap::with_key(),
            trees: Vec::new(),
            apples: SlotMap::with_key(),
            animals: SlotMap::with_key(),
            memories: Vec::new(),
            stats: PerTeam::default(),
            attack_mode: PerTeam::default(),
        }
    }

    /// World bounds.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// All units.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Number of units alive.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Look up a castle.
    #[must_use]
    pub fn castle(&self, id: CastleId) -> Option<&Castle> {
        self.castles.get(id)
    }

    /// All castles with their ids.
    pub fn castles(&self) -> impl Iterator<Item = (CastleId, &Castle)> {
        self.castles.iter()
    }

    /// All trees.
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// All apples with their ids, including ones in hand.
    pub fn apples(&self) -> impl Iterator<Item = (AppleId, &Apple)> {
        self.apples.iter()
    }

    /// All animals with their ids.
    pub fn animals(&self) -> impl Iterator<Item = (AnimalId, &Animal)> {
        self.animals.iter()
    }

    /// Active bad memories.
    #[must_use]
    pub fn memories(&self) -> &[BadMemory] {
        &self.memories
    }

    /// Combat record of a team.
    #[must_use]
    pub fn stats(&self, team: Team) -> &TeamCombatStats {
        &self.stats[team]
    }

    /// Whether a team is in global attack mode.
    #[must_use]
    pub fn attack_mode(&self, team: Team) -> bool {
        self.attack_mode[team]
    }

    /// Units of the team opposing `team`.
    pub fn enemies_of(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.team != team)
    }

    /// Units belonging to `team`.
    pub fn members_of(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.team == team)
    }

    /// Number of units on a team.
    #[must_use]
    pub fn population(&self, team: Team) -> usize {
        self.members_of(team).count()
    }

    /// Number of units on a team whose main skill is work.
    #[must_use]
    pub fn worker_count(&self, team: Team) -> usize {
        self.members_of(team)
            .filter(|u| u.skills.worker > DOMINANT_SKILL_THRESHOLD)
            .count()
    }

    /// Summed fighter skill of a team.
    #[must_use]
    pub fn team_threat(&self, team: Team) -> f32 {
        self.members_of(team).map(|u| u.skills.fighter).sum()
    }

    /// Nearest castle owned by `team`.
    #[must_use]
    pub fn nearest_castle(&self, team: Team, point: Vec2) -> Option<(CastleId, &Castle)> {
        self.castles
            .iter()
            .filter(|(_, c)| c.team == team && c.is_standing())
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
    }

    /// Whether a castle may be raised at `point`.
    #[must_use]
    pub fn can_build_castle(&self, point: Vec2) -> bool {
        self.castles
            .values()
            .all(|c| c.position.distance(point) >= BUILD_PROTECTION_RADIUS)
    }

    /// Centroid of all trees, or the arena centre when there are none.
    #[must_use]
    pub fn tree_center(&self) -> Vec2 {
        if self.trees.is_empty() {
            return self.config.center();
        }
        let sum = self
            .trees
            .iter()
            .fold(Vec2::ZERO, |acc, tree| acc + tree.position);
        sum * (1.0 / self.trees.len() as f32)
    }

    /// Nearest apple lying on the ground within `radius` of `point`.
    #[must_use]
    pub fn nearest_loose_apple(&self, point: Vec2, radius: f32) -> Option<AppleId> {
        self.apples
            .iter()
            .filter(|(_, a)| a.is_loose())
            .map(|(id, a)| (id, a.position.distance(point)))
            .filter(|(_, d)| *d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Record a bad memory.
    pub fn remember_danger(&mut self, position: Vec2, intensity: f32) {
        self.memories.push(BadMemory::new(position, intensity));
    }

    /// Place a new unit, clamped into the arena, with freshly scored waypoints.
    pub fn spawn_unit<R: Rng + ?Sized>(&mut self, spawn: UnitSpawn, rng: &mut R) -> UnitId {
        let spawn = UnitSpawn {
            position: self.config.clamp(spawn.position),
            ..spawn
        };
        let id = self.units.insert_with_key(|id| Unit::new(id, spawn, rng));

        if let Some(unit) = self.units.get(id) {
            let current = perception::score_waypoint(unit.position, unit, self);
            let alt_position =
                perception::sample_waypoint(unit, SPAWN_ALT_WAYPOINT_RANGE, &self.config, rng);
            let alt = perception::score_waypoint(alt_position, unit, self);
            if let Some(unit) = self.units.get_mut(id) {
                unit.current_waypoint = Waypoint::new(unit.position, current);
                unit.alt_waypoint = Waypoint::new(alt_position, alt);
            }
        }

        tracing::debug!(
            tick = self.tick,
            team = %spawn.team,
            unit = ?id,
            "Unit spawned"
        );
        id
    }

    /// Aggregate a team for display.
    #[must_use]
    pub fn team_summary(&self, team: Team) -> TeamSummary {
        let center = self.tree_center();
        let mut summary = TeamSummary::default();
        let mut energy = 0.0;
        let mut skills = Skills::NONE;

        for unit in self.members_of(team) {
            summary.unit_count += 1;
            summary.carried_food += unit.inventory.carrying;
            energy += unit.energy;
            skills.fighter += unit.skills.fighter;
            skills.worker += unit.skills.worker;
            skills.leader += unit.skills.leader;
            skills.trainer += unit.skills.trainer;

            if unit.skills.leader > LEADERSHIP_THRESHOLD {
                summary.strategic_leaders += 1;
            }
            if unit.position.distance(center) < RESOURCE_CONTROL_ZONE {
                summary.units_near_resources += 1;
            }
            if unit.sleep.sleeping {
                summary.sleeping += 1;
            } else if unit.movement_mode == MovementMode::Run {
                summary.running += 1;
            }
            if unit.energy < CRITICAL_ENERGY_THRESHOLD {
                summary.exhausted += 1;
            }
        }

        for castle in self.castles.values().filter(|c| c.team == team) {
            summary.castle_count += 1;
            summary.stored_food += castle.food;
        }

        if summary.unit_count > 0 {
            let n = summary.unit_count as f32;
            summary.average_energy = energy / n;
            summary.average_skills = Skills {
                fighter: skills.fighter / n,
                worker: skills.worker / n,
                leader: skills.leader / n,
                trainer: skills.trainer / n,
            };
        }
        summary.threat = skills.fighter;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world() -> World {
        World::new(WorldConfig::default())
    }

    #[test]
    fn test_tree_center_defaults_to_arena_center() {
        let w = world();
        assert_eq!(w.tree_center(), w.config().center());
    }

    #[test]
    fn test_tree_center_is_centroid() {
        let mut w = world();
        w.trees.push(Tree::new(Vec2::new(100.0, 100.0)));
        w.trees.push(Tree::new(Vec2::new(300.0, 200.0)));
        assert_eq!(w.tree_center(), Vec2::new(200.0, 150.0));
    }

    #[test]
    fn test_team_threat_sums_fighter_skill() {
        let mut w = world();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pos = Vec2::new(300.0, 300.0);
        w.spawn_unit(UnitSpawn::new(Team::Blue, pos, 30.0, Skills::fighter()), &mut rng);
        w.spawn_unit(UnitSpawn::new(Team::Blue, pos, 30.0, Skills::fighter()), &mut rng);
        w.spawn_unit(UnitSpawn::new(Team::Red, pos, 30.0, Skills::worker()), &mut rng);

        assert!((w.team_threat(Team::Blue) - 2.0).abs() < 1e-6);
        assert_eq!(w.team_threat(Team::Red), 0.0);
        assert_eq!(w.worker_count(Team::Red), 1);
        assert_eq!(w.population(Team::Blue), 2);
    }

    #[test]
    fn test_spawn_clamps_into_arena() {
        let mut w = world();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let id = w.spawn_unit(
            UnitSpawn::new(Team::Red, Vec2::new(-100.0, 9000.0), 20.0, Skills::NONE),
            &mut rng,
        );
        let unit = w.unit(id).unwrap();
        assert!(w.config().contains(unit.position));
    }

    #[test]
    fn test_nearest_castle_filters_team() {
        let mut w = world();
        w.castles
            .insert(Castle::new(Team::Blue, Vec2::new(400.0, 300.0), 0, None));
        let red = w
            .castles
            .insert(Castle::new(Team::Red, Vec2::new(900.0, 300.0), 0, None));
        w.castles
            .insert(Castle::new(Team::Red, Vec2::new(1100.0, 300.0), 0, None));

        let (id, _) = w.nearest_castle(Team::Red, Vec2::new(500.0, 300.0)).unwrap();
        assert_eq!(id, red);
        assert!(w.can_build_castle(Vec2::new(650.0, 300.0)));
        assert!(!w.can_build_castle(Vec2::new(420.0, 300.0)));
    }
}
