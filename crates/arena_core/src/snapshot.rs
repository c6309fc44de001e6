//! Read-only, serializable views of the world for renderers and reports.
//!
//! Snapshots copy out what a frontend draws each frame. They hold no
//! references into the world and can be sent across threads or written
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::components::{
    ActivityState, AnimalId, AppleId, CastleId, MovementMode, Order, Personality, Skills, UnitId,
};
use crate::factions::{PerTeam, Team};
use crate::math::Vec2;
use crate::memory::BadMemory;
use crate::production::Castle;
use crate::projectile::Arrow;
use crate::stats::{TeamCombatStats, TeamSummary};
use crate::unit::Unit;
use crate::world::World;

/// What a renderer needs to draw a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit key.
    pub id: UnitId,
    /// Display name.
    pub name: String,
    /// Owning team.
    pub team: Team,
    /// Position.
    pub position: Vec2,
    /// Facing, in radians.
    pub angle: f32,
    /// Body radius.
    pub size: f32,
    /// Hit points.
    pub hp: i32,
    /// Energy.
    pub energy: f32,
    /// Skills.
    pub skills: Skills,
    /// Temperament.
    pub personality: Personality,
    /// Gait.
    pub movement_mode: MovementMode,
    /// Worker state.
    pub activity: ActivityState,
    /// Asleep.
    pub sleeping: bool,
    /// On a rest break.
    pub resting: bool,
    /// Drawing the bow.
    pub aiming: bool,
    /// Current leader order.
    pub order: Option<Order>,
    /// Where the unit is heading.
    pub waypoint: Vec2,
    /// Food carried.
    pub carrying: u32,
    /// Speech bubble.
    pub message: Option<String>,
    /// Selected by the player.
    pub selected: bool,
}

impl From<&Unit> for UnitView {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            team: unit.team,
            position: unit.position,
            angle: unit.angle,
            size: unit.size,
            hp: unit.hp,
            energy: unit.energy,
            skills: unit.skills,
            personality: unit.personality,
            movement_mode: unit.movement_mode,
            activity: unit.activity,
            sleeping: unit.sleep.sleeping,
            resting: unit.rest.resting,
            aiming: unit.aiming,
            order: unit.current_order,
            waypoint: unit.current_waypoint.position,
            carrying: unit.inventory.carrying,
            message: unit.message.as_ref().map(|m| m.text.clone()),
            selected: unit.selected,
        }
    }
}

/// A castle as drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastleView {
    /// Castle key.
    pub id: CastleId,
    /// Owning team.
    pub team: Team,
    /// Position.
    pub position: Vec2,
    /// Hit points.
    pub hp: i32,
    /// Stored food.
    pub food: u32,
    /// Town name.
    pub name: Option<String>,
}

impl CastleView {
    fn new(id: CastleId, castle: &Castle) -> Self {
        Self {
            id,
            team: castle.team,
            position: castle.position,
            hp: castle.hp,
            food: castle.food,
            name: castle.name.clone(),
        }
    }
}

/// An arrow in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowView {
    /// Shooting team.
    pub team: Team,
    /// Position.
    pub position: Vec2,
    /// Heading.
    pub angle: f32,
    /// Recent positions, oldest first.
    pub trail: Vec<Vec2>,
}

impl From<&Arrow> for ArrowView {
    fn from(arrow: &Arrow) -> Self {
        Self {
            team: arrow.team,
            position: arrow.position,
            angle: arrow.angle,
            trail: arrow.trail.iter().copied().collect(),
        }
    }
}

/// A tree as drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeView {
    /// Position.
    pub position: Vec2,
    /// Growth stage.
    pub growth_stage: u8,
}

/// An apple on the ground or in hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppleView {
    /// Apple key.
    pub id: AppleId,
    /// Position where it lies, or where it was picked up.
    pub position: Vec2,
    /// Carried by a unit.
    pub held: bool,
}

/// A grazing animal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimalView {
    /// Animal key.
    pub id: AnimalId,
    /// Position.
    pub position: Vec2,
    /// Heading.
    pub angle: f32,
}

/// Everything visible at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Units.
    pub units: Vec<UnitView>,
    /// Castles.
    pub castles: Vec<CastleView>,
    /// Arrows in flight.
    pub arrows: Vec<ArrowView>,
    /// Trees.
    pub trees: Vec<TreeView>,
    /// Apples.
    pub apples: Vec<AppleView>,
    /// Animals.
    pub animals: Vec<AnimalView>,
    /// Bad memories.
    pub memories: Vec<BadMemory>,
    /// Combat record per team.
    pub stats: PerTeam<TeamCombatStats>,
    /// Aggregates per team.
    pub summaries: PerTeam<TeamSummary>,
}

impl WorldSnapshot {
    /// Capture the world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self {
            tick: world.tick(),
            units: world.units().map(UnitView::from).collect(),
            castles: world
                .castles()
                .map(|(id, castle)| CastleView::new(id, castle))
                .collect(),
            arrows: world
                .units()
                .flat_map(|u| u.arrows.iter().filter(|a| !a.hit))
                .map(ArrowView::from)
                .collect(),
            trees: world
                .trees()
                .iter()
                .map(|t| TreeView {
                    position: t.position,
                    growth_stage: t.growth_stage,
                })
                .collect(),
            apples: world
                .apples()
                .map(|(id, a)| AppleView {
                    id,
                    position: a.position,
                    held: a.held_by.is_some(),
                })
                .collect(),
            animals: world
                .animals()
                .map(|(id, a)| AnimalView {
                    id,
                    position: a.position,
                    angle: a.angle,
                })
                .collect(),
            memories: world.memories().to_vec(),
            stats: PerTeam::new(*world.stats(Team::Blue), *world.stats(Team::Red)),
            summaries: PerTeam::new(world.team_summary(Team::Blue), world.team_summary(Team::Red)),
        }
    }

    /// Units of one team.
    pub fn team_units(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.units.iter().filter(move |u| u.team == team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::animals::Animal;
    use crate::economy::{Apple, Tree};
    use crate::unit::UnitSpawn;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_capture_copies_world() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(91);
        world.spawn_unit(
            UnitSpawn::new(Team::Blue, Vec2::new(300.0, 300.0), 30.0, Skills::worker()),
            &mut rng,
        );
        world.spawn_unit(
            UnitSpawn::new(Team::Red, Vec2::new(900.0, 300.0), 30.0, Skills::fighter()),
            &mut rng,
        );
        world
            .castles
            .insert(Castle::new(Team::Red, Vec2::new(880.0, 360.0), 100, Some("Mordor".into())));
        world.trees.push(Tree::new(Vec2::new(640.0, 360.0)));
        world.apples.insert(Apple::new(Vec2::new(640.0, 375.0)));
        let animal = Animal::new(Vec2::new(500.0, 200.0), &world.config, &mut rng);
        world.animals.insert(animal);

        let snapshot = WorldSnapshot::capture(&world);
        assert_eq!(snapshot.units.len(), 2);
        assert_eq!(snapshot.team_units(Team::Red).count(), 1);
        assert_eq!(snapshot.castles[0].name.as_deref(), Some("Mordor"));
        assert_eq!(snapshot.trees.len(), 1);
        assert!(!snapshot.apples[0].held);
        assert_eq!(snapshot.animals[0].position, Vec2::new(500.0, 200.0));
        assert_eq!(snapshot.summaries[Team::Red].castle_count, 1);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(92);
        world.spawn_unit(
            UnitSpawn::new(Team::Blue, Vec2::new(300.0, 300.0), 30.0, Skills::leader()),
            &mut rng,
        );
        let json = serde_json::to_string(&WorldSnapshot::capture(&world)).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.units[0].skills, Skills::leader());
    }
}
