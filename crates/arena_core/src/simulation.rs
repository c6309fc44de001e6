//! Core simulation loop.
//!
//! [`Simulation`] owns the [`World`] and the single random source every
//! behavior draws from. Each call to [`Simulation::tick`] advances the
//! arena by one frame and reports what happened.
//!
//! # Determinism
//!
//! Given the same config, seed and sequence of external calls, two
//! simulations produce identical worlds: entity iteration follows slotmap
//! order and every random draw goes through the owned `ChaCha8Rng`.
//!
//! # Example
//!
//! ```
//! use arena_core::config::WorldConfig;
//! use arena_core::simulation::Simulation;
//!
//! let mut sim = Simulation::with_seed(WorldConfig::default(), 7).unwrap();
//! sim.spawn_standard_skirmish();
//! let events = sim.tick();
//! assert_eq!(sim.current_tick(), 1);
//! assert!(events.deaths.is_empty());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::animals::{self, Animal};
use crate::combat::{self, CombatEvent};
use crate::components::{AnimalId, AppleId, CastleId, Skills, UnitId};
use crate::config::WorldConfig;
use crate::economy::{self, Apple, EconomyEvent, Tree};
use crate::energy;
use crate::error::{Result, SimError};
use crate::factions::Team;
use crate::leadership::{self, OrderEvent};
use crate::math::Vec2;
use crate::memory::decay_memories;
use crate::movement;
use crate::perception;
use crate::production::{self, Castle, ProductionEvent};
use crate::projectile;
use crate::snapshot::WorldSnapshot;
use crate::stats::TeamSummary;
use crate::tuning::ANIMAL_COUNT;
use crate::unit::{Unit, UnitSpawn};
use crate::world::World;

/// A castle that fell this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastleDestroyed {
    /// The castle's key.
    pub castle: CastleId,
    /// Owning team.
    pub team: Team,
    /// Where it stood.
    pub position: Vec2,
}

/// Events generated during a single tick.
///
/// Frontends use these to trigger effects and logs; the headless runner
/// folds them into match metrics.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Arrows loosed, hits and misses.
    pub combat: Vec<CombatEvent>,
    /// Apples, deposits and construction.
    pub economy: Vec<EconomyEvent>,
    /// Recruits and rookies.
    pub production: Vec<ProductionEvent>,
    /// Orders issued by leaders.
    pub orders: Vec<OrderEvent>,
    /// Units removed this tick.
    pub deaths: Vec<UnitId>,
    /// Castles removed this tick.
    pub castles_destroyed: Vec<CastleDestroyed>,
    /// Units created this tick.
    pub spawned: Vec<UnitId>,
}

/// The arena simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Memory** - Bad memories fade
/// 2. **Production** - Castles recruit
/// 3. **Units** - Every unit alive at tick start updates in turn
/// 4. **Trees** - Trees grow and drop apples
/// 5. **Apples** - Loose apples age
/// 6. **Animals** - Herds graze
/// 7. **Arrows** - Arrows fly
/// 8. **Collisions** - Arrows strike units and castles
/// 9. **Cleanup** - The dead, the fallen and the spent are removed
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Create an empty simulation seeded from system entropy.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] when the bounds leave no room.
    pub fn new(config: WorldConfig) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create an empty simulation with a fixed seed.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] when the bounds leave no room.
    pub fn with_seed(config: WorldConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create an empty simulation drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] when the bounds leave no room.
    pub fn with_rng(config: WorldConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            world: World::new(config),
            rng,
        })
    }

    /// Read-only access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.world.tick
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let world = &mut self.world;
        let rng = &mut self.rng;

        // 1. Memory
        decay_memories(&mut world.memories);

        // 2. Production
        production::castle_system(world, rng, &mut events.production);

        // 3. Units, captured now so this tick's recruits wait a tick
        let unit_ids: Vec<UnitId> = world.units.keys().collect();
        for id in unit_ids {
            let Some(mut unit) = world.units.get(id).cloned() else {
                continue;
            };
            update_unit(&mut unit, world, rng, &mut events);
            if let Some(slot) = world.units.get_mut(id) {
                *slot = unit;
            }
        }

        // 4. Trees
        economy::tree_system(world, rng, &mut events.economy);

        // 5. Apples
        economy::apple_system(world);

        // 6. Animals
        animals::animal_system(world, rng);

        // 7. Arrows
        projectile::advance_arrows(world, &mut events.combat);

        // 8. Collisions
        projectile::resolve_collisions(world, &mut events.combat);

        // 9. Cleanup
        remove_dead(world, &mut events);

        events.spawned.extend(events.production.iter().map(|e| match *e {
            ProductionEvent::UnitRecruited { unit, .. } => unit,
            ProductionEvent::RookieTrained { rookie, .. } => rookie,
        }));

        world.tick += 1;
        events
    }

    /// Run `ticks` ticks, discarding events.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Place a unit.
    pub fn spawn_unit(&mut self, spawn: UnitSpawn) -> UnitId {
        self.world.spawn_unit(spawn, &mut self.rng)
    }

    /// Found a castle.
    pub fn spawn_castle(
        &mut self,
        team: Team,
        position: Vec2,
        food: u32,
        name: Option<String>,
    ) -> CastleId {
        let position = self.world.config.clamp(position);
        let id = self
            .world
            .castles
            .insert(Castle::new(team, position, food, name));
        tracing::debug!(tick = self.world.tick, team = %team, castle = ?id, "Castle founded");
        id
    }

    /// Plant a tree.
    pub fn spawn_tree(&mut self, position: Vec2) {
        self.world.trees.push(Tree::new(position));
    }

    /// Drop a loose apple.
    pub fn spawn_apple(&mut self, position: Vec2) -> AppleId {
        self.world.apples.insert(Apple::new(position))
    }

    /// Release an animal, pulled inside the margins.
    pub fn spawn_animal(&mut self, position: Vec2) -> AnimalId {
        let animal = Animal::new(position, &self.world.config, &mut self.rng);
        self.world.animals.insert(animal)
    }

    /// Release `count` animals at random spots on the canvas.
    pub fn spawn_random_animals(&mut self, count: usize) {
        let WorldConfig { width, height, .. } = self.world.config;
        for _ in 0..count {
            let position = Vec2::new(
                self.rng.gen_range(0.0..width),
                self.rng.gen_range(0.0..height),
            );
            self.spawn_animal(position);
        }
    }

    /// Set up the standard two-castle skirmish.
    ///
    /// Each side gets a named castle 400 from its wall with 100 food, a
    /// leader who can train, a worker and a fighter. Five trees ring the
    /// centre of the arena and a few animals roam at random.
    pub fn spawn_standard_skirmish(&mut self) {
        let WorldConfig { width, height, .. } = self.world.config;
        let mid = height / 2.0;

        for (team, name, mirrored) in [(Team::Blue, "Camelot", false), (Team::Red, "Mordor", true)] {
            let x = |d: f32| if mirrored { width - d } else { d };

            self.spawn_castle(team, Vec2::new(x(400.0), mid), 100, Some(name.to_string()));
            self.spawn_unit(UnitSpawn::new(
                team,
                Vec2::new(x(130.0), mid),
                40.0,
                Skills {
                    leader: 2.0,
                    trainer: 1.0,
                    ..Skills::NONE
                },
            ));
            self.spawn_unit(UnitSpawn::new(
                team,
                Vec2::new(x(160.0), mid),
                35.0,
                Skills::worker(),
            ));
            self.spawn_unit(UnitSpawn::new(
                team,
                Vec2::new(x(140.0), mid - 50.0),
                35.0,
                Skills::fighter(),
            ));
        }

        let center = self.world.config.center();
        for i in 0..5 {
            let angle = TAU * i as f32 / 5.0;
            self.spawn_tree(center.offset(angle, 200.0));
        }
        self.spawn_random_animals(ANIMAL_COUNT);
        tracing::info!(
            units = self.world.unit_count(),
            animals = self.world.animals.len(),
            "Standard skirmish ready"
        );
    }

    /// Remove a unit immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnitNotFound`] if no such unit exists.
    pub fn despawn_unit(&mut self, id: UnitId) -> Result<Unit> {
        let unit = self.world.units.remove(id).ok_or(SimError::UnitNotFound(id))?;
        for other in self.world.units.values_mut() {
            other.affinities.remove(&id);
        }
        Ok(unit)
    }

    /// Look up a unit.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnitNotFound`] if no such unit exists.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.world.unit(id).ok_or(SimError::UnitNotFound(id))
    }

    /// Look up a unit for editing.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnitNotFound`] if no such unit exists.
    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.world.units.get_mut(id).ok_or(SimError::UnitNotFound(id))
    }

    /// Look up a castle for editing.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CastleNotFound`] if no such castle exists.
    pub fn castle_mut(&mut self, id: CastleId) -> Result<&mut Castle> {
        self.world
            .castles
            .get_mut(id)
            .ok_or(SimError::CastleNotFound(id))
    }

    /// Turn a team's global attack mode on or off.
    pub fn set_attack_mode(&mut self, team: Team, enabled: bool) {
        self.world.attack_mode[team] = enabled;
        tracing::info!(team = %team, enabled, "Attack mode changed");
    }

    /// Toggle selection of the first unit under `point`.
    ///
    /// Clicking empty ground clears every selection. Returns the unit
    /// that was toggled.
    pub fn toggle_selection_at(&mut self, point: Vec2) -> Option<UnitId> {
        let hit = self
            .world
            .units
            .values_mut()
            .find(|u| u.contains_point(point));
        if let Some(unit) = hit {
            unit.selected = !unit.selected;
            return Some(unit.id);
        }
        for unit in self.world.units.values_mut() {
            unit.selected = false;
        }
        None
    }

    /// Capture a serializable view of the world.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world)
    }

    /// Aggregate one team.
    #[must_use]
    pub fn team_summary(&self, team: Team) -> TeamSummary {
        self.world.team_summary(team)
    }

    /// Hash of the mutable state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.world.tick.hash(&mut hasher);

        self.world.units.len().hash(&mut hasher);
        for (id, unit) in &self.world.units {
            id.hash(&mut hasher);
            unit.position.x.to_bits().hash(&mut hasher);
            unit.position.y.to_bits().hash(&mut hasher);
            unit.angle.to_bits().hash(&mut hasher);
            unit.energy.to_bits().hash(&mut hasher);
            unit.hp.hash(&mut hasher);
            unit.arrows.len().hash(&mut hasher);
        }

        for (id, castle) in &self.world.castles {
            id.hash(&mut hasher);
            castle.hp.hash(&mut hasher);
            castle.food.hash(&mut hasher);
        }
        for (id, animal) in &self.world.animals {
            id.hash(&mut hasher);
            animal.position.x.to_bits().hash(&mut hasher);
            animal.position.y.to_bits().hash(&mut hasher);
            animal.angle.to_bits().hash(&mut hasher);
        }
        self.world.apples.len().hash(&mut hasher);
        self.world.memories.len().hash(&mut hasher);

        hasher.finish()
    }
}

/// One unit's update for this tick. Sleeping and resting units only drift.
fn update_unit<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &mut World,
    rng: &mut R,
    events: &mut TickEvents,
) {
    unit.tick_message();

    if energy::update_rest_cycle(unit, world, rng) {
        return;
    }
    if energy::update_energy(unit, &world.config, rng) {
        return;
    }

    production::maybe_train_rookie(unit, world, rng, &mut events.production);

    if perception::wants_waypoint_review(unit, rng) {
        perception::evaluate_waypoints(unit, world, rng);
    }

    let steering = movement::steer_toward_waypoint(unit);

    if unit.skills.leader > 0.0 {
        leadership::update_leadership(unit, world, rng, &mut events.orders);
    }
    if unit.skills.fighter > 0.0 {
        combat::update_fighter(unit, world, rng, &mut events.combat);
    }
    if unit.skills.worker > 0.0 {
        economy::update_worker(unit, world, &mut events.economy);
    }

    movement::apply_center_bias(unit, &world.config);
    movement::apply_separation(unit, world, rng);
    energy::determine_movement_mode(unit, &world.stats[unit.team], world.tick, rng);
    movement::integrate(unit, steering, world);
    movement::normalize_facing(unit);
}

/// End-of-tick removal of dead units, fallen castles, spent arrows, gone
/// apples and slain animals.
fn remove_dead(world: &mut World, events: &mut TickEvents) {
    let dead: Vec<UnitId> = world
        .units
        .iter()
        .filter(|(_, u)| !u.is_alive())
        .map(|(id, _)| id)
        .collect();
    for id in &dead {
        if let Some(unit) = world.units.remove(*id) {
            tracing::debug!(
                tick = world.tick,
                team = %unit.team,
                unit = ?id,
                name = %unit.name,
                "Unit removed"
            );
        }
    }

    let fallen: Vec<CastleId> = world
        .castles
        .iter()
        .filter(|(_, c)| !c.is_standing())
        .map(|(id, _)| id)
        .collect();
    for id in fallen {
        if let Some(castle) = world.castles.remove(id) {
            events.castles_destroyed.push(CastleDestroyed {
                castle: id,
                team: castle.team,
                position: castle.position,
            });
        }
    }

    for unit in world.units.values_mut() {
        unit.arrows.retain(|a| !a.hit);
        for id in &dead {
            unit.affinities.remove(id);
        }
    }

    economy::prune_apples(world);
    animals::prune_animals(world);
    events.deaths = dead;
}
