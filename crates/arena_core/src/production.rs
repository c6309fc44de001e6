//! Castles, recruitment and rookie training.
//!
//! Castles turn stored food into new units on a fixed timer. What they
//! recruit depends on how the team has been doing: losses make the
//! matching unit type less attractive, recent fighting favours archers
//! and long peace favours workers. Recruitment slows as the team nears
//! the population cap.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{CastleId, Skills, UnitId};
use crate::factions::Team;
use crate::math::Vec2;
use crate::stats::{CombatRecency, TeamCombatStats};
use crate::tuning::{
    CASTLE_MAX_HP, CASTLE_SPAWN_INTERVAL, FIGHTER_COST, LEADER_COST,
    LEADER_FOOD_BONUS_THRESHOLD, PEASANT_SPAWN_CHANCE, TRAINING_CHANCE, TRAINING_COOLDOWN,
    TRAINING_COST, TRAINING_SKILL_GAIN, UNIT_CAP, WORKER_CAP, WORKER_COST,
};
use crate::unit::{Unit, UnitSpawn};
use crate::world::World;

/// Recruits appear within this distance of the castle on each axis.
const RECRUIT_SCATTER: f32 = 10.0;
/// Rookies appear within this distance of their trainer on each axis.
const ROOKIE_SCATTER: f32 = 15.0;
/// Body size of a trained rookie.
const ROOKIE_SIZE: f32 = 10.0;

/// A team stronghold: stores food and recruits units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Castle {
    /// Owning team.
    pub team: Team,
    /// Position.
    pub position: Vec2,
    /// Hit points; the castle falls at zero.
    pub hp: i32,
    /// Stored food.
    pub food: u32,
    /// Ticks until the next recruitment decision.
    pub spawn_timer: u32,
    /// Town name, for named starting castles.
    pub name: Option<String>,
}

impl Castle {
    /// Found a castle at full strength.
    #[must_use]
    pub fn new(team: Team, position: Vec2, food: u32, name: Option<String>) -> Self {
        Self {
            team,
            position,
            hp: CASTLE_MAX_HP,
            food,
            spawn_timer: CASTLE_SPAWN_INTERVAL,
            name,
        }
    }

    /// Still standing.
    #[must_use]
    pub const fn is_standing(&self) -> bool {
        self.hp > 0
    }
}

/// What a castle can recruit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recruit {
    /// Leader skill 1.
    Leader,
    /// Fighter skill 1.
    Fighter,
    /// Worker skill 1.
    Worker,
    /// No skills; free.
    Peasant,
}

impl Recruit {
    /// Starting skills.
    #[must_use]
    pub const fn skills(self) -> Skills {
        match self {
            Self::Leader => Skills::leader(),
            Self::Fighter => Skills::fighter(),
            Self::Worker => Skills::worker(),
            Self::Peasant => Skills::NONE,
        }
    }

    /// Food cost.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Leader => LEADER_COST,
            Self::Fighter => FIGHTER_COST,
            Self::Worker => WORKER_COST,
            Self::Peasant => 0,
        }
    }
}

/// Relative recruitment weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitWeights {
    /// Leader weight.
    pub leader: f32,
    /// Fighter weight.
    pub fighter: f32,
    /// Worker weight.
    pub worker: f32,
}

impl UnitWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.leader + self.fighter + self.worker
    }

    /// Multiply every weight by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            leader: self.leader * factor,
            fighter: self.fighter * factor,
            worker: self.worker * factor,
        }
    }

    /// Weights rescaled to sum to one, or `None` when they sum to zero.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let total = self.total();
        (total > 0.0).then(|| self.scaled(1.0 / total))
    }
}

/// Base recruitment weights for a castle, before population limits.
#[must_use]
pub fn calculate_unit_weights(castle: &Castle, stats: &TeamCombatStats, tick: u64) -> UnitWeights {
    let mut weights = UnitWeights {
        leader: 0.1,
        fighter: 0.5 * stats.knight_effectiveness,
        worker: 0.4 * stats.worker_effectiveness,
    };

    if castle.food > LEADER_FOOD_BONUS_THRESHOLD {
        weights.leader *= 2.0;
    }
    match stats.recency(tick) {
        CombatRecency::Recent => {
            weights.fighter *= 1.5;
            weights.worker *= 0.5;
        }
        CombatRecency::Peaceful => {
            weights.worker *= 1.5;
            weights.fighter *= 0.8;
        }
        CombatRecency::Lingering => {}
    }
    weights
}

/// Recruitment weights after the population cap and worker cap apply.
#[must_use]
pub fn effective_unit_weights(castle: &Castle, world: &World) -> UnitWeights {
    let population = world.population(castle.team);
    let growth = (UNIT_CAP.saturating_sub(population)) as f32 / UNIT_CAP as f32;
    let mut weights =
        calculate_unit_weights(castle, world.stats(castle.team), world.tick()).scaled(growth);
    if world.worker_count(castle.team) >= WORKER_CAP {
        weights.worker = 0.0;
    }
    weights
}

/// Pick an affordable recruit for a roll `r` in `[0, 1)`.
///
/// Leaders and fighters need both the roll and the food; workers are
/// the affordable fallback whenever the worker weight is still open.
#[must_use]
pub fn choose_recruit(weights: UnitWeights, food: u32, r: f32) -> Option<Recruit> {
    let norm = weights.normalized()?;
    if r < norm.leader && food >= LEADER_COST {
        Some(Recruit::Leader)
    } else if r < norm.leader + norm.fighter && food >= FIGHTER_COST {
        Some(Recruit::Fighter)
    } else if norm.worker > 0.0 && food >= WORKER_COST {
        Some(Recruit::Worker)
    } else {
        None
    }
}

/// Events generated by production.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// A castle recruited a unit.
    UnitRecruited {
        /// The recruiting castle.
        castle: CastleId,
        /// The new unit.
        unit: UnitId,
        /// What was recruited.
        recruit: Recruit,
    },
    /// A trainer turned food into a rookie.
    RookieTrained {
        /// The trainer.
        trainer: UnitId,
        /// The castle that paid.
        castle: CastleId,
        /// The new unit.
        rookie: UnitId,
    },
}

/// Advance every castle's recruitment timer and recruit when it fires.
pub fn castle_system<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    events: &mut Vec<ProductionEvent>,
) {
    let castle_ids: Vec<CastleId> = world.castles.keys().collect();

    for castle_id in castle_ids {
        let Some(castle) = world.castles.get_mut(castle_id) else {
            continue;
        };
        if !castle.is_standing() {
            continue;
        }
        castle.spawn_timer = castle.spawn_timer.saturating_sub(1);
        if castle.spawn_timer > 0 {
            continue;
        }
        castle.spawn_timer = CASTLE_SPAWN_INTERVAL;

        let Some(castle) = world.castles.get(castle_id) else {
            continue;
        };
        let team = castle.team;
        let position = castle.position;
        let weights = effective_unit_weights(castle, world);
        let roll = rng.gen::<f32>();

        let recruit = choose_recruit(weights, castle.food, roll).or_else(|| {
            (world.population(team) < UNIT_CAP && rng.gen_bool(PEASANT_SPAWN_CHANCE))
                .then_some(Recruit::Peasant)
        });
        let Some(recruit) = recruit else {
            continue;
        };

        if let Some(castle) = world.castles.get_mut(castle_id) {
            castle.food -= recruit.cost();
        }
        let offset = Vec2::new(
            rng.gen_range(-RECRUIT_SCATTER..RECRUIT_SCATTER),
            rng.gen_range(-RECRUIT_SCATTER..RECRUIT_SCATTER),
        );
        let size = rng.gen_range(15.0..25.0);
        let unit = world.spawn_unit(
            UnitSpawn::new(team, position + offset, size, recruit.skills()),
            rng,
        );

        tracing::debug!(
            tick = world.tick,
            team = %team,
            castle = ?castle_id,
            unit = ?unit,
            ?recruit,
            "Unit recruited"
        );
        events.push(ProductionEvent::UnitRecruited {
            castle: castle_id,
            unit,
            recruit,
        });
    }
}

/// Let a trainer occasionally turn castle food into an unskilled rookie.
pub fn maybe_train_rookie<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &mut World,
    rng: &mut R,
    events: &mut Vec<ProductionEvent>,
) {
    if unit.skills.trainer < 1.0 {
        return;
    }
    if unit.train_cooldown > 0 {
        unit.train_cooldown -= 1;
        return;
    }
    unit.train_cooldown = TRAINING_COOLDOWN;

    if !rng.gen_bool(TRAINING_CHANCE) || world.population(unit.team) >= UNIT_CAP {
        return;
    }
    let Some((castle_id, castle)) = world.nearest_castle(unit.team, unit.position) else {
        return;
    };
    if castle.food < TRAINING_COST {
        return;
    }
    if let Some(castle) = world.castles.get_mut(castle_id) {
        castle.food -= TRAINING_COST;
    }

    let offset = Vec2::new(
        rng.gen_range(-ROOKIE_SCATTER..ROOKIE_SCATTER),
        rng.gen_range(-ROOKIE_SCATTER..ROOKIE_SCATTER),
    );
    let rookie = world.spawn_unit(
        UnitSpawn::new(unit.team, unit.position + offset, ROOKIE_SIZE, Skills::NONE),
        rng,
    );
    unit.say("Trained a new rookie!");
    unit.skills.trainer += TRAINING_SKILL_GAIN;

    events.push(ProductionEvent::RookieTrained {
        trainer: unit.id,
        castle: castle_id,
        rookie,
    });
}
