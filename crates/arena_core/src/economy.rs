//! Orchard economy and the worker state machine.
//!
//! Trees ripen one apple at a time and drop it next to their trunk.
//! Workers cycle through gather, return and build: pick up an apple,
//! carry its food to the nearest castle of their team, or raise a new
//! castle when their team has none left.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{ActivityState, AppleId, CastleId, HeldItem, UnitId};
use crate::math::Vec2;
use crate::production::Castle;
use crate::tuning::{
    APPLE_FOOD_VALUE, APPLE_LIFETIME, BUILD_SKILL_GAIN, CASTLE_BUILD_COST, CASTLE_BUILD_TIME,
    DEPOSIT_SKILL_GAIN, INTERACTION_RADIUS, PRIORITY_WAYPOINT_SCORE, TREE_DROP_TICKS,
    TREE_MAX_STAGE, TREE_STAGE_TICKS,
};
use crate::unit::Unit;
use crate::world::World;

/// Horizontal scatter of a dropped apple around the trunk.
const APPLE_DROP_SCATTER: f32 = 10.0;
/// Apples land this far below the trunk.
const APPLE_DROP_OFFSET: f32 = 15.0;

/// A resource node. Stationary and never destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Trunk position.
    pub position: Vec2,
    /// Ripeness of the next apple, `0..=TREE_MAX_STAGE`.
    pub growth_stage: u8,
    /// Ticks since the last drop.
    pub timer: u32,
}

impl Tree {
    /// Plant a tree with no apple growing yet.
    #[must_use]
    pub const fn new(position: Vec2) -> Self {
        Self {
            position,
            growth_stage: 0,
            timer: 0,
        }
    }

    /// Whether the apple is fully grown.
    #[must_use]
    pub const fn is_ripe(&self) -> bool {
        self.growth_stage >= TREE_MAX_STAGE
    }

    /// Grow for one tick. Returns where an apple lands if one drops.
    pub fn grow<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Vec2> {
        self.timer += 1;
        if self.timer % TREE_STAGE_TICKS == 0 {
            self.growth_stage = (self.growth_stage + 1).min(TREE_MAX_STAGE);
        }
        if self.timer < TREE_DROP_TICKS {
            return None;
        }

        self.timer = 0;
        self.growth_stage = 0;
        let scatter = rng.gen_range(-APPLE_DROP_SCATTER..APPLE_DROP_SCATTER);
        Some(self.position + Vec2::new(scatter, APPLE_DROP_OFFSET))
    }
}

/// A food item on the ground or in a worker's hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Apple {
    /// Where it lies.
    pub position: Vec2,
    /// Ticks left before it rots.
    pub life: u32,
    /// Worker holding it.
    pub held_by: Option<UnitId>,
}

impl Apple {
    /// A freshly dropped apple.
    #[must_use]
    pub const fn new(position: Vec2) -> Self {
        Self {
            position,
            life: APPLE_LIFETIME,
            held_by: None,
        }
    }

    /// Lying on the ground, free to pick up.
    #[must_use]
    pub const fn is_loose(&self) -> bool {
        self.held_by.is_none() && self.life > 0
    }

    /// Rotted away.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.life == 0
    }
}

/// Events generated by the economy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A tree dropped an apple.
    AppleDropped {
        /// The new apple.
        apple: AppleId,
        /// Where it landed.
        position: Vec2,
    },
    /// A worker picked up an apple.
    ApplePickedUp {
        /// The worker.
        unit: UnitId,
        /// The apple.
        apple: AppleId,
    },
    /// A worker emptied its load into a castle.
    FoodDeposited {
        /// The worker.
        unit: UnitId,
        /// The receiving castle.
        castle: CastleId,
        /// Food added.
        amount: u32,
    },
    /// A worker raised a castle.
    CastleBuilt {
        /// The builder.
        unit: UnitId,
        /// The new castle.
        castle: CastleId,
    },
}

/// One tick of the worker state machine.
pub fn update_worker(unit: &mut Unit, world: &mut World, events: &mut Vec<EconomyEvent>) {
    if unit.activity == ActivityState::Idle {
        unit.activity = ActivityState::Gather;
    }

    match unit.activity {
        ActivityState::Idle => {}
        ActivityState::Gather => gather(unit, world, events),
        ActivityState::Return => return_home(unit, world, events),
        ActivityState::Build => build(unit, world, events),
    }
}

fn gather(unit: &mut Unit, world: &mut World, events: &mut Vec<EconomyEvent>) {
    if unit.inventory.carrying > 0 || !unit.inventory.hands_empty() {
        // A loaded worker waits here until its team has a castle to deliver to
        if unit.inventory.carrying > 0
            && world.nearest_castle(unit.team, unit.position).is_some()
        {
            unit.activity = ActivityState::Return;
        }
        return;
    }
    let Some(apple_id) = world.nearest_loose_apple(unit.position, INTERACTION_RADIUS) else {
        return;
    };
    let Some(apple) = world.apples.get_mut(apple_id) else {
        return;
    };

    let item = HeldItem {
        value: APPLE_FOOD_VALUE,
        source: Some(apple_id),
    };
    if !unit.inventory.stow(item) {
        return;
    }
    apple.held_by = Some(unit.id);
    unit.inventory.carrying = APPLE_FOOD_VALUE;
    unit.activity = ActivityState::Return;
    unit.say("Got an apple!");
    events.push(EconomyEvent::ApplePickedUp {
        unit: unit.id,
        apple: apple_id,
    });
}

fn return_home(unit: &mut Unit, world: &mut World, events: &mut Vec<EconomyEvent>) {
    let Some((castle_id, castle)) = world.nearest_castle(unit.team, unit.position) else {
        unit.activity = ActivityState::Build;
        unit.say("No castle found, let's build!");
        return;
    };
    let castle_position = castle.position;

    if unit.position.distance(castle_position) >= INTERACTION_RADIUS {
        unit.set_waypoint(castle_position, PRIORITY_WAYPOINT_SCORE);
        return;
    }

    let amount = unit.inventory.carrying;
    if let Some(castle) = world.castles.get_mut(castle_id) {
        castle.food += amount;
    }
    unit.inventory.carrying = 0;
    unit.inventory.clear_hands();
    unit.activity = ActivityState::Gather;
    unit.skills.worker += DEPOSIT_SKILL_GAIN;
    unit.say(format!("+{amount} food!"));
    events.push(EconomyEvent::FoodDeposited {
        unit: unit.id,
        castle: castle_id,
        amount,
    });
}

fn build(unit: &mut Unit, world: &mut World, events: &mut Vec<EconomyEvent>) {
    if unit.inventory.carrying < CASTLE_BUILD_COST {
        unit.activity = ActivityState::Gather;
        unit.say("Not enough food, gather more!");
        return;
    }

    unit.build_timer = unit.build_timer.saturating_sub(1);
    unit.say("Building in progress...");
    if unit.build_timer > 0 {
        return;
    }

    unit.activity = ActivityState::Gather;
    if !world.can_build_castle(unit.position) {
        unit.say("Too close to another castle, gather again!");
        return;
    }

    unit.inventory.carrying -= CASTLE_BUILD_COST;
    unit.inventory.clear_hands();
    unit.build_timer = CASTLE_BUILD_TIME;
    unit.skills.worker += BUILD_SKILL_GAIN;
    let castle = world
        .castles
        .insert(Castle::new(unit.team, unit.position, 0, None));
    unit.say("Castle built!");

    tracing::info!(
        tick = world.tick,
        team = %unit.team,
        unit = ?unit.id,
        castle = ?castle,
        "Castle built"
    );
    events.push(EconomyEvent::CastleBuilt {
        unit: unit.id,
        castle,
    });
}

/// Grow every tree and place the apples that drop.
pub fn tree_system<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    events: &mut Vec<EconomyEvent>,
) {
    let drops: Vec<Vec2> = world
        .trees
        .iter_mut()
        .filter_map(|tree| tree.grow(rng))
        .collect();

    for position in drops {
        let apple = world.apples.insert(Apple::new(position));
        tracing::trace!(tick = world.tick, apple = ?apple, "Apple dropped");
        events.push(EconomyEvent::AppleDropped { apple, position });
    }
}

/// Age the apples lying on the ground.
pub fn apple_system(world: &mut World) {
    for apple in world.apples.values_mut().filter(|a| a.held_by.is_none()) {
        apple.life = apple.life.saturating_sub(1);
    }
}

/// Drop rotten apples and apples whose holder no longer carries them.
pub fn prune_apples(world: &mut World) {
    let units = &world.units;
    world.apples.retain(|id, apple| match apple.held_by {
        None => !apple.is_expired(),
        Some(holder) => units
            .get(holder)
            .is_some_and(|unit| unit.inventory.holds(id)),
    });
}
