//! Plain data carried by arena entities.
//!
//! Ids are generation-tagged slotmap keys: a key kept after its entity
//! was removed simply fails to resolve, which is how weak references
//! (combat targets, arrow shooters, apple holders) are expressed.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::math::Vec2;
use crate::tuning::{
    BACKWARD_SPEED_MULTIPLIER, FORWARD_SPEED_MULTIPLIER, MESSAGE_DURATION, RUN_SPEED_MULTIPLIER,
    SIDEWAYS_SPEED_MULTIPLIER, WALK_SPEED_MULTIPLIER,
};

new_key_type! {
    /// Identifies a unit.
    pub struct UnitId;
    /// Identifies a castle.
    pub struct CastleId;
    /// Identifies an apple on the ground or in hand.
    pub struct AppleId;
    /// Identifies a wild animal.
    pub struct AnimalId;
}

/// Skill levels. Each grows without bound through small increments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Skills {
    /// Archery.
    pub fighter: f32,
    /// Gathering and building.
    pub worker: f32,
    /// Order giving.
    pub leader: f32,
    /// Training rookies.
    pub trainer: f32,
}

impl Skills {
    /// No skills at all (rookies and peasants).
    pub const NONE: Self = Self {
        fighter: 0.0,
        worker: 0.0,
        leader: 0.0,
        trainer: 0.0,
    };

    /// A trained fighter.
    #[must_use]
    pub const fn fighter() -> Self {
        Self {
            fighter: 1.0,
            ..Self::NONE
        }
    }

    /// A trained worker.
    #[must_use]
    pub const fn worker() -> Self {
        Self {
            worker: 1.0,
            ..Self::NONE
        }
    }

    /// A trained leader.
    #[must_use]
    pub const fn leader() -> Self {
        Self {
            leader: 1.0,
            ..Self::NONE
        }
    }
}

/// Temperament, fixed when the unit is created.
///
/// `Friendly` currently shares the neutral fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Personality {
    /// Closes distance and shoots first.
    Aggressive,
    /// Keeps distance and walks to save energy.
    Defensive,
    /// No combat preference.
    Friendly,
    /// Turns moderately and shoots when in range.
    #[default]
    Neutral,
}

impl Personality {
    /// All personalities.
    pub const ALL: [Personality; 4] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Friendly,
        Personality::Neutral,
    ];

    /// Pick one uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Gait selected by the energy model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Standing at the waypoint.
    Idle,
    /// Normal pace.
    #[default]
    Walk,
    /// Faster and more tiring.
    Run,
}

impl MovementMode {
    /// Speed multiplier for this gait.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::Run => RUN_SPEED_MULTIPLIER,
            Self::Walk | Self::Idle => WALK_SPEED_MULTIPLIER,
        }
    }
}

/// Direction of travel relative to facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementDirection {
    /// Within 45° of facing.
    #[default]
    Forward,
    /// More than 135° from facing.
    Backward,
    /// Anything in between.
    Sideways,
}

impl MovementDirection {
    /// Speed multiplier for this direction.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::Forward => FORWARD_SPEED_MULTIPLIER,
            Self::Backward => BACKWARD_SPEED_MULTIPLIER,
            Self::Sideways => SIDEWAYS_SPEED_MULTIPLIER,
        }
    }
}

/// Worker economy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityState {
    /// Not yet working.
    #[default]
    Idle,
    /// Looking for apples.
    Gather,
    /// Carrying food home.
    Return,
    /// Raising a new castle.
    Build,
}

/// Team-level order a leader can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Gather around.
    Rally,
    /// Hold back.
    Rest,
    /// Press forward.
    Attack,
}

/// Weights for the periodic order draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderWeights {
    /// Weight of [`Order::Rally`].
    pub rally: f32,
    /// Weight of [`Order::Rest`].
    pub rest: f32,
    /// Weight of [`Order::Attack`].
    pub attack: f32,
}

impl Default for OrderWeights {
    fn default() -> Self {
        Self {
            rally: 1.0,
            rest: 1.0,
            attack: 1.0,
        }
    }
}

impl OrderWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.rally + self.rest + self.attack
    }

    /// Pull every weight a fraction of the way back toward 1.
    pub fn revert_toward_one(&mut self, rate: f32) {
        for w in [&mut self.rally, &mut self.rest, &mut self.attack] {
            *w += rate * (1.0 - *w);
        }
    }

    /// Weighted draw. Falls back to the last order on rounding slack.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Order {
        let total = self.total();
        if total <= 0.0 {
            return Order::Rally;
        }
        let mut r = rng.gen::<f32>() * total;
        for (order, weight) in [
            (Order::Rally, self.rally),
            (Order::Rest, self.rest),
            (Order::Attack, self.attack),
        ] {
            if r < weight {
                return order;
            }
            r -= weight;
        }
        Order::Attack
    }
}

/// Something a unit can hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeldItem {
    /// Food value.
    pub value: u32,
    /// The apple this came from, if it still exists.
    pub source: Option<AppleId>,
}

/// Two hands and a running food tally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// Preferred hand.
    pub right_hand: Option<HeldItem>,
    /// Second hand.
    pub left_hand: Option<HeldItem>,
    /// Food being carried.
    pub carrying: u32,
}

impl Inventory {
    /// Whether both hands are free.
    #[must_use]
    pub const fn hands_empty(&self) -> bool {
        self.right_hand.is_none() && self.left_hand.is_none()
    }

    /// Put an item in the right hand, or the left if the right is taken.
    /// Returns `false` when both hands are full.
    pub fn stow(&mut self, item: HeldItem) -> bool {
        if self.right_hand.is_none() {
            self.right_hand = Some(item);
        } else if self.left_hand.is_none() {
            self.left_hand = Some(item);
        } else {
            return false;
        }
        true
    }

    /// Whether either hand holds the given apple.
    #[must_use]
    pub fn holds(&self, apple: AppleId) -> bool {
        [self.right_hand, self.left_hand]
            .iter()
            .flatten()
            .any(|item| item.source == Some(apple))
    }

    /// Empty both hands.
    pub fn clear_hands(&mut self) {
        self.right_hand = None;
        self.left_hand = None;
    }
}

/// A scored destination.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    /// Where to go.
    pub position: Vec2,
    /// Cached utility.
    pub score: f32,
}

impl Waypoint {
    /// Create a waypoint.
    #[must_use]
    pub const fn new(position: Vec2, score: f32) -> Self {
        Self { position, score }
    }
}

/// Short text shown above a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// What the unit says.
    pub text: String,
    /// Ticks left on screen.
    pub remaining: u32,
}

impl Message {
    /// A message with the standard display time.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            remaining: MESSAGE_DURATION,
        }
    }
}
