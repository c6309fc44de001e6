//! Leader orders, threat-driven retreats and resource control.
//!
//! Each leader re-draws an order on its own timer. Tactical leaders (skill
//! at most [`LEADERSHIP_THRESHOLD`]) lean toward attacking when the team is
//! winning the kill count; strategic leaders always keep attack on the
//! table and push toward the orchard.

use std::f32::consts::FRAC_PI_4;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{Order, UnitId};
use crate::factions::Team;
use crate::perception::{fresh_waypoint, score_waypoint};
use crate::tuning::{
    KILL_DIFFERENTIAL_WEIGHT, LEADERSHIP_THRESHOLD, ORDER_INTERVAL, ORDER_MEAN_REVERSION,
    ORDER_SKILL_GAIN, PRIORITY_WAYPOINT_SCORE, RESOURCE_CONTROL_CHANCE, RESOURCE_CONTROL_RADIUS,
    STRATEGIC_ATTACK_FLOOR, VISION_RADIUS,
};
use crate::unit::Unit;
use crate::world::World;

/// Retreat distances tried, nearest first.
const RETREAT_DISTANCES: [f32; 4] = [60.0, 90.0, 120.0, 150.0];
/// Candidates sampled toward the resource centre.
const RESOURCE_CONTROL_ATTEMPTS: u32 = 5;

/// A leader issued a new order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// The leader.
    pub leader: UnitId,
    /// The leader's team.
    pub team: Team,
    /// The order drawn.
    pub order: Order,
}

/// Run one tick of a leader's decision making.
pub fn update_leadership<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &World,
    rng: &mut R,
    events: &mut Vec<OrderEvent>,
) {
    unit.order_timer = unit.order_timer.saturating_sub(1);
    if unit.order_timer == 0 {
        issue_order(unit, world, rng, events);
    }

    if unit.current_order == Some(Order::Attack)
        && world.team_threat(unit.team) < world.team_threat(unit.team.opponent())
    {
        retreat_from_threat(unit, world, rng);
    }

    if unit.skills.leader > LEADERSHIP_THRESHOLD && rng.gen_bool(RESOURCE_CONTROL_CHANCE) {
        move_toward_resource_control(unit, world, rng);
    }
}

fn issue_order<R: Rng + ?Sized>(
    unit: &mut Unit,
    world: &World,
    rng: &mut R,
    events: &mut Vec<OrderEvent>,
) {
    let weights = &mut unit.order_weights;
    if unit.skills.leader <= LEADERSHIP_THRESHOLD {
        let differential = world.stats(unit.team).kill_differential() as f32;
        weights.attack = (weights.attack + KILL_DIFFERENTIAL_WEIGHT * differential).max(0.0);
    } else {
        weights.attack = weights.attack.max(STRATEGIC_ATTACK_FLOOR);
        move_toward_resource_control(unit, world, rng);
    }

    unit.order_weights.revert_toward_one(ORDER_MEAN_REVERSION);
    let order = unit.order_weights.choose(rng);
    unit.current_order = Some(order);
    unit.order_timer = ORDER_INTERVAL;
    unit.skills.leader += ORDER_SKILL_GAIN;

    tracing::info!(
        tick = world.tick(),
        team = %unit.team,
        unit = ?unit.id,
        ?order,
        "Order issued"
    );
    events.push(OrderEvent {
        leader: unit.id,
        team: unit.team,
        order,
    });
}

/// Step away from the enemy castle while outmatched.
///
/// Candidate points lie on the line from the enemy castle through the
/// leader, clamped into the arena. The first one inside the vision cone
/// wins; if none is and the current waypoint has also left the cone, a
/// fresh waypoint is sampled instead.
pub fn retreat_from_threat<R: Rng + ?Sized>(unit: &mut Unit, world: &World, rng: &mut R) {
    let Some((_, castle)) = world.nearest_castle(unit.team.opponent(), unit.position) else {
        return;
    };
    let away = (unit.position - castle.position).normalize();
    let config = world.config();

    let retreat = RETREAT_DISTANCES
        .iter()
        .map(|&d| config.clamp(unit.position + away * d))
        .find(|&p| unit.can_see(p));
    if let Some(point) = retreat {
        let score = score_waypoint(point, unit, world);
        unit.set_waypoint(point, score);
        unit.say("Retreating from threat!");
    }

    if !unit.can_see(unit.current_waypoint.position) {
        unit.current_waypoint = fresh_waypoint(unit, world, rng);
        unit.say("Need to reposition!");
    }
}

/// Head for the centre of the orchard with an overriding waypoint score.
pub fn move_toward_resource_control<R: Rng + ?Sized>(unit: &mut Unit, world: &World, rng: &mut R) {
    let center = world.tree_center();
    let distance = unit.position.distance(center);
    if distance <= RESOURCE_CONTROL_RADIUS {
        return;
    }

    let heading = unit.position.angle_to(center);
    let config = world.config();
    let mut best = None;
    for _ in 0..RESOURCE_CONTROL_ATTEMPTS {
        let angle = heading + (rng.gen::<f32>() - 0.5) * FRAC_PI_4;
        let reach = (rng.gen::<f32>() * 40.0 + distance * 0.5).min(VISION_RADIUS * 0.9);
        let candidate = config.clamp(unit.position.offset(angle, reach));
        if !unit.can_see(candidate) {
            continue;
        }
        let score = score_waypoint(candidate, unit, world);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    if let Some((point, score)) = best {
        unit.set_waypoint(point, PRIORITY_WAYPOINT_SCORE + score);
        unit.maybe_say(rng, 0.3, "Moving toward resources!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Skills;
    use crate::config::WorldConfig;
    use crate::economy::Tree;
    use crate::math::Vec2;
    use crate::production::Castle;
    use crate::unit::UnitSpawn;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn leader_skills(leader: f32) -> Skills {
        Skills {
            leader,
            ..Skills::NONE
        }
    }

    fn spawn(world: &mut World, rng: &mut ChaCha8Rng, team: Team, pos: Vec2, skills: Skills) -> Unit {
        let id = world.spawn_unit(UnitSpawn::new(team, pos, 30.0, skills), rng);
        world.unit(id).unwrap().clone()
    }

    #[test]
    fn test_order_fires_on_timer() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(81);
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(300.0, 300.0), leader_skills(1.0));
        unit.order_timer = 2;
        let mut events = Vec::new();

        update_leadership(&mut unit, &world, &mut rng, &mut events);
        assert!(events.is_empty());
        update_leadership(&mut unit, &world, &mut rng, &mut events);

        assert_eq!(events.len(), 1);
        assert_eq!(unit.current_order, Some(events[0].order));
        assert_eq!(unit.order_timer, ORDER_INTERVAL);
        assert!((unit.skills.leader - 1.05).abs() < 1e-6);
    }

    #[test]
    fn test_losing_team_discourages_attack() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(82);
        world.stats[Team::Blue].units_lost = 10;
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(300.0, 300.0), leader_skills(1.0));
        unit.order_timer = 1;

        update_leadership(&mut unit, &world, &mut rng, &mut Vec::new());
        // Floored at zero, then pulled 10% toward one
        assert!((unit.order_weights.attack - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_strategic_leader_keeps_attack_floor() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(83);
        world.stats[Team::Blue].units_lost = 10;
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(300.0, 300.0), leader_skills(2.0));
        unit.order_timer = 1;

        update_leadership(&mut unit, &world, &mut rng, &mut Vec::new());
        assert!((unit.order_weights.attack - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_outmatched_attacker_retreats_from_enemy_castle() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(84);
        world
            .castles
            .insert(Castle::new(Team::Red, Vec2::new(900.0, 360.0), 0, None));
        spawn(&mut world, &mut rng, Team::Red, Vec2::new(900.0, 400.0), Skills::fighter());
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(600.0, 360.0), leader_skills(1.0));
        // Facing away from the enemy castle
        unit.angle = std::f32::consts::PI;
        unit.current_order = Some(Order::Attack);
        unit.order_timer = 100;

        update_leadership(&mut unit, &world, &mut rng, &mut Vec::new());

        let wp = unit.current_waypoint.position;
        assert!((wp.x - 540.0).abs() < 1e-3);
        assert!((wp.y - 360.0).abs() < 1e-3);
        assert_eq!(unit.message.as_ref().unwrap().text, "Retreating from threat!");
    }

    #[test]
    fn test_resource_control_targets_orchard() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(85);
        world.trees.push(Tree::new(Vec2::new(800.0, 360.0)));
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(400.0, 360.0), leader_skills(2.0));
        unit.angle = 0.0;

        move_toward_resource_control(&mut unit, &world, &mut rng);

        let wp = unit.current_waypoint;
        assert!(wp.score >= PRIORITY_WAYPOINT_SCORE - 50.0);
        assert!(wp.position.x > unit.position.x);
        assert!(unit.position.distance(wp.position) <= VISION_RADIUS * 0.9 + 1e-3);
    }

    #[test]
    fn test_resource_control_idle_near_centre() {
        let mut world = World::new(WorldConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(86);
        world.trees.push(Tree::new(Vec2::new(420.0, 360.0)));
        let mut unit = spawn(&mut world, &mut rng, Team::Blue, Vec2::new(400.0, 360.0), leader_skills(2.0));
        let before = unit.current_waypoint;

        move_toward_resource_control(&mut unit, &world, &mut rng);
        assert_eq!(unit.current_waypoint, before);
    }
}
