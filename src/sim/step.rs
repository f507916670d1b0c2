/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Terminal-outcome gate (a decided world is inert until reset)
///   2. Frame-start collision check
///   3. Player intent resolution (walk / ghost wall pass / push)
///   4. Motion advance for player, block and enemies (dt-driven ease-out)
///   5. On player-move completion: effect countdown, then enemy turns
///   6. Plate / gate recompute from occupancy
///   7. Power-up collection + activation (at most one per frame)
///   8. Win check
///
/// Enemy-player collision is checked at frame start, the moment any enemy
/// finishes a move, and again before enemy turns are taken; the first
/// check that fires wins and the outcome never changes until the next
/// world reset.

use log::{debug, warn};
use rand::Rng;

use crate::domain::ai;
use crate::domain::entity::PowerKind;
use crate::domain::grid::Dir;
use crate::domain::rules::{self, MoveRuling};
use crate::sim::event::GameEvent;
use crate::sim::gen;
use crate::sim::world::{Outcome, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, intent: Option<Dir>, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    if world.outcome != Outcome::Playing {
        return events;
    }

    world.frame += 1;
    world.collected_this_frame = false;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    if resolve_collision(world, &mut events) {
        return events;
    }
    resolve_intent(world, intent, &mut events);
    let player_arrived = advance_motion(world, dt, &mut events);
    if world.outcome != Outcome::Playing {
        return events; // an enemy landed on the player
    }
    if player_arrived {
        resolve_turns(world, &mut events);
        if world.outcome != Outcome::Playing {
            return events;
        }
    }
    resolve_plate_and_gate(world, &mut events);
    resolve_collection(world, &mut events);
    resolve_win(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Collision
// ══════════════════════════════════════════════════════════════

/// Enemy-player cell coincidence. Ghost mode and the freeze effect both
/// suspend the check. Returns true when the game just ended.
fn resolve_collision(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.player.ghost || world.effects.frozen() {
        return false;
    }
    let player = world.player.mover.cell;
    if world.enemies.iter().any(|e| e.mover.cell == player) {
        if world.set_outcome(Outcome::GameOver) {
            events.push(GameEvent::PlayerCaught { x: player.x, y: player.y });
        }
        return true;
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Player intent
// ══════════════════════════════════════════════════════════════

/// Apply the player's movement intent. Ignored while a move is already
/// in flight; otherwise rules it as blocked, walk, wall pass, or push.
fn resolve_intent(world: &mut WorldState, intent: Option<Dir>, events: &mut Vec<GameEvent>) {
    let dir = match intent {
        Some(d) => d,
        None => return,
    };
    if world.player.mover.moving {
        return;
    }

    let from = world.player.mover.cell;
    let ruling = rules::rule_player_move(
        &world.board(),
        from,
        dir,
        world.player.ghost,
        world.effects.wall_passes,
        world.effects.frozen(),
    );
    let dest = from.step(dir);

    match ruling {
        MoveRuling::Blocked => {}
        MoveRuling::Walk => world.player.mover.begin(dest),
        MoveRuling::WalkThroughWall => {
            world.effects.wall_passes -= 1;
            events.push(GameEvent::WallPhased { remaining: world.effects.wall_passes });
            if world.effects.wall_passes == 0 {
                // The last pass ends ghost mode mid-traversal.
                world.player.ghost = false;
                events.push(GameEvent::EffectEnded { kind: PowerKind::Ghost });
            }
            world.player.mover.begin(dest);
        }
        MoveRuling::PushBlock => {
            let beyond = dest.step(dir);
            world.block.mover.begin(beyond);
            world.player.mover.begin(dest);
            events.push(GameEvent::BlockPushed { x: beyond.x, y: beyond.y });
        }
        MoveRuling::PushEnemy(idx) => {
            let beyond = dest.step(dir);
            world.enemies[idx].mover.begin(beyond);
            world.player.mover.begin(dest);
            events.push(GameEvent::EnemyPushed { x: beyond.x, y: beyond.y });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Motion
// ══════════════════════════════════════════════════════════════

/// Advance every in-flight move. Returns true when the player's move
/// completed this frame. An enemy landing on the player is fatal the
/// moment its move completes.
fn advance_motion(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    let speed = world.cfg.motion.move_speed;
    let eps = world.cfg.motion.snap_epsilon;

    let player_arrived = world.player.mover.advance(speed, eps, dt);
    world.block.mover.advance(speed, eps, dt);

    let shielded = world.player.ghost || world.effects.frozen();
    let player = world.player.mover.cell;
    for i in 0..world.enemies.len() {
        let arrived = world.enemies[i].mover.advance(speed, eps, dt);
        if arrived && !shielded && world.enemies[i].mover.cell == player {
            if world.set_outcome(Outcome::GameOver) {
                events.push(GameEvent::PlayerCaught { x: player.x, y: player.y });
            }
        }
    }

    player_arrived
}

// ══════════════════════════════════════════════════════════════
// Turn resolution (runs once per completed player move)
// ══════════════════════════════════════════════════════════════

/// Tick down the step-counted effects, then give every idle enemy its
/// turn. Frozen enemies take no turns; the freeze counter itself burns
/// one step per completed player move.
fn resolve_turns(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.effects.exit_view_steps > 0 {
        world.effects.exit_view_steps -= 1;
        if world.effects.exit_view_steps == 0 {
            events.push(GameEvent::EffectEnded { kind: PowerKind::ExitView });
        }
    }
    if world.effects.enemy_view_steps > 0 {
        world.effects.enemy_view_steps -= 1;
        if world.effects.enemy_view_steps == 0 {
            events.push(GameEvent::EffectEnded { kind: PowerKind::EnemyView });
        }
    }

    if world.effects.frozen() {
        world.effects.freeze_steps -= 1;
        debug!("freeze: {} steps remaining", world.effects.freeze_steps);
        if world.effects.freeze_steps == 0 {
            events.push(GameEvent::EffectEnded { kind: PowerKind::Freeze });
        }
        return;
    }

    // The player may have walked onto an enemy this very move.
    if resolve_collision(world, events) {
        return;
    }

    let mut rng = rand::rng();
    enemy_turns(world, &mut rng);
}

fn enemy_turns(world: &mut WorldState, rng: &mut impl Rng) {
    let player = world.player.mover.cell;
    for i in 0..world.enemies.len() {
        if world.enemies[i].mover.moving {
            continue;
        }
        let (kind, target) = ai::take_turn(&world.board(), i, player, rng);
        world.enemies[i].kind = kind;
        if let Some(cell) = target {
            world.enemies[i].mover.begin(cell);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Plate / gate
// ══════════════════════════════════════════════════════════════

/// Plate and gate are pure functions of occupancy, recomputed every
/// frame with no hysteresis.
fn resolve_plate_and_gate(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let plate = world.plate.cell;
    let active = world.player.mover.cell == plate || world.block.mover.cell == plate;
    world.plate.active = active;
    if active != world.gate.open {
        world.gate.open = active;
        events.push(if active {
            GameEvent::GateOpened
        } else {
            GameEvent::GateClosed
        });
    }
}

// ══════════════════════════════════════════════════════════════
// Power-ups
// ══════════════════════════════════════════════════════════════

/// Collect at most one power-up per frame. The collected flag flips
/// before any side effect runs, so a power-up can activate at most once
/// and re-collection is impossible.
fn resolve_collection(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.collected_this_frame {
        return;
    }
    let player = world.player.mover.cell;
    let idx = match world.power_up_at(player) {
        Some(i) => i,
        None => return,
    };

    world.power_ups[idx].collected = true;
    world.collected_this_frame = true;
    let kind = world.power_ups[idx].kind;

    // A power-up discovered on a wall cell violates generation
    // invariants: tombstone it without activating.
    if world.walls.contains(&player) {
        warn!(
            "power-up on a wall cell at ({}, {}), removed without effect",
            player.x, player.y
        );
        return;
    }

    events.push(GameEvent::PowerUpCollected { kind, x: player.x, y: player.y });
    activate(world, kind, events);
}

/// Apply a power-up effect. Re-activation while the same effect is live
/// is rejected; a fresh activation arms the counters and may trigger a
/// scarcity respawn of the same kind.
fn activate(world: &mut WorldState, kind: PowerKind, events: &mut Vec<GameEvent>) {
    let already = match kind {
        PowerKind::Ghost => world.player.ghost,
        PowerKind::Freeze => world.effects.frozen(),
        PowerKind::ExitView => world.effects.exit_view(),
        PowerKind::EnemyView => world.effects.enemy_view(),
    };
    if already {
        debug!("{kind:?} already active, activation rejected");
        return;
    }

    match kind {
        PowerKind::Ghost => {
            world.player.ghost = true;
            world.effects.wall_passes = world.cfg.effects.wall_passes;
        }
        PowerKind::Freeze => world.effects.freeze_steps = world.cfg.effects.freeze_steps,
        PowerKind::ExitView => world.effects.exit_view_steps = world.cfg.effects.view_steps,
        PowerKind::EnemyView => world.effects.enemy_view_steps = world.cfg.effects.view_steps,
    }
    events.push(GameEvent::EffectStarted { kind });

    // Scarcity maintenance: keep the world stocked with this flavor.
    if world.stock_of(kind) < world.cfg.world.min_power_up_stock {
        let mut rng = rand::rng();
        if let Some(cell) = gen::spawn_replacement(world, kind, &mut rng) {
            events.push(GameEvent::PowerUpSpawned { kind, x: cell.x, y: cell.y });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Win check
// ══════════════════════════════════════════════════════════════

/// Won when the player's cell is the open gate's cell. First-wins.
fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.gate.open && world.player.mover.cell == world.gate.cell {
        if world.set_outcome(Outcome::Won) {
            events.push(GameEvent::ExitReached);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Scenario tests
// ══════════════════════════════════════════════════════════════
