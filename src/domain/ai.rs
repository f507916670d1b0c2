/// Enemy turn logic.
///
/// Two variants:
///   1. **Chaser**: steps along the axis with the larger distance to the
///      player and falls back to the other axis when blocked.
///   2. **Sentry**: wanders a patrol box around its spawn cell; the
///      player entering the trigger box starts a chase, leaving the
///      patrol box ends it. While chasing a sentry moves like a chaser
///      and may leave its patrol box.
///
/// Decisions run on current grid cells via `BoardView`; the step function
/// applies the chosen target and starts the move animation. Turns happen
/// only right after the player completes a move and never while the
/// freeze effect is active.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::entity::EnemyKind;
use crate::domain::grid::{Cell, Dir};
use crate::domain::rules::BoardView;

/// Trigger box half-extent: a player inside this Chebyshev ring wakes a
/// sentry.
pub const FOV_RADIUS: i32 = 2;
/// Patrol box half-extent around a sentry's spawn cell. Bounds both its
/// wandering and how far the player can retreat before it gives up.
pub const PATROL_RADIUS: i32 = 4;

/// One enemy turn: the possibly-updated kind (sentry chase flag) and the
/// target cell to start moving to, or None to skip the turn.
pub fn take_turn(
    view: &BoardView,
    idx: usize,
    player: Cell,
    rng: &mut impl Rng,
) -> (EnemyKind, Option<Cell>) {
    let enemy = &view.enemies[idx];
    let here = enemy.mover.cell;

    match enemy.kind {
        EnemyKind::Chaser => (EnemyKind::Chaser, chase_step(view, idx, here, player)),
        EnemyKind::Sentry { center, chasing } => {
            let in_fov = player.chebyshev(here) <= FOV_RADIUS;
            let in_patrol = player.chebyshev(center) <= PATROL_RADIUS;
            let chasing = if !chasing && in_fov {
                true
            } else if chasing && !in_patrol {
                false
            } else {
                chasing
            };
            let target = if chasing {
                chase_step(view, idx, here, player)
            } else {
                patrol_step(view, idx, here, center, rng)
            };
            (EnemyKind::Sentry { center, chasing }, target)
        }
    }
}

/// Greedy single step toward the player: larger-delta axis first, then
/// the other axis, otherwise skip. A zero-delta axis yields no candidate.
fn chase_step(view: &BoardView, idx: usize, here: Cell, player: Cell) -> Option<Cell> {
    if here == player {
        return None;
    }
    let dx = player.x - here.x;
    let dy = player.y - here.y;
    let horizontal = Cell::new(here.x + dx.signum(), here.y);
    let vertical = Cell::new(here.x, here.y + dy.signum());

    let (first, second) = if dx.abs() > dy.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    for candidate in [first, second] {
        if candidate != here && !view.blocks_enemy(candidate, idx) {
            return Some(candidate);
        }
    }
    None
}

/// Random patrol step: first shuffled direction that stays inside the
/// patrol box and is unblocked, else skip the turn.
fn patrol_step(
    view: &BoardView,
    idx: usize,
    here: Cell,
    center: Cell,
    rng: &mut impl Rng,
) -> Option<Cell> {
    let mut dirs = Dir::ALL;
    dirs.shuffle(rng);
    for dir in dirs {
        let candidate = here.step(dir);
        if candidate.chebyshev(center) > PATROL_RADIUS {
            continue;
        }
        if view.blocks_enemy(candidate, idx) {
            continue;
        }
        return Some(candidate);
    }
    None
}
