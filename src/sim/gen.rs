/// World generation: random walls, the exit/plate/block triple, power-ups
/// and enemies, all placed under spacing and validity constraints.
///
/// Placement is best-effort: every optional entity retries up to a bounded
/// attempt count and is skipped (logged) on exhaustion; a slightly short
/// roster is acceptable, a failed generation is not. The mandatory triple
/// is unconditional: walls conflicting with the exit, the plate, or the
/// block's final cell are removed instead.

use std::collections::HashSet;

use log::{debug, warn};
use rand::Rng;

use crate::config::GameConfig;
use crate::domain::entity::{
    Block, Enemy, ExitGate, Player, PowerKind, PowerUp, PressurePlate,
};
use crate::domain::grid::Cell;
use crate::sim::world::{Camera, Effects, Outcome, WorldState};

const BLOCK_ATTEMPTS: u32 = 100;
const POWER_UP_ATTEMPTS: u32 = 500;
const SENTRY_ATTEMPTS: u32 = 200;
const CHASER_ATTEMPTS: u32 = 50;

/// Sentries spawn within this box around their anchor (exit or block).
const SENTRY_SPAWN_BOX: i32 = 4;
/// Chasers draw their cells from this box around the origin.
const CHASER_SPAWN_RANGE: i32 = 20;
/// Chasers keep at least this Euclidean distance from the exit.
const CHASER_EXIT_CLEARANCE: f64 = 5.0;

impl WorldState {
    /// Build a fresh world from `cfg` using thread-local randomness.
    /// Also serves as the reset path: the previous world is dropped
    /// wholesale, no entity survives.
    pub fn generate(cfg: &GameConfig) -> Self {
        Self::generate_with(cfg, &mut rand::rng())
    }

    /// Generation with a caller-supplied source, so tests can seed it.
    pub fn generate_with(cfg: &GameConfig, rng: &mut impl Rng) -> Self {
        let hw = cfg.world.half_width;

        // Interior walls, skipping the spawn safe zone.
        let mut walls: HashSet<Cell> = HashSet::new();
        for x in -hw..=hw {
            for y in -hw..=hw {
                let cell = Cell::new(x, y);
                if cell.dist_from_origin() < cfg.world.safe_radius {
                    continue;
                }
                if rng.random::<f64>() < cfg.world.wall_density {
                    walls.insert(cell);
                }
            }
        }

        // Unbroken boundary ring.
        for x in -hw..=hw {
            walls.insert(Cell::new(x, -hw));
            walls.insert(Cell::new(x, hw));
        }
        for y in -hw..=hw {
            walls.insert(Cell::new(-hw, y));
            walls.insert(Cell::new(hw, y));
        }

        // Exit on a random boundary edge; plate `plate_inset` cells inward
        // and offset one cell sideways, so walking straight in from the
        // exit never crosses it. Near a corner the offset flips inward
        // instead of clamping, which would collapse it onto the exit line.
        let inset = cfg.world.plate_inset;
        let lateral = if rng.random::<bool>() { 1 } else { -1 };
        let offset = rng.random_range(-hw..=hw);
        let mut side = offset + lateral;
        if side.abs() >= hw {
            side = offset - lateral;
        }
        let (exit, plate) = match rng.random_range(0..4) {
            0 => (Cell::new(offset, hw), Cell::new(side, hw - inset)),
            1 => (Cell::new(offset, -hw), Cell::new(side, -hw + inset)),
            2 => (Cell::new(-hw, offset), Cell::new(-hw + inset, side)),
            _ => (Cell::new(hw, offset), Cell::new(hw - inset, side)),
        };
        walls.remove(&exit);
        walls.remove(&plate);

        // The block is mandatory: far from spawn and clear of the
        // exit/plate/walls. If the draws run out, the last cell stands
        // and any wall there is removed, keeping the block off walls.
        let mut block_cell = random_interior(rng, hw);
        let mut block_placed = false;
        for _ in 0..BLOCK_ATTEMPTS {
            block_cell = random_interior(rng, hw);
            if block_cell.dist_from_origin() >= cfg.world.spawn_clearance
                && block_cell != exit
                && block_cell != plate
                && !walls.contains(&block_cell)
            {
                block_placed = true;
                break;
            }
        }
        if !block_placed {
            warn!(
                "block placement retries exhausted, clearing ({}, {})",
                block_cell.x, block_cell.y
            );
            walls.remove(&block_cell);
        }

        // Power-ups, a fixed batch per kind.
        let mut power_ups: Vec<PowerUp> = Vec::new();
        for kind in PowerKind::ALL {
            for _ in 0..cfg.world.power_ups_per_kind {
                let mut placed = false;
                for _ in 0..POWER_UP_ATTEMPTS {
                    let cell = random_interior(rng, hw);
                    if cell.dist_from_origin() < cfg.world.spawn_clearance
                        || cell == exit
                        || cell == plate
                        || cell == block_cell
                        || walls.contains(&cell)
                        || power_ups.iter().any(|p| p.cell == cell)
                    {
                        continue;
                    }
                    power_ups.push(PowerUp::new(cell, kind));
                    placed = true;
                    break;
                }
                if !placed {
                    warn!("power-up placement exhausted for {kind:?}, skipping");
                }
            }
        }

        // One sentry near the exit, one near the block.
        let mut enemies: Vec<Enemy> = Vec::new();
        for anchor in [exit, block_cell] {
            let mut placed = false;
            for _ in 0..SENTRY_ATTEMPTS {
                let cell = Cell::new(
                    anchor.x + rng.random_range(-SENTRY_SPAWN_BOX..=SENTRY_SPAWN_BOX),
                    anchor.y + rng.random_range(-SENTRY_SPAWN_BOX..=SENTRY_SPAWN_BOX),
                );
                if cell == anchor
                    || cell == exit
                    || cell == plate
                    || cell == block_cell
                    || cell.x.abs() > hw
                    || cell.y.abs() > hw
                    || walls.contains(&cell)
                    || enemies.iter().any(|e| e.mover.cell == cell)
                {
                    continue;
                }
                enemies.push(Enemy::sentry(cell));
                placed = true;
                break;
            }
            if !placed {
                warn!(
                    "sentry placement exhausted near ({}, {}), skipping",
                    anchor.x, anchor.y
                );
            }
        }

        // A handful of chasers, away from both the spawn and the exit.
        let chasers = rng.random_range(cfg.world.chasers_min..=cfg.world.chasers_max);
        for _ in 0..chasers {
            let mut placed = false;
            for _ in 0..CHASER_ATTEMPTS {
                let cell = Cell::new(
                    rng.random_range(-CHASER_SPAWN_RANGE..=CHASER_SPAWN_RANGE),
                    rng.random_range(-CHASER_SPAWN_RANGE..=CHASER_SPAWN_RANGE),
                );
                if cell.dist_from_origin() < cfg.world.spawn_clearance
                    || cell.dist(exit) < CHASER_EXIT_CLEARANCE
                    || walls.contains(&cell)
                    || enemies.iter().any(|e| e.mover.cell == cell)
                {
                    continue;
                }
                enemies.push(Enemy::chaser(cell));
                placed = true;
                break;
            }
            if !placed {
                debug!("chaser placement exhausted, fewer chasers this round");
            }
        }

        debug!(
            "generated world: {} walls, {} power-ups, {} enemies, exit ({}, {}), plate ({}, {})",
            walls.len(),
            power_ups.len(),
            enemies.len(),
            exit.x,
            exit.y,
            plate.x,
            plate.y
        );

        WorldState {
            walls,
            half_width: hw,
            player: Player::spawn(),
            block: Block::at(block_cell),
            enemies,
            power_ups,
            plate: PressurePlate::at(plate),
            gate: ExitGate::at(exit),
            effects: Effects::default(),
            outcome: Outcome::Playing,
            collected_this_frame: false,
            cfg: cfg.clone(),
            frame: 0,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
        }
    }
}

/// Spawn one replacement power-up of `kind` at a valid random cell:
/// generation validity plus not-on-enemy. Returns the spawned cell, or
/// None when attempts are exhausted.
pub fn spawn_replacement(
    world: &mut WorldState,
    kind: PowerKind,
    rng: &mut impl Rng,
) -> Option<Cell> {
    for _ in 0..POWER_UP_ATTEMPTS {
        let cell = random_interior(rng, world.half_width);
        if !replacement_valid(world, cell) {
            continue;
        }
        world.power_ups.push(PowerUp::new(cell, kind));
        debug!("respawned {kind:?} power-up at ({}, {})", cell.x, cell.y);
        return Some(cell);
    }
    warn!("failed to respawn {kind:?} power-up, attempts exhausted");
    None
}

fn replacement_valid(world: &WorldState, cell: Cell) -> bool {
    cell.dist_from_origin() >= world.cfg.world.spawn_clearance
        && cell != world.gate.cell
        && cell != world.plate.cell
        && cell != world.block.mover.cell
        && !world.walls.contains(&cell)
        && world.power_ups.iter().all(|p| p.collected || p.cell != cell)
        && world.enemies.iter().all(|e| e.mover.cell != cell)
}

fn random_interior(rng: &mut impl Rng, hw: i32) -> Cell {
    Cell::new(
        rng.random_range(-(hw - 1)..hw),
        rng.random_range(-(hw - 1)..hw),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generate(seed: u64) -> WorldState {
        let cfg = GameConfig::default();
        WorldState::generate_with(&cfg, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn boundary_ring_is_fully_closed() {
        let world = generate(1);
        let hw = world.half_width;
        for x in -hw..=hw {
            assert!(world.walls.contains(&Cell::new(x, -hw)));
            assert!(world.walls.contains(&Cell::new(x, hw)));
        }
        for y in -hw..=hw {
            assert!(world.walls.contains(&Cell::new(-hw, y)));
            assert!(world.walls.contains(&Cell::new(hw, y)));
        }
    }

    #[test]
    fn spawn_safe_zone_contains_no_walls() {
        for seed in 0..5 {
            let world = generate(seed);
            let r = world.cfg.world.safe_radius.ceil() as i32;
            for x in -r..=r {
                for y in -r..=r {
                    let cell = Cell::new(x, y);
                    if cell.dist_from_origin() < world.cfg.world.safe_radius {
                        assert!(
                            !world.walls.contains(&cell),
                            "wall at ({x}, {y}) inside the safe zone"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn mandatory_triple_is_placed_and_clear_of_walls() {
        for seed in 0..5 {
            let world = generate(seed);
            assert!(!world.walls.contains(&world.gate.cell));
            assert!(!world.walls.contains(&world.plate.cell));
            assert!(!world.walls.contains(&world.block.mover.cell));
            assert_ne!(world.gate.cell, world.plate.cell);
            assert_ne!(world.block.mover.cell, world.gate.cell);
            assert_ne!(world.block.mover.cell, world.plate.cell);
        }
    }

    #[test]
    fn exit_sits_on_the_boundary_plate_inside_it() {
        for seed in 0..5 {
            let world = generate(seed);
            let hw = world.half_width;
            let exit = world.gate.cell;
            assert!(exit.x.abs() == hw || exit.y.abs() == hw);
            let plate = world.plate.cell;
            assert!(plate.x.abs() < hw && plate.y.abs() < hw);
            // Laterally offset: never on the straight line from the exit.
            assert!(plate.x != exit.x && plate.y != exit.y);
        }
    }

    #[test]
    fn power_ups_respect_validity_constraints() {
        let world = generate(2);
        let per_kind = world.cfg.world.power_ups_per_kind;
        assert!(world.power_ups.len() <= per_kind * PowerKind::ALL.len());
        let mut seen = HashSet::new();
        for p in &world.power_ups {
            assert!(!world.walls.contains(&p.cell), "power-up on a wall");
            assert!(p.cell.dist_from_origin() >= world.cfg.world.spawn_clearance);
            assert_ne!(p.cell, world.gate.cell);
            assert_ne!(p.cell, world.plate.cell);
            assert_ne!(p.cell, world.block.mover.cell);
            assert!(seen.insert(p.cell), "two power-ups share a cell");
            assert!(!p.collected);
        }
    }

    #[test]
    fn enemies_spawn_clear_of_walls_and_each_other() {
        let world = generate(3);
        let mut seen = HashSet::new();
        for e in &world.enemies {
            assert!(!world.walls.contains(&e.mover.cell));
            assert!(seen.insert(e.mover.cell), "two enemies share a cell");
        }
        let sentries = world.enemies.iter().filter(|e| e.is_sentry()).count();
        assert!(sentries <= 2);
        let chasers = world.enemies.len() - sentries;
        assert!(chasers <= world.cfg.world.chasers_max);
    }

    #[test]
    fn fresh_world_starts_closed_and_playing() {
        let world = generate(4);
        assert_eq!(world.outcome, Outcome::Playing);
        assert!(!world.gate.open);
        assert!(!world.plate.active);
        assert_eq!(world.player.mover.cell, Cell::ORIGIN);
        assert!(!world.player.ghost);
        assert_eq!(world.effects.wall_passes, 0);
    }

    #[test]
    fn replacement_spawns_on_valid_cells_only() {
        let mut world = generate(5);
        let mut rng = StdRng::seed_from_u64(99);
        let before = world.stock_of(PowerKind::Freeze);
        let cell = spawn_replacement(&mut world, PowerKind::Freeze, &mut rng)
            .expect("an almost-empty board must accept a replacement");
        assert_eq!(world.stock_of(PowerKind::Freeze), before + 1);
        assert!(!world.walls.contains(&cell));
        assert!(cell.dist_from_origin() >= world.cfg.world.spawn_clearance);
    }
}
