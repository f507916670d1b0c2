/// WorldState: the complete snapshot of a running game.
///
/// One value owns every entity, effect timer and the outcome flag; the
/// generator builds it, the step function mutates it, the renderer reads
/// it. All operations receive it explicitly; there is no ambient global
/// state, which keeps the simulation testable without a terminal.
///
/// ## Spatial queries
///
/// Grid cells are the only positions queries ever see. `board()` builds
/// the `BoardView` used by movement, push and AI rules; `occupants_at`
/// reports every occupancy class on a cell for the renderer and tests.
/// In-flight render positions are never consulted.

use std::collections::HashSet;

use crate::config::GameConfig;
use crate::domain::entity::{
    Block, Enemy, ExitGate, Occupancy, Player, PowerKind, PowerUp, PressurePlate,
};
use crate::domain::grid::{Cell, Vec2};
use crate::domain::rules::BoardView;

/// Final game outcome. Transitions are first-writer-wins; once terminal
/// the world ignores further play until regenerated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Playing,
    GameOver,
    Won,
}

/// World-level timed effects. A nonzero counter means the effect is
/// active. The three step-counted timers tick down once per completed
/// player move; ghost wall passes are consumed by wall traversals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Effects {
    pub wall_passes: u32,
    pub freeze_steps: u32,
    pub exit_view_steps: u32,
    pub enemy_view_steps: u32,
}

impl Effects {
    pub fn frozen(&self) -> bool {
        self.freeze_steps > 0
    }

    pub fn exit_view(&self) -> bool {
        self.exit_view_steps > 0
    }

    pub fn enemy_view(&self) -> bool {
        self.enemy_view_steps > 0
    }
}

pub struct WorldState {
    // ── Board ──
    pub walls: HashSet<Cell>,
    pub half_width: i32,

    // ── Entities ──
    pub player: Player,
    pub block: Block,
    pub enemies: Vec<Enemy>,
    pub power_ups: Vec<PowerUp>,
    pub plate: PressurePlate,
    pub gate: ExitGate,

    // ── Effects / outcome ──
    pub effects: Effects,
    pub outcome: Outcome,

    // ── Per-frame bookkeeping ──
    /// Single-collection-per-frame guard, reset at the top of each step.
    pub collected_this_frame: bool,

    // ── Config snapshot ──
    pub cfg: GameConfig,

    // ── Meta / UI ──
    pub frame: u64,
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,
}

// ── Spatial queries ──

impl WorldState {
    /// Occupancy view over current grid positions.
    pub fn board(&self) -> BoardView<'_> {
        BoardView {
            walls: &self.walls,
            half_width: self.half_width,
            block: &self.block,
            enemies: &self.enemies,
            gate: &self.gate,
        }
    }

    /// Every occupancy class present at `cell`. Collected power-ups are
    /// tombstones and do not report.
    pub fn occupants_at(&self, cell: Cell) -> Vec<Occupancy> {
        let mut out = Vec::new();
        if self.walls.contains(&cell) {
            out.push(Occupancy::Wall);
        }
        if self.block.mover.cell == cell {
            out.push(Occupancy::Block);
        }
        if self.enemies.iter().any(|e| e.mover.cell == cell) {
            out.push(Occupancy::Enemy);
        }
        if self.plate.cell == cell {
            out.push(Occupancy::Plate);
        }
        if self.gate.cell == cell {
            out.push(Occupancy::Gate);
        }
        if self.player.mover.cell == cell {
            out.push(Occupancy::Player);
        }
        if self.power_ups.iter().any(|p| !p.collected && p.cell == cell) {
            out.push(Occupancy::PowerUp);
        }
        out
    }

    /// Uncollected power-up occupying `cell`.
    pub fn power_up_at(&self, cell: Cell) -> Option<usize> {
        self.power_ups
            .iter()
            .position(|p| !p.collected && p.cell == cell)
    }

    /// Uncollected power-ups of `kind` remaining in the world.
    pub fn stock_of(&self, kind: PowerKind) -> usize {
        self.power_ups
            .iter()
            .filter(|p| p.kind == kind && !p.collected)
            .count()
    }
}

// ── Outcome / messages ──

impl WorldState {
    /// First-writer-wins outcome transition. Returns true only for the
    /// call that actually performed it.
    pub fn set_outcome(&mut self, outcome: Outcome) -> bool {
        if self.outcome != Outcome::Playing {
            return false;
        }
        self.outcome = outcome;
        true
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

// ── Test scaffolding ──

#[cfg(test)]
impl WorldState {
    /// An empty board for scenario tests: no walls, no enemies, no
    /// power-ups, player at the origin, block and the plate/gate pair
    /// parked far from the action. Tests snap entities where they need
    /// them.
    pub fn bare(cfg: &GameConfig) -> Self {
        WorldState {
            walls: HashSet::new(),
            half_width: cfg.world.half_width,
            player: Player::spawn(),
            block: Block::at(Cell::new(30, 30)),
            enemies: vec![],
            power_ups: vec![],
            plate: PressurePlate::at(Cell::new(40, 1)),
            gate: ExitGate::at(Cell::new(40, 4)),
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

// ── Camera / Viewport ──

/// Camera: a viewport into the world, kept centered on the player.
///
/// `(x, y)` is the world cell at the bottom-left of the view; the
/// renderer sets `view_w`/`view_h` from the terminal size each frame and
/// flips rows when drawing (world y grows upward).
#[derive(Clone, Debug)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    pub fn new() -> Self {
        Camera { x: 0, y: 0, view_w: 0, view_h: 0 }
    }

    /// Center the view on a world position.
    pub fn center_on(&mut self, pos: Vec2) {
        self.x = pos.x.floor() as i32 - self.view_w as i32 / 2;
        self.y = pos.y.floor() as i32 - self.view_h as i32 / 2;
    }

    /// World cell to view coordinates (y up). None when outside the view.
    pub fn world_to_view(&self, cell: Cell) -> Option<(usize, usize)> {
        let vx = cell.x - self.x;
        let vy = cell.y - self.y;
        if vx >= 0 && (vx as usize) < self.view_w && vy >= 0 && (vy as usize) < self.view_h {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }

    pub fn in_view(&self, cell: Cell) -> bool {
        self.world_to_view(cell).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_transition_is_first_writer_wins() {
        let cfg = GameConfig::default();
        let mut world = WorldState::bare(&cfg);
        assert!(world.set_outcome(Outcome::Won));
        assert!(!world.set_outcome(Outcome::GameOver));
        assert_eq!(world.outcome, Outcome::Won);
    }

    #[test]
    fn occupants_reports_all_classes_on_a_cell() {
        let cfg = GameConfig::default();
        let mut world = WorldState::bare(&cfg);
        let cell = Cell::new(5, 5);
        world.walls.insert(cell);
        world.power_ups.push(PowerUp::new(cell, PowerKind::Freeze));
        world.enemies.push(Enemy::chaser(cell));

        let classes = world.occupants_at(cell);
        assert!(classes.contains(&Occupancy::Wall));
        assert!(classes.contains(&Occupancy::Enemy));
        assert!(classes.contains(&Occupancy::PowerUp));
        assert!(!classes.contains(&Occupancy::Player));
    }

    #[test]
    fn collected_power_ups_are_invisible_to_queries() {
        let cfg = GameConfig::default();
        let mut world = WorldState::bare(&cfg);
        let cell = Cell::new(9, 0);
        world.power_ups.push(PowerUp::new(cell, PowerKind::Ghost));
        assert_eq!(world.power_up_at(cell), Some(0));
        assert_eq!(world.stock_of(PowerKind::Ghost), 1);

        world.power_ups[0].collected = true;
        assert_eq!(world.power_up_at(cell), None);
        assert_eq!(world.stock_of(PowerKind::Ghost), 0);
        assert!(world.occupants_at(cell).is_empty());
    }

    #[test]
    fn camera_maps_world_cells_into_the_view() {
        let mut cam = Camera::new();
        cam.view_w = 7;
        cam.view_h = 7;
        cam.center_on(Cell::new(10, 10).center());
        assert_eq!(cam.world_to_view(Cell::new(10, 10)), Some((3, 3)));
        assert!(cam.in_view(Cell::new(7, 7)));
        assert!(!cam.in_view(Cell::new(14, 10)));
    }
}
