/// Movement and push legality, truth-table driven.
///
/// Pure queries over a `BoardView`: no side effects. The step function
/// applies the ruling and mutates the world.
///
/// ## Blocking Truth Table (player destination)
///
/// ┌──────────────────────────┬──────────────────────────────────┐
/// │ Destination contains      │ Ruling                           │
/// ├──────────────────────────┼──────────────────────────────────┤
/// │ out of bounds             │ DENY (always)                    │
/// │ boundary wall             │ DENY (always, even ghost)        │
/// │ interior wall             │ DENY unless ghost pass remains   │
/// │ closed exit gate          │ DENY (always, even ghost)        │
/// │ block                     │ push if beyond clear, else DENY  │
/// │ enemy, freeze active      │ push if beyond clear, else DENY  │
/// │ enemy, no freeze          │ ALLOW (walking into a kill)      │
/// │ plate / power-up / open gate │ ALLOW                         │
/// └──────────────────────────┴──────────────────────────────────┘
///
/// ### Push clearance (the cell beyond the pushed entity)
/// Free of walls, the block, every enemy, and the closed exit gate.
/// A mid-move block or enemy refuses the push outright.

use std::collections::HashSet;

use crate::domain::entity::{Block, Enemy, ExitGate};
use crate::domain::grid::{Cell, Dir};

/// Immutable occupancy view for rule queries.
///
/// Reads current grid cells only; in-flight render positions are
/// invisible here. Every movement and collision check in the game goes
/// through this view.
pub struct BoardView<'a> {
    pub walls: &'a HashSet<Cell>,
    pub half_width: i32,
    pub block: &'a Block,
    pub enemies: &'a [Enemy],
    pub gate: &'a ExitGate,
}

impl<'a> BoardView<'a> {
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x.abs() <= self.half_width && cell.y.abs() <= self.half_width
    }

    /// Boundary ring cells: walls that ghost mode can never traverse.
    pub fn is_boundary(&self, cell: Cell) -> bool {
        cell.x.abs() == self.half_width || cell.y.abs() == self.half_width
    }

    pub fn wall_at(&self, cell: Cell) -> bool {
        self.walls.contains(&cell)
    }

    pub fn block_at(&self, cell: Cell) -> bool {
        self.block.mover.cell == cell
    }

    /// Index of an enemy occupying `cell`, skipping `except`.
    pub fn enemy_at(&self, cell: Cell, except: Option<usize>) -> Option<usize> {
        self.enemies
            .iter()
            .enumerate()
            .find(|(i, e)| Some(*i) != except && e.mover.cell == cell)
            .map(|(i, _)| i)
    }

    /// Can an enemy not enter this cell? Walls, the block, other enemies
    /// and the closed gate block; the player's cell does not.
    pub fn blocks_enemy(&self, cell: Cell, except: usize) -> bool {
        !self.in_bounds(cell)
            || self.wall_at(cell)
            || self.block_at(cell)
            || self.enemy_at(cell, Some(except)).is_some()
            || self.gate.blocks(cell)
    }

    /// Is the beyond-cell clear for a push? `pushed_enemy` exempts the
    /// entity being pushed from its own occupancy check.
    pub fn push_clear(&self, cell: Cell, pushed_enemy: Option<usize>) -> bool {
        self.in_bounds(cell)
            && !self.wall_at(cell)
            && !self.block_at(cell)
            && self.enemy_at(cell, pushed_enemy).is_none()
            && !self.gate.blocks(cell)
    }
}

// ── Player movement ruling ──

/// How a player intent resolves, before any mutation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveRuling {
    Blocked,
    Walk,
    /// Free move through an interior wall; one ghost pass is burned.
    WalkThroughWall,
    PushBlock,
    PushEnemy(usize),
}

/// Resolve a player intent one cell in `dir`.
///
/// `ghost`/`passes` gate wall traversal, `frozen` gates enemy pushes.
/// The caller is responsible for rule 1 (no new intent while the player
/// is already mid-move).
pub fn rule_player_move(
    view: &BoardView,
    from: Cell,
    dir: Dir,
    ghost: bool,
    passes: u32,
    frozen: bool,
) -> MoveRuling {
    let dest = from.step(dir);
    if !view.in_bounds(dest) {
        return MoveRuling::Blocked;
    }

    let mut through_wall = false;
    if view.wall_at(dest) {
        if view.is_boundary(dest) {
            return MoveRuling::Blocked;
        }
        if !ghost || passes == 0 {
            return MoveRuling::Blocked;
        }
        through_wall = true;
    }

    if view.gate.blocks(dest) {
        return MoveRuling::Blocked;
    }

    if view.block_at(dest) {
        // A mid-move block refuses a second push.
        if view.block.mover.moving {
            return MoveRuling::Blocked;
        }
        let beyond = dest.step(dir);
        if view.push_clear(beyond, None) {
            return MoveRuling::PushBlock;
        }
        return MoveRuling::Blocked;
    }

    if frozen {
        if let Some(idx) = view.enemy_at(dest, None) {
            if view.enemies[idx].mover.moving {
                return MoveRuling::Blocked;
            }
            let beyond = dest.step(dir);
            if view.push_clear(beyond, Some(idx)) {
                return MoveRuling::PushEnemy(idx);
            }
            return MoveRuling::Blocked;
        }
    }

    if through_wall {
        MoveRuling::WalkThroughWall
    } else {
        MoveRuling::Walk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HW: i32 = 10;

    struct Fixture {
        walls: HashSet<Cell>,
        block: Block,
        enemies: Vec<Enemy>,
        gate: ExitGate,
    }

    impl Fixture {
        /// Empty board, block and gate parked out of the way.
        fn new() -> Self {
            Fixture {
                walls: HashSet::new(),
                block: Block::at(Cell::new(-9, -9)),
                enemies: vec![],
                gate: ExitGate::at(Cell::new(9, 9)),
            }
        }

        fn view(&self) -> BoardView<'_> {
            BoardView {
                walls: &self.walls,
                half_width: HW,
                block: &self.block,
                enemies: &self.enemies,
                gate: &self.gate,
            }
        }
    }

    fn rule(f: &Fixture, from: Cell, dir: Dir) -> MoveRuling {
        rule_player_move(&f.view(), from, dir, false, 0, false)
    }

    // ── Walk / block ──

    #[test]
    fn open_cell_allows_walk() {
        let f = Fixture::new();
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Walk);
    }

    #[test]
    fn wall_blocks_without_ghost() {
        let mut f = Fixture::new();
        f.walls.insert(Cell::new(1, 0));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn ghost_pass_traverses_interior_wall() {
        let mut f = Fixture::new();
        f.walls.insert(Cell::new(1, 0));
        let ruling = rule_player_move(&f.view(), Cell::ORIGIN, Dir::Right, true, 2, false);
        assert_eq!(ruling, MoveRuling::WalkThroughWall);
    }

    #[test]
    fn ghost_without_passes_is_blocked() {
        let mut f = Fixture::new();
        f.walls.insert(Cell::new(1, 0));
        let ruling = rule_player_move(&f.view(), Cell::ORIGIN, Dir::Right, true, 0, false);
        assert_eq!(ruling, MoveRuling::Blocked);
    }

    #[test]
    fn boundary_wall_blocks_even_with_passes() {
        let mut f = Fixture::new();
        f.walls.insert(Cell::new(HW, 0));
        let from = Cell::new(HW - 1, 0);
        let ruling = rule_player_move(&f.view(), from, Dir::Right, true, 3, false);
        assert_eq!(ruling, MoveRuling::Blocked);
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let f = Fixture::new();
        // No wall stored at the edge; the bounds check alone must deny.
        assert_eq!(rule(&f, Cell::new(HW, 0), Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn closed_gate_blocks_even_in_ghost_mode() {
        let mut f = Fixture::new();
        f.gate = ExitGate::at(Cell::new(1, 0));
        let ruling = rule_player_move(&f.view(), Cell::ORIGIN, Dir::Right, true, 3, false);
        assert_eq!(ruling, MoveRuling::Blocked);
    }

    #[test]
    fn open_gate_allows_walk() {
        let mut f = Fixture::new();
        f.gate = ExitGate::at(Cell::new(1, 0));
        f.gate.open = true;
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Walk);
    }

    // ── Pushing ──

    #[test]
    fn push_with_clear_beyond_succeeds() {
        let mut f = Fixture::new();
        f.block = Block::at(Cell::new(1, 0));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::PushBlock);
    }

    #[test]
    fn push_into_wall_fails() {
        let mut f = Fixture::new();
        f.block = Block::at(Cell::new(1, 0));
        f.walls.insert(Cell::new(2, 0));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn push_into_enemy_fails() {
        let mut f = Fixture::new();
        f.block = Block::at(Cell::new(1, 0));
        f.enemies.push(Enemy::chaser(Cell::new(2, 0)));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn push_into_closed_gate_fails() {
        let mut f = Fixture::new();
        f.block = Block::at(Cell::new(1, 0));
        f.gate = ExitGate::at(Cell::new(2, 0));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn mid_move_block_refuses_push() {
        let mut f = Fixture::new();
        f.block = Block::at(Cell::new(1, 0));
        f.block.mover.begin(Cell::new(1, 1));
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Blocked);
    }

    #[test]
    fn enemy_pushable_only_while_frozen() {
        let mut f = Fixture::new();
        f.enemies.push(Enemy::chaser(Cell::new(1, 0)));

        let frozen = rule_player_move(&f.view(), Cell::ORIGIN, Dir::Right, false, 0, true);
        assert_eq!(frozen, MoveRuling::PushEnemy(0));

        // Not frozen: the cell is enterable (fatal, but legal).
        assert_eq!(rule(&f, Cell::ORIGIN, Dir::Right), MoveRuling::Walk);
    }

    #[test]
    fn frozen_enemy_push_into_other_enemy_fails() {
        let mut f = Fixture::new();
        f.enemies.push(Enemy::chaser(Cell::new(1, 0)));
        f.enemies.push(Enemy::chaser(Cell::new(2, 0)));
        let ruling = rule_player_move(&f.view(), Cell::ORIGIN, Dir::Right, false, 0, true);
        assert_eq!(ruling, MoveRuling::Blocked);
    }

    // ── Enemy blocking ──

    #[test]
    fn enemy_blocked_by_wall_block_gate_and_enemy() {
        let mut f = Fixture::new();
        f.walls.insert(Cell::new(3, 0));
        f.block = Block::at(Cell::new(4, 0));
        f.gate = ExitGate::at(Cell::new(5, 0));
        f.enemies.push(Enemy::chaser(Cell::new(6, 0)));
        let v = f.view();
        assert!(v.blocks_enemy(Cell::new(3, 0), 9));
        assert!(v.blocks_enemy(Cell::new(4, 0), 9));
        assert!(v.blocks_enemy(Cell::new(5, 0), 9));
        assert!(v.blocks_enemy(Cell::new(6, 0), 9));
        assert!(!v.blocks_enemy(Cell::new(7, 0), 9));
        // An enemy never blocks itself.
        assert!(!v.blocks_enemy(Cell::new(6, 0), 0));
    }

    #[test]
    fn open_gate_does_not_block_enemy() {
        let mut f = Fixture::new();
        f.gate = ExitGate::at(Cell::new(5, 0));
        f.gate.open = true;
        assert!(!f.view().blocks_enemy(Cell::new(5, 0), 0));
    }
}
