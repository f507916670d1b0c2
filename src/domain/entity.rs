/// Entities: Player, Block, Enemy, PowerUp, PressurePlate, ExitGate.
///
/// Mobile entities share a `Mover`: the grid cell is authoritative, the
/// render position eases toward the target cell's center over time.
/// Kind-specific behavior dispatches on plain enums; there is no shared
/// object hierarchy.

use crate::domain::grid::{Cell, Vec2};

// ── Motion ──

/// Grid position plus in-flight movement state.
///
/// A move is begun by setting the target cell; each frame the render
/// position eases toward the target's world center, and when the remaining
/// distance drops under the snap epsilon the grid cell snaps to the target
/// and the moving flag clears. At most one move is pending at a time.
#[derive(Clone, Debug)]
pub struct Mover {
    pub cell: Cell,
    pub target: Cell,
    pub moving: bool,
    pub render: Vec2,
}

impl Mover {
    pub fn at(cell: Cell) -> Self {
        Mover {
            cell,
            target: cell,
            moving: false,
            render: cell.center(),
        }
    }

    /// Begin a one-cell move. The caller must have validated the target.
    pub fn begin(&mut self, target: Cell) {
        self.target = target;
        self.moving = true;
    }

    /// Advance the render position with ease-out interpolation.
    /// Returns true exactly once per move, on the frame it completes.
    pub fn advance(&mut self, speed: f32, epsilon: f32, dt: f32) -> bool {
        if !self.moving {
            return false;
        }
        let goal = self.target.center();
        let dx = goal.x - self.render.x;
        let dy = goal.y - self.render.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance < epsilon {
            self.cell = self.target;
            self.render = goal;
            self.moving = false;
            return true;
        }

        let ratio = (speed * dt / distance).min(1.0);
        let eased = ratio * (2.0 - ratio); // ease-out
        self.render.x += dx * eased;
        self.render.y += dy * eased;
        false
    }

    /// Place directly, cancelling any in-flight move.
    #[allow(dead_code)]
    pub fn snap_to(&mut self, cell: Cell) {
        self.cell = cell;
        self.target = cell;
        self.moving = false;
        self.render = cell.center();
    }
}

// ── Entities ──

#[derive(Clone, Debug)]
pub struct Player {
    pub mover: Mover,
    /// Ghost mode: may traverse interior walls while wall passes remain.
    pub ghost: bool,
}

impl Player {
    pub fn spawn() -> Self {
        Player {
            mover: Mover::at(Cell::ORIGIN),
            ghost: false,
        }
    }
}

/// The single pushable block.
#[derive(Clone, Debug)]
pub struct Block {
    pub mover: Mover,
}

impl Block {
    pub fn at(cell: Cell) -> Self {
        Block { mover: Mover::at(cell) }
    }
}

/// Enemy behavior variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    /// Walks one greedy step toward the player every turn.
    Chaser,
    /// Wanders a fixed box around its spawn cell; chases once the player
    /// enters its trigger box, until the player leaves the patrol box.
    Sentry { center: Cell, chasing: bool },
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub mover: Mover,
    pub kind: EnemyKind,
}

impl Enemy {
    pub fn chaser(cell: Cell) -> Self {
        Enemy {
            mover: Mover::at(cell),
            kind: EnemyKind::Chaser,
        }
    }

    pub fn sentry(cell: Cell) -> Self {
        Enemy {
            mover: Mover::at(cell),
            kind: EnemyKind::Sentry { center: cell, chasing: false },
        }
    }

    pub fn is_sentry(&self) -> bool {
        matches!(self.kind, EnemyKind::Sentry { .. })
    }
}

/// Power-up flavors. The step-counted effects run for a fixed number of
/// completed player moves; Ghost is consumed by wall traversals instead.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerKind {
    Ghost,
    Freeze,
    ExitView,
    EnemyView,
}

impl PowerKind {
    pub const ALL: [PowerKind; 4] = [
        PowerKind::Ghost,
        PowerKind::Freeze,
        PowerKind::ExitView,
        PowerKind::EnemyView,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PowerKind::Ghost => "Ghost shell",
            PowerKind::Freeze => "Freeze",
            PowerKind::ExitView => "Exit view",
            PowerKind::EnemyView => "Enemy view",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PowerUp {
    pub cell: Cell,
    pub kind: PowerKind,
    /// Monotonic: set before any activation side effect, never reverts.
    /// Collected power-ups stay in storage as tombstones.
    pub collected: bool,
}

impl PowerUp {
    pub fn new(cell: Cell, kind: PowerKind) -> Self {
        PowerUp { cell, kind, collected: false }
    }
}

/// Activated iff the player or the block occupies its cell, recomputed
/// from occupancy every frame.
#[derive(Clone, Debug)]
pub struct PressurePlate {
    pub cell: Cell,
    pub active: bool,
}

impl PressurePlate {
    pub fn at(cell: Cell) -> Self {
        PressurePlate { cell, active: false }
    }
}

/// Mirrors the pressure plate with no hysteresis. Closed it blocks like a
/// wall; open it is the win cell.
#[derive(Clone, Debug)]
pub struct ExitGate {
    pub cell: Cell,
    pub open: bool,
}

impl ExitGate {
    pub fn at(cell: Cell) -> Self {
        ExitGate { cell, open: false }
    }

    pub fn blocks(&self, cell: Cell) -> bool {
        !self.open && self.cell == cell
    }
}

/// Occupancy classes reported by spatial queries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Occupancy {
    Wall,
    Block,
    Enemy,
    Plate,
    Gate,
    Player,
    PowerUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEED: f32 = 5.0;
    const EPS: f32 = 0.005;

    #[test]
    fn mover_idle_does_not_advance() {
        let mut m = Mover::at(Cell::new(2, 2));
        assert!(!m.advance(SPEED, EPS, 0.1));
        assert_eq!(m.cell, Cell::new(2, 2));
        assert!(!m.moving);
    }

    #[test]
    fn mover_completes_and_snaps() {
        let mut m = Mover::at(Cell::new(0, 0));
        m.begin(Cell::new(1, 0));
        assert!(m.moving);
        assert_eq!(m.cell, Cell::new(0, 0)); // grid holds until completion

        let mut completed = false;
        for _ in 0..20 {
            if m.advance(SPEED, EPS, 0.05) {
                completed = true;
                break;
            }
        }
        assert!(completed);
        assert!(!m.moving);
        assert_eq!(m.cell, Cell::new(1, 0));
        let goal = Cell::new(1, 0).center();
        assert!((m.render.x - goal.x).abs() < 1e-6);
        assert!((m.render.y - goal.y).abs() < 1e-6);
    }

    #[test]
    fn mover_eases_monotonically_toward_target() {
        let mut m = Mover::at(Cell::new(0, 0));
        m.begin(Cell::new(0, 1));
        let goal = Cell::new(0, 1).center();
        let mut last = (goal.y - m.render.y).abs();
        for _ in 0..5 {
            m.advance(SPEED, EPS, 0.02);
            let now = (goal.y - m.render.y).abs();
            assert!(now <= last);
            last = now;
        }
    }

    #[test]
    fn snap_to_cancels_in_flight_move() {
        let mut m = Mover::at(Cell::new(0, 0));
        m.begin(Cell::new(1, 0));
        m.snap_to(Cell::new(5, 5));
        assert!(!m.moving);
        assert_eq!(m.cell, Cell::new(5, 5));
        assert_eq!(m.target, Cell::new(5, 5));
    }

    #[test]
    fn gate_blocks_only_while_closed() {
        let mut gate = ExitGate::at(Cell::new(7, 0));
        assert!(gate.blocks(Cell::new(7, 0)));
        assert!(!gate.blocks(Cell::new(6, 0)));
        gate.open = true;
        assert!(!gate.blocks(Cell::new(7, 0)));
    }
}
