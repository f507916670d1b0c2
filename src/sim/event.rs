/// Events emitted during a simulation step.
/// The shell consumes these for status messages; the sim never talks to
/// the presentation layer directly.

use crate::domain::entity::PowerKind;

#[derive(Clone, Debug)]
pub enum GameEvent {
    PowerUpCollected { kind: PowerKind, x: i32, y: i32 },
    PowerUpSpawned { kind: PowerKind, x: i32, y: i32 },
    EffectStarted { kind: PowerKind },
    EffectEnded { kind: PowerKind },
    WallPhased { remaining: u32 },
    BlockPushed { x: i32, y: i32 },
    EnemyPushed { x: i32, y: i32 },
    GateOpened,
    GateClosed,
    PlayerCaught { x: i32, y: i32 },
    ExitReached,
}
