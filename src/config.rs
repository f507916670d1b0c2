/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub motion: MotionConfig,
    pub world: WorldConfig,
    pub effects: EffectConfig,
}

#[derive(Clone, Debug)]
pub struct MotionConfig {
    pub frame_sleep_ms: u64,
    /// Grid cells per second for every mobile entity.
    pub move_speed: f32,
    /// Remaining distance below which a move snaps to its target.
    pub snap_epsilon: f32,
}

#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Playfield spans -half_width..=half_width on both axes.
    pub half_width: i32,
    pub wall_density: f64,
    /// Wall-free radius around the spawn origin.
    pub safe_radius: f64,
    /// Minimum spawn distance for the block, power-ups and chasers.
    pub spawn_clearance: f64,
    /// Cells between the exit gate and the pressure plate.
    pub plate_inset: i32,
    pub power_ups_per_kind: usize,
    /// Replacements spawn when a kind's uncollected stock drops below this.
    pub min_power_up_stock: usize,
    pub chasers_min: usize,
    pub chasers_max: usize,
}

#[derive(Clone, Debug)]
pub struct EffectConfig {
    pub wall_passes: u32,
    pub freeze_steps: u32,
    pub view_steps: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    motion: TomlMotion,
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    effects: TomlEffects,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_snap_epsilon")]
    snap_epsilon: f32,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_half_width")]
    half_width: i32,
    #[serde(default = "default_wall_density")]
    wall_density: f64,
    #[serde(default = "default_safe_radius")]
    safe_radius: f64,
    #[serde(default = "default_spawn_clearance")]
    spawn_clearance: f64,
    #[serde(default = "default_plate_inset")]
    plate_inset: i32,
    #[serde(default = "default_power_ups_per_kind")]
    power_ups_per_kind: usize,
    #[serde(default = "default_min_power_up_stock")]
    min_power_up_stock: usize,
    #[serde(default = "default_chasers_min")]
    chasers_min: usize,
    #[serde(default = "default_chasers_max")]
    chasers_max: usize,
}

#[derive(Deserialize, Debug)]
struct TomlEffects {
    #[serde(default = "default_wall_passes")]
    wall_passes: u32,
    #[serde(default = "default_freeze_steps")]
    freeze_steps: u32,
    #[serde(default = "default_view_steps")]
    view_steps: u32,
}

// ── Defaults ──

fn default_frame_sleep() -> u64 { 5 }
fn default_move_speed() -> f32 { 5.0 }      // grid cells per second
fn default_snap_epsilon() -> f32 { 0.005 }

fn default_half_width() -> i32 { 50 }
fn default_wall_density() -> f64 { 0.15 }
fn default_safe_radius() -> f64 { 6.0 }
fn default_spawn_clearance() -> f64 { 8.0 }
fn default_plate_inset() -> i32 { 3 }
fn default_power_ups_per_kind() -> usize { 10 }
fn default_min_power_up_stock() -> usize { 5 }
fn default_chasers_min() -> usize { 2 }
fn default_chasers_max() -> usize { 4 }

fn default_wall_passes() -> u32 { 3 }
fn default_freeze_steps() -> u32 { 7 }
fn default_view_steps() -> u32 { 7 }

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion {
            frame_sleep_ms: default_frame_sleep(),
            move_speed: default_move_speed(),
            snap_epsilon: default_snap_epsilon(),
        }
    }
}

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            half_width: default_half_width(),
            wall_density: default_wall_density(),
            safe_radius: default_safe_radius(),
            spawn_clearance: default_spawn_clearance(),
            plate_inset: default_plate_inset(),
            power_ups_per_kind: default_power_ups_per_kind(),
            min_power_up_stock: default_min_power_up_stock(),
            chasers_min: default_chasers_min(),
            chasers_max: default_chasers_max(),
        }
    }
}

impl Default for TomlEffects {
    fn default() -> Self {
        TomlEffects {
            wall_passes: default_wall_passes(),
            freeze_steps: default_freeze_steps(),
            view_steps: default_view_steps(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::from_toml(load_toml(&candidate_dirs()))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            motion: MotionConfig {
                frame_sleep_ms: cfg.motion.frame_sleep_ms,
                move_speed: cfg.motion.move_speed,
                snap_epsilon: cfg.motion.snap_epsilon,
            },
            world: WorldConfig {
                half_width: cfg.world.half_width,
                wall_density: cfg.world.wall_density,
                safe_radius: cfg.world.safe_radius,
                spawn_clearance: cfg.world.spawn_clearance,
                plate_inset: cfg.world.plate_inset,
                power_ups_per_kind: cfg.world.power_ups_per_kind,
                min_power_up_stock: cfg.world.min_power_up_stock,
                chasers_min: cfg.world.chasers_min,
                chasers_max: cfg.world.chasers_max,
            },
            effects: EffectConfig {
                wall_passes: cfg.effects.wall_passes,
                freeze_steps: cfg.effects.freeze_steps,
                view_steps: cfg.effects.view_steps,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
