/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::step;
use sim::world::{Outcome, WorldState};
use ui::input::InputState;
use ui::renderer::{Renderer, Screen};

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    env_logger::init();
    let config = GameConfig::load();

    let mut world = WorldState::generate(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Gatecrash!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut screen = Screen::Title;
    let frame_sleep = Duration::from_millis(config.motion.frame_sleep_ms);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        if kb.ctrl_c_pressed() {
            break;
        }

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        let confirm = kb.any_pressed(KEYS_CONFIRM);
        let esc = kb.was_pressed(KeyCode::Esc);

        match screen {
            // ── Title ──
            Screen::Title => {
                if confirm {
                    *world = WorldState::generate(config);
                    screen = Screen::Playing;
                } else if esc || kb.any_pressed(KEYS_QUIT) {
                    break;
                }
            }

            // ── Playing ──
            Screen::Playing => {
                if esc {
                    screen = Screen::Title;
                } else if kb.any_pressed(KEYS_RESTART) {
                    *world = WorldState::generate(config);
                    world.set_message("New maze", 60);
                } else {
                    let events = step::step(world, kb.movement_intent(), dt);
                    process_events(world, &events);
                    match world.outcome {
                        Outcome::GameOver => screen = Screen::GameOver,
                        Outcome::Won => screen = Screen::Victory,
                        Outcome::Playing => {}
                    }
                }
            }

            // ── Game over / victory ──
            Screen::GameOver | Screen::Victory => {
                if confirm {
                    *world = WorldState::generate(config);
                    screen = Screen::Playing;
                } else if esc {
                    screen = Screen::Title;
                }
            }
        }

        renderer.render(world, screen)?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

/// Map simulation events to status messages. The sim itself never
/// touches presentation state beyond the message line it owns.
fn process_events(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::PowerUpCollected { kind, .. } => {
                world.set_message(&format!("{} picked up!", kind.label()), 60);
            }
            GameEvent::WallPhased { remaining } => {
                world.set_message(&format!("Phased through a wall, {remaining} left"), 60);
            }
            GameEvent::EffectEnded { kind } => {
                world.set_message(&format!("{} wore off", kind.label()), 60);
            }
            GameEvent::GateOpened => {
                world.set_message("The exit gate grinds open", 60);
            }
            GameEvent::GateClosed => {
                world.set_message("The exit gate slams shut", 60);
            }
            GameEvent::PlayerCaught { .. } => {
                world.set_message("An enemy caught you", 120);
            }
            GameEvent::ExitReached => {
                world.set_message("You slipped through the gate!", 120);
            }
            _ => {}
        }
    }
}
