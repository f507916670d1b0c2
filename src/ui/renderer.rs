/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` (an array of Glyph)
///   2. Compare each cell with `back` (the previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// The world is drawn through a viewport centered on the player; world y
/// grows upward, terminal rows grow downward, so rows are flipped at the
/// edge of this module and nowhere else. Row 0 is the HUD, the bottom
/// row is the status message line.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Occupancy, PowerKind};
use crate::domain::grid::{Cell, Vec2};
use crate::sim::world::{Outcome, WorldState};

/// Which top-level screen the shell is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Title,
    Playing,
    GameOver,
    Victory,
}

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for every cell, so terminal-default
    /// backgrounds never bleed through between rows.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 16, b: 26 };

    const BLANK: Glyph = Glyph {
        ch: ' ',
        fg: Color::White,
        bg: Glyph::BASE_BG,
    };

    fn new(ch: char, fg: Color) -> Self {
        Glyph { ch, fg, bg: Glyph::BASE_BG }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Glyph::BLANK; w * h],
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn put(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn put_str(&mut self, x: usize, y: usize, text: &str, fg: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.put(x + i, y, Glyph::new(ch, fg));
        }
    }

    fn put_centered(&mut self, y: usize, text: &str, fg: Color) {
        let x = (self.width.saturating_sub(text.chars().count())) / 2;
        self.put_str(x, y, text, fg);
    }
}

// ── Renderer ──

pub struct Renderer {
    out: BufWriter<Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    force_full: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            out: BufWriter::new(io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            force_full: true,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All),
        )?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&mut self, world: &mut WorldState, screen: Screen) -> io::Result<()> {
        let (w, h) = terminal::size()?;
        let (w, h) = (w as usize, h as usize);
        if w != self.front.width || h != self.front.height {
            self.front = FrameBuffer::new(w, h);
            self.back = FrameBuffer::new(w, h);
            self.force_full = true;
        }
        if w < 20 || h < 8 {
            return Ok(()); // too small to draw anything useful
        }

        self.front.clear();
        match screen {
            Screen::Title => self.draw_title(),
            Screen::Playing => self.draw_world(world),
            Screen::GameOver => {
                self.draw_world(world);
                self.draw_banner(&["CAUGHT", "[Enter] New maze   [Esc] Title"]);
            }
            Screen::Victory => {
                self.draw_world(world);
                self.draw_banner(&["ESCAPED!", "[Enter] New maze   [Esc] Title"]);
            }
        }
        self.flush_diff()
    }

    // ── World drawing ──

    fn draw_world(&mut self, world: &mut WorldState) {
        let view_w = self.front.width;
        let view_h = self.front.height - 2; // HUD row + message row
        world.camera.view_w = view_w;
        world.camera.view_h = view_h;
        world.camera.center_on(world.player.mover.render);

        // Terrain and static entities, cell by cell.
        for vy in 0..view_h {
            for vx in 0..view_w {
                let cell = Cell::new(
                    world.camera.x + vx as i32,
                    world.camera.y + vy as i32,
                );
                let row = 1 + (view_h - 1 - vy);
                self.front.put(vx, row, terrain_glyph(world, cell));
            }
        }

        // Mobile entities by render position, player drawn last.
        let block_glyph = Glyph::new('■', Color::Blue);
        self.put_at_render(world, world.block.mover.render, block_glyph, view_h);
        for enemy in &world.enemies {
            let color = if world.effects.frozen() {
                Color::Cyan
            } else if enemy.is_sentry() {
                Color::Magenta
            } else {
                Color::DarkYellow
            };
            self.put_at_render(world, enemy.mover.render, Glyph::new('●', color), view_h);
        }
        let player_color = if world.player.ghost {
            // Ghost pulse.
            if (world.frame / 6) % 2 == 0 { Color::Magenta } else { Color::DarkMagenta }
        } else {
            Color::Red
        };
        self.put_at_render(world, world.player.mover.render, Glyph::new('@', player_color), view_h);

        // Indicator overlays.
        if world.effects.exit_view() {
            self.draw_pointer(world, world.gate.cell.center(), Color::Green, view_h);
            self.draw_pointer(world, world.block.mover.cell.center(), Color::Blue, view_h);
        }
        if world.effects.enemy_view() {
            for enemy in &world.enemies {
                if world.camera.in_view(enemy.mover.cell) {
                    continue;
                }
                let color = if enemy.is_sentry() { Color::Magenta } else { Color::DarkYellow };
                self.draw_pointer(world, enemy.mover.cell.center(), color, view_h);
            }
        }

        self.draw_hud(world);
        let msg_row = self.front.height - 1;
        self.front.put_str(1, msg_row, &world.message, Color::Yellow);
    }

    fn put_at_render(&mut self, world: &WorldState, pos: Vec2, glyph: Glyph, view_h: usize) {
        let cell = Cell::new(pos.x.floor() as i32, pos.y.floor() as i32);
        if let Some((vx, vy)) = world.camera.world_to_view(cell) {
            let row = 1 + (view_h - 1 - vy);
            self.front.put(vx, row, glyph);
        }
    }

    /// Edge arrow toward an off-screen point of interest: a ray from the
    /// viewport center, clamped to the border ring.
    fn draw_pointer(&mut self, world: &WorldState, target: Vec2, color: Color, view_h: usize) {
        let view_w = world.camera.view_w;
        let player = world.player.mover.render;
        let dx = target.x - player.x;
        let dy = target.y - player.y;
        if dx * dx + dy * dy < 1e-3 {
            return;
        }
        let cx = view_w as f32 / 2.0;
        let cy = view_h as f32 / 2.0;
        let len = (dx * dx + dy * dy).sqrt();
        let (nx, ny) = (dx / len, dy / len);
        let tx = if nx.abs() < 1e-6 { f32::MAX } else { (cx - 1.0) / nx.abs() };
        let ty = if ny.abs() < 1e-6 { f32::MAX } else { (cy - 1.0) / ny.abs() };
        let t = tx.min(ty);
        let vx = (cx + nx * t).round().clamp(0.0, view_w as f32 - 1.0) as usize;
        let vy = (cy + ny * t).round().clamp(0.0, view_h as f32 - 1.0) as usize;
        let row = 1 + (view_h - 1 - vy);
        self.front.put(vx, row, Glyph::new(arrow_char(nx, ny), color));
    }

    fn draw_hud(&mut self, world: &WorldState) {
        let mut hud = String::from(" GATECRASH ");
        let e = &world.effects;
        if world.player.ghost {
            hud.push_str(&format!("  Ghost:{}", e.wall_passes));
        }
        if e.frozen() {
            hud.push_str(&format!("  Frozen:{}", e.freeze_steps));
        }
        if e.exit_view() {
            hud.push_str(&format!("  ExitView:{}", e.exit_view_steps));
        }
        if e.enemy_view() {
            hud.push_str(&format!("  EnemyView:{}", e.enemy_view_steps));
        }
        if world.outcome == Outcome::Playing && !world.gate.open {
            hud.push_str("  [gate closed]");
        } else if world.gate.open {
            hud.push_str("  [gate OPEN]");
        }
        self.front.put_str(0, 0, &hud, Color::White);
    }

    // ── Screens ──

    fn draw_title(&mut self) {
        let mid = self.front.height / 2;
        let lines: &[(&str, Color)] = &[
            ("G A T E C R A S H", Color::Red),
            ("", Color::White),
            ("Push the block onto the pressure plate,", Color::Grey),
            ("then escape through the gate it opens.", Color::Grey),
            ("", Color::White),
            ("Arrows / WASD move   power-ups help   enemies end you", Color::Grey),
            ("", Color::White),
            ("[Enter] Start    [Q] Quit", Color::Yellow),
        ];
        let top = mid.saturating_sub(lines.len() / 2);
        for (i, (text, color)) in lines.iter().enumerate() {
            self.front.put_centered(top + i, text, *color);
        }
    }

    fn draw_banner(&mut self, lines: &[&str]) {
        let mid = self.front.height / 2;
        let top = mid.saturating_sub(lines.len());
        for (i, text) in lines.iter().enumerate() {
            let padded = format!("  {text}  ");
            self.front.put_centered(top + i * 2, &padded, Color::Yellow);
        }
    }

    // ── Diff / flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::Reset;
        let mut last_bg = Color::Reset;
        let mut cursor_at: Option<(usize, usize)> = None;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let idx = y * self.front.width + x;
                let cell = self.front.cells[idx];
                if !self.force_full && cell == self.back.cells[idx] {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.out, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.out, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.out, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.out, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.out.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        self.force_full = false;
        Ok(())
    }
}

// ── Glyph selection ──

fn terrain_glyph(world: &WorldState, cell: Cell) -> Glyph {
    let classes = world.occupants_at(cell);
    if classes.contains(&Occupancy::Wall) {
        let boundary = cell.x.abs() == world.half_width || cell.y.abs() == world.half_width;
        return if boundary {
            Glyph::new('█', Color::White)
        } else {
            Glyph::new('█', Color::DarkGrey)
        };
    }
    if classes.contains(&Occupancy::Gate) {
        return if world.gate.open {
            Glyph::new('▓', Color::Green)
        } else {
            Glyph::new('▓', Color::Red)
        };
    }
    if classes.contains(&Occupancy::Plate) {
        return if world.plate.active {
            Glyph::new('▄', Color::Green)
        } else {
            Glyph::new('▄', Color::DarkYellow)
        };
    }
    if classes.contains(&Occupancy::PowerUp) {
        if let Some(idx) = world.power_up_at(cell) {
            let kind = world.power_ups[idx].kind;
            let bright = (world.frame / 8) % 2 == 0;
            return Glyph::new('◆', power_up_color(kind, bright));
        }
    }
    Glyph::new('·', Color::Rgb { r: 50, g: 50, b: 64 })
}

fn power_up_color(kind: PowerKind, bright: bool) -> Color {
    match (kind, bright) {
        (PowerKind::Ghost, true) => Color::Magenta,
        (PowerKind::Ghost, false) => Color::DarkMagenta,
        (PowerKind::Freeze, true) => Color::Cyan,
        (PowerKind::Freeze, false) => Color::DarkCyan,
        (PowerKind::ExitView, true) => Color::Yellow,
        (PowerKind::ExitView, false) => Color::DarkYellow,
        (PowerKind::EnemyView, true) => Color::Rgb { r: 255, g: 140, b: 60 },
        (PowerKind::EnemyView, false) => Color::Rgb { r: 180, g: 95, b: 40 },
    }
}

/// Octant arrow for a normalized world-space direction (y up).
fn arrow_char(nx: f32, ny: f32) -> char {
    const ARROWS: [char; 8] = ['→', '↗', '↑', '↖', '←', '↙', '↓', '↘'];
    let octant = (ny.atan2(nx) / (std::f32::consts::PI / 4.0)).round() as i32;
    ARROWS[octant.rem_euclid(8) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_chars_cover_the_octants() {
        assert_eq!(arrow_char(1.0, 0.0), '→');
        assert_eq!(arrow_char(0.0, 1.0), '↑');
        assert_eq!(arrow_char(-1.0, 0.0), '←');
        assert_eq!(arrow_char(0.0, -1.0), '↓');
        assert_eq!(arrow_char(0.7, 0.7), '↗');
        assert_eq!(arrow_char(-0.7, -0.7), '↙');
    }
}
