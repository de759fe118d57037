use std::io::{self, Write};
use std::thread;

use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use crate::config::{Pacing, CELL_W};
use crate::grid::{Cell, Direction};
use crate::leaderboard::Standing;
use crate::progression::{Frame, Status};
use crate::session::Step;

const TRAIL_UP: u8 = 1;
const TRAIL_DOWN: u8 = 2;
const TRAIL_LEFT: u8 = 4;
const TRAIL_RIGHT: u8 = 8;

const PLAYER_TEXT: &str = "●";
const PLAYER_COLOR: Color = Color::Cyan;

#[derive(Clone, Copy, PartialEq, Debug)]
enum Glyph {
    Player,
    Exit,
    Wall,
    Open,
    /// Failure trail with its `TRAIL_*` connections.
    Trail(u8),
    /// Forces a redraw on the next frame.
    Stale,
}

#[derive(Clone, Copy, PartialEq, Debug)]
struct Paint {
    glyph: Glyph,
    color: Color,
}

const STALE: Paint = Paint {
    glyph: Glyph::Stale,
    color: Color::Reset,
};

pub struct Renderer {
    width: usize,
    height: usize,
    last: Vec<Paint>,
    last_hud: String,
    last_banner: String,
    needs_full: bool,
    fits: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            last: vec![STALE; width * height],
            last_hud: String::new(),
            last_banner: String::new(),
            needs_full: true,
            fits: false,
            origin_x: 0,
            origin_y: 1,
        }
    }

    pub fn invalidate(&mut self) {
        self.needs_full = true;
    }

    pub fn render(
        &mut self,
        out: &mut impl Write,
        frame: &Frame<'_>,
        status: &Status,
        banner: Option<&str>,
    ) -> io::Result<()> {
        out.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = terminal::size()?;
        let Some((needed_w, needed_h)) = self
            .needed_size()
            .filter(|&(w, h)| term_w >= w && term_h >= h)
        else {
            out.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                self.width.saturating_mul(CELL_W),
                self.height.saturating_add(2),
                term_w,
                term_h
            );
            out.queue(Print(msg))?;
            out.flush()?;
            self.fits = false;
            self.needs_full = true;
            return Ok(());
        };
        if !self.fits {
            out.queue(Clear(ClearType::All))?;
            self.fits = true;
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            out.queue(Clear(ClearType::All))?;
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }

        let hud = format!("{status}   (q to quit, shift to sprint)");
        if self.needs_full || hud != self.last_hud {
            self.print_line(out, self.origin_y - 1, &hud, Color::White)?;
            self.last_hud = hud;
        }

        let trails = trail_masks(frame.failed_paths, self.width, self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let cell = Cell { row, col };
                let paint = paint_for(frame, &trails, self.width, cell, true);
                let idx = row * self.width + col;
                if self.needs_full || paint != self.last[idx] {
                    self.last[idx] = paint;
                    self.draw_cell(out, cell, paint)?;
                }
            }
        }

        let banner = banner.unwrap_or("");
        if self.needs_full || banner != self.last_banner {
            let y = self.origin_y + self.height as u16;
            self.print_line(out, y, banner, Color::Yellow)?;
            self.last_banner = banner.to_owned();
        }
        self.needs_full = false;

        out.flush()
    }

    /// Slides the player token from `step.from` to `step.to`. Purely cosmetic;
    /// the move has already been applied.
    pub fn animate(
        &mut self,
        out: &mut impl Write,
        frame: &Frame<'_>,
        step: Step,
        sprint: bool,
    ) -> io::Result<()> {
        if !self.fits || self.needs_full {
            return Ok(());
        }
        let (steps, delay) = Pacing::animation(sprint);
        let trails = trail_masks(frame.failed_paths, self.width, self.height);
        let (fx, fy) = self.screen_pos(step.from);
        let (tx, ty) = self.screen_pos(step.to);

        for i in 1..=steps {
            for cell in [step.from, step.to] {
                let paint = paint_for(frame, &trails, self.width, cell, false);
                self.draw_cell(out, cell, paint)?;
            }
            let x = fx as i32 + (tx as i32 - fx as i32) * i as i32 / steps as i32;
            let y = if i * 2 < steps { fy } else { ty };
            out.queue(MoveTo(x as u16, y))?;
            out.queue(SetForegroundColor(PLAYER_COLOR))?;
            out.queue(Print(PLAYER_TEXT))?;
            out.queue(ResetColor)?;
            out.flush()?;
            thread::sleep(delay);
        }

        for cell in [step.from, step.to] {
            self.last[cell.row * self.width + cell.col] = STALE;
        }
        Ok(())
    }

    pub fn render_win(
        &mut self,
        out: &mut impl Write,
        map_count: usize,
        total_attempts: u32,
        standings: &[Standing],
    ) -> io::Result<()> {
        out.queue(Clear(ClearType::All))?;
        let mut lines = vec![
            format!("You escaped all {map_count} mazes in {total_attempts} attempts!"),
            String::new(),
        ];
        if standings.is_empty() {
            lines.push("(leaderboard unavailable)".to_owned());
        } else {
            lines.push("Leaderboard".to_owned());
            lines.extend(leaderboard_lines(standings));
        }
        lines.push(String::new());
        lines.push("press q to quit".to_owned());

        let (term_w, term_h) = terminal::size()?;
        let text_w = lines
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()))
            .max()
            .unwrap_or(0) as u16;
        let x = term_w.saturating_sub(text_w) / 2;
        let y = term_h.saturating_sub(lines.len() as u16) / 2;
        for (i, line) in lines.iter().enumerate() {
            out.queue(MoveTo(x, y + i as u16))?;
            out.queue(Print(line))?;
        }
        self.needs_full = true;
        out.flush()
    }

    /// Terminal columns and rows the maze plus status and banner lines
    /// occupy, or `None` when that exceeds what a terminal can address.
    fn needed_size(&self) -> Option<(u16, u16)> {
        let cols = self.width.checked_mul(CELL_W)?;
        let rows = self.height.checked_add(2)?;
        Some((u16::try_from(cols).ok()?, u16::try_from(rows).ok()?))
    }

    /// Only valid once `render` has confirmed the maze fits.
    fn screen_pos(&self, cell: Cell) -> (u16, u16) {
        (
            self.origin_x + (cell.col * CELL_W) as u16,
            self.origin_y + cell.row as u16,
        )
    }

    fn print_line(&self, out: &mut impl Write, y: u16, text: &str, color: Color) -> io::Result<()> {
        out.queue(MoveTo(self.origin_x, y))?;
        out.queue(SetForegroundColor(color))?;
        out.queue(Clear(ClearType::CurrentLine))?;
        out.queue(Print(text))?;
        out.queue(ResetColor)?;
        Ok(())
    }

    fn draw_cell(&self, out: &mut impl Write, cell: Cell, paint: Paint) -> io::Result<()> {
        let text = glyph_text(paint.glyph);
        let (x, y) = self.screen_pos(cell);
        out.queue(MoveTo(x, y))?;
        out.queue(SetForegroundColor(paint.color))?;
        out.queue(Print(&text))?;
        let w = UnicodeWidthStr::width(text.as_str());
        for _ in w..CELL_W {
            out.queue(Print(' '))?;
        }
        out.queue(ResetColor)?;
        Ok(())
    }
}

fn paint_for(frame: &Frame<'_>, trails: &[u8], width: usize, cell: Cell, with_player: bool) -> Paint {
    if with_player && cell == frame.player {
        return Paint {
            glyph: Glyph::Player,
            color: PLAYER_COLOR,
        };
    }
    if cell == frame.exit {
        return Paint {
            glyph: Glyph::Exit,
            color: Color::Green,
        };
    }
    if !frame.grid.is_open(cell) {
        return Paint {
            glyph: Glyph::Wall,
            color: Color::DarkGrey,
        };
    }
    match trails[cell.row * width + cell.col] {
        0 => Paint {
            glyph: Glyph::Open,
            color: Color::Reset,
        },
        mask => Paint {
            glyph: Glyph::Trail(mask),
            color: Color::Red,
        },
    }
}

fn glyph_text(glyph: Glyph) -> String {
    match glyph {
        Glyph::Player => PLAYER_TEXT.to_owned(),
        Glyph::Exit => "🏁".to_owned(),
        Glyph::Wall => "██".to_owned(),
        Glyph::Open | Glyph::Stale => "  ".to_owned(),
        Glyph::Trail(mask) => trail_text(mask),
    }
}

/// Union of the connections of every failed path, one mask per cell.
fn trail_masks(paths: &[Vec<Cell>], width: usize, height: usize) -> Vec<u8> {
    let mut masks = vec![0u8; width * height];
    for path in paths {
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let Some(dir) = Direction::ALL.into_iter().find(|&d| {
                let (dr, dc) = d.delta();
                a.row.checked_add_signed(dr) == Some(b.row)
                    && a.col.checked_add_signed(dc) == Some(b.col)
            }) else {
                continue;
            };
            let (out_bit, in_bit) = match dir {
                Direction::Up => (TRAIL_UP, TRAIL_DOWN),
                Direction::Down => (TRAIL_DOWN, TRAIL_UP),
                Direction::Left => (TRAIL_LEFT, TRAIL_RIGHT),
                Direction::Right => (TRAIL_RIGHT, TRAIL_LEFT),
            };
            masks[a.row * width + a.col] |= out_bit;
            masks[b.row * width + b.col] |= in_bit;
        }
    }
    masks
}

fn trail_text(mask: u8) -> String {
    let vertical = mask & (TRAIL_UP | TRAIL_DOWN);
    let horizontal = mask & (TRAIL_LEFT | TRAIL_RIGHT);
    let corner = match (vertical, horizontal) {
        (0, _) => '─',
        (_, 0) => '│',
        (TRAIL_DOWN, TRAIL_RIGHT) => '┌',
        (TRAIL_DOWN, TRAIL_LEFT) => '┐',
        (TRAIL_UP, TRAIL_RIGHT) => '└',
        (TRAIL_UP, TRAIL_LEFT) => '┘',
        (TRAIL_DOWN, _) => '┬',
        (TRAIL_UP, _) => '┴',
        (_, TRAIL_RIGHT) => '├',
        (_, TRAIL_LEFT) => '┤',
        _ => '┼',
    };
    let tail = if mask & TRAIL_RIGHT != 0 { '─' } else { ' ' };
    [corner, tail].iter().collect()
}

fn leaderboard_lines(standings: &[Standing]) -> Vec<String> {
    let name_w = standings
        .iter()
        .map(|s| UnicodeWidthStr::width(s.username.as_str()))
        .max()
        .unwrap_or(0);
    standings
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let pad = name_w - UnicodeWidthStr::width(s.username.as_str());
            format!(
                "{:>2}. {}{}  {} attempts",
                i + 1,
                s.username,
                " ".repeat(pad),
                s.attempts
            )
        })
        .collect()
}
