use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::grid::Direction;

/// Input state sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub quit: bool,
}

impl InputSnapshot {
    pub fn pressing(dir: Direction) -> Self {
        let mut snapshot = Self::default();
        snapshot.set(dir);
        snapshot
    }

    pub fn sprinting(mut self) -> Self {
        self.sprint = true;
        self
    }

    /// First asserted flag wins: up, down, left, right.
    pub fn direction(&self) -> Option<Direction> {
        if self.up {
            Some(Direction::Up)
        } else if self.down {
            Some(Direction::Down)
        } else if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }

    fn set(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
    }
}

/// Collects terminal key events between ticks. A terminal only reports
/// presses and auto-repeats, so a key counts as held for a tick when at
/// least one of those arrived since the previous snapshot.
#[derive(Debug, Default)]
pub struct InputTracker {
    pending: InputSnapshot,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, event: &Event) {
        if let Event::Key(key) = event {
            if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                self.absorb_key(key);
            }
        }
    }

    fn absorb_key(&mut self, key: &KeyEvent) {
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            self.pending.sprint = true;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.pending.quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.pending.quit = true,
            KeyCode::Char(c) => {
                if let Some(dir) = direction_for_char(c) {
                    if c.is_ascii_uppercase() {
                        self.pending.sprint = true;
                    }
                    self.pending.set(dir);
                }
            }
            KeyCode::Up => self.pending.set(Direction::Up),
            KeyCode::Down => self.pending.set(Direction::Down),
            KeyCode::Left => self.pending.set(Direction::Left),
            KeyCode::Right => self.pending.set(Direction::Right),
            _ => {}
        }
    }

    /// Returns everything seen since the last call and starts over.
    pub fn take_snapshot(&mut self) -> InputSnapshot {
        std::mem::take(&mut self.pending)
    }
}

fn direction_for_char(c: char) -> Option<Direction> {
    match c.to_ascii_lowercase() {
        'w' | 'k' => Some(Direction::Up),
        's' | 'j' => Some(Direction::Down),
        'a' | 'h' => Some(Direction::Left),
        'd' | 'l' => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn priority_is_up_down_left_right() {
        let all = InputSnapshot {
            up: true,
            down: true,
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(all.direction(), Some(Direction::Up));
        let lr = InputSnapshot {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(lr.direction(), Some(Direction::Left));
        let dr = InputSnapshot {
            down: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(dr.direction(), Some(Direction::Down));
        assert_eq!(InputSnapshot::default().direction(), None);
    }

    #[test]
    fn tracker_merges_events_until_snapshot() {
        let mut tracker = InputTracker::new();
        tracker.absorb(&press(KeyCode::Char('d'), KeyModifiers::NONE));
        tracker.absorb(&press(KeyCode::Up, KeyModifiers::NONE));
        let snapshot = tracker.take_snapshot();
        assert!(snapshot.right && snapshot.up);
        assert_eq!(snapshot.direction(), Some(Direction::Up));
        assert!(!snapshot.sprint);

        assert_eq!(tracker.take_snapshot(), InputSnapshot::default());
    }

    #[test]
    fn shift_means_sprint() {
        let mut tracker = InputTracker::new();
        tracker.absorb(&press(KeyCode::Char('S'), KeyModifiers::SHIFT));
        let snapshot = tracker.take_snapshot();
        assert_eq!(snapshot.direction(), Some(Direction::Down));
        assert!(snapshot.sprint);

        tracker.absorb(&press(KeyCode::Char('A'), KeyModifiers::NONE));
        assert!(tracker.take_snapshot().sprint);
    }

    #[test]
    fn quit_keys() {
        let mut tracker = InputTracker::new();
        tracker.absorb(&press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(tracker.take_snapshot().quit);
        tracker.absorb(&press(KeyCode::Esc, KeyModifiers::NONE));
        assert!(tracker.take_snapshot().quit);
        tracker.absorb(&press(KeyCode::Char('q'), KeyModifiers::NONE));
        let snapshot = tracker.take_snapshot();
        assert!(snapshot.quit);
        assert_eq!(snapshot.direction(), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut tracker = InputTracker::new();
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Char('w'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        tracker.absorb(&release);
        assert_eq!(tracker.take_snapshot().direction(), None);
    }
}
