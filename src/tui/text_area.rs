use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{prelude::*, widgets::*};

/// Text in, text out. The session controller only ever talks to the editor
/// through this.
pub trait EditorWidget {
    fn value(&self) -> String;
    fn set_value(&mut self, text: &str);
}

/// Minimal multi-line editor. Lines are split on `\n` only, so any `\r` in
/// the loaded text survives a round trip untouched.
pub struct TextArea {
    lines: Vec<String>,
    row: usize,
    /// Cursor column in chars, not bytes.
    col: usize,
    scroll: (u16, u16),
}

impl Default for TextArea {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            scroll: (0, 0),
        }
    }
}

impl EditorWidget for TextArea {
    fn value(&self) -> String {
        self.lines.join("\n")
    }

    fn set_value(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = 0;
        self.col = 0;
        self.scroll = (0, 0);
    }
}

impl TextArea {
    #[cfg(test)]
    fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_at(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
    }

    /// Apply one key press. Returns `true` if the text changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => {
                self.insert(c);
                true
            }
            KeyCode::Tab => {
                self.insert('\t');
                true
            }
            KeyCode::Enter => {
                self.newline();
                true
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = self.line_len(self.row);
                }
                false
            }
            KeyCode::Right => {
                if self.col < self.line_len(self.row) {
                    self.col += 1;
                } else if self.row + 1 < self.lines.len() {
                    self.row += 1;
                    self.col = 0;
                }
                false
            }
            KeyCode::Up => {
                self.move_rows(-1);
                false
            }
            KeyCode::Down => {
                self.move_rows(1);
                false
            }
            KeyCode::PageUp => {
                self.move_rows(-20);
                false
            }
            KeyCode::PageDown => {
                self.move_rows(20);
                false
            }
            KeyCode::Home => {
                self.col = 0;
                false
            }
            KeyCode::End => {
                self.col = self.line_len(self.row);
                false
            }
            _ => false,
        }
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_at(self.row, self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    fn newline(&mut self) {
        let at = self.byte_at(self.row, self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    fn backspace(&mut self) -> bool {
        if self.col > 0 {
            let at = self.byte_at(self.row, self.col - 1);
            self.lines[self.row].remove(at);
            self.col -= 1;
            true
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
            true
        } else {
            false
        }
    }

    fn delete(&mut self) -> bool {
        if self.col < self.line_len(self.row) {
            let at = self.byte_at(self.row, self.col);
            self.lines[self.row].remove(at);
            true
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            true
        } else {
            false
        }
    }

    fn move_rows(&mut self, delta: isize) {
        let last = self.lines.len() - 1;
        self.row = self.row.saturating_add_signed(delta).min(last);
        self.col = self.col.min(self.line_len(self.row));
    }

    /// Draw inside `block`, scrolled so the cursor stays visible. Places the
    /// terminal cursor when `focused`.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, block: Block, focused: bool) {
        let inner = block.inner(area);
        let (height, width) = (inner.height.max(1) as usize, inner.width.max(1) as usize);

        let (mut top, mut left) = (self.scroll.0 as usize, self.scroll.1 as usize);
        if self.row < top {
            top = self.row;
        } else if self.row >= top + height {
            top = self.row + 1 - height;
        }
        if self.col < left {
            left = self.col;
        } else if self.col >= left + width {
            left = self.col + 1 - width;
        }
        self.scroll = (top as u16, left as u16);

        let text: Vec<Line> = self.lines.iter().map(|l| Line::raw(l.as_str())).collect();
        frame.render_widget(Paragraph::new(text).block(block).scroll(self.scroll), area);

        if focused {
            let x = inner.x + (self.col - left) as u16;
            let y = inner.y + (self.row - top) as u16;
            frame.set_cursor_position((x, y));
        }
    }
}
