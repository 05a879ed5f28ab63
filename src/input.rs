use crossterm::event::{KeyCode, KeyEvent};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Take the current text, leaving the field empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert(c);
        }
    }

    /// Apply an editing key; returns false for keys the field does not handle.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            KeyCode::Delete => {
                let char_count = self.value.chars().count();
                if self.cursor < char_count {
                    let byte_pos = char_to_byte_index(&self.value, self.cursor);
                    self.value.remove(byte_pos);
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let char_count = self.value.chars().count();
                self.cursor = (self.cursor + 1).min(char_count);
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.value.chars().count();
            }
            KeyCode::Char(c) => self.insert(c),
            _ => return false,
        }
        true
    }

    /// Visible slice and cursor column for a field `width` characters wide.
    pub fn visible(&self, width: usize) -> (String, usize) {
        let scroll_offset = if width == 0 {
            0
        } else if self.cursor >= width {
            self.cursor - width + 1
        } else {
            0
        };
        let text = self.value.chars().skip(scroll_offset).take(width).collect();
        (text, self.cursor - scroll_offset)
    }
}
