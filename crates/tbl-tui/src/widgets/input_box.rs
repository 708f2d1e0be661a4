//! Single-line message input

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Text input for the student's next message.
///
/// The box can be disabled (no exercise loaded, or a confirmation pending).
/// While disabled it ignores edits and shows `disabled_hint` instead of the
/// placeholder.
#[derive(Debug)]
pub struct InputBox {
    content: String,
    /// Cursor position in chars
    cursor: usize,
    /// Horizontal scroll in display columns
    scroll: usize,
    placeholder: String,
    disabled_hint: String,
    enabled: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            scroll: 0,
            placeholder: String::new(),
            disabled_hint: String::new(),
            enabled: true,
        }
    }
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_disabled_hint(mut self, hint: impl Into<String>) -> Self {
        self.disabled_hint = hint.into();
        self
    }

    pub fn set_disabled_hint(&mut self, hint: impl Into<String>) {
        self.disabled_hint = hint.into();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Take the content out, leaving the box empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.scroll = 0;
        std::mem::take(&mut self.content)
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.chars().count();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn cursor_display_width(&self) -> usize {
        self.content.chars().take(self.cursor).map(char_width).sum()
    }

    fn remove_range(&mut self, start: usize, end: usize) {
        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(end);
        self.content.drain(start_byte..end_byte);
    }

    /// Apply an editing action. Returns true if the content or cursor changed.
    pub fn handle_action(&mut self, action: &Action, width: u16) -> bool {
        if !self.enabled {
            return false;
        }

        let char_count = self.content.chars().count();
        let changed = match action {
            Action::Char(c) => {
                self.insert_char(*c);
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.remove_range(self.cursor - 1, self.cursor);
                self.cursor -= 1;
                true
            }
            Action::Delete if self.cursor < char_count => {
                self.remove_range(self.cursor, self.cursor + 1);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < char_count => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = char_count;
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let chars: Vec<char> = self.content.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.remove_range(start, self.cursor);
                self.cursor = start;
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    if c == '\n' || c == '\r' {
                        if self.cursor > 0 && !self.content.ends_with(' ') {
                            self.insert_char(' ');
                        }
                    } else {
                        self.insert_char(c);
                    }
                }
                true
            }
            _ => false,
        };

        if changed {
            self.update_scroll(width as usize);
        }
        changed
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, c);
        self.cursor += 1;
    }

    fn update_scroll(&mut self, width: usize) {
        let visible_width = width.saturating_sub(4).max(1);
        let cursor_pos = self.cursor_display_width();

        if cursor_pos < self.scroll {
            self.scroll = cursor_pos;
        } else if cursor_pos >= self.scroll + visible_width {
            self.scroll = cursor_pos + 1 - visible_width;
        }
    }

    fn visible_text(&self, width: usize) -> String {
        let mut skipped = 0;
        let mut used = 0;
        let mut visible = String::new();
        for c in self.content.chars() {
            let w = char_width(c);
            if skipped < self.scroll {
                skipped += w;
                continue;
            }
            if used + w > width {
                break;
            }
            visible.push(c);
            used += w;
        }
        visible
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.enabled {
                theme.accent_style()
            } else {
                theme.border_style()
            });

        let inner = block.inner(area);
        block.render(area, buf);

        let (text, style) = if !self.enabled {
            (self.disabled_hint.clone(), theme.dim_style())
        } else if self.content.is_empty() {
            (self.placeholder.clone(), theme.dim_style())
        } else {
            (self.visible_text(inner.width as usize), theme.base_style())
        };
        Paragraph::new(text).style(style).render(inner, buf);

        if self.enabled && inner.width > 0 {
            let cursor_x = self.cursor_display_width().saturating_sub(self.scroll);
            if cursor_x < inner.width as usize {
                let x = inner.x + cursor_x as u16;
                if let Some(cell) = buf.cell_mut((x, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(input: &mut InputBox, text: &str) {
        for c in text.chars() {
            input.handle_action(&Action::Char(c), 40);
        }
    }

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect()
    }

    #[test]
    fn test_typing_and_editing() {
        let mut input = InputBox::new();
        type_str(&mut input, "héllo world");
        assert_eq!(input.content(), "héllo world");

        input.handle_action(&Action::DeleteWord, 40);
        assert_eq!(input.content(), "héllo ");

        input.handle_action(&Action::Home, 40);
        input.handle_action(&Action::Delete, 40);
        input.handle_action(&Action::Delete, 40);
        assert_eq!(input.content(), "llo ");

        input.handle_action(&Action::End, 40);
        input.handle_action(&Action::Backspace, 40);
        assert_eq!(input.content(), "llo");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = InputBox::new();
        input.handle_action(&Action::Paste("fever\r\nthree days".into()), 40);
        assert_eq!(input.content(), "fever three days");
    }

    #[test]
    fn test_disabled_ignores_edits() {
        let mut input = InputBox::new();
        input.set_enabled(false);
        assert!(!input.handle_action(&Action::Char('a'), 40));
        assert_eq!(input.content(), "");
    }

    #[test]
    fn test_take_empties_box() {
        let mut input = InputBox::new();
        type_str(&mut input, "Hello");
        assert_eq!(input.take(), "Hello");
        assert_eq!(input.content(), "");
        assert!(input.handle_action(&Action::Char('x'), 40));
        assert_eq!(input.content(), "x");
    }

    #[test]
    fn test_render_shows_disabled_hint() {
        let theme = Theme::dark();
        let mut input = InputBox::new()
            .with_placeholder("Type a message")
            .with_disabled_hint("Select an exercise");
        let area = Rect::new(0, 0, 30, 3);

        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf, &theme);
        assert!(row(&buf, 1).contains("Type a message"));

        input.set_enabled(false);
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf, &theme);
        assert!(row(&buf, 1).contains("Select an exercise"));
    }

    #[test]
    fn test_long_input_scrolls_to_cursor() {
        let theme = Theme::dark();
        let mut input = InputBox::new();
        for c in "abcdefghijklmnopqrstuvwxyz".chars() {
            input.handle_action(&Action::Char(c), 12);
        }
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf, &theme);
        let line = row(&buf, 1);
        assert!(line.contains("xyz"));
        assert!(!line.contains("abc"));
    }
}
