//! Modal question with a row of buttons

use crate::Theme;
use crate::widgets::selector::centered;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

const DIALOG_WIDTH: u16 = 60;

/// A centered dialog asking `message`, with one button per choice.
/// The button at `selected` is highlighted.
pub struct ConfirmDialog<'a> {
    title: &'a str,
    message: &'a str,
    choices: &'a [&'a str],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> ConfirmDialog<'a> {
    pub fn new(title: &'a str, message: &'a str, choices: &'a [&'a str], theme: &'a Theme) -> Self {
        Self {
            title,
            message,
            choices,
            selected: 0,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.choices.len().saturating_sub(1));
        self
    }

    fn buttons(&self) -> Line<'static> {
        let mut spans = Vec::with_capacity(self.choices.len() * 2);
        for (i, choice) in self.choices.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            let style = if i == self.selected {
                self.theme.highlight_style()
            } else {
                self.theme.accent_style()
            };
            spans.push(Span::styled(format!("[ {} ]", choice), style));
        }
        Line::from(spans).centered()
    }

    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let inner_width = DIALOG_WIDTH.saturating_sub(4).max(1) as usize;
        let message_rows = textwrap::wrap(self.message, inner_width).len().max(1) as u16;
        let popup = centered(area, (DIALOG_WIDTH, message_rows + 4));
        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.warning_style());

        let mut lines: Vec<Line> = vec![Line::from(Span::styled(
            self.message.to_string(),
            self.theme.base_style(),
        ))];
        lines.push(Line::from(""));
        lines.push(self.buttons());

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(popup, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_message_and_choices() {
        let theme = Theme::dark();
        let choices = ["Yes, Save", "No, Continue", "Cancel"];
        let dialog = ConfirmDialog::new(
            "Change exercise",
            "Save the current conversation before switching?",
            &choices,
            &theme,
        )
        .with_selected(1);

        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        dialog.render_centered(area, &mut buf);

        let text = screen(&buf);
        assert!(text.contains("Change exercise"));
        assert!(text.contains("Save the current conversation"));
        assert!(text.contains("[ Yes, Save ]"));
        assert!(text.contains("[ No, Continue ]"));
        assert!(text.contains("[ Cancel ]"));
    }

    #[test]
    fn test_selected_is_clamped() {
        let theme = Theme::dark();
        let choices = ["Yes", "No"];
        let dialog = ConfirmDialog::new("t", "m", &choices, &theme).with_selected(9);
        assert_eq!(dialog.selected, 1);
    }
}
