//! Conversation view

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use crate::widgets::spinner::frame_at;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::time::Duration;

/// Who a displayed entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    /// Local status line (saved, cleared, switched)
    Notice,
    /// Inline error banner
    Error,
}

/// One entry in the conversation view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub content: String,
}

impl ChatMessage {
    pub fn new(speaker: Speaker, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Speaker::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, content)
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(Speaker::Notice, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Speaker::Error, content)
    }
}

/// Renders chat messages top to bottom, with an optional "thinking" line
/// after the last one while a reply is outstanding.
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
    waiting: Option<Duration>,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
            waiting: None,
        }
    }

    /// Skip this many rendered lines from the top
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Show the thinking indicator, animated by time since submission
    pub fn waiting(mut self, elapsed: Option<Duration>) -> Self {
        self.waiting = elapsed;
        self
    }

    /// All lines for the current messages at `width`
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .messages
            .iter()
            .flat_map(|msg| render_message(msg, self.theme, width))
            .collect();

        if let Some(elapsed) = self.waiting {
            lines.push(Line::from(Span::styled(
                format!("  {} thinking...", frame_at(elapsed)),
                self.theme.warning_style(),
            )));
        }
        lines
    }
}

fn render_message(msg: &ChatMessage, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let content_width = width.saturating_sub(2).max(1);
    let mut lines = Vec::new();

    let (header, header_style, body_style) = match msg.speaker {
        Speaker::User => ("▶ You", theme.accent_bold(), theme.base_style()),
        Speaker::Assistant => ("◀ Assistant", theme.reply_bold(), theme.base_style()),
        Speaker::Notice => ("● Notice", theme.dim_style(), theme.dim_style()),
        Speaker::Error => ("✖ Error", theme.error_style(), theme.error_style()),
    };
    lines.push(Line::from(Span::styled(header, header_style)));

    if msg.speaker == Speaker::Assistant {
        for line in render_markdown(&msg.content, theme, content_width) {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(
                line.spans
                    .into_iter()
                    .map(|s| Span::styled(s.content.into_owned(), s.style)),
            );
            lines.push(Line::from(spans));
        }
    } else {
        for line in wrap_plain(&msg.content, content_width) {
            lines.push(Line::from(Span::styled(format!("  {}", line), body_style)));
        }
    }

    lines.push(Line::from(""));
    lines
}

/// Wrap text that is not markdown, keeping blank lines the student typed
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    text.split('\n')
        .flat_map(|para| {
            let wrapped = textwrap::wrap(para, width);
            if wrapped.is_empty() {
                vec![String::new()]
            } else {
                wrapped.into_iter().map(|l| l.into_owned()).collect()
            }
        })
        .collect()
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible: Vec<Line> = self
            .lines(area.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

/// Total rendered height of `messages` at `width`, used to keep the view
/// pinned to the bottom.
pub fn calculate_message_height(messages: &[ChatMessage], width: usize, waiting: bool) -> usize {
    let theme = Theme::dark();
    let list = MessageList::new(messages, &theme).waiting(waiting.then_some(Duration::ZERO));
    list.lines(width).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_headers_per_speaker() {
        let theme = Theme::dark();
        let messages = vec![
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi there"),
            ChatMessage::error("Failed to generate response. Please try again."),
        ];
        let text = text_of(&MessageList::new(&messages, &theme).lines(60));
        assert_eq!(text[0], "▶ You");
        assert_eq!(text[1], "  Hello");
        assert_eq!(text[3], "◀ Assistant");
        assert_eq!(text[4], "  Hi there");
        assert_eq!(text[6], "✖ Error");
    }

    #[test]
    fn test_waiting_indicator_appended() {
        let theme = Theme::dark();
        let messages = vec![ChatMessage::user("Hello")];
        let idle = MessageList::new(&messages, &theme).lines(40);
        let waiting = MessageList::new(&messages, &theme)
            .waiting(Some(Duration::ZERO))
            .lines(40);
        assert_eq!(waiting.len(), idle.len() + 1);
        assert!(text_of(&waiting).last().unwrap().contains("thinking..."));
    }

    #[test]
    fn test_height_matches_lines() {
        let messages = vec![
            ChatMessage::user("a fairly long question that will need to wrap at a narrow width"),
            ChatMessage::assistant("**Answer**\n\n- one\n- two"),
        ];
        let theme = Theme::dark();
        let lines = MessageList::new(&messages, &theme).lines(20);
        assert_eq!(calculate_message_height(&messages, 20, false), lines.len());
        assert_eq!(calculate_message_height(&messages, 20, true), lines.len() + 1);
    }

    #[test]
    fn test_plain_text_keeps_blank_lines() {
        assert_eq!(wrap_plain("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_render_respects_scroll() {
        let theme = Theme::dark();
        let messages = vec![ChatMessage::user("first"), ChatMessage::user("second")];
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        MessageList::new(&messages, &theme).scroll(3).render(area, &mut buf);
        let top: String = (0..area.width)
            .map(|x| buf.cell((x, 0)).map(|c| c.symbol()).unwrap_or(" "))
            .collect();
        assert!(top.starts_with("▶ You"));
        let second: String = (0..area.width)
            .map(|x| buf.cell((x, 1)).map(|c| c.symbol()).unwrap_or(" "))
            .collect();
        assert!(second.contains("second"));
    }
}
