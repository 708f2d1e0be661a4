//! Popup list for picking an exercise or a model

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};

const MAX_POPUP_WIDTH: u16 = 80;
const MAX_POPUP_HEIGHT: u16 = 20;

/// Rect of `size` centered in `area`, clipped to it
pub(crate) fn centered(area: Rect, (width, height): (u16, u16)) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// One entry in a [`Selector`]
pub struct SelectorItem<'a> {
    pub label: &'a str,
    /// Shown dimmed after the label
    pub description: Option<&'a str>,
    /// Marks the entry that is active now
    pub is_current: bool,
}

/// A centered popup list. With no items it shows `empty_text` instead.
pub struct Selector<'a> {
    title: &'a str,
    items: Vec<SelectorItem<'a>>,
    selected: usize,
    empty_text: &'a str,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    pub fn new(title: &'a str, items: Vec<SelectorItem<'a>>, theme: &'a Theme) -> Self {
        let selected = items.iter().position(|item| item.is_current).unwrap_or(0);
        Self {
            title,
            items,
            selected,
            empty_text: "Nothing to choose from",
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    pub fn with_empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn popup_size(&self) -> (u16, u16) {
        let mut width = self.title.chars().count() + 4;
        if self.items.is_empty() {
            width = width.max(self.empty_text.chars().count() + 6);
        }
        for item in &self.items {
            let desc = item.description.map_or(0, |d| d.chars().count() + 3);
            width = width.max(item.label.chars().count() + desc + 6);
        }
        let rows = self.items.len().max(1) as u16;
        (
            (width as u16).clamp(20, MAX_POPUP_WIDTH),
            (rows + 2).min(MAX_POPUP_HEIGHT),
        )
    }

    fn list_item(&self, index: usize, item: &SelectorItem<'_>) -> ListItem<'static> {
        let prefix = if item.is_current { "● " } else { "  " };
        let label_style = if index == self.selected {
            self.theme.highlight_style()
        } else if item.is_current {
            self.theme.accent_style()
        } else {
            self.theme.base_style()
        };

        let mut spans = vec![Span::styled(format!("{}{}", prefix, item.label), label_style)];
        if let Some(desc) = item.description {
            spans.push(Span::styled(format!("   {}", desc), self.theme.dim_style()));
        }
        ListItem::new(Line::from(spans))
    }

    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let popup = centered(area, self.popup_size());
        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        if self.items.is_empty() {
            let empty = ListItem::new(Span::styled(
                format!("  {}", self.empty_text),
                self.theme.dim_style(),
            ));
            Widget::render(List::new(vec![empty]).block(block), popup, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| self.list_item(i, item))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.selected));
        StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and cursor of a popup that lives across frames
#[derive(Debug, Default)]
pub struct SelectorState {
    pub selected: usize,
    pub visible: bool,
}

impl SelectorState {
    /// Show the popup with the cursor on `index`
    pub fn show_at(&mut self, index: usize) {
        self.selected = index;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move up, wrapping to the bottom
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            item_count - 1
        } else {
            self.selected - 1
        };
    }

    /// Move down, wrapping to the top
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % item_count;
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
    fn test_state_wraps() {
        let mut state = SelectorState::default();
        state.up(3);
        assert_eq!(state.selected, 2);
        state.down(3);
        assert_eq!(state.selected, 0);
        state.down(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_starts_on_current_item() {
        let theme = Theme::dark();
        let items = vec![
            SelectorItem { label: "intro", description: None, is_current: false },
            SelectorItem { label: "week2", description: None, is_current: true },
        ];
        assert_eq!(Selector::new("Exercise", items, &theme).selected(), 1);
    }

    #[test]
    fn test_renders_labels_and_descriptions() {
        let theme = Theme::dark();
        let items = vec![SelectorItem {
            label: "gpt-4o-2024-11-20",
            description: Some("$2.50 / $10.00 per 1M"),
            is_current: true,
        }];
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        Selector::new("Model", items, &theme).render_centered(area, &mut buf);
        let text = screen(&buf);
        assert!(text.contains("Model"));
        assert!(text.contains("gpt-4o-2024-11-20"));
        assert!(text.contains("$2.50 / $10.00 per 1M"));
    }

    #[test]
    fn test_empty_selector_shows_placeholder() {
        let theme = Theme::dark();
        let area = Rect::new(0, 0, 50, 8);
        let mut buf = Buffer::empty(area);
        Selector::new("Exercise", Vec::new(), &theme)
            .with_empty_text("No exercises available")
            .render_centered(area, &mut buf);
        assert!(screen(&buf).contains("No exercises available"));
    }

    #[test]
    fn test_centered_clips_to_area() {
        let rect = centered(Rect::new(0, 0, 10, 4), (30, 8));
        assert_eq!(rect, Rect::new(0, 0, 10, 4));
        let rect = centered(Rect::new(0, 0, 40, 20), (20, 10));
        assert_eq!(rect, Rect::new(10, 5, 20, 10));
    }
}
