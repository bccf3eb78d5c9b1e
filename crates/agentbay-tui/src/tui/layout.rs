// Screen layout: page frame and the chat page split.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Page (fill)                                       |
// |                                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// The chat page further splits into the conversation (left) and, once
// there are recommendations, the recommendations panel (right, 40%).

use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

/// Resolved screen areas for the page frame.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: brand, current page, signed-in account.
    pub status_bar: Rect,
    /// The current page.
    pub main: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the page frame from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(6),    // page
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main: vertical[1],
        help_bar: vertical[2],
    }
}

/// Areas of the chat page.
#[derive(Debug, Clone)]
pub struct ChatLayout {
    pub messages: Rect,
    /// Input box (3 rows, bordered).
    pub input: Rect,
    /// Hint line under the input.
    pub hint: Rect,
    /// Recommendations panel, when shown.
    pub panel: Option<Rect>,
}

/// Split the chat page. `show_panel` reserves the right 40% for the
/// recommendations panel.
pub fn chat_layout(area: Rect, show_panel: bool) -> ChatLayout {
    let (conversation, panel) = if show_panel {
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        (horizontal[0], Some(horizontal[1]))
    } else {
        (area, None)
    };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(conversation);

    ChatLayout {
        messages: vertical[0],
        input: vertical[1],
        hint: vertical[2],
        panel,
    }
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the rectangle is clamped to the available space.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_area() -> Rect {
        Rect::new(0, 0, 120, 40)
    }

    #[test]
    fn layout_bars_are_one_row() {
        let layout = build_layout(test_area());
        assert_eq!(layout.status_bar.height, 1);
        assert_eq!(layout.help_bar.height, 1);
        assert_eq!(layout.main.height, 38);
        assert_eq!(layout.main.width, 120);
    }

    #[test]
    fn layout_stacks_top_to_bottom() {
        let layout = build_layout(test_area());
        assert!(layout.status_bar.y < layout.main.y);
        assert!(layout.main.y < layout.help_bar.y);
        assert_eq!(layout.help_bar.y, 39);
    }

    #[test]
    fn chat_without_panel_uses_full_width() {
        let chat = chat_layout(test_area(), false);
        assert!(chat.panel.is_none());
        assert_eq!(chat.messages.width, 120);
        assert_eq!(chat.input.height, 3);
        assert_eq!(chat.hint.height, 1);
    }

    #[test]
    fn chat_panel_takes_right_side() {
        let chat = chat_layout(test_area(), true);
        let panel = chat.panel.unwrap();
        assert!(panel.x >= chat.messages.x + chat.messages.width);
        assert!(chat.messages.width > panel.width);
        assert_eq!(panel.height, 40);
    }

    #[test]
    fn centered_rect_is_centered() {
        let area = Rect::new(0, 0, 80, 24);
        let result = centered_rect(30, 6, area);
        assert_eq!(result.width, 30);
        assert_eq!(result.height, 6);
        assert_eq!(result.x, 25);
        assert_eq!(result.y, 9);
    }

    #[test]
    fn centered_rect_clamps_to_small_area() {
        let area = Rect::new(0, 0, 10, 3);
        let result = centered_rect(30, 6, area);
        assert!(result.width <= area.width);
        assert!(result.height <= area.height);
    }

    #[test]
    fn small_terminal_still_valid() {
        let layout = build_layout(Rect::new(0, 0, 40, 10));
        for rect in [layout.status_bar, layout.main, layout.help_bar] {
            assert!(rect.width > 0 && rect.height > 0, "zero area: {:?}", rect);
        }
    }
}
