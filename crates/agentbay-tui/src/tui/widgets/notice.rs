// Notice overlay: the toast shown after bids, publishing, sign-in and
// failures. Anchored to the top-right corner of the page.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::protocol::{Notice, NoticeLevel};

const NOTICE_WIDTH: u16 = 44;

pub fn render(frame: &mut Frame, area: Rect, notice: &Notice) {
    let notice_area = notice_rect(area, &notice.body);
    if notice_area.width == 0 || notice_area.height == 0 {
        return;
    }
    frame.render_widget(Clear, notice_area);

    let color = level_color(notice.level);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", notice.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(Line::from(notice.body.as_str()))
        .block(block)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, notice_area);
}

pub fn level_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Error => Color::Red,
    }
}

/// Top-right box tall enough for `body` wrapped to the notice width.
fn notice_rect(area: Rect, body: &str) -> Rect {
    let width = NOTICE_WIDTH.min(area.width);
    let inner = width.saturating_sub(2).max(1) as usize;
    let lines = u16::try_from(body.chars().count().div_ceil(inner).max(1)).unwrap_or(u16::MAX);
    let height = lines.saturating_add(2).min(area.height);
    Rect {
        x: area.x + area.width - width,
        y: area.y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_colors() {
        assert_eq!(level_color(NoticeLevel::Success), Color::Green);
        assert_eq!(level_color(NoticeLevel::Error), Color::Red);
        assert_eq!(level_color(NoticeLevel::Info), Color::Cyan);
    }

    #[test]
    fn notice_rect_sits_top_right() {
        let area = Rect::new(0, 1, 100, 30);
        let rect = notice_rect(area, "short");
        assert_eq!(rect.x + rect.width, 100);
        assert_eq!(rect.y, 1);
        assert_eq!(rect.height, 3);

        let long = "x".repeat(100);
        assert_eq!(notice_rect(area, &long).height, 5);
    }

    #[test]
    fn notice_rect_clamps_to_area() {
        let rect = notice_rect(Rect::new(0, 0, 20, 2), &"y".repeat(200));
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 2);
    }

    #[test]
    fn render_shows_title_and_body() {
        let backend = ratatui::backend::TestBackend::new(80, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let notice = Notice::success("Listing Published", "Your product is live");
        terminal
            .draw(|frame| render(frame, frame.area(), &notice))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Listing Published"));
        assert!(text.contains("Your product is live"));
    }
}
