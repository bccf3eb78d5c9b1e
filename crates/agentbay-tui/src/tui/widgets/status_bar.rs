// Status bar widget: brand, page tabs, signed-in account.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use agentbay_app::protocol::Page;
use agentbay_core::account::Account;

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [brand] [page tabs] [account]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![
        Span::styled(
            " AgentBay ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    spans.extend(page_spans(state.page()));

    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.push(account_span(state.app.account.as_ref()));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Page indicators with the current page highlighted.
pub fn page_spans(active: Page) -> Vec<Span<'static>> {
    let pages = [Page::Landing, Page::Chat, Page::Products, Page::Listing];

    let mut spans = Vec::new();
    for page in pages {
        let style = if page == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}]", page.title()), style));
        spans.push(Span::raw(" "));
    }
    // Account pages only appear while open
    if matches!(active, Page::Signup | Page::Signin) {
        spans.push(Span::styled(
            format!("[{}]", active.title()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans
}

pub fn account_span(account: Option<&Account>) -> Span<'static> {
    match account {
        Some(account) => Span::styled(
            format!("{} ({})", account.display_name(), account.user_type.as_str()),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled("Guest", Style::default().fg(Color::DarkGray)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
