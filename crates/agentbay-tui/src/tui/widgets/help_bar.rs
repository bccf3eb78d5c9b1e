// Help bar widget: keyboard shortcuts for the current page or overlay.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use agentbay_app::chat::ChatMode;
use agentbay_app::protocol::Page;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();
    for (key, action) in hints(state) {
        spans.push(Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {action}  "),
            Style::default().fg(Color::Gray),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// `(key, action)` pairs for whatever currently has the keyboard.
pub fn hints(state: &ViewState) -> Vec<(&'static str, &'static str)> {
    if state.confirm_quit {
        return vec![("y", "Quit"), ("n", "Cancel")];
    }
    if state.app.chat.bid_dialog.is_some() {
        return vec![("Tab", "Next field"), ("Enter", "Place Bid"), ("Esc", "Cancel")];
    }
    if state.app.my_bids.open {
        return vec![("Esc", "Close"), ("q", "Quit")];
    }

    match state.page() {
        Page::Landing => {
            let mut hints = vec![
                ("Enter", "Get Started"),
                ("p", "Products"),
                ("l", "Sell"),
                ("m", "My Bids"),
            ];
            if state.app.account.is_some() {
                hints.push(("o", "Sign Out"));
            } else {
                hints.push(("i", "Sign In"));
                hints.push(("u", "Sign Up"));
            }
            hints.push(("q", "Quit"));
            hints
        }
        Page::Chat if state.app.chat.mode == ChatMode::Selection => vec![
            ("1", "Buyer"),
            ("2", "Seller"),
            ("3", "All Products"),
            ("Esc", "Home"),
        ],
        Page::Chat => vec![
            ("Enter", "Send"),
            ("Ctrl+T", "Voice"),
            ("Tab", "Panel"),
            ("Ctrl+B", "Bid"),
            ("Esc", "Back"),
        ],
        Page::Products if state.filter_mode => vec![("Enter", "Keep filter"), ("Esc", "Clear")],
        Page::Products if state.app.products.detail.is_some() => {
            vec![("b", "Place Bid"), ("Esc", "Back")]
        }
        Page::Products => vec![
            ("Enter", "Details"),
            ("b", "Bid"),
            ("/", "Filter"),
            ("r", "Refresh"),
            ("m", "My Bids"),
            ("Esc", "Home"),
        ],
        Page::Listing => vec![
            ("Tab", "Next field"),
            ("Ctrl+G", "Generate"),
            ("Ctrl+S", "Save draft"),
            ("Ctrl+P", "Publish"),
            ("Esc", "Home"),
        ],
        Page::Signup => vec![
            ("Tab", "Next field"),
            ("Space", "Toggle"),
            ("Enter", "Create Account"),
            ("Ctrl+O", "Sign In"),
            ("Esc", "Home"),
        ],
        Page::Signin => vec![
            ("Tab", "Next field"),
            ("Enter", "Sign In"),
            ("Ctrl+O", "Sign Up"),
            ("Esc", "Home"),
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use agentbay_app::protocol::AppSnapshot;

    fn on_page(page: Page) -> ViewState {
        let mut state = ViewState::default();
        state.apply_snapshot(AppSnapshot {
            page,
            ..Default::default()
        });
        state
    }

    #[test]
    fn quit_confirm_overrides_page_hints() {
        let mut state = on_page(Page::Listing);
        state.confirm_quit = true;
        assert_eq!(hints(&state), vec![("y", "Quit"), ("n", "Cancel")]);
    }

    #[test]
    fn my_bids_overlay_takes_the_keyboard() {
        let mut state = on_page(Page::Products);
        assert!(hints(&state).contains(&("m", "My Bids")));
        state.app.my_bids.open = true;
        assert_eq!(hints(&state), vec![("Esc", "Close"), ("q", "Quit")]);
    }

    #[test]
    fn chat_hints_follow_mode() {
        let mut state = on_page(Page::Chat);
        assert_eq!(hints(&state)[0], ("1", "Buyer"));
        state.app.chat.select_mode(ChatMode::Buyer);
        assert_eq!(hints(&state)[0], ("Enter", "Send"));
    }

    #[test]
    fn landing_hints_follow_account() {
        let state = on_page(Page::Landing);
        assert!(hints(&state).contains(&("i", "Sign In")));
        assert!(!hints(&state).contains(&("o", "Sign Out")));
    }

    #[test]
    fn render_does_not_panic_on_every_page() {
        for page in [Page::Landing, Page::Products, Page::Signup, Page::Signin] {
            let backend = ratatui::backend::TestBackend::new(80, 1);
            let mut terminal = ratatui::Terminal::new(backend).unwrap();
            let state = on_page(page);
            terminal
                .draw(|frame| render(frame, frame.area(), &state))
                .unwrap();
        }
    }
}
