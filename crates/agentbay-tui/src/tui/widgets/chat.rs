// Chat page: mode selection cards, then the conversation with the input box
// and, once there are results, the recommendations panel.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::chat::{ChatMode, ChatSession};

use crate::tui::layout::chat_layout;
use crate::tui::widgets::recommendations;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let chat = &state.app.chat;
    if chat.mode == ChatMode::Selection {
        render_selection(frame, area, state);
        return;
    }

    let layout = chat_layout(area, chat.show_panel() && !chat.panel_collapsed);
    render_messages(frame, layout.messages, chat);
    render_input(frame, layout.input, state);

    let hint = Paragraph::new(Line::from(Span::styled(
        chat.hint(),
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(hint, layout.hint);

    if let Some(panel) = layout.panel {
        recommendations::render(frame, panel, state);
    }
}

// ---------------------------------------------------------------------------
// Mode selection
// ---------------------------------------------------------------------------

fn render_selection(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ", ChatMode::Selection.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(0),
        ])
        .split(inner);

    let intro = Paragraph::new("What would you like to do today?")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(intro, rows[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[1]);

    let options = [
        (
            "[1] I want to Buy",
            ChatMode::Buyer.title(),
            "Find products with AI recommendations",
            Color::Yellow,
        ),
        (
            "[2] I want to Sell",
            ChatMode::Seller.title(),
            "Create listings with AI help",
            Color::Green,
        ),
        (
            "[3] View All Products",
            "Browse",
            "See everything up for bidding",
            Color::Cyan,
        ),
    ];
    for (card_area, (label, title, body, color)) in cards.iter().zip(options) {
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(body, Style::default().fg(Color::Gray))),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))
                .title(format!(" {title} ")),
        );
        frame.render_widget(card, *card_area);
    }

    let recent = Paragraph::new(recent_search_lines(&state.app.recent_searches)).block(
        Block::default()
            .borders(Borders::TOP)
            .title(" Recent Searches "),
    );
    frame.render_widget(recent, rows[2]);
}

pub fn recent_search_lines(searches: &[String]) -> Vec<Line<'static>> {
    if searches.is_empty() {
        return vec![Line::from(Span::styled(
            "No searches yet.",
            Style::default().fg(Color::DarkGray),
        ))];
    }
    searches
        .iter()
        .map(|q| Line::from(format!("  • {q}")))
        .collect()
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Scroll offset that shows the last `viewport` of `height` rows. Saturates
/// at `u16::MAX` for very long conversations.
pub fn bottom_scroll(height: usize, viewport: u16) -> u16 {
    u16::try_from(height.saturating_sub(viewport as usize)).unwrap_or(u16::MAX)
}

fn render_messages(frame: &mut Frame, area: Rect, chat: &ChatSession) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} · {} ", chat.mode.title(), chat.mode.assistant_name()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);

    let lines = message_lines(chat);
    // Keep the newest messages in view.
    let height = wrapped_height(&lines, inner.width);
    let scroll = bottom_scroll(height, inner.height);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

pub fn message_lines(chat: &ChatSession) -> Vec<Line<'static>> {
    if chat.messages.is_empty() {
        let welcome = match chat.mode {
            ChatMode::Seller => "What are you selling today?",
            _ => "What are you looking for today?",
        };
        return vec![
            Line::from(""),
            Line::from(Span::styled(
                welcome,
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            Line::from(Span::styled(chat.hint(), Style::default().fg(Color::Gray)))
                .alignment(Alignment::Center),
        ];
    }

    let mut lines = Vec::new();
    for message in &chat.messages {
        let (who, color) = if message.is_user {
            ("You", Color::Cyan)
        } else {
            (chat.mode.assistant_name(), Color::Green)
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{who} "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                message.timestamp.format("%H:%M").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(message.text.clone()));
        lines.push(Line::from(""));
    }
    if chat.is_loading {
        lines.push(Line::from(Span::styled(
            "Thinking...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|l| l.width().div_ceil(width).max(1))
        .sum()
}

fn render_input(frame: &mut Frame, area: Rect, state: &ViewState) {
    let chat = &state.app.chat;
    let mut title = vec![Span::raw(" Message ")];
    if chat.listening {
        title.push(Span::styled(
            "● Listening... ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let content = if state.chat_input.is_empty() {
        Line::from(Span::styled(
            chat.placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::raw(state.chat_input.clone()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ])
    };

    let border = if chat.is_loading {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Line::from(title)),
    );
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
