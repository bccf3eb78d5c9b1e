// "Place a Bid" dialog overlay, shared by the chat and products pages.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::chat::BidDialog;
use agentbay_core::product::format_price;

use crate::tui::layout::centered_rect;
use crate::tui::{BidField, ViewState};

const DIALOG_WIDTH: u16 = 56;
const DIALOG_HEIGHT: u16 = 13;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(dialog) = &state.app.chat.bid_dialog else {
        return;
    };
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            " Place a Bid ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(dialog_lines(dialog, state))
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

pub fn dialog_lines(dialog: &BidDialog, state: &ViewState) -> Vec<Line<'static>> {
    let product = &dialog.product;
    let current = match product.current_bid {
        Some(bid) if bid > 0.0 => format_price(bid),
        _ => "No bids yet".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            product.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Current bid: ", Style::default().fg(Color::Gray)),
            Span::raw(current),
        ]),
        Line::from(vec![
            Span::styled("Minimum bid: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_price(product.min_next_bid()),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        field_line(
            "Your Name",
            &state.bid_form.user_id,
            state.bid_field == BidField::Name,
        ),
        field_line(
            "Bid Amount ($)",
            &state.bid_form.amount,
            state.bid_field == BidField::Amount,
        ),
        Line::from(""),
    ];

    if let Some(error) = &dialog.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(if dialog.submitting {
        Line::from(Span::styled(
            "Placing Bid...",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "[Enter] Place Bid   [Esc] Cancel",
            Style::default().fg(Color::DarkGray),
        ))
    });
    lines
}

/// `Label: value` with a cursor on the focused field.
pub fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let mut spans = vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value.to_string()),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}
