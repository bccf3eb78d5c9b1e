// Recommendations panel: one section per query, newest first. Cards in the
// latest batch are selectable for bidding.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::chat::RecommendationBatch;
use agentbay_core::product::Product;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let history = state.app.chat.visible_history();
    let lines = panel_lines(history, state.rec_selected);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Recommendations ({}) ", history.len()));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Lines for every visible batch, newest first. `selected` indexes the
/// newest batch.
pub fn panel_lines(history: &[RecommendationBatch], selected: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, batch) in history.iter().rev().enumerate() {
        let latest = i == 0;
        lines.push(Line::from(vec![
            Span::styled(
                format!("\"{}\"", batch.query),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " · {} results · {}",
                    batch.recommendations.len(),
                    batch.timestamp.format("%H:%M")
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        if batch.recommendations.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No products matched.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (j, product) in batch.recommendations.iter().enumerate() {
            lines.extend(card_lines(product, latest && j == selected));
        }
        lines.push(Line::from(""));
    }
    lines
}

/// A compact product card: title, brand/model, price line, category and tags.
pub fn card_lines(product: &Product, selected: bool) -> Vec<Line<'static>> {
    let marker = if selected { ">> " } else { "   " };
    let title_style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::raw(marker),
        Span::styled(product.title.clone(), title_style),
    ])];
    if let Some(brand_model) = product.brand_model() {
        lines.push(Line::from(Span::styled(
            format!("   {brand_model}"),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("   {}", product.price_line()),
        Style::default().fg(Color::Green),
    )));

    let mut badges = vec![Span::raw("   ")];
    if !product.category.is_empty() {
        badges.push(Span::styled(
            format!("[{}]", product.category),
            Style::default().fg(Color::Cyan),
        ));
    }
    for tag in product.tag_preview() {
        badges.push(Span::styled(
            format!(" #{tag}"),
            Style::default().fg(Color::Magenta),
        ));
    }
    lines.push(Line::from(badges));
    lines
}
