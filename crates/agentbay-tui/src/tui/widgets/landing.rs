// Landing page: hero, features, featured products, categories, how it
// works, call to action and footer. Scrolls as one long paragraph.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_core::catalog::FeaturedProduct;
use agentbay_core::product::format_price;

use crate::tui::ViewState;

const FEATURES: [(&str, &str); 3] = [
    (
        "Smart Photo Upload",
        "Snap a photo and our AI writes the title, description and price for you.",
    ),
    (
        "Voice & Text Search",
        "Describe what you want in plain words and get matched recommendations.",
    ),
    (
        "Scam Detection",
        "Listings and bids are checked so you can trade with confidence.",
    ),
];

const STEPS: [(&str, &str); 3] = [
    ("Tell us what you need", "Chat with the assistant or upload a photo."),
    ("AI does the work", "Recommendations and listings are generated for you."),
    ("Bid and sell", "Place bids or publish your listing in seconds."),
];

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = landing_lines(state);
    let max_scroll = lines.len().saturating_sub(1);
    let scroll = state
        .scroll_offset
        .get("landing")
        .copied()
        .unwrap_or(0)
        .min(max_scroll) as u16;

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

pub fn landing_lines(state: &ViewState) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Buy & Sell with AI Intelligence",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            "The marketplace where an AI assistant finds, lists and prices for you.",
            Style::default().fg(Color::Gray),
        ))
        .alignment(Alignment::Center),
        Line::from(vec![
            Span::styled("[s] Start Selling", Style::default().fg(Color::Green)),
            Span::raw("    "),
            Span::styled("[Enter] Shop Now", Style::default().fg(Color::Yellow)),
        ])
        .alignment(Alignment::Center),
    ];

    if let Some(account) = &state.app.account {
        lines.push(
            Line::from(Span::styled(
                format!("Welcome back, {}!", account.display_name()),
                Style::default().fg(Color::Green),
            ))
            .alignment(Alignment::Center),
        );
    }

    lines.push(Line::from(""));
    lines.push(heading("Why AgentBay"));
    for (title, body) in FEATURES {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {title}: "),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(body),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Featured Products"));
    if state.app.featured.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No featured products right now.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend(state.app.featured.iter().map(featured_line));

    if !state.app.categories.is_empty() {
        lines.push(Line::from(""));
        lines.push(heading("Shop by Category"));
        let badges: Vec<Span> = state
            .app
            .categories
            .iter()
            .flat_map(|(name, count)| {
                [
                    Span::styled(
                        format!(" {name} ({count}) "),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();
        let mut badge_line = vec![Span::raw("  ")];
        badge_line.extend(badges);
        lines.push(Line::from(badge_line));
    }

    lines.push(Line::from(""));
    lines.push(heading("How It Works"));
    for (i, (title, body)) in STEPS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {}. {title}: ", i + 1),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(*body),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Start Selling Today"));
    lines.push(Line::from(vec![
        Span::raw("  Join buyers and sellers trading smarter.  "),
        Span::styled("[l] Create a Listing", Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled("[p] Browse Products", Style::default().fg(Color::Yellow)),
    ]));

    lines.push(Line::from(""));
    lines.push(
        Line::from(Span::styled(
            "AgentBay · AI-powered marketplace · Terms · Privacy",
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center),
    );
    lines
}

/// One featured product: title, price, strike price and discount, rating.
pub fn featured_line(item: &FeaturedProduct) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("  {:<32} ", item.title)),
        Span::styled(
            format_price(item.price),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    let discount = item.discount_pct();
    if discount > 0 {
        spans.push(Span::styled(
            format!(" {}", format_price(item.original_price)),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        ));
        spans.push(Span::styled(
            format!(" -{discount}%"),
            Style::default().fg(Color::Red),
        ));
    }

    spans.push(Span::styled(
        format!("  ★ {:.1} ({})", item.rating, item.reviews),
        Style::default().fg(Color::Yellow),
    ));
    spans.push(Span::styled(
        format!("  [{}]", item.category),
        Style::default().fg(Color::Cyan),
    ));
    if item.wishlisted {
        spans.push(Span::styled(" ♥", Style::default().fg(Color::Magenta)));
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
