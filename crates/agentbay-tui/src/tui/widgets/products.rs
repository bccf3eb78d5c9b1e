// Products page: the full catalog as a grid of cards, with a text filter and
// a detail view listing the product's bids.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use agentbay_app::protocol::ProductDetail;
use agentbay_core::bid::{Bid, BidStatus};
use agentbay_core::product::{format_price, Product};

use crate::tui::ViewState;

pub const CARD_WIDTH: u16 = 30;
pub const CARD_HEIGHT: u16 = 7;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    if let Some(detail) = &state.app.products.detail {
        render_detail(frame, area, detail, &state.app.api_base);
        return;
    }

    let products = state.filtered_products();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(build_title(state, products.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let view = &state.app.products;
    if view.loading {
        frame.render_widget(
            Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow)),
            inner,
        );
        return;
    }
    if products.is_empty() {
        let message = match &view.error {
            Some(error) => Line::from(Span::styled(
                format!("Could not load products: {error}"),
                Style::default().fg(Color::Red),
            )),
            None if !state.filter_text.is_empty() => Line::from(Span::styled(
                "No products match the filter.",
                Style::default().fg(Color::DarkGray),
            )),
            None => Line::from(Span::styled(
                "No products listed yet.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), inner);
        return;
    }

    let columns = grid_columns(inner.width);
    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let first_row = first_visible_row(state.product_selected / columns, visible_rows);

    for (i, product) in products
        .iter()
        .enumerate()
        .skip(first_row * columns)
        .take(visible_rows * columns)
    {
        let slot = i - first_row * columns;
        let card_area = Rect {
            x: inner.x + (slot % columns) as u16 * CARD_WIDTH,
            y: inner.y + (slot / columns) as u16 * CARD_HEIGHT,
            width: CARD_WIDTH.min(inner.width),
            height: CARD_HEIGHT.min(inner.height),
        };
        let card_area = card_area.intersection(inner);
        if card_area.height < 3 {
            continue;
        }
        render_card(frame, card_area, product, i == state.product_selected);
    }
}

/// Cards per grid row for an inner width.
pub fn grid_columns(width: u16) -> usize {
    (width / CARD_WIDTH).max(1) as usize
}

/// First grid row to draw so that `selected_row` stays on screen.
pub fn first_visible_row(selected_row: usize, visible_rows: usize) -> usize {
    selected_row.saturating_sub(visible_rows.saturating_sub(1))
}

fn build_title(state: &ViewState, count: usize) -> Line<'static> {
    let mut title = format!(" All Products ({count}) ");
    if state.filter_mode || !state.filter_text.is_empty() {
        title.push_str(&format!("[filter: {}", state.filter_text));
        if state.filter_mode {
            title.push('█');
        }
        title.push_str("] ");
    }
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn render_card(frame: &mut Frame, area: Rect, product: &Product, selected: bool) {
    let border = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let paragraph = Paragraph::new(card_lines(product))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn card_lines(product: &Product) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        product.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(Span::styled(
        product.brand_model().unwrap_or_default(),
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(Span::styled(
        product.price_line(),
        Style::default().fg(Color::Green),
    )));

    let mut badges = Vec::new();
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
    lines.push(Line::from(Span::styled(
        "[b] Place Bid",
        Style::default().fg(Color::Yellow),
    )));
    lines
}

// ---------------------------------------------------------------------------
// Detail view
// ---------------------------------------------------------------------------

fn render_detail(frame: &mut Frame, area: Rect, detail: &ProductDetail, api_base: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(3)])
        .split(area);

    let info = Paragraph::new(detail_lines(detail, api_base))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!(" {} ", detail.product.title),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(info, chunks[0]);

    let bids_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Bids ({}) ", detail.bids.len()));

    if detail.loading || detail.bids.is_empty() || detail.error.is_some() {
        let message = if detail.loading {
            Span::styled("Loading bids...", Style::default().fg(Color::Yellow))
        } else if let Some(error) = &detail.error {
            Span::styled(
                format!("Could not load bids: {error}"),
                Style::default().fg(Color::Red),
            )
        } else {
            Span::styled("No bids yet.", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(Line::from(message)).block(bids_block), chunks[1]);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Bidder"),
        Cell::from("Amount"),
        Cell::from("Status"),
        Cell::from("Placed"),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = detail
        .bids
        .iter()
        .map(|bid| {
            Row::new(vec![
                Cell::from(bid.user_id.clone()),
                Cell::from(format_price(bid.amount)),
                Cell::from(bid.status.to_string()),
                Cell::from(
                    bid.timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "--".to_string()),
                ),
            ])
            .style(Style::default().fg(status_color(bid.status)))
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(17),
    ];
    let table = Table::new(rows, widths).header(header).block(bids_block);
    frame.render_widget(table, chunks[1]);
}

pub fn detail_lines(detail: &ProductDetail, api_base: &str) -> Vec<Line<'static>> {
    let product = &detail.product;
    let label = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();

    if let Some(brand_model) = product.brand_model() {
        lines.push(Line::from(brand_model));
    }
    lines.push(Line::from(vec![
        Span::styled("Condition: ", label),
        Span::raw(product.condition.clone()),
        Span::styled("   Category: ", label),
        Span::raw(product.category.clone()),
    ]));
    lines.push(Line::from(Span::styled(
        product.price_line(),
        Style::default().fg(Color::Green),
    )));
    lines.push(Line::from(vec![
        Span::styled("Highest bid: ", label),
        Span::raw(highest_label(detail.highest.as_ref())),
    ]));
    if !product.tags.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Tags: ", label),
            Span::raw(product.tags.join(", ")),
        ]));
    }
    if let Some(url) = product.resolve_image_url(api_base) {
        lines.push(Line::from(vec![
            Span::styled("Image: ", label),
            Span::styled(url, Style::default().fg(Color::Blue)),
        ]));
    }
    lines.push(Line::from(product.description.clone()));
    lines
}

pub fn highest_label(highest: Option<&Bid>) -> String {
    match highest {
        Some(bid) => format!("{} by {}", format_price(bid.amount), bid.user_id),
        None => "No bids yet".to_string(),
    }
}

pub(crate) fn status_color(status: BidStatus) -> Color {
    match status {
        BidStatus::Winning | BidStatus::Won => Color::Green,
        BidStatus::Active => Color::White,
        BidStatus::Outbid | BidStatus::Lost => Color::DarkGray,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
