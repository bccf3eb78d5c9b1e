// "My Bids" overlay: the bidder's bids on the marketplace and the local bid
// log.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::protocol::MyBidsView;
use agentbay_core::product::{format_price, Product};

use super::products::status_color;
use crate::tui::layout::centered_rect;
use crate::tui::ViewState;

const DIALOG_WIDTH: u16 = 64;
const DIALOG_HEIGHT: u16 = 20;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let view = &state.app.my_bids;
    if !view.open {
        return;
    }
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);
    frame.render_widget(Clear, dialog_area);

    let title = match &view.bidder {
        Some(bidder) => format!(" My Bids ({bidder}) "),
        None => " My Bids ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(bid_lines(view, &state.app.products.items))
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}

fn heading(text: String) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn dim(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

/// Catalog title for a backend product id, when the catalog has it loaded.
fn product_label(product_id: &str, catalog: &[Product]) -> String {
    catalog
        .iter()
        .find(|p| p.id.is_some_and(|id| id.to_string() == product_id))
        .map(|p| p.title.clone())
        .unwrap_or_else(|| format!("Product #{product_id}"))
}

pub fn bid_lines(view: &MyBidsView, catalog: &[Product]) -> Vec<Line<'static>> {
    let mut lines = vec![heading(format!("On the marketplace ({})", view.remote_count))];
    if view.bidder.is_none() {
        lines.push(dim("Sign in or place a bid to see your marketplace bids."));
    } else if view.loading {
        lines.push(dim("Loading..."));
    } else if let Some(error) = &view.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if view.remote.is_empty() {
        lines.push(dim("No bids yet."));
    } else {
        for bid in &view.remote {
            lines.push(Line::from(vec![
                Span::raw(format!(
                    "  {:<28} {:>10}  ",
                    product_label(&bid.product_id, catalog),
                    format_price(bid.amount)
                )),
                Span::styled(
                    bid.status.to_string(),
                    Style::default().fg(status_color(bid.status)),
                ),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(heading(format!("Placed from this terminal ({})", view.local.len())));
    if view.local.is_empty() {
        lines.push(dim("No bids logged."));
    }
    for logged in &view.local {
        lines.push(Line::from(vec![
            Span::raw(format!(
                "  {:<28} {:>10}  ",
                logged.product_title,
                format_price(logged.amount)
            )),
            Span::styled(
                logged.placed_at.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbay_core::bid::{Bid, BidStatus};
    use agentbay_core::db::LoggedBid;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(view: &MyBidsView, catalog: &[Product]) -> Vec<String> {
        bid_lines(view, catalog).iter().map(line_text).collect()
    }

    #[test]
    fn no_bidder_explains_how_to_get_one() {
        let view = MyBidsView {
            open: true,
            ..Default::default()
        };
        let texts = texts(&view, &[]);
        assert_eq!(texts[0], "On the marketplace (0)");
        assert!(texts[1].starts_with("Sign in or place a bid"));
        assert_eq!(texts[4], "No bids logged.");
    }

    #[test]
    fn remote_bids_use_catalog_titles() {
        let view = MyBidsView {
            open: true,
            bidder: Some("sam".into()),
            remote: vec![
                Bid {
                    bid_id: None,
                    user_id: "sam".into(),
                    product_id: "1".into(),
                    amount: 55.0,
                    timestamp: None,
                    status: BidStatus::Winning,
                    is_auto_bid: false,
                    max_auto_bid: None,
                },
                Bid {
                    bid_id: None,
                    user_id: "sam".into(),
                    product_id: "9".into(),
                    amount: 12.0,
                    timestamp: None,
                    status: BidStatus::Outbid,
                    is_auto_bid: false,
                    max_auto_bid: None,
                },
            ],
            remote_count: 2,
            local: vec![LoggedBid {
                bid_id: "b-1".into(),
                product_id: 1,
                product_title: "Headphones".into(),
                user_id: "sam".into(),
                amount: 55.0,
                placed_at: "2024-05-01 10:00:00".into(),
            }],
            ..Default::default()
        };
        let catalog = [crate::tui::tests::product(1, "Headphones")];
        let lines = bid_lines(&view, &catalog);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts[0], "On the marketplace (2)");
        assert!(texts[1].starts_with("  Headphones "));
        assert!(texts[1].ends_with("winning"));
        assert_eq!(lines[1].spans[1].style.fg, Some(Color::Green));
        assert!(texts[2].starts_with("  Product #9 "));
        assert_eq!(texts[4], "Placed from this terminal (1)");
        assert!(texts[5].ends_with("2024-05-01 10:00:00"));
    }

    #[test]
    fn loading_and_error_states() {
        let mut view = MyBidsView {
            open: true,
            bidder: Some("sam".into()),
            loading: true,
            ..Default::default()
        };
        assert_eq!(texts(&view, &[])[1], "Loading...");
        view.loading = false;
        view.error = Some("backend unreachable".into());
        assert_eq!(texts(&view, &[])[1], "backend unreachable");
    }

    #[test]
    fn render_only_when_open() {
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.app.my_bids.open = true;
        state.app.my_bids.bidder = Some("sam".into());
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("My Bids (sam)"));
    }
}
