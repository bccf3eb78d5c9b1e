// Create Listing page: image path, the listing fields and the AI generate,
// save draft and publish actions.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_app::protocol::ListingView;
use agentbay_core::listing::{ListingForm, CATEGORIES};

use crate::tui::{ListingField, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(4)])
        .split(area);

    let form = Paragraph::new(form_lines(&state.listing_form, state.listing_field))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " Create Listing ",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(form, chunks[0]);

    let status = Paragraph::new(status_lines(&state.app.listing))
        .block(Block::default().borders(Borders::ALL).title(" Actions "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);
}

pub fn form_lines(form: &ListingForm, focus: ListingField) -> Vec<Line<'static>> {
    let image = form
        .image_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut lines = vec![
        text_field(
            "Photo (path)",
            &image,
            "path/to/photo.jpg",
            focus == ListingField::Image,
        ),
        Line::from(""),
        text_field(
            "Title",
            &form.title,
            "What are you selling?",
            focus == ListingField::Title,
        ),
        text_field(
            "Description",
            &form.description,
            "Condition, features, history...",
            focus == ListingField::Description,
        ),
    ];
    lines.push(category_line(&form.category, focus == ListingField::Category));
    lines.push(text_field(
        "Tags",
        &form.tags,
        "vintage, leather, size 10",
        focus == ListingField::Tags,
    ));
    lines.push(text_field(
        "Price ($)",
        &form.price,
        "0.00",
        focus == ListingField::Price,
    ));
    lines
}

fn label_span(label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(format!("{:>14}: ", label), style)
}

fn text_field(label: &str, value: &str, placeholder: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![label_span(label, focused)];
    if value.is_empty() {
        spans.push(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw(value.to_string()));
    }
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

/// Category selector: every option, the chosen one highlighted.
fn category_line(selected: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![label_span("Category", focused)];
    for category in CATEGORIES {
        let style = if category == selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {category} "), style));
        spans.push(Span::raw(" "));
    }
    if selected.is_empty() {
        spans.push(Span::styled(
            "(Select a category)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

pub fn status_lines(view: &ListingView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if view.generating {
        lines.push(Line::from(Span::styled(
            "Generating listing from your photo...",
            Style::default().fg(Color::Yellow),
        )));
    } else if view.publishing {
        lines.push(Line::from(Span::styled(
            "Publishing...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &view.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if view.draft_saved {
        lines.push(Line::from(Span::styled(
            "Draft saved.",
            Style::default().fg(Color::Green),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "[Ctrl+G] Generate with AI   [Ctrl+S] Save as Draft   [Ctrl+P] Publish Listing",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}
