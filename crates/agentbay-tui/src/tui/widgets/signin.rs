// Sign In page.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_core::account::SigninForm;

use super::signup::{checkbox, field_label, input_line, mask};
use crate::tui::layout::centered_rect;
use crate::tui::{SigninField, ViewState};

const FORM_WIDTH: u16 = 56;
const FORM_HEIGHT: u16 = 12;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let form_area = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);
    frame.render_widget(Clear, form_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Welcome back to AgentBay.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(&state.signin, state.signin_field));
    lines.push(Line::from(""));
    if let Some(error) = &state.form_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        " [Enter] Sign In ",
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        "New here? [Ctrl+O] Create an account",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " Sign in ",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, form_area);
}

pub fn form_lines(form: &SigninForm, focus: SigninField) -> Vec<Line<'static>> {
    vec![
        input_line("Email", &form.email, focus == SigninField::Email),
        input_line(
            "Password",
            &mask(&form.password),
            focus == SigninField::Password,
        ),
        Line::from(vec![
            field_label("Remember me", focus == SigninField::RememberMe),
            Span::raw(checkbox(form.remember_me)),
        ]),
    ]
}
