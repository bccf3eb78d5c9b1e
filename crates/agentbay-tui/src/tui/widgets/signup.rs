// Sign Up page.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use agentbay_core::account::{SignupForm, UserType};

use crate::tui::layout::centered_rect;
use crate::tui::{SignupField, ViewState};

const FORM_WIDTH: u16 = 64;
const FORM_HEIGHT: u16 = 18;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let form_area = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);
    frame.render_widget(Clear, form_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Join AgentBay and start trading with AI.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(&state.signup, state.signup_field));
    lines.push(Line::from(""));
    if let Some(error) = &state.form_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(submit_line(state.signup.can_submit()));
    lines.push(Line::from(Span::styled(
        "Already have an account? [Ctrl+O] Sign in",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " Create your account ",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, form_area);
}

pub fn form_lines(form: &SignupForm, focus: SignupField) -> Vec<Line<'static>> {
    vec![
        input_line("First name", &form.first_name, focus == SignupField::FirstName),
        input_line("Last name", &form.last_name, focus == SignupField::LastName),
        input_line("Email", &form.email, focus == SignupField::Email),
        input_line(
            "Password",
            &mask(&form.password),
            focus == SignupField::Password,
        ),
        input_line(
            "Confirm",
            &mask(&form.confirm_password),
            focus == SignupField::ConfirmPassword,
        ),
        user_type_line(form.user_type, focus == SignupField::UserType),
        terms_line(form.agree_to_terms, focus == SignupField::Terms),
    ]
}

pub fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

pub fn field_label(label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(format!("{:>12}: ", label), style)
}

pub fn input_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![field_label(label, focused), Span::raw(value.to_string())];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Gray)));
    }
    Line::from(spans)
}

pub fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn user_type_line(user_type: UserType, focused: bool) -> Line<'static> {
    let mut spans = vec![field_label("I want to", focused)];
    for option in [UserType::Buyer, UserType::Seller] {
        let marker = if option == user_type { "(•)" } else { "( )" };
        spans.push(Span::raw(format!("{marker} {option}  ")));
    }
    Line::from(spans)
}

fn terms_line(agreed: bool, focused: bool) -> Line<'static> {
    Line::from(vec![
        field_label("Terms", focused),
        Span::raw(format!(
            "{} I agree to the Terms of Service and Privacy Policy",
            checkbox(agreed)
        )),
    ])
}

fn submit_line(enabled: bool) -> Line<'static> {
    let style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Line::from(Span::styled(" [Enter] Create Account ", style))
}
