// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (typing into forms,
// moving focus and selection, filtering).

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use agentbay_app::chat::ChatMode;
use agentbay_app::protocol::{Page, UserCommand};
use agentbay_core::form::FormError;

use super::{cycle, BidField, ListingField, SigninField, SignupField, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally by
/// mutating `ViewState`.
pub fn handle_key(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if is_ctrl(&key_event, 'c') {
        return Some(UserCommand::Quit);
    }

    if state.confirm_quit {
        return handle_confirm_quit(key_event, state);
    }

    if state.notice.is_some() && key_event.code == KeyCode::Esc {
        state.dismiss_notice();
        return None;
    }

    if state.app.chat.bid_dialog.is_some() {
        return handle_bid_dialog(key_event, state);
    }

    if state.app.my_bids.open {
        return match key_event.code {
            KeyCode::Esc | KeyCode::Char('m') => Some(UserCommand::CloseMyBids),
            KeyCode::Char('q') => {
                state.confirm_quit = true;
                None
            }
            _ => None,
        };
    }

    match state.page() {
        Page::Landing => handle_landing(key_event, state),
        Page::Chat => handle_chat(key_event, state),
        Page::Products => handle_products(key_event, state),
        Page::Listing => handle_listing(key_event, state),
        Page::Signup => handle_signup(key_event, state),
        Page::Signin => handle_signin(key_event, state),
    }
}

fn is_ctrl(key_event: &KeyEvent, c: char) -> bool {
    key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char(c)
}

/// Apply a printable character or backspace to `buf`. Returns whether the
/// buffer changed.
fn edit_text(buf: &mut String, key_event: &KeyEvent) -> bool {
    if key_event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return false;
    }
    match key_event.code {
        KeyCode::Char(c) => {
            buf.push(c);
            true
        }
        KeyCode::Backspace => buf.pop().is_some(),
        _ => false,
    }
}

/// In quit confirmation mode `y`/`q` confirm, `n`/Esc cancel and all other
/// keys are blocked.
fn handle_confirm_quit(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Landing
// ---------------------------------------------------------------------------

fn handle_landing(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        // Get Started / Shop Now / Start Selling all open the assistant
        KeyCode::Enter | KeyCode::Char('g') | KeyCode::Char('s') => {
            Some(UserCommand::Navigate(Page::Chat))
        }
        KeyCode::Char('p') => Some(UserCommand::Navigate(Page::Products)),
        KeyCode::Char('l') => Some(UserCommand::Navigate(Page::Listing)),
        KeyCode::Char('i') => Some(UserCommand::Navigate(Page::Signin)),
        KeyCode::Char('u') => Some(UserCommand::Navigate(Page::Signup)),
        KeyCode::Char('o') if state.app.account.is_some() => Some(UserCommand::SignOut),
        KeyCode::Char('m') => Some(UserCommand::OpenMyBids),
        KeyCode::Up | KeyCode::Char('k') => {
            scroll(state, "landing", -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            scroll(state, "landing", 1);
            None
        }
        KeyCode::Char('q') => {
            state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn scroll(state: &mut ViewState, key: &str, delta: isize) {
    let offset = state.scroll_offset.entry(key.to_string()).or_insert(0);
    *offset = offset.saturating_add_signed(delta);
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

fn handle_chat(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    if state.app.chat.mode == ChatMode::Selection {
        return match key_event.code {
            KeyCode::Char('1') | KeyCode::Char('b') => {
                Some(UserCommand::SelectMode(ChatMode::Buyer))
            }
            KeyCode::Char('2') | KeyCode::Char('s') => {
                Some(UserCommand::SelectMode(ChatMode::Seller))
            }
            KeyCode::Char('3') | KeyCode::Char('p') => Some(UserCommand::Navigate(Page::Products)),
            KeyCode::Esc => Some(UserCommand::Navigate(Page::Landing)),
            KeyCode::Char('q') => {
                state.confirm_quit = true;
                None
            }
            _ => None,
        };
    }

    if is_ctrl(&key_event, 't') {
        return Some(UserCommand::ToggleListening);
    }
    if is_ctrl(&key_event, 'b') {
        return state
            .selected_recommendation()
            .cloned()
            .map(|p| UserCommand::OpenBidDialog(Box::new(p)));
    }

    match key_event.code {
        KeyCode::Esc => Some(UserCommand::ResetChat),
        KeyCode::Enter => {
            if state.chat_input.trim().is_empty() || state.app.chat.is_loading {
                None
            } else {
                Some(UserCommand::SubmitQuery(state.chat_input.clone()))
            }
        }
        KeyCode::Tab => Some(UserCommand::TogglePanel),
        KeyCode::Up => {
            state.rec_selected = state.rec_selected.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            let len = state.app.chat.recommendations.len();
            if state.rec_selected + 1 < len {
                state.rec_selected += 1;
            }
            None
        }
        _ => {
            if edit_text(&mut state.chat_input, &key_event) && state.app.chat.listening {
                // Typing stops voice input.
                Some(UserCommand::EditChatInput(state.chat_input.clone()))
            } else {
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Bid dialog
// ---------------------------------------------------------------------------

fn handle_bid_dialog(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    let submitting = state
        .app
        .chat
        .bid_dialog
        .as_ref()
        .is_some_and(|d| d.submitting);

    match key_event.code {
        KeyCode::Esc => Some(UserCommand::CloseBidDialog),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            state.bid_field = match state.bid_field {
                BidField::Name => BidField::Amount,
                BidField::Amount => BidField::Name,
            };
            None
        }
        KeyCode::Enter if !submitting => Some(UserCommand::SubmitBid(state.bid_form.clone())),
        _ => {
            let buf = match state.bid_field {
                BidField::Name => &mut state.bid_form.user_id,
                BidField::Amount => &mut state.bid_form.amount,
            };
            edit_text(buf, &key_event);
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

fn handle_products(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    if state.filter_mode {
        return handle_filter_mode(key_event, state);
    }

    if let Some(detail) = &state.app.products.detail {
        return match key_event.code {
            KeyCode::Esc => Some(UserCommand::CloseProductDetail),
            KeyCode::Char('b') => Some(UserCommand::OpenBidDialog(Box::new(
                detail.product.clone(),
            ))),
            KeyCode::Char('q') => {
                state.confirm_quit = true;
                None
            }
            _ => None,
        };
    }

    match key_event.code {
        KeyCode::Char('/') => {
            state.filter_mode = true;
            None
        }
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('h') => {
            state.product_selected = state.product_selected.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => {
            let len = state.filtered_products().len();
            if state.product_selected + 1 < len {
                state.product_selected += 1;
            }
            None
        }
        KeyCode::Enter => state
            .selected_product()
            .and_then(|p| p.id)
            .map(UserCommand::OpenProductDetail),
        KeyCode::Char('b') => state
            .selected_product()
            .cloned()
            .map(|p| UserCommand::OpenBidDialog(Box::new(p))),
        KeyCode::Char('r') => Some(UserCommand::RefreshProducts),
        KeyCode::Char('m') => Some(UserCommand::OpenMyBids),
        KeyCode::Esc => {
            // Clear the filter first, leave the page on the second press
            if state.filter_text.is_empty() {
                Some(UserCommand::Navigate(Page::Landing))
            } else {
                state.filter_text.clear();
                state.product_selected = 0;
                None
            }
        }
        KeyCode::Char('q') => {
            state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// Printable characters extend the filter, Enter keeps it and Esc clears it.
fn handle_filter_mode(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            state.filter_mode = false;
            state.filter_text.clear();
        }
        KeyCode::Enter => {
            state.filter_mode = false;
        }
        _ => {
            if edit_text(&mut state.filter_text, &key_event) {
                state.product_selected = 0;
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Listing form
// ---------------------------------------------------------------------------

fn handle_listing(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    if is_ctrl(&key_event, 'g') {
        return Some(UserCommand::GenerateListing(Box::new(state.listing_form.clone())));
    }
    if is_ctrl(&key_event, 'p') {
        return Some(UserCommand::PublishListing(Box::new(state.listing_form.clone())));
    }
    if is_ctrl(&key_event, 's') {
        return Some(UserCommand::SaveListingDraft(Box::new(
            state.listing_form.clone(),
        )));
    }

    match key_event.code {
        KeyCode::Esc => return Some(UserCommand::Navigate(Page::Landing)),
        KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
            state.listing_field = cycle(&ListingField::ALL, state.listing_field, true);
            return None;
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.listing_field = cycle(&ListingField::ALL, state.listing_field, false);
            return None;
        }
        _ => {}
    }

    let form = &mut state.listing_form;
    match state.listing_field {
        ListingField::Category => {
            if matches!(
                key_event.code,
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            ) {
                form.cycle_category();
            }
        }
        ListingField::Image => {
            let mut text = form
                .image_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            if edit_text(&mut text, &key_event) {
                form.image_path = (!text.is_empty()).then(|| PathBuf::from(text));
            }
        }
        ListingField::Title => {
            edit_text(&mut form.title, &key_event);
        }
        ListingField::Description => {
            edit_text(&mut form.description, &key_event);
        }
        ListingField::Tags => {
            edit_text(&mut form.tags, &key_event);
        }
        ListingField::Price => {
            edit_text(&mut form.price, &key_event);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Account forms
// ---------------------------------------------------------------------------

fn handle_signup(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    if is_ctrl(&key_event, 'o') {
        return Some(UserCommand::Navigate(Page::Signin));
    }

    match key_event.code {
        KeyCode::Esc => return Some(UserCommand::Navigate(Page::Landing)),
        KeyCode::Enter => {
            if !state.signup.can_submit() {
                state.form_error = Some(FormError::TermsNotAccepted.to_string());
                return None;
            }
            state.form_error = None;
            return Some(UserCommand::Signup(Box::new(state.signup.clone())));
        }
        KeyCode::Tab | KeyCode::Down => {
            state.signup_field = cycle(&SignupField::ALL, state.signup_field, true);
            return None;
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.signup_field = cycle(&SignupField::ALL, state.signup_field, false);
            return None;
        }
        _ => {}
    }

    let form = &mut state.signup;
    let changed = match state.signup_field {
        SignupField::UserType => {
            let toggle = matches!(
                key_event.code,
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            );
            if toggle {
                form.user_type = form.user_type.toggle();
            }
            toggle
        }
        SignupField::Terms => {
            let toggle = key_event.code == KeyCode::Char(' ');
            if toggle {
                form.agree_to_terms = !form.agree_to_terms;
            }
            toggle
        }
        SignupField::FirstName => edit_text(&mut form.first_name, &key_event),
        SignupField::LastName => edit_text(&mut form.last_name, &key_event),
        SignupField::Email => edit_text(&mut form.email, &key_event),
        SignupField::Password => edit_text(&mut form.password, &key_event),
        SignupField::ConfirmPassword => edit_text(&mut form.confirm_password, &key_event),
    };
    if changed {
        state.form_error = None;
    }
    None
}

fn handle_signin(key_event: KeyEvent, state: &mut ViewState) -> Option<UserCommand> {
    if is_ctrl(&key_event, 'o') {
        return Some(UserCommand::Navigate(Page::Signup));
    }

    match key_event.code {
        KeyCode::Esc => return Some(UserCommand::Navigate(Page::Landing)),
        KeyCode::Enter => {
            state.form_error = None;
            return Some(UserCommand::Signin(state.signin.clone()));
        }
        KeyCode::Tab | KeyCode::Down => {
            state.signin_field = cycle(&SigninField::ALL, state.signin_field, true);
            return None;
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.signin_field = cycle(&SigninField::ALL, state.signin_field, false);
            return None;
        }
        _ => {}
    }

    let form = &mut state.signin;
    let changed = match state.signin_field {
        SigninField::Email => edit_text(&mut form.email, &key_event),
        SigninField::Password => edit_text(&mut form.password, &key_event),
        SigninField::RememberMe => {
            let toggle = key_event.code == KeyCode::Char(' ');
            if toggle {
                form.remember_me = !form.remember_me;
            }
            toggle
        }
    };
    if changed {
        state.form_error = None;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
