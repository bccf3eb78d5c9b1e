// Terminal storefront: layout, input handling, and page rendering.
//
// The TUI owns a `ViewState` that mirrors the app state from the latest
// snapshot plus the edit buffers of every form on screen. The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;

use agentbay_app::protocol::{AppSnapshot, Notice, Page, UiUpdate, UserCommand};
use agentbay_core::account::{SigninForm, SignupForm};
use agentbay_core::bid::BidForm;
use agentbay_core::listing::ListingForm;
use agentbay_core::product::Product;

use layout::build_layout;

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

// ---------------------------------------------------------------------------
// Form focus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BidField {
    #[default]
    Name,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingField {
    #[default]
    Image,
    Title,
    Description,
    Category,
    Tags,
    Price,
}

impl ListingField {
    pub const ALL: [ListingField; 6] = [
        ListingField::Image,
        ListingField::Title,
        ListingField::Description,
        ListingField::Category,
        ListingField::Tags,
        ListingField::Price,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignupField {
    #[default]
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    UserType,
    Terms,
}

impl SignupField {
    pub const ALL: [SignupField; 7] = [
        SignupField::FirstName,
        SignupField::LastName,
        SignupField::Email,
        SignupField::Password,
        SignupField::ConfirmPassword,
        SignupField::UserType,
        SignupField::Terms,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigninField {
    #[default]
    Email,
    Password,
    RememberMe,
}

impl SigninField {
    pub const ALL: [SigninField; 3] = [
        SigninField::Email,
        SigninField::Password,
        SigninField::RememberMe,
    ];
}

/// Step `current` forward or back through `all`, wrapping at the ends.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let idx = all.iter().position(|f| *f == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % all.len()
    } else {
        (idx + all.len() - 1) % all.len()
    };
    all[next]
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// `app` is replaced wholesale by each snapshot. Everything else is owned by
/// the TUI: edit buffers, focus, selection and overlays.
#[derive(Default)]
pub struct ViewState {
    pub app: AppSnapshot,
    /// Chat input line.
    pub chat_input: String,
    /// Selected card in the latest recommendation batch.
    pub rec_selected: usize,
    pub bid_form: BidForm,
    pub bid_field: BidField,
    /// Product the bid buffer was last seeded for.
    pub bid_product: Option<Option<i64>>,
    /// Selected card on the Products page (index into the filtered list).
    pub product_selected: usize,
    pub filter_text: String,
    pub filter_mode: bool,
    pub listing_form: ListingForm,
    pub listing_field: ListingField,
    pub signup: SignupForm,
    pub signup_field: SignupField,
    pub signin: SigninForm,
    pub signin_field: SigninField,
    /// Validation message for the account form on screen.
    pub form_error: Option<String>,
    pub notice: Option<Notice>,
    pub notice_shown_at: Option<Instant>,
    /// Per-page scroll offsets (keyed by page name).
    pub scroll_offset: HashMap<String, usize>,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn page(&self) -> Page {
        self.app.page
    }

    /// Apply a full state snapshot from the app orchestrator.
    ///
    /// Leaving a page drops its local buffers so the next visit starts
    /// fresh. A newly opened bid dialog seeds the bid buffer from the form
    /// the app prefilled.
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        let previous = self.app.page;
        if previous != snapshot.page {
            self.form_error = None;
            match previous {
                Page::Signup => {
                    self.signup = SignupForm::default();
                    self.signup_field = SignupField::default();
                }
                Page::Signin => {
                    self.signin = SigninForm::default();
                    self.signin_field = SigninField::default();
                }
                Page::Products => {
                    self.filter_mode = false;
                    self.filter_text.clear();
                    self.product_selected = 0;
                }
                _ => {}
            }
        }

        match &snapshot.chat.bid_dialog {
            Some(dialog) if self.bid_product != Some(dialog.product.id) => {
                self.bid_form = dialog.form.clone();
                self.bid_field = if dialog.form.user_id.is_empty() {
                    BidField::Name
                } else {
                    BidField::Amount
                };
                self.bid_product = Some(dialog.product.id);
            }
            Some(_) => {}
            None => {
                self.bid_product = None;
            }
        }

        if self.rec_selected >= snapshot.chat.recommendations.len() {
            self.rec_selected = 0;
        }

        self.app = snapshot;
    }

    /// Catalog products that pass the current filter.
    pub fn filtered_products(&self) -> Vec<&Product> {
        self.app
            .products
            .items
            .iter()
            .filter(|p| p.matches(&self.filter_text))
            .collect()
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.filtered_products().get(self.product_selected).copied()
    }

    pub fn selected_recommendation(&self) -> Option<&Product> {
        self.app.chat.recommendations.get(self.rec_selected)
    }

    pub fn show_notice(&mut self, notice: Notice, now: Instant) {
        self.notice = Some(notice);
        self.notice_shown_at = Some(now);
    }

    /// Drop the notice once it has been visible for `NOTICE_TTL`.
    pub fn expire_notice(&mut self, now: Instant) {
        if let Some(shown) = self.notice_shown_at {
            if now.duration_since(shown) >= NOTICE_TTL {
                self.notice = None;
                self.notice_shown_at = None;
            }
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.notice_shown_at = None;
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::Notice(notice) => {
            state.show_notice(notice, Instant::now());
        }
        UiUpdate::ChatInput(text) => {
            state.chat_input = text;
        }
        UiUpdate::ListingForm(form) => {
            state.listing_form = *form;
        }
        UiUpdate::FormError(message) => {
            state.form_error = Some(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame: status bar, the current page, the help bar and
/// any overlays.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.page() {
        Page::Landing => widgets::landing::render(frame, layout.main, state),
        Page::Chat => widgets::chat::render(frame, layout.main, state),
        Page::Products => widgets::products::render(frame, layout.main, state),
        Page::Listing => widgets::listing::render(frame, layout.main, state),
        Page::Signup => widgets::signup::render(frame, layout.main, state),
        Page::Signin => widgets::signin::render(frame, layout.main, state),
    }
    widgets::help_bar::render(frame, layout.help_bar, state);

    if state.app.chat.bid_dialog.is_some() {
        widgets::bid_dialog::render(frame, frame.area(), state);
    }
    if state.app.my_bids.open {
        widgets::my_bids::render(frame, frame.area(), state);
    }
    if let Some(notice) = &state.notice {
        widgets::notice::render(frame, layout.main, notice);
    }
    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // 3. Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events are picked up by the next draw
                    }
                    Some(Err(_)) | None => break,
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                view_state.expire_notice(Instant::now());
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 4. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
