// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI,
// results of spawned backend requests and speech transcripts. Maintains the
// authoritative storefront state and pushes UI updates to the TUI render
// loop.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use agentbay_api::MarketplaceApi;
use agentbay_core::account::{Account, SigninForm, SignupForm};
use agentbay_core::bid::{BidForm, BidRequest};
use agentbay_core::catalog::{category_counts, FeaturedProduct};
use agentbay_core::config::Config;
use agentbay_core::db::Database;
use agentbay_core::listing::{check_image_path, ListingForm};
use agentbay_core::product::{format_price, Product, ProductDraft};

use crate::chat::{ChatMode, ChatSession};
use crate::protocol::{
    ApiEvent, AppSnapshot, ListingView, MyBidsView, Notice, Page, ProductDetail, ProductsView,
    UiUpdate, UserCommand,
};
use crate::speech::{SpeechEvent, SpeechInput};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of past queries shown on the chat selection screen.
pub const RECENT_SEARCHES: usize = 5;

/// Bids fetched for the product detail view.
pub const DETAIL_BID_LIMIT: u32 = 20;

/// Bids shown in the My Bids overlay, per source.
pub const MY_BIDS_LIMIT: u32 = 20;

pub const BID_PLACED_TITLE: &str = "Bid Placed Successfully!";
pub const BID_FAILED_TITLE: &str = "Bid Failed";
pub const BID_FAILED_BODY: &str = "Failed to place bid. Please try again.";

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Backend client, shared with spawned request tasks.
    pub api: Arc<dyn MarketplaceApi>,
    pub speech: Arc<SpeechInput>,
    /// Spawned request tasks report back through clones of this sender.
    pub api_tx: mpsc::Sender<ApiEvent>,
    pub speech_tx: mpsc::Sender<SpeechEvent>,
    pub page: Page,
    pub account: Option<Account>,
    pub chat: ChatSession,
    pub products: ProductsView,
    pub listing: ListingView,
    pub my_bids: MyBidsView,
    /// Last listing form the TUI submitted, filled in place by AI generation.
    pub listing_form: ListingForm,
    pub featured: Vec<FeaturedProduct>,
    pub categories: Vec<(String, usize)>,
    pub recent_searches: Vec<String>,
    /// Generation counters, one per request kind. Results carrying an older
    /// generation are discarded.
    pub chat_generation: u64,
    pub products_generation: u64,
    pub detail_generation: u64,
    pub listing_generation: u64,
    pub my_bids_generation: u64,
    pub speech_generation: u64,
    pub speech_task: Option<JoinHandle<()>>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        api: Arc<dyn MarketplaceApi>,
        speech: SpeechInput,
        featured: Vec<FeaturedProduct>,
        api_tx: mpsc::Sender<ApiEvent>,
        speech_tx: mpsc::Sender<SpeechEvent>,
    ) -> Self {
        let chat = ChatSession::new(config.chat.max_history);
        let categories = category_counts(&featured);

        AppState {
            config,
            db,
            api,
            speech: Arc::new(speech),
            api_tx,
            speech_tx,
            page: Page::Landing,
            account: None,
            chat,
            products: ProductsView::default(),
            listing: ListingView::default(),
            my_bids: MyBidsView::default(),
            listing_form: ListingForm::default(),
            featured,
            categories,
            recent_searches: Vec::new(),
            chat_generation: 0,
            products_generation: 0,
            detail_generation: 0,
            listing_generation: 0,
            my_bids_generation: 0,
            speech_generation: 0,
            speech_task: None,
        }
    }

    /// Build an `AppSnapshot` from the current application state.
    pub fn build_snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            page: self.page,
            account: self.account.clone(),
            chat: self.chat.clone(),
            speech_supported: self.speech.is_supported(),
            products: self.products.clone(),
            listing: self.listing.clone(),
            my_bids: self.my_bids.clone(),
            featured: self.featured.clone(),
            categories: self.categories.clone(),
            recent_searches: self.recent_searches.clone(),
            api_base: self.api.base_url().to_string(),
        }
    }

    /// Reload the recent search list from the database.
    pub fn refresh_recent_searches(&mut self) {
        match self.db.recent_searches(RECENT_SEARCHES) {
            Ok(records) => {
                self.recent_searches = records.into_iter().map(|r| r.query).collect();
            }
            Err(e) => warn!("Failed to load recent searches: {:#}", e),
        }
    }

    // -----------------------------------------------------------------------
    // Spawned requests
    // -----------------------------------------------------------------------

    /// Ask the recommendation agent for `query`. Supersedes any query still
    /// in flight.
    pub fn fetch_recommendations(&mut self, query: String) {
        self.chat_generation += 1;
        let generation = self.chat_generation;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();
        info!("Fetching recommendations for {:?} (gen {})", query, generation);

        tokio::spawn(async move {
            let result = api
                .recommendations(&query)
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(ApiEvent::Recommendations {
                    generation,
                    query,
                    result,
                })
                .await;
        });
    }

    /// Load the full catalog for the Products page.
    pub fn fetch_products(&mut self) {
        self.products_generation += 1;
        let generation = self.products_generation;
        self.products.loading = true;
        self.products.error = None;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();

        tokio::spawn(async move {
            let result = api.list_products().await.map_err(|e| e.to_string());
            let _ = tx.send(ApiEvent::Products { generation, result }).await;
        });
    }

    /// Open the detail view for a product in the loaded catalog and fetch its
    /// bid history and highest bid. Returns `false` when the product is not
    /// in the catalog.
    pub fn fetch_product_detail(&mut self, product_id: i64) -> bool {
        let Some(product) = self
            .products
            .items
            .iter()
            .find(|p| p.id == Some(product_id))
            .cloned()
        else {
            warn!("Product {} is not in the loaded catalog", product_id);
            return false;
        };

        self.detail_generation += 1;
        let generation = self.detail_generation;
        self.products.detail = Some(ProductDetail {
            product,
            bids: Vec::new(),
            highest: None,
            loading: true,
            error: None,
        });
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();

        tokio::spawn(async move {
            let (bids, highest) = tokio::join!(
                api.product_bids(product_id, DETAIL_BID_LIMIT),
                api.highest_bid(product_id)
            );
            let _ = tx
                .send(ApiEvent::ProductDetail {
                    generation,
                    product_id,
                    bids: bids.map_err(|e| e.to_string()),
                    highest: highest.map_err(|e| e.to_string()),
                })
                .await;
        });
        true
    }

    fn spawn_bid(&self, product: Product, product_id: i64, request: BidRequest) {
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();
        info!(
            "Placing bid {} of {} on product {}",
            request.bid_id,
            format_price(request.amount),
            product_id
        );

        tokio::spawn(async move {
            let result = api
                .place_bid(product_id, &request)
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(ApiEvent::BidPlaced {
                    product: Box::new(product),
                    request,
                    result,
                })
                .await;
        });
    }

    /// Re-read a product from the backend so every copy shows its current
    /// bid.
    pub fn refresh_product(&self, product_id: i64) {
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();

        tokio::spawn(async move {
            let result = api
                .get_product(product_id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(ApiEvent::ProductRefreshed { product_id, result })
                .await;
        });
    }

    /// Replace every loaded copy of `product` (catalog, detail view, chat).
    pub fn replace_product(&mut self, product: &Product) {
        let id = product.id;
        for slot in self.products.items.iter_mut().filter(|p| p.id == id) {
            *slot = product.clone();
        }
        if let Some(detail) = self.products.detail.as_mut().filter(|d| d.product.id == id) {
            detail.product = product.clone();
        }
        self.chat.replace_product(product);
    }

    /// Open the My Bids overlay with the local bid log and fetch the bidder's
    /// bids from the backend. The bidder is the signed-in account, or else
    /// the name on the most recent logged bid.
    pub fn open_my_bids(&mut self) {
        let local = match self.db.recent_bids(MY_BIDS_LIMIT as usize) {
            Ok(bids) => bids,
            Err(e) => {
                warn!("Failed to read bid log: {:#}", e);
                Vec::new()
            }
        };
        let bidder = self
            .account
            .as_ref()
            .map(Account::display_name)
            .or_else(|| local.first().map(|b| b.user_id.clone()));

        self.my_bids_generation += 1;
        let generation = self.my_bids_generation;
        self.my_bids = MyBidsView {
            open: true,
            bidder: bidder.clone(),
            loading: bidder.is_some(),
            local,
            ..MyBidsView::default()
        };

        let Some(bidder) = bidder else {
            debug!("No bidder known, showing local bid log only");
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();
        info!("Fetching bids for {:?} (gen {})", bidder, generation);

        tokio::spawn(async move {
            let result = api
                .user_bids(&bidder, false, MY_BIDS_LIMIT)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiEvent::UserBids { generation, result }).await;
        });
    }

    /// Upload the listing image to the listing agent.
    pub fn generate_listing(&mut self, image: PathBuf, preferences: Option<Value>) {
        self.listing_generation += 1;
        let generation = self.listing_generation;
        self.listing.generating = true;
        self.listing.error = None;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();
        info!("Generating listing from {}", image.display());

        tokio::spawn(async move {
            let result = api
                .create_listing(&image, preferences)
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(ApiEvent::ListingGenerated { generation, result })
                .await;
        });
    }

    fn spawn_publish(&mut self, draft: ProductDraft) {
        self.listing.publishing = true;
        self.listing.error = None;
        let api = Arc::clone(&self.api);
        let tx = self.api_tx.clone();
        info!("Publishing listing {:?}", draft.title);

        tokio::spawn(async move {
            let result = api
                .create_product(&draft)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(ApiEvent::ProductPublished { result }).await;
        });
    }

    // -----------------------------------------------------------------------
    // Speech
    // -----------------------------------------------------------------------

    /// Start the speech command, replacing any previous one.
    pub fn start_listening(&mut self) {
        self.cancel_speech_task();
        self.speech_generation += 1;
        let generation = self.speech_generation;
        let speech = Arc::clone(&self.speech);
        let tx = self.speech_tx.clone();

        self.speech_task = Some(tokio::spawn(async move {
            speech.listen(tx, generation).await;
        }));
        info!("Voice input started (gen {})", generation);
    }

    /// Cancel the speech task if one is running. Dropping the task kills the
    /// child process.
    pub fn cancel_speech_task(&mut self) {
        if let Some(handle) = self.speech_task.take() {
            handle.abort();
            // Late transcripts from the aborted task must not land.
            self.speech_generation += 1;
            info!("Cancelled speech task");
        }
    }

    fn stop_voice_input(&mut self) {
        self.cancel_speech_task();
        self.chat.stop_listening();
    }

    /// Leave the chat for the selection screen, dropping any query in flight.
    fn reset_chat(&mut self) {
        self.stop_voice_input();
        self.chat.reset_to_selection();
        self.chat_generation += 1;
    }
}

/// `user_preferences` sent along with the listing image.
fn listing_preferences(form: &ListingForm) -> Option<Value> {
    let mut prefs = Map::new();
    let category = form.category.trim();
    if !category.is_empty() {
        prefs.insert("category".into(), json!(category));
    }
    if let Ok(price) = form.price.trim().parse::<f64>() {
        if price >= 0.0 {
            prefs.insert("price".into(), json!(price));
        }
    }
    (!prefs.is_empty()).then_some(Value::Object(prefs))
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Selects over backend results, speech events and user commands until a
/// `Quit` command arrives or the command channel closes. Pushes UI updates
/// through `ui_tx` for the TUI render loop.
pub async fn run(
    mut api_rx: mpsc::Receiver<ApiEvent>,
    mut speech_rx: mpsc::Receiver<SpeechEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    // When a channel closes its recv future is disabled so tokio::select!
    // never spins on it.
    let mut api_open = true;
    let mut speech_open = true;

    send_snapshot(&state, &ui_tx).await;
    if state.listing_form != ListingForm::default() {
        let _ = ui_tx
            .send(UiUpdate::ListingForm(Box::new(state.listing_form.clone())))
            .await;
    }

    loop {
        tokio::select! {
            // --- Backend results ---
            event = api_rx.recv(), if api_open => {
                match event {
                    Some(event) => handle_api_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("API channel closed");
                        api_open = false;
                    }
                }
            }

            // --- Speech transcripts ---
            event = speech_rx.recv(), if speech_open => {
                match event {
                    Some(event) => handle_speech_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("Speech channel closed");
                        speech_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    state.cancel_speech_task();
    info!("Application event loop exiting");
    Ok(())
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let snapshot = state.build_snapshot();
    let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
}

async fn send_notice(ui_tx: &mpsc::Sender<UiUpdate>, notice: Notice) {
    info!("Notice: {}", notice);
    let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
}

/// Handle the result of a spawned backend request.
async fn handle_api_event(state: &mut AppState, event: ApiEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    match event {
        ApiEvent::Recommendations {
            generation,
            query,
            result,
        } => {
            if generation != state.chat_generation {
                debug!(
                    "Discarding stale recommendations (event gen: {}, current gen: {})",
                    generation, state.chat_generation
                );
                return;
            }
            match &result {
                Ok(products) => {
                    info!("{} recommendations for {:?}", products.len(), query);
                    if let Err(e) =
                        state
                            .db
                            .record_search(state.chat.mode.as_str(), &query, products.len())
                    {
                        warn!("Failed to record search: {:#}", e);
                    }
                    state.refresh_recent_searches();
                }
                Err(e) => warn!("Recommendation request failed: {}", e),
            }
            state.chat.complete_query(&query, result);
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::Products { generation, result } => {
            if generation != state.products_generation {
                debug!("Discarding stale product list (gen {})", generation);
                return;
            }
            state.products.loading = false;
            match result {
                Ok(items) => {
                    info!("Loaded {} products", items.len());
                    state.products.items = items;
                    state.products.error = None;
                }
                Err(e) => {
                    warn!("Failed to load products: {}", e);
                    state.products.items.clear();
                    state.products.error = Some(e.clone());
                    send_notice(ui_tx, Notice::error("Failed to load products", e)).await;
                }
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::ProductDetail {
            generation,
            product_id,
            bids,
            highest,
        } => {
            if generation != state.detail_generation {
                debug!("Discarding stale detail for product {}", product_id);
                return;
            }
            let Some(detail) = state.products.detail.as_mut() else {
                return;
            };
            detail.loading = false;
            match bids {
                Ok(list) => {
                    detail.highest = match highest {
                        Ok(highest) => highest,
                        Err(e) => {
                            warn!("Highest bid lookup failed for {}: {}", product_id, e);
                            list.highest_live().cloned()
                        }
                    };
                    detail.bids = list.bids;
                }
                Err(e) => {
                    warn!("Bid history lookup failed for {}: {}", product_id, e);
                    detail.highest = highest.ok().flatten();
                    detail.error = Some(e);
                }
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::BidPlaced {
            product,
            request,
            result,
        } => {
            let same_dialog = state
                .chat
                .bid_dialog
                .as_ref()
                .is_some_and(|d| d.product.id == product.id);
            match result {
                Ok(bid) => {
                    info!("Bid {:?} accepted for {}", bid.bid_id, product.title);
                    let product_id = product.id.unwrap_or_default();
                    if let Err(e) = state.db.log_bid(product_id, &product.title, &request) {
                        warn!("Failed to log bid: {:#}", e);
                    }
                    if same_dialog {
                        state.chat.close_bid_dialog();
                    }
                    send_notice(
                        ui_tx,
                        Notice::success(
                            BID_PLACED_TITLE,
                            format!(
                                "Your bid of {} has been placed for {}",
                                format_price(request.amount),
                                product.title
                            ),
                        ),
                    )
                    .await;
                    let detail_open = state
                        .products
                        .detail
                        .as_ref()
                        .is_some_and(|d| d.product.id == product.id);
                    if detail_open {
                        state.fetch_product_detail(product_id);
                    }
                    if product.id.is_some() {
                        state.refresh_product(product_id);
                    }
                }
                Err(e) => {
                    warn!("Bid on {} failed: {}", product.title, e);
                    if let Some(dialog) = state.chat.bid_dialog.as_mut().filter(|_| same_dialog) {
                        dialog.submitting = false;
                    }
                    send_notice(ui_tx, Notice::error(BID_FAILED_TITLE, BID_FAILED_BODY)).await;
                }
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::UserBids { generation, result } => {
            if generation != state.my_bids_generation {
                debug!("Discarding stale user bids (gen {})", generation);
                return;
            }
            state.my_bids.loading = false;
            match result {
                Ok(list) => {
                    state.my_bids.remote_count = list.bid_count;
                    state.my_bids.remote = list.bids;
                }
                Err(e) => {
                    warn!("Failed to load user bids: {}", e);
                    state.my_bids.error = Some(e);
                }
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::ProductRefreshed { product_id, result } => {
            match result {
                Ok(product) if product.id == Some(product_id) => state.replace_product(&product),
                Ok(_) => warn!("Backend returned a different product for {}", product_id),
                Err(e) => warn!("Failed to refresh product {}: {}", product_id, e),
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::ListingGenerated { generation, result } => {
            if generation != state.listing_generation {
                debug!("Discarding stale listing generation (gen {})", generation);
                return;
            }
            state.listing.generating = false;
            match result {
                Ok(outcome) => {
                    match outcome.product {
                        Some(mut product) => {
                            if product.image_url.is_none() {
                                product.image_url = outcome.image_url.clone();
                            }
                            state.listing_form.fill_from(&product);
                            let _ = ui_tx
                                .send(UiUpdate::ListingForm(Box::new(state.listing_form.clone())))
                                .await;
                        }
                        None => warn!("Listing agent returned no product"),
                    }
                    if let Some(warning) = outcome.database_warning {
                        send_notice(ui_tx, Notice::info("Listing generated", warning)).await;
                    } else {
                        let body = outcome
                            .message
                            .unwrap_or_else(|| "Review the details and publish.".to_string());
                        send_notice(ui_tx, Notice::success("Listing generated", body)).await;
                    }
                }
                Err(e) => {
                    warn!("Listing generation failed: {}", e);
                    state.listing.error = Some(e.clone());
                    send_notice(ui_tx, Notice::error("Listing generation failed", e)).await;
                }
            }
            send_snapshot(state, ui_tx).await;
        }

        ApiEvent::ProductPublished { result } => {
            state.listing.publishing = false;
            match result {
                Ok(created) => {
                    info!("Published product {}", created.id);
                    if let Err(e) = state.db.clear_listing_draft() {
                        warn!("Failed to clear listing draft: {:#}", e);
                    }
                    state.listing_form = ListingForm::default();
                    state.listing.draft_saved = false;
                    state.listing.error = None;
                    let body = created
                        .message
                        .unwrap_or_else(|| format!("{} is now live.", created.product.title));
                    send_notice(ui_tx, Notice::success("Listing Published", body)).await;
                    let _ = ui_tx
                        .send(UiUpdate::ListingForm(Box::new(ListingForm::default())))
                        .await;
                }
                Err(e) => {
                    warn!("Publishing failed: {}", e);
                    state.listing.error = Some(e.clone());
                    send_notice(ui_tx, Notice::error("Publish failed", e)).await;
                }
            }
            send_snapshot(state, ui_tx).await;
        }
    }
}

/// Handle an event from the speech command.
async fn handle_speech_event(
    state: &mut AppState,
    event: SpeechEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    if event.generation() != state.speech_generation {
        debug!(
            "Discarding stale speech event (event gen: {}, current gen: {})",
            event.generation(),
            state.speech_generation
        );
        return;
    }

    match event {
        SpeechEvent::Transcript { text, .. } => {
            if state.chat.apply_transcript(&text) {
                let _ = ui_tx.send(UiUpdate::ChatInput(text)).await;
            }
        }
        SpeechEvent::Ended { .. } => {
            info!("Voice input ended");
            state.speech_task = None;
            state.chat.stop_listening();
            send_snapshot(state, ui_tx).await;
        }
        SpeechEvent::Failed { message, .. } => {
            warn!("Voice input failed: {}", message);
            state.speech_task = None;
            state.chat.stop_listening();
            send_notice(ui_tx, Notice::error("Voice Search", message)).await;
            send_snapshot(state, ui_tx).await;
        }
    }
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Navigate(page) => {
            info!("Navigating to {:?}", page);
            if state.page == Page::Chat && page != Page::Chat {
                state.stop_voice_input();
            }
            state.page = page;
            if page == Page::Products {
                state.products.detail = None;
                state.fetch_products();
            }
        }
        UserCommand::SelectMode(mode) => {
            info!("Chat mode: {:?}", mode);
            if mode == ChatMode::Selection {
                state.reset_chat();
                let _ = ui_tx.send(UiUpdate::ChatInput(String::new())).await;
            } else {
                state.chat.select_mode(mode);
            }
        }
        UserCommand::ResetChat => {
            state.reset_chat();
            let _ = ui_tx.send(UiUpdate::ChatInput(String::new())).await;
        }
        UserCommand::SubmitQuery(text) => {
            let Some(query) = state.chat.begin_query(&text) else {
                return;
            };
            state.stop_voice_input();
            state.fetch_recommendations(query);
            let _ = ui_tx.send(UiUpdate::ChatInput(String::new())).await;
        }
        UserCommand::EditChatInput(text) => {
            if !state.chat.edit_input(&text) {
                return;
            }
            // Typing stopped voice input.
            state.cancel_speech_task();
        }
        UserCommand::ToggleListening => {
            match state.chat.toggle_listening(state.speech.is_supported()) {
                Some(message) => {
                    send_notice(ui_tx, Notice::error("Voice Search", message)).await;
                }
                None if state.chat.listening => {
                    state.start_listening();
                    let _ = ui_tx.send(UiUpdate::ChatInput(String::new())).await;
                }
                None => state.cancel_speech_task(),
            }
        }
        UserCommand::TogglePanel => {
            state.chat.panel_collapsed = !state.chat.panel_collapsed;
        }
        UserCommand::OpenBidDialog(product) => {
            let bidder = state.account.as_ref().map(Account::display_name);
            state.chat.open_bid_dialog(*product, bidder.as_deref());
        }
        UserCommand::CloseBidDialog => {
            state.chat.close_bid_dialog();
        }
        UserCommand::SubmitBid(form) => {
            let Some(dialog) = state.chat.bid_dialog.as_mut() else {
                warn!("Bid submitted with no dialog open");
                return;
            };
            if dialog.submitting {
                return;
            }
            dialog.form = form;
            let validated: Result<(i64, BidRequest), String> = match dialog.product.id {
                None => Err("This product is not open for bidding yet.".to_string()),
                Some(id) => dialog
                    .form
                    .validate(&dialog.product)
                    .map(|req| (id, req))
                    .map_err(|e| e.to_string()),
            };
            match validated {
                Ok((product_id, request)) => {
                    dialog.error = None;
                    dialog.submitting = true;
                    let product = dialog.product.clone();
                    state.spawn_bid(product, product_id, request);
                }
                Err(e) => {
                    debug!("Bid form rejected: {}", e);
                    dialog.error = Some(e);
                }
            }
        }
        UserCommand::RefreshProducts => {
            state.fetch_products();
        }
        UserCommand::OpenProductDetail(product_id) => {
            state.fetch_product_detail(product_id);
        }
        UserCommand::CloseProductDetail => {
            state.products.detail = None;
            state.detail_generation += 1;
        }
        UserCommand::OpenMyBids => {
            state.open_my_bids();
        }
        UserCommand::CloseMyBids => {
            state.my_bids = MyBidsView::default();
            state.my_bids_generation += 1;
        }
        UserCommand::GenerateListing(form) => {
            state.listing_form = *form;
            state.listing_form.generated = None;
            let checked = match &state.listing_form.image_path {
                None => Err("Please choose an image first.".to_string()),
                Some(path) => check_image_path(path)
                    .map(|_| path.clone())
                    .map_err(|e| e.to_string()),
            };
            match checked {
                Ok(path) => {
                    let prefs = listing_preferences(&state.listing_form);
                    state.generate_listing(path, prefs);
                }
                Err(e) => state.listing.error = Some(e),
            }
        }
        UserCommand::PublishListing(form) => {
            if state.listing.publishing {
                return;
            }
            state.listing_form = *form;
            match state.listing_form.to_product_draft() {
                Ok(draft) => state.spawn_publish(draft),
                Err(e) => state.listing.error = Some(e.to_string()),
            }
        }
        UserCommand::SaveListingDraft(form) => {
            state.listing_form = *form;
            match state.db.save_listing_draft(&state.listing_form) {
                Ok(()) => {
                    state.listing.draft_saved = true;
                    state.listing.error = None;
                    send_notice(
                        ui_tx,
                        Notice::success("Draft saved", "Your listing will be here next time."),
                    )
                    .await;
                }
                Err(e) => {
                    warn!("Failed to save listing draft: {:#}", e);
                    send_notice(ui_tx, Notice::error("Draft not saved", e.to_string())).await;
                }
            }
        }
        UserCommand::Signup(form) => {
            handle_signup(state, &form, ui_tx).await;
        }
        UserCommand::Signin(form) => {
            handle_signin(state, &form, ui_tx).await;
        }
        UserCommand::SignOut => {
            if let Some(account) = state.account.take() {
                info!("Signed out {}", account.email);
            }
            if let Err(e) = state.db.forget_session() {
                warn!("Failed to forget session: {:#}", e);
            }
            send_notice(ui_tx, Notice::info("Signed out", "See you soon.")).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
    send_snapshot(state, ui_tx).await;
}

async fn handle_signup(state: &mut AppState, form: &SignupForm, ui_tx: &mpsc::Sender<UiUpdate>) {
    let account = match form.validate() {
        Ok(account) => account,
        Err(e) => {
            let _ = ui_tx.send(UiUpdate::FormError(e.to_string())).await;
            return;
        }
    };
    match state.db.insert_account(&account) {
        Ok(true) => {
            info!("Created account for {}", account.email);
            let name = account.display_name();
            state.account = Some(account);
            state.page = Page::Landing;
            send_notice(
                ui_tx,
                Notice::success("Account created", format!("Welcome to AgentBay, {name}!")),
            )
            .await;
        }
        Ok(false) => {
            let _ = ui_tx
                .send(UiUpdate::FormError(
                    "An account with this email already exists.".to_string(),
                ))
                .await;
        }
        Err(e) => {
            warn!("Failed to store account: {:#}", e);
            let _ = ui_tx
                .send(UiUpdate::FormError("Could not create your account.".to_string()))
                .await;
        }
    }
}

async fn handle_signin(state: &mut AppState, form: &SigninForm, ui_tx: &mpsc::Sender<UiUpdate>) {
    let email = match form.validate() {
        Ok(email) => email,
        Err(e) => {
            let _ = ui_tx.send(UiUpdate::FormError(e.to_string())).await;
            return;
        }
    };
    let account = match state.db.find_account(&email) {
        Ok(Some(account)) => account,
        Ok(None) => {
            let _ = ui_tx
                .send(UiUpdate::FormError(
                    "No account found for this email.".to_string(),
                ))
                .await;
            return;
        }
        Err(e) => {
            warn!("Account lookup failed: {:#}", e);
            let _ = ui_tx
                .send(UiUpdate::FormError("Could not sign you in.".to_string()))
                .await;
            return;
        }
    };

    if form.remember_me {
        if let Err(e) = state.db.remember_session(&account.email) {
            warn!("Failed to remember session: {:#}", e);
        }
    }
    info!("Signed in {}", account.email);
    let name = account.display_name();
    state.account = Some(account);
    state.page = Page::Landing;
    send_notice(ui_tx, Notice::success("Signed in", format!("Welcome back, {name}!"))).await;
}

// ---------------------------------------------------------------------------
// Restart recovery
// ---------------------------------------------------------------------------

/// Restore the remembered session, the saved listing draft and the recent
/// searches from the database. Returns whether a session or draft was found.
pub fn recover_from_db(state: &mut AppState) -> anyhow::Result<bool> {
    let mut restored = false;

    if let Some(account) = state.db.remembered_session()? {
        info!("Restored session for {}", account.email);
        state.account = Some(account);
        restored = true;
    }

    if let Some(form) = state.db.load_listing_draft()? {
        info!("Restored listing draft {:?}", form.title);
        state.listing_form = form;
        state.listing.draft_saved = true;
        restored = true;
    }

    state.refresh_recent_searches();
    Ok(restored)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
