// End-to-end tests of the app event loop against an in-process fake backend.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use agentbay_api::{ApiError, MarketplaceApi};
use agentbay_app::app::{run, AppState, BID_PLACED_TITLE};
use agentbay_app::chat::ChatMode;
use agentbay_app::protocol::{AppSnapshot, NoticeLevel, Page, UiUpdate, UserCommand};
use agentbay_app::speech::SpeechInput;
use agentbay_core::bid::{Bid, BidForm, BidList, BidRequest, BidStatus};
use agentbay_core::config::{
    ApiConfig, CatalogConfig, ChatConfig, Config, CredentialsConfig, SpeechConfig,
};
use agentbay_core::db::Database;
use agentbay_core::listing::{CreatedProduct, ListingForm, ListingOutcome};
use agentbay_core::product::{Product, ProductDraft, DEFAULT_CONFIDENCE};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeMarketplace {
    catalog: Vec<Product>,
    bids: Mutex<Vec<(i64, BidRequest)>>,
    published: Mutex<Vec<ProductDraft>>,
    queries: Mutex<Vec<String>>,
}

fn product(id: i64, title: &str, category: &str, current_bid: Option<f64>) -> Product {
    Product {
        id: Some(id),
        title: title.into(),
        description: format!("A fine {title}"),
        condition: "good".into(),
        category: category.into(),
        suggested_price: Some(80.0),
        current_bid,
        tags: vec!["audio".into()],
        brand: Some("Acme".into()),
        model: None,
        confidence_score: DEFAULT_CONFIDENCE,
        image_url: Some("/static/uploads/a.jpg".into()),
    }
}

fn bid(user: &str, amount: f64, status: BidStatus) -> Bid {
    Bid {
        bid_id: Some(format!("{user}-{amount}")),
        user_id: user.into(),
        product_id: "1".into(),
        amount,
        timestamp: None,
        status,
        is_auto_bid: false,
        max_auto_bid: None,
    }
}

#[async_trait]
impl MarketplaceApi for FakeMarketplace {
    fn base_url(&self) -> &str {
        "http://fake.test"
    }

    async fn recommendations(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .catalog
            .iter()
            .filter(|p| p.matches(query))
            .cloned()
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.catalog.clone())
    }

    async fn get_product(&self, product_id: i64) -> Result<Product, ApiError> {
        self.catalog
            .iter()
            .find(|p| p.id == Some(product_id))
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                detail: "Product not found".into(),
            })
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ApiError> {
        self.published.lock().unwrap().push(draft.clone());
        let mut created = product(100, &draft.title, &draft.category, None);
        created.description = draft.description.clone();
        Ok(CreatedProduct {
            id: 100,
            message: Some("Product created successfully".into()),
            product: created,
        })
    }

    async fn create_listing(
        &self,
        _image: &Path,
        _preferences: Option<Value>,
    ) -> Result<ListingOutcome, ApiError> {
        let mut generated = product(0, "Vintage Film Camera", "electronics", None);
        generated.tags = vec!["film".into(), "35mm".into()];
        generated.suggested_price = Some(120.0);
        generated.condition = "like_new".into();
        generated.model = Some("AE-1".into());
        generated.confidence_score = 0.82;
        generated.image_url = None;
        Ok(ListingOutcome {
            status: "success".into(),
            message: None,
            product: Some(generated),
            database_warning: Some("Listing created but not saved to database".into()),
            image_url: Some("/uploads/images/cam.jpg".into()),
        })
    }

    async fn place_bid(&self, product_id: i64, request: &BidRequest) -> Result<Bid, ApiError> {
        self.bids
            .lock()
            .unwrap()
            .push((product_id, request.clone()));
        Ok(bid(&request.user_id, request.amount, BidStatus::Active))
    }

    async fn product_bids(&self, _product_id: i64, _limit: u32) -> Result<BidList, ApiError> {
        Ok(BidList {
            bids: vec![
                bid("sam", 50.0, BidStatus::Outbid),
                bid("kim", 55.0, BidStatus::Winning),
            ],
            bid_count: 2,
        })
    }

    async fn user_bids(
        &self,
        _user_id: &str,
        _active_only: bool,
        _limit: u32,
    ) -> Result<BidList, ApiError> {
        Ok(BidList {
            bids: vec![],
            bid_count: 0,
        })
    }

    async fn highest_bid(&self, _product_id: i64) -> Result<Option<Bid>, ApiError> {
        Ok(Some(bid("kim", 55.0, BidStatus::Winning)))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Running {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn test_config() -> Config {
    Config {
        api: ApiConfig {
            base_url: "http://fake.test".into(),
            timeout_secs: 5,
        },
        credentials: CredentialsConfig::default(),
        db_path: ":memory:".into(),
        catalog: CatalogConfig {
            featured: "data/featured.csv".into(),
        },
        speech: SpeechConfig::default(),
        chat: ChatConfig { max_history: 10 },
    }
}

fn start(api: Arc<FakeMarketplace>) -> Running {
    let (api_tx, api_rx) = mpsc::channel(16);
    let (speech_tx, speech_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let db = Database::open(":memory:").expect("in-memory database");
    let state = AppState::new(
        test_config(),
        db,
        api,
        SpeechInput::Disabled,
        Vec::new(),
        api_tx,
        speech_tx,
    );
    let handle = tokio::spawn(run(api_rx, speech_rx, cmd_rx, ui_tx, state));
    Running {
        cmd_tx,
        ui_rx,
        handle,
    }
}

impl Running {
    async fn send(&self, cmd: UserCommand) {
        self.cmd_tx.send(cmd).await.expect("event loop alive");
    }

    /// Receive updates until one satisfies `pred`.
    async fn wait_for<T>(&mut self, mut pred: impl FnMut(&UiUpdate) -> Option<T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let update = self.ui_rx.recv().await.expect("ui channel open");
                if let Some(found) = pred(&update) {
                    return found;
                }
            }
        })
        .await
        .expect("timed out waiting for update")
    }

    async fn wait_for_snapshot(
        &mut self,
        mut pred: impl FnMut(&AppSnapshot) -> bool,
    ) -> Box<AppSnapshot> {
        self.wait_for(|u| match u {
            UiUpdate::Snapshot(snap) if pred(snap) => Some(snap.clone()),
            _ => None,
        })
        .await
    }

    async fn quit(self) {
        self.cmd_tx.send(UserCommand::Quit).await.unwrap();
        assert!(self.handle.await.unwrap().is_ok());
    }
}

fn catalog() -> Vec<Product> {
    vec![
        product(1, "Wireless Headphones", "Electronics", Some(50.0)),
        product(2, "Studio Headphones", "Electronics", None),
        product(3, "Yoga Mat", "Sports", None),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn buyer_query_builds_history() {
    let api = Arc::new(FakeMarketplace {
        catalog: catalog(),
        ..Default::default()
    });
    let mut app = start(Arc::clone(&api));

    app.send(UserCommand::Navigate(Page::Chat)).await;
    app.send(UserCommand::SelectMode(ChatMode::Buyer)).await;
    app.send(UserCommand::SubmitQuery("headphones".into())).await;

    let snap = app
        .wait_for_snapshot(|s| !s.chat.is_loading && !s.chat.history.is_empty())
        .await;
    assert_eq!(snap.chat.mode, ChatMode::Buyer);
    assert_eq!(snap.chat.recommendations.len(), 2);
    assert_eq!(snap.chat.history[0].query, "headphones");
    assert_eq!(snap.chat.messages.len(), 2);
    assert!(snap.chat.messages[0].is_user);
    assert_eq!(
        snap.chat.messages[1].text,
        "I found 2 recommendations for \"headphones\". Check out the products below!"
    );
    assert!(snap.chat.show_panel());
    assert_eq!(snap.recent_searches, vec!["headphones".to_string()]);

    app.send(UserCommand::SubmitQuery("yoga".into())).await;
    let snap = app.wait_for_snapshot(|s| s.chat.history.len() == 2).await;
    assert_eq!(snap.chat.recommendations[0].title, "Yoga Mat");
    assert!(snap.chat.messages[1].id < snap.chat.messages[2].id);

    assert_eq!(api.queries.lock().unwrap().len(), 2);
    app.quit().await;
}

#[tokio::test]
async fn products_page_loads_catalog_and_detail() {
    let api = Arc::new(FakeMarketplace {
        catalog: catalog(),
        ..Default::default()
    });
    let mut app = start(api);

    app.send(UserCommand::Navigate(Page::Products)).await;
    let snap = app
        .wait_for_snapshot(|s| s.page == Page::Products && !s.products.loading)
        .await;
    assert_eq!(snap.products.items.len(), 3);
    assert!(snap.products.error.is_none());

    app.send(UserCommand::OpenProductDetail(1)).await;
    let snap = app
        .wait_for_snapshot(|s| s.products.detail.as_ref().is_some_and(|d| !d.loading))
        .await;
    let detail = snap.products.detail.unwrap();
    assert_eq!(detail.product.title, "Wireless Headphones");
    assert_eq!(detail.bids.len(), 2);
    assert_eq!(detail.highest.unwrap().amount, 55.0);

    app.send(UserCommand::CloseProductDetail).await;
    app.wait_for_snapshot(|s| s.products.detail.is_none()).await;
    app.quit().await;
}

#[tokio::test]
async fn placing_a_bid_notifies_and_closes_dialog() {
    let api = Arc::new(FakeMarketplace {
        catalog: catalog(),
        ..Default::default()
    });
    let mut app = start(Arc::clone(&api));
    let target = catalog().remove(0);

    app.send(UserCommand::OpenBidDialog(Box::new(target))).await;
    app.wait_for_snapshot(|s| s.chat.bid_dialog.is_some()).await;

    app.send(UserCommand::SubmitBid(BidForm {
        user_id: "Sam".into(),
        amount: "52.50".into(),
    }))
    .await;

    let notice = app
        .wait_for(|u| match u {
            UiUpdate::Notice(n) => Some(n.clone()),
            _ => None,
        })
        .await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.title, BID_PLACED_TITLE);
    assert_eq!(
        notice.body,
        "Your bid of $52.50 has been placed for Wireless Headphones"
    );
    app.wait_for_snapshot(|s| s.chat.bid_dialog.is_none()).await;

    let bids = api.bids.lock().unwrap().clone();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].0, 1);
    assert_eq!(bids[0].1.user_id, "Sam");
    assert_eq!(bids[0].1.amount, 52.5);
    assert!(!bids[0].1.bid_id.is_empty());
    app.quit().await;
}

#[tokio::test]
async fn generated_listing_fills_form_and_warns() {
    let api = Arc::new(FakeMarketplace::default());
    let mut app = start(api);

    let form = ListingForm {
        image_path: Some("camera.JPG".into()),
        ..Default::default()
    };
    app.send(UserCommand::Navigate(Page::Listing)).await;
    app.send(UserCommand::GenerateListing(Box::new(form))).await;

    let filled = app
        .wait_for(|u| match u {
            UiUpdate::ListingForm(f) => Some(f.clone()),
            _ => None,
        })
        .await;
    assert_eq!(filled.title, "Vintage Film Camera");
    assert_eq!(filled.category, "Electronics");
    assert_eq!(filled.tags, "film, 35mm");
    assert_eq!(filled.price, "120.00");
    assert_eq!(filled.image_path.as_deref(), Some(Path::new("camera.JPG")));

    let notice = app
        .wait_for(|u| match u {
            UiUpdate::Notice(n) => Some(n.clone()),
            _ => None,
        })
        .await;
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.body, "Listing created but not saved to database");
    app.quit().await;
}

#[tokio::test]
async fn publishing_resets_the_form() {
    let api = Arc::new(FakeMarketplace::default());
    let mut app = start(Arc::clone(&api));

    let form = ListingForm {
        title: "Desk Lamp".into(),
        description: "Brass, works".into(),
        category: "Home & Garden".into(),
        tags: "lamp, brass,".into(),
        price: "35".into(),
        ..Default::default()
    };
    app.send(UserCommand::SaveListingDraft(Box::new(form.clone())))
        .await;
    app.wait_for_snapshot(|s| s.listing.draft_saved).await;

    app.send(UserCommand::PublishListing(Box::new(form))).await;
    let reset = app
        .wait_for(|u| match u {
            UiUpdate::ListingForm(f) => Some(f.clone()),
            _ => None,
        })
        .await;
    assert_eq!(*reset, ListingForm::default());
    let snap = app
        .wait_for_snapshot(|s| !s.listing.publishing)
        .await;
    assert!(!snap.listing.draft_saved);

    let published = api.published.lock().unwrap().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].tags, vec!["lamp", "brass"]);
    assert_eq!(published[0].suggested_price, Some(35.0));
    app.quit().await;
}

#[tokio::test]
async fn publishing_a_generated_listing_keeps_agent_attributes() {
    let api = Arc::new(FakeMarketplace::default());
    let mut app = start(Arc::clone(&api));

    let form = ListingForm {
        image_path: Some("camera.jpg".into()),
        ..Default::default()
    };
    app.send(UserCommand::Navigate(Page::Listing)).await;
    app.send(UserCommand::GenerateListing(Box::new(form))).await;
    let mut filled = app
        .wait_for(|u| match u {
            UiUpdate::ListingForm(f) => Some(f.clone()),
            _ => None,
        })
        .await;
    filled.price = "110".into();

    app.send(UserCommand::PublishListing(filled)).await;
    let reset = app
        .wait_for(|u| match u {
            UiUpdate::ListingForm(f) => Some(f.clone()),
            _ => None,
        })
        .await;
    assert_eq!(reset.generated, None);

    let published = api.published.lock().unwrap().clone();
    assert_eq!(published.len(), 1);
    let draft = &published[0];
    assert_eq!(draft.title, "Vintage Film Camera");
    assert_eq!(draft.suggested_price, Some(110.0));
    assert_eq!(draft.image_url.as_deref(), Some("/uploads/images/cam.jpg"));
    assert_eq!(draft.brand.as_deref(), Some("Acme"));
    assert_eq!(draft.model.as_deref(), Some("AE-1"));
    assert_eq!(draft.condition, "like_new");
    assert_eq!(draft.confidence_score, 0.82);
    app.quit().await;
}
