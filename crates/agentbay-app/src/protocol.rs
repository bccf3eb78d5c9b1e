// Messages exchanged between the app orchestrator, the TUI and the spawned
// backend request tasks.

use std::fmt;

use agentbay_core::account::{Account, SigninForm, SignupForm};
use agentbay_core::bid::{Bid, BidForm, BidList, BidRequest};
use agentbay_core::catalog::FeaturedProduct;
use agentbay_core::db::LoggedBid;
use agentbay_core::listing::{CreatedProduct, ListingForm, ListingOutcome};
use agentbay_core::product::Product;

use crate::chat::{ChatMode, ChatSession};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Landing,
    Chat,
    Products,
    Listing,
    Signup,
    Signin,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Landing => "Home",
            Page::Chat => "Assistant",
            Page::Products => "All Products",
            Page::Listing => "Create Listing",
            Page::Signup => "Sign Up",
            Page::Signin => "Sign In",
        }
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A modal-style message, the terminal counterpart of a toast or alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            title: title.into(),
            body: body.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.body)
    }
}

// ---------------------------------------------------------------------------
// Snapshot (app -> TUI)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetail {
    pub product: Product,
    pub bids: Vec<Bid>,
    pub highest: Option<Bid>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductsView {
    pub loading: bool,
    pub items: Vec<Product>,
    pub error: Option<String>,
    pub detail: Option<ProductDetail>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingView {
    pub generating: bool,
    pub publishing: bool,
    /// Validation or backend error from the last action.
    pub error: Option<String>,
    pub draft_saved: bool,
}

/// The "My Bids" overlay. `local` is this client's bid log; `remote` is what
/// the backend holds for `bidder`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MyBidsView {
    pub open: bool,
    pub bidder: Option<String>,
    pub loading: bool,
    pub local: Vec<LoggedBid>,
    pub remote: Vec<Bid>,
    pub remote_count: usize,
    pub error: Option<String>,
}

/// Everything the TUI renders that the app owns.
#[derive(Debug, Clone, Default)]
pub struct AppSnapshot {
    pub page: Page,
    pub account: Option<Account>,
    pub chat: ChatSession,
    pub speech_supported: bool,
    pub products: ProductsView,
    pub listing: ListingView,
    pub my_bids: MyBidsView,
    pub featured: Vec<FeaturedProduct>,
    pub categories: Vec<(String, usize)>,
    pub recent_searches: Vec<String>,
    /// Base URL product image paths resolve against.
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub enum UiUpdate {
    Snapshot(Box<AppSnapshot>),
    Notice(Notice),
    /// Replace the chat input text (speech transcript, or cleared on send).
    ChatInput(String),
    /// Replace the listing form (restored draft, AI fill, or reset).
    ListingForm(Box<ListingForm>),
    /// Validation error for the sign-up or sign-in form on screen.
    FormError(String),
}

// ---------------------------------------------------------------------------
// Commands (TUI -> app)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Navigate(Page),
    SelectMode(ChatMode),
    ResetChat,
    SubmitQuery(String),
    EditChatInput(String),
    ToggleListening,
    TogglePanel,
    OpenBidDialog(Box<Product>),
    CloseBidDialog,
    SubmitBid(BidForm),
    RefreshProducts,
    OpenProductDetail(i64),
    CloseProductDetail,
    OpenMyBids,
    CloseMyBids,
    GenerateListing(Box<ListingForm>),
    PublishListing(Box<ListingForm>),
    SaveListingDraft(Box<ListingForm>),
    Signup(Box<SignupForm>),
    Signin(SigninForm),
    SignOut,
    Quit,
}

// ---------------------------------------------------------------------------
// Backend results (request tasks -> app)
// ---------------------------------------------------------------------------

/// Outcome of a spawned backend request. Errors are carried as display
/// strings. Variants with a `generation` are dropped when a newer request of
/// the same kind has been issued since.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    Recommendations {
        generation: u64,
        query: String,
        result: Result<Vec<Product>, String>,
    },
    Products {
        generation: u64,
        result: Result<Vec<Product>, String>,
    },
    ProductDetail {
        generation: u64,
        product_id: i64,
        bids: Result<BidList, String>,
        highest: Result<Option<Bid>, String>,
    },
    BidPlaced {
        product: Box<Product>,
        request: BidRequest,
        result: Result<Bid, String>,
    },
    /// Fresh copy of a product after one of our bids changed it.
    ProductRefreshed {
        product_id: i64,
        result: Result<Product, String>,
    },
    UserBids {
        generation: u64,
        result: Result<BidList, String>,
    },
    ListingGenerated {
        generation: u64,
        result: Result<ListingOutcome, String>,
    },
    ProductPublished {
        result: Result<CreatedProduct, String>,
    },
}
