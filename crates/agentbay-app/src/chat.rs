// Chat assistant session: message log, recommendation history, bid dialog and
// the voice input toggle.

use chrono::{DateTime, Utc};

use agentbay_core::bid::BidForm;
use agentbay_core::product::Product;

pub const SPEECH_UNSUPPORTED: &str = "Speech recognition is not supported.";

pub const FETCH_FAILED_REPLY: &str =
    "Sorry, I couldn't fetch recommendations at the moment. Please try again later.";

pub const SELLER_REPLY: &str = "I'll help you create an optimized listing. Please upload photos \
     of your item and I'll generate a compelling description.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatMode {
    #[default]
    Selection,
    Buyer,
    Seller,
}

impl ChatMode {
    /// Heading shown above the conversation.
    pub fn title(&self) -> &'static str {
        match self {
            ChatMode::Selection => "Choose Your Path",
            ChatMode::Buyer => "Explorer Mode",
            ChatMode::Seller => "Creator Mode",
        }
    }

    pub fn assistant_name(&self) -> &'static str {
        match self {
            ChatMode::Seller => "AI Listing Helper",
            _ => "AI Shopping Assistant",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Selection => "selection",
            ChatMode::Buyer => "buyer",
            ChatMode::Seller => "seller",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// One query and the products it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationBatch {
    pub query: String,
    pub recommendations: Vec<Product>,
    pub timestamp: DateTime<Utc>,
}

/// The "Place a Bid" dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct BidDialog {
    pub product: Product,
    pub form: BidForm,
    /// Validation error from the last submit attempt.
    pub error: Option<String>,
    pub submitting: bool,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    pub mode: ChatMode,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub is_loading: bool,
    /// The latest batch.
    pub recommendations: Vec<Product>,
    pub history: Vec<RecommendationBatch>,
    pub bid_dialog: Option<BidDialog>,
    pub listening: bool,
    pub panel_collapsed: bool,
    /// Batches the history panel shows (most recent last).
    pub max_history: usize,
    next_id: u64,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ChatSession {
    pub fn new(max_history: usize) -> Self {
        ChatSession {
            mode: ChatMode::Selection,
            messages: Vec::new(),
            input: String::new(),
            is_loading: false,
            recommendations: Vec::new(),
            history: Vec::new(),
            bid_dialog: None,
            listening: false,
            panel_collapsed: false,
            max_history: max_history.max(1),
            next_id: 1,
        }
    }

    pub fn select_mode(&mut self, mode: ChatMode) {
        if mode == ChatMode::Selection {
            self.reset_to_selection();
        } else {
            self.mode = mode;
        }
    }

    /// Start a query from the input box. Returns the query to send, or `None`
    /// when the input is blank or a query is already in flight.
    pub fn begin_query(&mut self, input: &str) -> Option<String> {
        if self.is_loading || input.trim().is_empty() {
            return None;
        }
        self.push_message(input.to_string(), true);
        self.input.clear();
        self.is_loading = true;
        Some(input.to_string())
    }

    /// Record the outcome of the query started by `begin_query`.
    pub fn complete_query(&mut self, query: &str, result: Result<Vec<Product>, String>) {
        self.is_loading = false;
        match result {
            Ok(products) => {
                self.recommendations = products.clone();
                self.history.push(RecommendationBatch {
                    query: query.to_string(),
                    recommendations: products,
                    timestamp: Utc::now(),
                });
                let reply = match self.mode {
                    ChatMode::Seller => SELLER_REPLY.to_string(),
                    _ => format!(
                        "I found {} recommendations for \"{}\". Check out the products below!",
                        self.recommendations.len(),
                        query
                    ),
                };
                self.push_message(reply, false);
            }
            Err(_) => {
                self.push_message(FETCH_FAILED_REPLY.to_string(), false);
            }
        }
    }

    pub fn reset_to_selection(&mut self) {
        let max_history = self.max_history;
        let next_id = self.next_id;
        *self = ChatSession::new(max_history);
        self.next_id = next_id;
    }

    pub fn open_bid_dialog(&mut self, product: Product, bidder: Option<&str>) {
        self.bid_dialog = Some(BidDialog {
            product,
            form: BidForm::for_user(bidder.unwrap_or_default()),
            error: None,
            submitting: false,
        });
    }

    pub fn close_bid_dialog(&mut self) {
        self.bid_dialog = None;
    }

    /// Swap in a fresher copy of `product` wherever the session shows it.
    pub fn replace_product(&mut self, product: &Product) {
        let Some(id) = product.id else {
            return;
        };
        let batches = self.history.iter_mut().flat_map(|b| b.recommendations.iter_mut());
        for slot in self.recommendations.iter_mut().chain(batches) {
            if slot.id == Some(id) {
                *slot = product.clone();
            }
        }
        if let Some(dialog) = self.bid_dialog.as_mut().filter(|d| d.product.id == Some(id)) {
            dialog.product = product.clone();
        }
    }

    /// Flip voice input. Returns a notice when speech is unavailable.
    pub fn toggle_listening(&mut self, supported: bool) -> Option<&'static str> {
        if !supported {
            self.listening = false;
            return Some(SPEECH_UNSUPPORTED);
        }
        self.listening = !self.listening;
        if self.listening {
            self.input.clear();
        }
        None
    }

    /// Replace the input with the latest transcript. Ignored unless
    /// listening.
    pub fn apply_transcript(&mut self, text: &str) -> bool {
        if !self.listening {
            return false;
        }
        self.input = text.to_string();
        true
    }

    /// Typed edit. Typing stops voice input; returns whether it was on.
    pub fn edit_input(&mut self, text: &str) -> bool {
        self.input = text.to_string();
        std::mem::replace(&mut self.listening, false)
    }

    pub fn stop_listening(&mut self) {
        self.listening = false;
    }

    /// The recommendations panel appears once there is a conversation and at
    /// least one batch.
    pub fn show_panel(&self) -> bool {
        !self.messages.is_empty() && !self.history.is_empty()
    }

    /// The most recent `max_history` batches, oldest first.
    pub fn visible_history(&self) -> &[RecommendationBatch] {
        let skip = self.history.len().saturating_sub(self.max_history);
        &self.history[skip..]
    }

    pub fn placeholder(&self) -> &'static str {
        if self.show_panel() {
            "Ask me to find products..."
        } else {
            "Ask me to find products... (e.g., 'vintage sneakers under $100')"
        }
    }

    /// Hint under the welcome heading.
    pub fn hint(&self) -> &'static str {
        match self.mode {
            ChatMode::Seller => {
                "Upload photos of your item and I'll help create the perfect listing with \
                 optimized descriptions"
            }
            _ if self.show_panel() => {
                "Try: \"Find me vintage sneakers under $100\" or \"Show me gaming laptops\""
            }
            _ => {
                "Try: \"Find me vintage sneakers under $100\" or \"Show me gaming laptops with \
                 good reviews\""
            }
        }
    }

    fn push_message(&mut self, text: String, is_user: bool) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            text,
            is_user,
            timestamp: Utc::now(),
        });
        self.next_id += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn product(title: &str) -> Product {
        serde_json::from_value(serde_json::json!({ "id": 1, "title": title })).unwrap()
    }

    fn buyer() -> ChatSession {
        let mut chat = ChatSession::new(10);
        chat.select_mode(ChatMode::Buyer);
        chat
    }

    #[test]
    fn starts_in_selection() {
        let chat = ChatSession::default();
        assert_eq!(chat.mode, ChatMode::Selection);
        assert!(chat.messages.is_empty());
        assert!(!chat.show_panel());
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut chat = buyer();
        assert_eq!(chat.begin_query("   \t"), None);
        assert!(chat.messages.is_empty());
        assert!(!chat.is_loading);
    }

    #[test]
    fn begin_query_appends_user_message_as_typed() {
        let mut chat = buyer();
        chat.input = " sneakers ".into();
        assert_eq!(chat.begin_query(" sneakers ").as_deref(), Some(" sneakers "));
        assert!(chat.is_loading);
        assert!(chat.input.is_empty());
        assert_eq!(chat.messages.len(), 1);
        assert!(chat.messages[0].is_user);
        assert_eq!(chat.messages[0].text, " sneakers ");
    }

    #[test]
    fn query_while_loading_is_ignored() {
        let mut chat = buyer();
        chat.begin_query("a").unwrap();
        assert_eq!(chat.begin_query("b"), None);
        assert_eq!(chat.messages.len(), 1);
    }

    #[test]
    fn buyer_success_records_batch_and_reply() {
        let mut chat = buyer();
        let q = chat.begin_query("lamps").unwrap();
        chat.complete_query(&q, Ok(vec![product("Desk Lamp"), product("Floor Lamp")]));

        assert!(!chat.is_loading);
        assert_eq!(chat.recommendations.len(), 2);
        assert_eq!(chat.history.len(), 1);
        assert_eq!(chat.history[0].query, "lamps");
        assert_eq!(
            chat.messages[1].text,
            "I found 2 recommendations for \"lamps\". Check out the products below!"
        );
        assert!(!chat.messages[1].is_user);
        assert!(chat.show_panel());
    }

    #[test]
    fn seller_success_uses_listing_reply() {
        let mut chat = ChatSession::new(10);
        chat.select_mode(ChatMode::Seller);
        let q = chat.begin_query("my old camera").unwrap();
        chat.complete_query(&q, Ok(vec![]));
        assert_eq!(chat.messages[1].text, SELLER_REPLY);
    }

    #[test]
    fn failure_leaves_history_untouched() {
        let mut chat = buyer();
        let q = chat.begin_query("lamps").unwrap();
        chat.complete_query(&q, Ok(vec![product("Lamp")]));
        let q = chat.begin_query("chairs").unwrap();
        chat.complete_query(&q, Err("connection refused".into()));

        assert_eq!(chat.history.len(), 1);
        assert_eq!(chat.recommendations[0].title, "Lamp");
        assert_eq!(chat.messages.last().unwrap().text, FETCH_FAILED_REPLY);
        assert!(!chat.is_loading);
    }

    #[test]
    fn message_ids_increase_across_reset() {
        let mut chat = buyer();
        let q = chat.begin_query("a").unwrap();
        chat.complete_query(&q, Ok(vec![]));
        let last = chat.messages.last().unwrap().id;
        assert!(chat.messages.windows(2).all(|w| w[0].id < w[1].id));

        chat.reset_to_selection();
        chat.select_mode(ChatMode::Buyer);
        chat.begin_query("b").unwrap();
        assert!(chat.messages[0].id > last);
    }

    #[test]
    fn reset_clears_conversation() {
        let mut chat = buyer();
        chat.input = "draft".into();
        let q = chat.begin_query("a").unwrap();
        chat.complete_query(&q, Ok(vec![product("X")]));
        chat.reset_to_selection();

        assert_eq!(chat.mode, ChatMode::Selection);
        assert!(chat.messages.is_empty());
        assert!(chat.history.is_empty());
        assert!(chat.recommendations.is_empty());
        assert!(chat.input.is_empty());
        assert_eq!(chat.max_history, 10);
    }

    #[test]
    fn replace_product_updates_every_copy() {
        let mut chat = buyer();
        chat.begin_query("lamps");
        chat.complete_query("lamps", Ok(vec![product("Lamp")]));
        chat.open_bid_dialog(product("Lamp"), None);

        let mut fresher = product("Lamp");
        fresher.current_bid = Some(42.0);
        chat.replace_product(&fresher);

        assert_eq!(chat.recommendations[0].current_bid, Some(42.0));
        assert_eq!(chat.history[0].recommendations[0].current_bid, Some(42.0));
        assert_eq!(
            chat.bid_dialog.as_ref().unwrap().product.current_bid,
            Some(42.0)
        );
    }

    #[test]
    fn bid_dialog_prefills_bidder() {
        let mut chat = buyer();
        chat.open_bid_dialog(product("Lamp"), Some("Ada Lovelace"));
        let dialog = chat.bid_dialog.as_ref().unwrap();
        assert_eq!(dialog.form.user_id, "Ada Lovelace");
        assert!(dialog.form.amount.is_empty());
        chat.close_bid_dialog();
        assert!(chat.bid_dialog.is_none());
    }

    #[test]
    fn unsupported_speech_returns_notice() {
        let mut chat = buyer();
        assert_eq!(chat.toggle_listening(false), Some(SPEECH_UNSUPPORTED));
        assert!(!chat.listening);
    }

    #[test]
    fn listening_clears_input_and_accepts_transcripts() {
        let mut chat = buyer();
        chat.input = "typed".into();
        assert_eq!(chat.toggle_listening(true), None);
        assert!(chat.listening);
        assert!(chat.input.is_empty());

        assert!(chat.apply_transcript("find me"));
        assert!(chat.apply_transcript("find me sneakers"));
        assert_eq!(chat.input, "find me sneakers");

        assert!(chat.edit_input("find me sneakers!"));
        assert!(!chat.listening);
        assert!(!chat.apply_transcript("late words"));
        assert_eq!(chat.input, "find me sneakers!");
    }

    #[test]
    fn visible_history_keeps_most_recent() {
        let mut chat = ChatSession::new(2);
        chat.select_mode(ChatMode::Buyer);
        for q in ["a", "b", "c"] {
            let q = chat.begin_query(q).unwrap();
            chat.complete_query(&q, Ok(vec![]));
        }
        assert_eq!(chat.history.len(), 3);
        let visible: Vec<_> = chat.visible_history().iter().map(|b| b.query.as_str()).collect();
        assert_eq!(visible, vec!["b", "c"]);
    }

    #[test]
    fn hint_and_placeholder_follow_panel() {
        let mut chat = buyer();
        assert!(chat.placeholder().contains("e.g."));
        assert!(chat.hint().contains("with good reviews"));
        let q = chat.begin_query("a").unwrap();
        chat.complete_query(&q, Ok(vec![]));
        assert_eq!(chat.placeholder(), "Ask me to find products...");
        assert!(!chat.hint().contains("with good reviews"));
    }
}
