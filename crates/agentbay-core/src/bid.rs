// Bids: wire types, status lifecycle, and the bid dialog form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::form::{non_blank, parse_amount, FormError};
use crate::product::{format_price, Product};

/// Lifecycle of a bid on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Active,
    Winning,
    Outbid,
    Won,
    Lost,
}

impl BidStatus {
    /// Bids that can still win the auction.
    pub fn is_live(&self) -> bool {
        matches!(self, BidStatus::Active | BidStatus::Winning)
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BidStatus::Active => "active",
            BidStatus::Winning => "winning",
            BidStatus::Outbid => "outbid",
            BidStatus::Won => "won",
            BidStatus::Lost => "lost",
        };
        write!(f, "{s}")
    }
}

/// A bid as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    #[serde(default)]
    pub bid_id: Option<String>,
    pub user_id: String,
    pub product_id: String,
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    pub status: BidStatus,
    #[serde(default)]
    pub is_auto_bid: bool,
    #[serde(default)]
    pub max_auto_bid: Option<f64>,
}

/// Accept RFC 3339 timestamps as well as the naive ISO strings the backend
/// emits for rows without a timezone. Anything unparseable becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    Ok(chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc()))
}

/// Body of `POST /api/products/{id}/bids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRequest {
    pub bid_id: String,
    pub user_id: String,
    pub amount: f64,
    pub is_auto_bid: bool,
    pub max_auto_bid: Option<f64>,
}

/// The "Place a Bid" dialog's fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BidForm {
    pub user_id: String,
    pub amount: String,
}

impl BidForm {
    /// Form with the bidder's name already filled in.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        BidForm {
            user_id: user_id.into(),
            amount: String::new(),
        }
    }

    /// Whether the submit action should be enabled.
    pub fn is_complete(&self) -> bool {
        non_blank(&self.user_id).is_some() && non_blank(&self.amount).is_some()
    }

    /// Validate the form against the product being bid on and build the
    /// request body. Each submission gets a fresh `bid_id`.
    pub fn validate(&self, product: &Product) -> Result<BidRequest, FormError> {
        let (Some(user_id), Some(raw_amount)) = (non_blank(&self.user_id), non_blank(&self.amount))
        else {
            return Err(FormError::MissingFields);
        };

        let amount = parse_amount("amount", raw_amount)?;
        if amount <= 0.0 {
            return Err(FormError::NotPositive { field: "amount" });
        }

        let minimum = product.min_next_bid();
        if amount + f64::EPSILON < minimum {
            return Err(FormError::BelowMinimum {
                minimum: format_price(minimum),
            });
        }

        Ok(BidRequest {
            bid_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            is_auto_bid: false,
            max_auto_bid: None,
        })
    }
}

/// Response of `GET /api/products/{id}/bids` and `GET /api/users/{id}/bids`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BidList {
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default)]
    pub bid_count: usize,
}

impl BidList {
    /// Highest live bid in the list.
    pub fn highest_live(&self) -> Option<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.status.is_live())
            .max_by(|a, b| a.amount.total_cmp(&b.amount))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn product(current_bid: Option<f64>) -> Product {
        Product {
            id: Some(3),
            title: "Vintage Jacket".into(),
            description: String::new(),
            condition: "good".into(),
            category: "Fashion".into(),
            suggested_price: Some(90.0),
            current_bid,
            tags: vec![],
            brand: None,
            model: None,
            confidence_score: 0.7,
            image_url: None,
        }
    }

    #[test]
    fn empty_fields_are_rejected() {
        let form = BidForm {
            user_id: "  ".into(),
            amount: "10".into(),
        };
        assert_eq!(form.validate(&product(None)), Err(FormError::MissingFields));
        assert!(!form.is_complete());
    }

    #[test]
    fn valid_form_builds_request_with_fresh_id() {
        let form = BidForm {
            user_id: "ada".into(),
            amount: "25".into(),
        };
        let a = form.validate(&product(None)).unwrap();
        let b = form.validate(&product(None)).unwrap();
        assert_eq!(a.user_id, "ada");
        assert!((a.amount - 25.0).abs() < f64::EPSILON);
        assert!(!a.is_auto_bid);
        assert_ne!(a.bid_id, b.bid_id);
    }

    #[test]
    fn bid_below_minimum_is_rejected() {
        let form = BidForm {
            user_id: "ada".into(),
            amount: "50".into(),
        };
        let err = form.validate(&product(Some(50.0))).unwrap_err();
        assert_eq!(
            err,
            FormError::BelowMinimum {
                minimum: "$52.50".into()
            }
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        let form = BidForm {
            user_id: "ada".into(),
            amount: "-5".into(),
        };
        assert_eq!(
            form.validate(&product(None)),
            Err(FormError::NotPositive { field: "amount" })
        );
    }

    #[test]
    fn bid_json_round_trips_status() {
        let json = r#"{
            "bid_id": "b-1", "user_id": "ada", "product_id": "3",
            "amount": 12.5, "timestamp": "2025-01-01T10:00:00Z",
            "status": "winning", "is_auto_bid": false, "max_auto_bid": null
        }"#;
        let bid: Bid = serde_json::from_str(json).unwrap();
        assert_eq!(bid.status, BidStatus::Winning);
        assert!(bid.status.is_live());
        assert!(bid.timestamp.is_some());
    }

    #[test]
    fn naive_timestamp_is_read_as_utc() {
        let json = r#"{
            "user_id": "ada", "product_id": "3", "amount": 1.0,
            "timestamp": "2025-03-04T05:06:07.123456", "status": "active"
        }"#;
        let bid: Bid = serde_json::from_str(json).unwrap();
        assert_eq!(
            bid.timestamp.unwrap().to_rfc3339(),
            "2025-03-04T05:06:07.123456+00:00"
        );
    }

    #[test]
    fn highest_live_ignores_outbid() {
        let mk = |amount: f64, status| Bid {
            bid_id: None,
            user_id: "u".into(),
            product_id: "1".into(),
            amount,
            timestamp: None,
            status,
            is_auto_bid: false,
            max_auto_bid: None,
        };
        let list = BidList {
            bids: vec![
                mk(100.0, BidStatus::Outbid),
                mk(60.0, BidStatus::Winning),
                mk(40.0, BidStatus::Active),
            ],
            bid_count: 3,
        };
        assert!((list.highest_live().unwrap().amount - 60.0).abs() < f64::EPSILON);
    }
}
