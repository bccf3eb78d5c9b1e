// Product representation as served by the marketplace backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence the listing agent assigns when it reports none.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

/// A product listed on the marketplace.
///
/// Mirrors the backend's product JSON. Every field except the text fields is
/// optional on the wire; unknown fields are ignored so newer backends don't
/// break older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub suggested_price: Option<f64>,
    #[serde(default)]
    pub current_bid: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The backend sends `"tags": null` for rows created before tags existed.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Product {
    /// Resolve the product image into an absolute URL.
    ///
    /// Absolute `https` URLs (CDN images) are used as-is. Anything else is an
    /// upload path served by the backend (`/uploads/images/<uuid>.jpg`) and is
    /// joined onto `base_url`.
    pub fn resolve_image_url(&self, base_url: &str) -> Option<String> {
        let url = self.image_url.as_deref()?;
        if url.is_empty() {
            return None;
        }
        if url.starts_with("https") {
            return Some(url.to_string());
        }
        let base = base_url.trim_end_matches('/');
        if url.starts_with('/') {
            Some(format!("{base}{url}"))
        } else {
            Some(format!("{base}/{url}"))
        }
    }

    /// The tags shown as badges on a product card (first two).
    pub fn tag_preview(&self) -> &[String] {
        let n = self.tags.len().min(2);
        &self.tags[..n]
    }

    /// "Brand Model" subtitle, only when both halves are known.
    pub fn brand_model(&self) -> Option<String> {
        match (self.brand.as_deref(), self.model.as_deref()) {
            (Some(b), Some(m)) if !b.is_empty() && !m.is_empty() => Some(format!("{b} {m}")),
            _ => None,
        }
    }

    /// The lowest amount a new bid may have.
    pub fn min_next_bid(&self) -> f64 {
        match self.current_bid {
            Some(current) if current > 0.0 => current + min_increment(current),
            _ => 1.0,
        }
    }

    /// Price summary line: `Suggested: $X • Current: $Y`.
    pub fn price_line(&self) -> String {
        let suggested = self
            .suggested_price
            .map(format_price)
            .unwrap_or_else(|| "--".to_string());
        match self.current_bid {
            Some(current) if current > 0.0 => {
                format!("Suggested: {suggested} • Current: {}", format_price(current))
            }
            _ => format!("Suggested: {suggested}"),
        }
    }

    /// Whether the product matches a free-text filter (title, category, tags).
    pub fn matches(&self, filter: &str) -> bool {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Minimum bid increment for a given current bid.
pub fn min_increment(current_bid: f64) -> f64 {
    if current_bid < 25.0 {
        1.0
    } else if current_bid < 100.0 {
        2.5
    } else if current_bid < 500.0 {
        5.0
    } else if current_bid < 1000.0 {
        10.0
    } else {
        25.0
    }
}

/// Format a dollar amount, dropping the cents when they are zero.
pub fn format_price(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("${amount:.0}")
    } else {
        format!("${amount:.2}")
    }
}

/// Condition grades the listing agent assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    New,
    LikeNew,
    Excellent,
    Good,
    Fair,
    Poor,
    ForParts,
}

impl ProductCondition {
    pub const ALL: [ProductCondition; 7] = [
        ProductCondition::New,
        ProductCondition::LikeNew,
        ProductCondition::Excellent,
        ProductCondition::Good,
        ProductCondition::Fair,
        ProductCondition::Poor,
        ProductCondition::ForParts,
    ];

    /// Parse the wire value (`like_new`, `for_parts`, ...).
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(ProductCondition::New),
            "like_new" | "like new" => Some(ProductCondition::LikeNew),
            "excellent" => Some(ProductCondition::Excellent),
            "good" => Some(ProductCondition::Good),
            "fair" => Some(ProductCondition::Fair),
            "poor" => Some(ProductCondition::Poor),
            "for_parts" | "for parts" => Some(ProductCondition::ForParts),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            ProductCondition::New => "new",
            ProductCondition::LikeNew => "like_new",
            ProductCondition::Excellent => "excellent",
            ProductCondition::Good => "good",
            ProductCondition::Fair => "fair",
            ProductCondition::Poor => "poor",
            ProductCondition::ForParts => "for_parts",
        }
    }
}

impl fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProductCondition::New => "New",
            ProductCondition::LikeNew => "Like New",
            ProductCondition::Excellent => "Excellent",
            ProductCondition::Good => "Good",
            ProductCondition::Fair => "Fair",
            ProductCondition::Poor => "Poor",
            ProductCondition::ForParts => "For Parts",
        };
        write!(f, "{label}")
    }
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub condition: String,
    pub category: String,
    pub suggested_price: Option<f64>,
    pub tags: Vec<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub confidence_score: f64,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn headphones() -> Product {
        Product {
            id: Some(7),
            title: "Wireless Headphones".into(),
            description: "Noise cancelling".into(),
            condition: "like_new".into(),
            category: "Electronics".into(),
            suggested_price: Some(120.0),
            current_bid: None,
            tags: vec!["audio".into(), "wireless".into(), "premium".into()],
            brand: Some("Sony".into()),
            model: Some("WH-1000XM4".into()),
            confidence_score: 0.9,
            image_url: Some("/uploads/images/abc.jpg".into()),
        }
    }

    #[test]
    fn deserializes_sparse_backend_json() {
        let json = r#"{"title": "Lamp", "tags": null, "extra": 1}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.title, "Lamp");
        assert!(p.tags.is_empty());
        assert!(p.id.is_none());
        assert!((p.confidence_score - DEFAULT_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn relative_image_is_joined_onto_base() {
        let p = headphones();
        assert_eq!(
            p.resolve_image_url("http://127.0.0.1:8000/").as_deref(),
            Some("http://127.0.0.1:8000/uploads/images/abc.jpg")
        );
    }

    #[test]
    fn https_image_is_used_verbatim() {
        let mut p = headphones();
        p.image_url = Some("https://cdn.example.com/x.png".into());
        assert_eq!(
            p.resolve_image_url("http://127.0.0.1:8000").as_deref(),
            Some("https://cdn.example.com/x.png")
        );
    }

    #[test]
    fn missing_image_resolves_to_none() {
        let mut p = headphones();
        p.image_url = None;
        assert!(p.resolve_image_url("http://x").is_none());
        p.image_url = Some(String::new());
        assert!(p.resolve_image_url("http://x").is_none());
    }

    #[test]
    fn tag_preview_caps_at_two() {
        let mut p = headphones();
        assert_eq!(p.tag_preview(), &["audio".to_string(), "wireless".to_string()]);
        p.tags.truncate(1);
        assert_eq!(p.tag_preview().len(), 1);
    }

    #[test]
    fn brand_model_requires_both() {
        let mut p = headphones();
        assert_eq!(p.brand_model().as_deref(), Some("Sony WH-1000XM4"));
        p.model = None;
        assert!(p.brand_model().is_none());
    }

    #[test]
    fn min_next_bid_uses_increment_table() {
        let mut p = headphones();
        assert!((p.min_next_bid() - 1.0).abs() < f64::EPSILON);
        p.current_bid = Some(20.0);
        assert!((p.min_next_bid() - 21.0).abs() < f64::EPSILON);
        p.current_bid = Some(80.0);
        assert!((p.min_next_bid() - 82.5).abs() < f64::EPSILON);
        p.current_bid = Some(1500.0);
        assert!((p.min_next_bid() - 1525.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_line_includes_current_bid_when_present() {
        let mut p = headphones();
        assert_eq!(p.price_line(), "Suggested: $120");
        p.current_bid = Some(130.5);
        assert_eq!(p.price_line(), "Suggested: $120 • Current: $130.50");
    }

    #[test]
    fn matches_searches_title_category_and_tags() {
        let p = headphones();
        assert!(p.matches(""));
        assert!(p.matches("WIRELESS"));
        assert!(p.matches("electro"));
        assert!(p.matches("premium"));
        assert!(!p.matches("sneakers"));
    }

    #[test]
    fn condition_wire_names() {
        for c in ProductCondition::ALL {
            assert_eq!(ProductCondition::from_wire(c.as_wire()), Some(c));
        }
        assert_eq!(ProductCondition::from_wire("Like New"), Some(ProductCondition::LikeNew));
        assert_eq!(ProductCondition::from_wire("mint"), None);
        assert_eq!(ProductCondition::ForParts.to_string(), "For Parts");
    }
}
