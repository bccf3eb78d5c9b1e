// HTTP client for the marketplace backend.
//
// Every endpoint the storefront talks to sits behind `MarketplaceApi` so the
// app orchestrator can be driven by a fake in tests. `HttpMarketplace` is the
// reqwest implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use agentbay_core::bid::{Bid, BidList, BidRequest};
use agentbay_core::config::Config;
use agentbay_core::listing::{image_mime, CreatedProduct, ListingOutcome};
use agentbay_core::product::{Product, ProductDraft};

use crate::error::ApiError;

/// Bounds the backend enforces on `limit` query parameters.
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 500;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Base URL that relative product image paths resolve against.
    fn base_url(&self) -> &str;

    /// `POST /api/agent/recommendations`
    async fn recommendations(&self, query: &str) -> Result<Vec<Product>, ApiError>;

    /// `GET /api/products`
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// `GET /api/products/{id}`
    async fn get_product(&self, product_id: i64) -> Result<Product, ApiError>;

    /// `POST /api/products`
    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ApiError>;

    /// `POST /api/agent/create-listing` with the image as multipart form data.
    async fn create_listing(
        &self,
        image: &Path,
        preferences: Option<Value>,
    ) -> Result<ListingOutcome, ApiError>;

    /// `POST /api/products/{id}/bids`
    async fn place_bid(&self, product_id: i64, bid: &BidRequest) -> Result<Bid, ApiError>;

    /// `GET /api/products/{id}/bids`
    async fn product_bids(&self, product_id: i64, limit: u32) -> Result<BidList, ApiError>;

    /// `GET /api/users/{id}/bids`
    async fn user_bids(
        &self,
        user_id: &str,
        active_only: bool,
        limit: u32,
    ) -> Result<BidList, ApiError>;

    /// `GET /api/products/{id}/highest-bid`. `None` when nobody has bid.
    async fn highest_bid(&self, product_id: i64) -> Result<Option<Bid>, ApiError>;
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductsResponse {
    Bare(Vec<Product>),
    Wrapped { products: Vec<Product> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductResponse {
    Wrapped { product: Product },
    Bare(Product),
}

#[derive(Deserialize)]
struct BidCreatedResponse {
    bid: Bid,
}

#[derive(Deserialize)]
struct HighestBidResponse {
    #[serde(default)]
    highest_bid: Option<Bid>,
}

// ---------------------------------------------------------------------------
// HttpMarketplace
// ---------------------------------------------------------------------------

pub struct HttpMarketplace {
    http: reqwest::Client,
    base_url: Url,
    base_str: String,
    api_token: Option<String>,
}

impl HttpMarketplace {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        api_token: Option<String>,
    ) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Setup)?;
        Ok(Self {
            http,
            base_str: base_url.trim_end_matches('/').to_string(),
            base_url: parsed,
            api_token: api_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
            config.credentials.api_token.clone(),
        )
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.api_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and return the JSON body of a 2xx response.
    async fn send_value(&self, req: RequestBuilder, url: &Url) -> Result<Value, ApiError> {
        debug!("{}", url);
        let resp = req.send().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            let detail = error_detail(&body, status);
            warn!("{} returned {}: {}", url, status, detail);
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, url: &Url) -> Result<T, ApiError> {
        let value = self.send_value(req, url).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplace {
    fn base_url(&self) -> &str {
        &self.base_str
    }

    async fn recommendations(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let url = self.url(&["api", "agent", "recommendations"]);
        let req = self
            .request(Method::POST, url.clone())
            .json(&serde_json::json!({ "query_string": query }));
        let resp: RecommendationsResponse = self.send(req, &url).await?;
        Ok(decode_recommendations(resp.results))
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.url(&["api", "products"]);
        let req = self.request(Method::GET, url.clone());
        let resp: ProductsResponse = self.send(req, &url).await?;
        Ok(match resp {
            ProductsResponse::Bare(products) => products,
            ProductsResponse::Wrapped { products } => products,
        })
    }

    async fn get_product(&self, product_id: i64) -> Result<Product, ApiError> {
        let id = product_id.to_string();
        let url = self.url(&["api", "products", &id]);
        let req = self.request(Method::GET, url.clone());
        let resp: ProductResponse = self.send(req, &url).await?;
        let mut product = match resp {
            ProductResponse::Wrapped { product } => product,
            ProductResponse::Bare(product) => product,
        };
        product.id.get_or_insert(product_id);
        Ok(product)
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<CreatedProduct, ApiError> {
        let url = self.url(&["api", "products"]);
        let req = self.request(Method::POST, url.clone()).json(draft);
        self.send(req, &url).await
    }

    async fn create_listing(
        &self,
        image: &Path,
        preferences: Option<Value>,
    ) -> Result<ListingOutcome, ApiError> {
        let url = self.url(&["api", "agent", "create-listing"]);
        let bytes = tokio::fs::read(image).await.map_err(|e| ApiError::Io {
            path: image.to_path_buf(),
            source: e,
        })?;
        let file_name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(image))
            .map_err(|e| ApiError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        let mut form = reqwest::multipart::Form::new().part("image", part);
        if let Some(prefs) = preferences {
            form = form.text("user_preferences", prefs.to_string());
        }

        let req = self.request(Method::POST, url.clone()).multipart(form);
        let outcome: ListingOutcome = self.send(req, &url).await?;
        if !outcome.is_success() {
            return Err(ApiError::Listing(
                outcome
                    .message
                    .unwrap_or_else(|| format!("status `{}`", outcome.status)),
            ));
        }
        Ok(outcome)
    }

    async fn place_bid(&self, product_id: i64, bid: &BidRequest) -> Result<Bid, ApiError> {
        let id = product_id.to_string();
        let url = self.url(&["api", "products", &id, "bids"]);
        let req = self.request(Method::POST, url.clone()).json(bid);
        let resp: BidCreatedResponse = self.send(req, &url).await?;
        Ok(resp.bid)
    }

    async fn product_bids(&self, product_id: i64, limit: u32) -> Result<BidList, ApiError> {
        let id = product_id.to_string();
        let url = self.url(&["api", "products", &id, "bids"]);
        let req = self
            .request(Method::GET, url.clone())
            .query(&[("limit", clamp_limit(limit))]);
        self.send(req, &url).await
    }

    async fn user_bids(
        &self,
        user_id: &str,
        active_only: bool,
        limit: u32,
    ) -> Result<BidList, ApiError> {
        let url = self.url(&["api", "users", user_id, "bids"]);
        let req = self.request(Method::GET, url.clone()).query(&[
            ("active_only", active_only.to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ]);
        self.send(req, &url).await
    }

    async fn highest_bid(&self, product_id: i64) -> Result<Option<Bid>, ApiError> {
        let id = product_id.to_string();
        let url = self.url(&["api", "products", &id, "highest-bid"]);
        let req = self.request(Method::GET, url.clone());
        let resp: HighestBidResponse = self.send(req, &url).await?;
        Ok(resp.highest_bid)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Human-readable reason for a failed request. FastAPI puts it in `detail`,
/// which is a string for `HTTPException` and a list for validation errors.
fn error_detail(body: &str, status: StatusCode) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        match v.get("detail") {
            Some(Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

/// Recommendation results arrive either as bare products or wrapped as
/// `{"product": {...}, "time_left_formatted": "..."}`. Items that are
/// neither are skipped.
fn decode_recommendations(items: Vec<Value>) -> Vec<Product> {
    items
        .into_iter()
        .filter_map(|item| {
            let inner = match item {
                Value::Object(mut map) => match map.remove("product") {
                    Some(product @ Value::Object(_)) => product,
                    Some(other) => {
                        map.insert("product".to_string(), other);
                        Value::Object(map)
                    }
                    None => Value::Object(map),
                },
                other => other,
            };
            match serde_json::from_value::<Product>(inner) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("skipping malformed recommendation: {}", e);
                    None
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one HTTP response from a local socket. The join handle
    /// yields the raw request the client sent.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            request
        });

        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut req = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            req.extend_from_slice(&buf[..n]);
            let Some(end) = req.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&req[..end]).to_lowercase();
            if head.contains("transfer-encoding: chunked") {
                if req.ends_with(b"0\r\n\r\n") {
                    break;
                }
                continue;
            }
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if req.len() >= end + 4 + len {
                break;
            }
        }
        String::from_utf8_lossy(&req).into_owned()
    }

    fn client(base: &str) -> HttpMarketplace {
        HttpMarketplace::new(base, Duration::from_secs(5), None).unwrap()
    }

    // -- pure helpers --

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(9999), 500);
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"Product not found"}"#, StatusCode::NOT_FOUND),
            "Product not found"
        );
        assert!(error_detail(r#"{"detail":[{"loc":["body"]}]}"#, StatusCode::UNPROCESSABLE_ENTITY)
            .contains("loc"));
        assert_eq!(error_detail("oops", StatusCode::BAD_GATEWAY), "oops");
        assert_eq!(error_detail("", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }

    #[test]
    fn recommendations_accept_flat_and_wrapped_items() {
        let items = serde_json::from_str::<Vec<Value>>(
            r#"[
                {"title": "Flat", "suggested_price": 10},
                {"product": {"id": 4, "title": "Wrapped"}, "time_left_formatted": "2h"},
                {"nonsense": true},
                42
            ]"#,
        )
        .unwrap();
        let products = decode_recommendations(items);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Flat");
        assert_eq!(products[1].title, "Wrapped");
        assert_eq!(products[1].id, Some(4));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            HttpMarketplace::new("not a url", Duration::from_secs(1), None),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn url_segments_are_encoded() {
        let c = client("http://127.0.0.1:8000/");
        assert_eq!(
            c.url(&["api", "users", "ada lovelace", "bids"]).as_str(),
            "http://127.0.0.1:8000/api/users/ada%20lovelace/bids"
        );
        assert_eq!(c.base_url(), "http://127.0.0.1:8000");
    }

    // -- mock server round trips --

    #[tokio::test]
    async fn recommendations_posts_query_string() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"results":[{"product":{"id":1,"title":"Sneakers","tags":["retro"]}}]}"#,
        )
        .await;

        let products = client(&base).recommendations("vintage sneakers").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Sneakers");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/agent/recommendations "));
        assert!(request.contains(r#""query_string":"vintage sneakers""#));
    }

    #[tokio::test]
    async fn list_products_accepts_bare_array() {
        let (base, server) =
            serve_once("200 OK", r#"[{"id":1,"title":"A"},{"id":2,"title":"B"}]"#).await;
        let products = client(&base).list_products().await.unwrap();
        assert_eq!(products.len(), 2);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/products "));
    }

    #[tokio::test]
    async fn get_product_unwraps_envelope() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"product":{"title":"Lamp"},"database_info":{"created_at":null}}"#,
        )
        .await;
        let product = client(&base).get_product(9).await.unwrap();
        assert_eq!(product.title, "Lamp");
        assert_eq!(product.id, Some(9));
    }

    #[tokio::test]
    async fn not_found_maps_to_status_error() {
        let (base, _server) = serve_once("404 Not Found", r#"{"detail":"Product not found"}"#).await;
        let err = client(&base).get_product(404).await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            ApiError::Status { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Product not found");
            }
            other => panic!("expected Status, got {other}"),
        }
    }

    #[tokio::test]
    async fn place_bid_sends_body_and_bearer_token() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"message":"Bid created successfully","bid_id":12,
                "bid":{"bid_id":"b-1","user_id":"ada","product_id":"3","amount":25.0,
                       "timestamp":"2025-01-01T00:00:00","status":"active"}}"#,
        )
        .await;
        let c = HttpMarketplace::new(&base, Duration::from_secs(5), Some("tok".into())).unwrap();
        let req = BidRequest {
            bid_id: "b-1".into(),
            user_id: "ada".into(),
            amount: 25.0,
            is_auto_bid: false,
            max_auto_bid: None,
        };
        let bid = c.place_bid(3, &req).await.unwrap();
        assert_eq!(bid.user_id, "ada");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/products/3/bids "));
        assert!(request.to_lowercase().contains("authorization: bearer tok"));
        assert!(request.contains(r#""is_auto_bid":false"#));
        assert!(request.contains(r#""max_auto_bid":null"#));
    }

    #[tokio::test]
    async fn product_bids_clamps_limit_in_query() {
        let (base, server) = serve_once("200 OK", r#"{"product_id":3,"bids":[],"bid_count":0}"#).await;
        let list = client(&base).product_bids(3, 10_000).await.unwrap();
        assert_eq!(list.bid_count, 0);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/products/3/bids?limit=500 "));
    }

    #[tokio::test]
    async fn user_bids_passes_flags() {
        let (base, server) = serve_once("200 OK", r#"{"user_id":"ada","bids":[],"bid_count":0}"#).await;
        client(&base).user_bids("ada", true, 0).await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/users/ada/bids?active_only=true&limit=1 "));
    }

    #[tokio::test]
    async fn highest_bid_absent_is_none() {
        let (base, _server) =
            serve_once("200 OK", r#"{"message":"No bids found for this product"}"#).await;
        assert!(client(&base).highest_bid(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_listing_uploads_multipart_image() {
        let dir = std::env::temp_dir().join("agentbay_api_listing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("camera.png");
        std::fs::write(&image, b"\x89PNG fake").unwrap();

        let (base, server) = serve_once(
            "200 OK",
            r#"{"status":"success","message":"Listing created successfully",
                "product":{"title":"Film Camera","image_url":"/uploads/images/x.png"}}"#,
        )
        .await;
        let outcome = client(&base)
            .create_listing(&image, Some(serde_json::json!({"tone": "casual"})))
            .await
            .unwrap();
        assert_eq!(outcome.product.unwrap().title, "Film Camera");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/agent/create-listing "));
        assert!(request.contains("multipart/form-data"));
        assert!(request.contains(r#"name="image"; filename="camera.png""#));
        assert!(request.contains("image/png"));
        assert!(request.contains(r#"name="user_preferences""#));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn create_listing_missing_file_is_io_error() {
        let c = client("http://127.0.0.1:9");
        let err = c
            .create_listing(Path::new("/no/such/photo.jpg"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}")).list_products().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
