// Typed REST client for the marketplace backend.

pub mod client;
pub mod error;

pub use client::{HttpMarketplace, MarketplaceApi};
pub use error::ApiError;
