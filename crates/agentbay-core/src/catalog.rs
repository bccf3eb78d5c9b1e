// Featured products shown on the landing page.
//
// Loaded from a CSV file with columns:
// id,title,price,original_price,rating,reviews,image,category,wishlisted

use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedProduct {
    pub id: u32,
    pub title: String,
    pub price: f64,
    pub original_price: f64,
    pub rating: f64,
    pub reviews: u32,
    pub image: String,
    pub category: String,
    pub wishlisted: bool,
}

impl FeaturedProduct {
    /// Percentage off the original price, rounded. Zero when the original
    /// price is not above the current one.
    pub fn discount_pct(&self) -> u32 {
        if self.original_price <= self.price || self.original_price <= 0.0 {
            return 0;
        }
        (((self.original_price - self.price) / self.original_price) * 100.0).round() as u32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

#[derive(Debug, Deserialize)]
struct RawFeatured {
    id: u32,
    title: String,
    price: f64,
    original_price: f64,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    reviews: u32,
    #[serde(default)]
    image: String,
    category: String,
    #[serde(default)]
    wishlisted: bool,
}

fn load_featured_from_reader<R: Read>(rdr: R) -> Result<Vec<FeaturedProduct>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut products = Vec::new();
    for result in reader.deserialize::<RawFeatured>() {
        match result {
            Ok(raw) => {
                if !(raw.price.is_finite() && raw.original_price.is_finite()) {
                    warn!("skipping featured product '{}': non-finite price", raw.title.trim());
                    continue;
                }
                products.push(FeaturedProduct {
                    id: raw.id,
                    title: raw.title.trim().to_string(),
                    price: raw.price,
                    original_price: raw.original_price,
                    rating: raw.rating,
                    reviews: raw.reviews,
                    image: raw.image.trim().to_string(),
                    category: raw.category.trim().to_string(),
                    wishlisted: raw.wishlisted,
                });
            }
            Err(e) => {
                warn!("skipping malformed featured product row: {}", e);
            }
        }
    }
    Ok(products)
}

/// Load the featured catalog from `path`.
pub fn load_featured(path: &Path) -> Result<Vec<FeaturedProduct>, CatalogError> {
    let file = std::fs::File::open(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_featured_from_reader(file).map_err(|e| CatalogError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Category names with how many featured products fall in each, sorted by
/// name.
pub fn category_counts(products: &[FeaturedProduct]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for p in products {
        *counts.entry(p.category.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, n)| (name.to_string(), n))
        .collect()
}
