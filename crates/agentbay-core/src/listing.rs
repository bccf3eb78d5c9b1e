// Seller listing form and the AI listing response.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::form::{non_blank, parse_amount, FormError};
use crate::product::{Product, ProductDraft, DEFAULT_CONFIDENCE};

/// Categories offered by the listing form's selector.
pub const CATEGORIES: [&str; 4] = ["Electronics", "Fashion", "Home & Garden", "Sports"];

/// Image extensions the listing agent accepts.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Listing form fields as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingForm {
    pub image_path: Option<PathBuf>,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Comma separated.
    pub tags: String,
    pub price: String,
    /// Product the listing agent generated for the current image. Carries the
    /// uploaded image URL and the attributes the form has no fields for.
    #[serde(default)]
    pub generated: Option<Product>,
}

impl ListingForm {
    /// Split the comma separated tags, dropping blanks.
    pub fn parsed_tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Advance the category selector to the next option (wrapping through
    /// the unselected state).
    pub fn cycle_category(&mut self) {
        let idx = CATEGORIES.iter().position(|c| *c == self.category);
        self.category = match idx {
            None => CATEGORIES[0].to_string(),
            Some(i) if i + 1 < CATEGORIES.len() => CATEGORIES[i + 1].to_string(),
            Some(_) => String::new(),
        };
    }

    /// Validate the form for publishing and build the create-product body.
    pub fn to_product_draft(&self) -> Result<ProductDraft, FormError> {
        let title = non_blank(&self.title).ok_or(FormError::Required { field: "title" })?;
        let description =
            non_blank(&self.description).ok_or(FormError::Required { field: "description" })?;
        let category =
            non_blank(&self.category).ok_or(FormError::Required { field: "category" })?;
        if !CATEGORIES.contains(&category) {
            return Err(FormError::UnknownCategory(category.to_string()));
        }

        let suggested_price = match non_blank(&self.price) {
            None => None,
            Some(raw) => {
                let price = parse_amount("price", raw)?;
                if price < 0.0 {
                    return Err(FormError::Invalid("price cannot be negative".into()));
                }
                Some(price)
            }
        };

        let generated = self.generated.as_ref();
        let condition = generated
            .and_then(|p| non_blank(&p.condition))
            .unwrap_or("good");

        Ok(ProductDraft {
            title: title.to_string(),
            description: description.to_string(),
            condition: condition.to_string(),
            category: category.to_string(),
            suggested_price,
            tags: self.parsed_tags(),
            brand: generated.and_then(|p| p.brand.clone()),
            model: generated.and_then(|p| p.model.clone()),
            confidence_score: generated.map_or(DEFAULT_CONFIDENCE, |p| p.confidence_score),
            image_url: generated.and_then(|p| p.image_url.clone()),
        })
    }

    /// Fill the form from a product the listing agent generated, keeping the
    /// product for publishing.
    pub fn fill_from(&mut self, product: &Product) {
        self.title = product.title.clone();
        self.description = product.description.clone();
        if let Some(cat) = CATEGORIES
            .iter()
            .find(|c| c.eq_ignore_ascii_case(product.category.trim()))
        {
            self.category = cat.to_string();
        }
        self.tags = product.tags.join(", ");
        if let Some(price) = product.suggested_price {
            self.price = format!("{price:.2}");
        }
        self.generated = Some(product.clone());
    }
}

/// Check that the file at `path` looks like an image the listing agent will
/// accept.
pub fn check_image_path(path: &Path) -> Result<(), FormError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(e) if IMAGE_EXTENSIONS.contains(&e.as_str()) => Ok(()),
        _ => Err(FormError::Invalid("File must be an image.".into())),
    }
}

/// MIME type for an image path, by extension.
pub fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// Response of `POST /api/agent/create-listing`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingOutcome {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub database_warning: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ListingOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `POST /api/products`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedProduct {
    pub id: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub product: Product,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
