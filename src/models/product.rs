use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product. Created once on upload; never updated or deleted by
/// exposed routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    /// Full URL returned by the media host at upload time
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Request model for creating a product from the parsed upload form.
/// The image itself travels separately as multipart bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
}

/// Raw image payload extracted from the multipart upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Product {
    /// Create a new Product with a generated ID and creation timestamp
    pub fn new(request: CreateProductRequest, image_url: String) -> Self {
        Self {
            id: format!(
                "P{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            name: request.name,
            description: request.description,
            price: request.price,
            category: request.category,
            image_url,
            created_at: Utc::now(),
        }
    }
}

impl ImageUpload {
    /// Formats accepted by the upload endpoint; everything else is rejected
    /// before the media host is contacted.
    pub fn is_supported_format(&self) -> bool {
        matches!(self.content_type.as_str(), "image/jpeg" | "image/png")
            || self
                .file_name
                .rsplit('.')
                .next()
                .map(|ext| {
                    let ext = ext.to_lowercase();
                    ext == "jpg" || ext == "jpeg" || ext == "png"
                })
                .unwrap_or(false)
    }
}
