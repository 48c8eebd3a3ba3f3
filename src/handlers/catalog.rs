use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{error, info, instrument, warn};

use crate::models::{CreateProductRequest, ImageUpload, Product};

use super::{bad_request, service_error_to_response, ApiState};

/// Upload a product: multipart fields name, description, price, category,
/// and an image file. Name, price, and image are required; the image must
/// be jpg/jpeg/png and is rejected here before the media host is contacted.
#[instrument(name = "upload_product", skip(state, multipart))]
pub async fn upload_product(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), (StatusCode, Json<Value>)> {
    info!("Processing product upload");

    let mut name = None;
    let mut description = None;
    let mut price_raw = None;
    let mut category = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Malformed multipart request: {}", e)))?
    {
        let field_name = field.name().map(ToString::to_string);
        match field_name.as_deref() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    bad_request(format!("Failed to read name field: {}", e))
                })?);
            }
            Some("description") => {
                description = Some(field.text().await.map_err(|e| {
                    bad_request(format!("Failed to read description field: {}", e))
                })?);
            }
            Some("price") => {
                price_raw = Some(field.text().await.map_err(|e| {
                    bad_request(format!("Failed to read price field: {}", e))
                })?);
            }
            Some("category") => {
                category = Some(field.text().await.map_err(|e| {
                    bad_request(format!("Failed to read category field: {}", e))
                })?);
            }
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    bad_request(format!("Failed to read image field: {}", e))
                })?;

                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            other => {
                warn!("Ignoring unexpected multipart field: {:?}", other);
            }
        }
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| bad_request("Product name is required"))?;
    let price_raw = price_raw.ok_or_else(|| bad_request("Product price is required"))?;
    let image = image.ok_or_else(|| bad_request("Product image is required"))?;

    let price = Decimal::from_str(price_raw.trim())
        .map_err(|_| bad_request(format!("Invalid price: {}", price_raw)))?;

    if !image.is_supported_format() {
        return Err(bad_request(
            "Unsupported image format: only jpg, jpeg, and png are accepted",
        ));
    }

    let request = CreateProductRequest {
        name,
        description: description.unwrap_or_default(),
        price,
        category: category.unwrap_or_default(),
    };

    match state.catalog_service.upload_product(request, image).await {
        Ok(product) => {
            info!("Successfully created product: {}", product.id);
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(err) => {
            error!("Failed to upload product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// List all products, newest first
#[instrument(name = "list_products", skip(state))]
pub async fn list_products(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Product>>, (StatusCode, Json<Value>)> {
    info!("Listing products");

    match state.catalog_service.list_products().await {
        Ok(products) => {
            info!("Successfully listed {} products", products.len());
            Ok(Json(products))
        }
        Err(err) => {
            error!("Failed to list products: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
