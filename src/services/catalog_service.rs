use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::models::{
    CreateProductRequest, ImageUpload, Product, ServiceError, ServiceResult, Validate,
};
use crate::repositories::ProductRepository;
use crate::services::MediaClient;

/// Service for catalog management: product upload and listing
pub struct CatalogService {
    product_repository: Arc<dyn ProductRepository>,
    media_client: Arc<MediaClient>,
}

impl CatalogService {
    /// Create a new CatalogService
    pub fn new(
        product_repository: Arc<dyn ProductRepository>,
        media_client: Arc<MediaClient>,
    ) -> Self {
        Self {
            product_repository,
            media_client,
        }
    }

    /// Upload a product: persist the image on the media host, then create
    /// the catalog record holding the returned URL
    #[instrument(skip(self, request, image), fields(name = %request.name))]
    pub async fn upload_product(
        &self,
        request: CreateProductRequest,
        image: ImageUpload,
    ) -> ServiceResult<Product> {
        info!("Uploading product");

        request.validate()?;

        let image_url = self
            .media_client
            .upload_image(&image)
            .await
            .map_err(|e| {
                error!("Media host upload failed: {}", e);
                ServiceError::MediaUpload {
                    message: e.to_string(),
                }
            })?;

        let product = Product::new(request, image_url);
        let created = self.product_repository.save(product).await?;

        info!("Product created: {}", created.id);
        Ok(created)
    }

    /// List all products, newest-created first
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        info!("Listing products");

        let mut products = self.product_repository.find_all().await?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        info!("Listed {} products", products.len());
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::models::RepositoryError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use mockall::mock;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
            async fn find_by_id(&self, product_id: &str) -> Result<Option<Product>, RepositoryError>;
            async fn find_by_ids(&self, product_ids: &[String]) -> Result<Vec<Product>, RepositoryError>;
            async fn save(&self, product: Product) -> Result<Product, RepositoryError>;
        }
    }

    fn create_test_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Jollof Rice Bowl".to_string(),
            description: "Smoky party-style jollof".to_string(),
            price: dec!(10.00),
            category: "meals".to_string(),
        }
    }

    fn create_test_image() -> ImageUpload {
        ImageUpload {
            file_name: "jollof.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }
    }

    fn media_client_against(mock_server: &MockServer) -> Arc<MediaClient> {
        let config = MediaConfig {
            cloud_name: "testcloud".to_string(),
            api_key: "key123".to_string(),
            api_secret: "secret456".to_string(),
            base_url: mock_server.uri(),
        };
        Arc::new(MediaClient::new(&config).unwrap())
    }

    #[tokio::test]
    async fn test_upload_product_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/testcloud/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "secure_url": "https://media.example.com/storefront/jollof.jpg",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut mock_repo = MockTestProductRepository::new();
        mock_repo
            .expect_save()
            .times(1)
            .returning(|product| Ok(product));

        let service = CatalogService::new(
            Arc::new(mock_repo),
            media_client_against(&mock_server),
        );

        let product = service
            .upload_product(create_test_request(), create_test_image())
            .await
            .unwrap();

        assert!(product.id.starts_with('P'));
        assert_eq!(
            product.image_url,
            "https://media.example.com/storefront/jollof.jpg"
        );
        assert_eq!(product.price, dec!(10.00));
    }

    #[tokio::test]
    async fn test_upload_product_media_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/testcloud/image/upload"))
            .respond_with(ResponseTemplate::new(500).set_body_string("storage unavailable"))
            .mount(&mock_server)
            .await;

        // The product must not be written when the media host fails
        let mock_repo = MockTestProductRepository::new();

        let service = CatalogService::new(
            Arc::new(mock_repo),
            media_client_against(&mock_server),
        );

        let result = service
            .upload_product(create_test_request(), create_test_image())
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::MediaUpload { .. }
        ));
    }

    #[tokio::test]
    async fn test_upload_product_rejects_missing_name() {
        let mock_server = MockServer::start().await;
        let mock_repo = MockTestProductRepository::new();

        let service = CatalogService::new(
            Arc::new(mock_repo),
            media_client_against(&mock_server),
        );

        let request = CreateProductRequest {
            name: "   ".to_string(),
            ..create_test_request()
        };

        let result = service.upload_product(request, create_test_image()).await;

        assert!(matches!(
            result.unwrap_err(),
            ServiceError::ValidationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_products_newest_first() {
        let mut mock_repo = MockTestProductRepository::new();

        let older = {
            let mut p = Product::new(
                create_test_request(),
                "https://media.example.com/a.jpg".to_string(),
            );
            p.created_at = Utc::now() - Duration::hours(2);
            p
        };
        let newer = Product::new(
            CreateProductRequest {
                name: "Suya Skewers".to_string(),
                ..create_test_request()
            },
            "https://media.example.com/b.jpg".to_string(),
        );

        let scan_result = vec![older.clone(), newer.clone()];
        mock_repo
            .expect_find_all()
            .times(1)
            .returning(move || Ok(scan_result.clone()));

        let mock_server = MockServer::start().await;
        let service = CatalogService::new(
            Arc::new(mock_repo),
            media_client_against(&mock_server),
        );

        let products = service.list_products().await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Suya Skewers");
        assert_eq!(products[1].name, "Jollof Rice Bowl");
    }
}
