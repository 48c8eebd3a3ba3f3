use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use storefront_rs::{
    handlers::{self, accounts, cart, catalog, orders, ApiState},
    init_observability,
    observability::observability_middleware,
    repositories::{
        DynamoDbCartRepository, DynamoDbOrderRepository, DynamoDbProductRepository,
        DynamoDbUserRepository, TableManager,
    },
    services::{AccountService, CartService, CatalogService, MediaClient, OrderService},
    shutdown_observability, Config, Metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Load configuration first (basic logging only)
    let config = Config::from_environment().await?;
    println!("Configuration loaded successfully");

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        &config.observability.otlp_endpoint,
        config.observability.enable_json_logging,
    )?;

    info!("Starting storefront-rs service");
    info!(
        "Service: {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.aws.region);
    info!(
        "DynamoDB tables: users={}, products={}, cart_items={}, orders={}",
        config.database.users_table_name,
        config.database.products_table_name,
        config.database.cart_items_table_name,
        config.database.orders_table_name
    );

    let metrics = Arc::new(Metrics::new()?);
    info!("Metrics initialized successfully");

    // AWS client is constructed once by the config loader and shared
    let dynamodb_client = Arc::new(config.aws.dynamodb_client.clone());
    info!("AWS clients initialized successfully");

    // Ensure the four tables and their indexes exist before serving
    let table_manager = TableManager::new(dynamodb_client.clone());
    table_manager
        .create_all_tables(
            &config.database.users_table_name,
            &config.database.products_table_name,
            &config.database.cart_items_table_name,
            &config.database.orders_table_name,
        )
        .await?;
    info!("Tables ready");

    let user_repository = Arc::new(DynamoDbUserRepository::new(
        dynamodb_client.clone(),
        config.database.users_table_name.clone(),
        config.database.region.clone(),
    ));
    let product_repository = Arc::new(DynamoDbProductRepository::new(
        dynamodb_client.clone(),
        config.database.products_table_name.clone(),
        config.database.region.clone(),
    ));
    let cart_repository = Arc::new(DynamoDbCartRepository::new(
        dynamodb_client.clone(),
        config.database.cart_items_table_name.clone(),
        config.database.region.clone(),
    ));
    let order_repository = Arc::new(DynamoDbOrderRepository::new(
        dynamodb_client.clone(),
        config.database.orders_table_name.clone(),
        config.database.region.clone(),
    ));
    info!("Repositories initialized successfully");

    let media_client = Arc::new(MediaClient::new(&config.media)?);

    let account_service = Arc::new(AccountService::new(user_repository.clone()));
    let catalog_service = Arc::new(CatalogService::new(
        product_repository.clone(),
        media_client,
    ));
    let cart_service = Arc::new(CartService::new(
        cart_repository.clone(),
        product_repository.clone(),
    ));
    let order_service = Arc::new(OrderService::new(
        order_repository,
        cart_repository,
        product_repository,
        user_repository,
    ));
    info!("Services initialized successfully");

    let app = create_app(
        metrics,
        account_service,
        catalog_service,
        cart_service,
        order_service,
        config.server.max_request_size,
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    // Flush traces on shutdown
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn create_app(
    metrics: Arc<Metrics>,
    account_service: Arc<AccountService>,
    catalog_service: Arc<CatalogService>,
    cart_service: Arc<CartService>,
    order_service: Arc<OrderService>,
    max_request_size: usize,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    let api_state = ApiState {
        account_service,
        catalog_service,
        cart_service,
        order_service,
    };

    Router::new()
        // Health and metrics endpoints (with metrics state)
        .route("/health/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics)
        // Root liveness line
        .route("/", get(handlers::root))
        // Account endpoints
        .route("/user/:user_id", get(accounts::get_profile))
        .route("/user/update/:user_id", put(accounts::update_profile))
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        // Catalog endpoints
        .route("/upload", post(catalog::upload_product))
        .route("/products", get(catalog::list_products))
        // Cart endpoints
        .route("/cart/add", post(cart::add_cart_item))
        .route("/cart/:user_id", get(cart::get_cart))
        .route("/cart/update", put(cart::update_cart_item))
        .route("/cart/remove", delete(cart::remove_cart_item))
        // Order endpoints
        .route("/orders/checkout", post(orders::checkout))
        .route("/orders/user/:user_id", get(orders::list_user_orders))
        // Rider endpoints (not gated; every route is open by design)
        .route("/rider/orders", get(orders::list_all_orders))
        .route(
            "/rider/orders/:order_id/status",
            put(orders::update_order_status),
        )
        .with_state(api_state)
        // Middleware layers (outer to inner)
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
