use super::*;
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

// These tests mutate process environment variables, so they must not run
// concurrently with each other.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

fn clear_storefront_env() {
    for (key, _) in env::vars() {
        if key.starts_with("STOREFRONT_") {
            env::remove_var(key);
        }
    }
}

#[test]
fn test_server_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8080);
    assert_eq!(config.request_timeout_seconds, 30);
    assert_eq!(config.max_request_size, 10 * 1024 * 1024);
}

#[test]
fn test_database_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    env::set_var("STOREFRONT_USERS_TABLE_NAME", "TestUsers");
    env::set_var("STOREFRONT_PRODUCTS_TABLE_NAME", "TestProducts");
    env::set_var("STOREFRONT_CART_ITEMS_TABLE_NAME", "TestCartItems");
    env::set_var("STOREFRONT_ORDERS_TABLE_NAME", "TestOrders");
    env::set_var("STOREFRONT_REGION", "eu-west-1");

    let config = DatabaseConfig::from_env().unwrap();

    assert_eq!(config.users_table_name, "TestUsers");
    assert_eq!(config.products_table_name, "TestProducts");
    assert_eq!(config.cart_items_table_name, "TestCartItems");
    assert_eq!(config.orders_table_name, "TestOrders");
    assert_eq!(config.region, "eu-west-1");

    clear_storefront_env();
}

#[test]
fn test_database_config_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    let config = DatabaseConfig::from_env().unwrap();

    assert_eq!(config.users_table_name, "StorefrontUsers");
    assert_eq!(config.products_table_name, "StorefrontProducts");
    assert_eq!(config.cart_items_table_name, "StorefrontCartItems");
    assert_eq!(config.orders_table_name, "StorefrontOrders");
    assert_eq!(config.region, "us-west-2");
}

#[test]
fn test_media_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    env::set_var("STOREFRONT_MEDIA_CLOUD_NAME", "demo-cloud");
    env::set_var("STOREFRONT_MEDIA_API_KEY", "key123");
    env::set_var("STOREFRONT_MEDIA_API_SECRET", "secret456");

    let config = MediaConfig::from_env().unwrap();

    assert_eq!(config.cloud_name, "demo-cloud");
    assert_eq!(config.api_key, "key123");
    assert_eq!(config.api_secret, "secret456");
    assert_eq!(config.base_url, "https://api.cloudinary.com/v1_1");

    clear_storefront_env();
}

#[test]
fn test_media_config_defaults_to_empty_credentials() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    let config = MediaConfig::from_env().unwrap();

    assert!(config.cloud_name.is_empty());
    assert!(config.api_key.is_empty());
    assert!(config.api_secret.is_empty());
}

#[test]
fn test_observability_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_storefront_env();

    env::set_var("STOREFRONT_SERVICE_NAME", "test-service");
    env::set_var("STOREFRONT_SERVICE_VERSION", "1.0.0");
    env::set_var("STOREFRONT_OTLP_ENDPOINT", "http://test:4317");
    env::set_var("STOREFRONT_METRICS_PORT", "9091");
    env::set_var("STOREFRONT_LOG_LEVEL", "debug");

    let config = ObservabilityConfig::from_env().unwrap();

    assert_eq!(config.service_name, "test-service");
    assert_eq!(config.service_version, "1.0.0");
    assert_eq!(config.otlp_endpoint, "http://test:4317");
    assert_eq!(config.metrics_port, 9091);
    assert_eq!(config.log_level, "debug");

    clear_storefront_env();
}

#[test]
fn test_server_config_request_timeout() {
    let config = ServerConfig {
        host: "localhost".to_string(),
        port: 8080,
        request_timeout_seconds: 45,
        max_request_size: 1024,
    };

    assert_eq!(config.request_timeout(), std::time::Duration::from_secs(45));
}
