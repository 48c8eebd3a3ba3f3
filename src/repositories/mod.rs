// Repositories module - data access layer over DynamoDB

pub mod cart_repository;
pub mod order_repository;
pub mod product_repository;
pub mod table_manager;
pub mod user_repository;

pub use cart_repository::{CartRepository, DynamoDbCartRepository};
pub use order_repository::{DynamoDbOrderRepository, OrderRepository};
pub use product_repository::{DynamoDbProductRepository, ProductRepository};
pub use table_manager::TableManager;
pub use user_repository::{DynamoDbUserRepository, UserRepository};

/// Create a DynamoDB client span carrying the store-call attributes the
/// trace backend groups on
pub(crate) fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,

        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),

        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,

        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,

        "component" = "aws-sdk-dynamodb",
    )
}
