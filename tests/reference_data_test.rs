mod common;

use common::{create_location, create_product, stock_quantity, TestApp};
use rust_decimal::Decimal;
use stockflow_api::{
    errors::ServiceError,
    services::{
        locations::CreateLocationInput,
        products::{CreateProductInput, UpdateProductInput},
        stock_transactions::AdjustmentDirection,
    },
};

#[tokio::test]
async fn product_skus_are_unique() {
    let app = TestApp::new().await;

    let input = CreateProductInput {
        sku: "UNIQ-1".to_string(),
        name: "First".to_string(),
        description: None,
        reorder_level: 0,
        cost_price: Decimal::new(100, 2),
        selling_price: Decimal::new(200, 2),
    };
    app.services.products.create(app.actor, input.clone()).await.unwrap();

    let err = app
        .services
        .products
        .create(app.actor, input)
        .await
        .expect_err("duplicate SKU");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn product_with_movement_history_cannot_be_deleted() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "DEL-1", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let err = app
        .services
        .products
        .delete(app.actor, product.id)
        .await
        .expect_err("referenced by ledger rows");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Still there.
    assert!(app.services.products.get(product.id).await.is_ok());
}

#[tokio::test]
async fn unreferenced_product_can_be_deleted() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "DEL-2", 0).await;

    app.services
        .products
        .delete(app.actor, product.id)
        .await
        .expect("nothing references it");

    let err = app
        .services
        .products
        .get(product.id)
        .await
        .expect_err("gone");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn location_with_stock_history_cannot_be_deleted() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "DEL-3", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let err = app
        .services
        .locations
        .delete(app.actor, location.id)
        .await
        .expect_err("stock history exists");
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(5)
    );
}

#[tokio::test]
async fn location_names_are_unique() {
    let app = TestApp::new().await;

    app.services
        .locations
        .create(
            app.actor,
            CreateLocationInput {
                name: "Dock 7".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .locations
        .create(
            app.actor,
            CreateLocationInput {
                name: "Dock 7".to_string(),
                description: None,
            },
        )
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn reorder_level_updates_feed_threshold_detection() {
    let mut app = TestApp::new().await;
    let product = create_product(&app.db, "DEL-4", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 20, AdjustmentDirection::In, None)
        .await
        .unwrap();

    // With the threshold disabled nothing fires.
    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::Out, None)
        .await
        .unwrap();
    assert!(!app
        .drain_events()
        .iter()
        .any(|e| matches!(e, stockflow_api::events::Event::LowStockDetected { .. })));

    // Raise the reorder level above the current balance, then cross it.
    app.services
        .products
        .update(
            app.actor,
            product.id,
            UpdateProductInput {
                reorder_level: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 6, AdjustmentDirection::Out, None)
        .await
        .unwrap();
    assert!(app
        .drain_events()
        .iter()
        .any(|e| matches!(e, stockflow_api::events::Event::LowStockDetected { quantity: 9, .. })));

    let err = app
        .services
        .products
        .update(
            app.actor,
            product.id,
            UpdateProductInput {
                reorder_level: Some(-1),
                ..Default::default()
            },
        )
        .await
        .expect_err("negative reorder level");
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}
