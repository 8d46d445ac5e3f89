mod common;

use common::{create_location, create_product, stock_quantity, transactions_for_product, TestApp};
use stockflow_api::{
    errors::ServiceError,
    events::Event,
    services::stock_transactions::AdjustmentDirection,
};
use uuid::Uuid;

#[tokio::test]
async fn inbound_adjustment_creates_balance_and_ledger_row() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-1", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    let outcome = app
        .services
        .stock_transactions
        .record_adjustment(
            app.actor,
            product.id,
            location.id,
            10,
            AdjustmentDirection::In,
            Some("initial intake".to_string()),
        )
        .await
        .expect("adjustment should succeed");

    assert_eq!(outcome.stock_level.quantity, 10);
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(10)
    );

    let rows = transactions_for_product(&app.db, product.id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transaction_type, "ADJUSTMENT_IN");
    assert_eq!(rows[0].quantity_change, 10);
    assert_eq!(rows[0].destination_location_id, Some(location.id));
    assert_eq!(rows[0].source_location_id, None);
    assert_eq!(rows[0].user_id, app.actor);
}

#[tokio::test]
async fn outbound_adjustment_decrements_existing_balance() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-2", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 10, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let outcome = app
        .services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 4, AdjustmentDirection::Out, None)
        .await
        .expect("outbound adjustment should succeed");

    assert_eq!(outcome.stock_level.quantity, 6);

    let rows = transactions_for_product(&app.db, product.id).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].transaction_type, "ADJUSTMENT_OUT");
    assert_eq!(rows[1].quantity_change, -4);
    assert_eq!(rows[1].source_location_id, Some(location.id));
    assert_eq!(rows[1].destination_location_id, None);
}

#[tokio::test]
async fn insufficient_stock_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-3", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let err = app
        .services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 8, AdjustmentDirection::Out, None)
        .await
        .expect_err("decrement past zero must fail");

    match err {
        ServiceError::InsufficientStock {
            product_id,
            location_id,
            requested,
            available,
        } => {
            assert_eq!(product_id, product.id);
            assert_eq!(location_id, location.id);
            assert_eq!(requested, 8);
            assert_eq!(available, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Balance untouched, no ledger row for the failed attempt.
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(5)
    );
    assert_eq!(transactions_for_product(&app.db, product.id).await.len(), 1);
}

#[tokio::test]
async fn decrement_against_missing_balance_fails() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-4", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    let err = app
        .services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 1, AdjustmentDirection::Out, None)
        .await
        .expect_err("no balance row exists");

    assert!(matches!(
        err,
        ServiceError::InsufficientStock { available: 0, .. }
    ));
    assert_eq!(stock_quantity(&app.db, product.id, location.id).await, None);
}

#[tokio::test]
async fn zero_quantity_always_rejected() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-5", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    for direction in [AdjustmentDirection::In, AdjustmentDirection::Out] {
        let err = app
            .services
            .stock_transactions
            .record_adjustment(app.actor, product.id, location.id, 0, direction, None)
            .await
            .expect_err("zero quantity is a no-op and must be rejected");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    assert_eq!(stock_quantity(&app.db, product.id, location.id).await, None);
    assert!(transactions_for_product(&app.db, product.id).await.is_empty());
}

#[tokio::test]
async fn unknown_product_or_location_not_found() {
    let app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-6", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    let err = app
        .services
        .stock_transactions
        .record_adjustment(
            app.actor,
            Uuid::new_v4(),
            location.id,
            5,
            AdjustmentDirection::In,
            None,
        )
        .await
        .expect_err("unknown product");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .services
        .stock_transactions
        .record_adjustment(
            app.actor,
            product.id,
            Uuid::new_v4(),
            5,
            AdjustmentDirection::In,
            None,
        )
        .await
        .expect_err("unknown location");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn low_stock_event_fires_once_per_crossing() {
    let mut app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-7", 10).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 20, AdjustmentDirection::In, None)
        .await
        .unwrap();
    app.drain_events();

    // 20 -> 5 crosses the reorder level of 10.
    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 15, AdjustmentDirection::Out, None)
        .await
        .unwrap();

    let events = app.drain_events();
    let low_stock: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::LowStockDetected { .. }))
        .collect();
    assert_eq!(low_stock.len(), 1);
    match low_stock[0] {
        Event::LowStockDetected {
            product_id,
            quantity,
            reorder_level,
            ..
        } => {
            assert_eq!(*product_id, product.id);
            assert_eq!(*quantity, 5);
            assert_eq!(*reorder_level, 10);
        }
        _ => unreachable!(),
    }

    // Already below the level: a further decrement must not re-alert.
    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 1, AdjustmentDirection::Out, None)
        .await
        .unwrap();

    let events = app.drain_events();
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Event::LowStockDetected { .. })),
        "no second alert while already below the reorder level"
    );
}

#[tokio::test]
async fn zero_reorder_level_never_alerts() {
    let mut app = TestApp::new().await;
    let product = create_product(&app.db, "WIDGET-8", 0).await;
    let location = create_location(&app.db, "Main Warehouse").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::In, None)
        .await
        .unwrap();
    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 5, AdjustmentDirection::Out, None)
        .await
        .unwrap();

    let events = app.drain_events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::LowStockDetected { .. })));
}
