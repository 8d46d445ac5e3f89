mod common;

use common::{
    create_customer, create_location, create_product, create_supplier, stock_quantity,
    transactions_for_product, TestApp,
};
use rust_decimal::Decimal;
use stockflow_api::{
    errors::ServiceError,
    events::Event,
    services::{
        order_status::OrderStatus,
        purchase_orders::{CreateOrderItemInput, CreatePurchaseOrderInput, ReceiveItemInput},
        sales_orders::{CreateSalesOrderInput, CreateSalesOrderItemInput, ShipItemInput},
        stock_transactions::AdjustmentDirection,
    },
};
use uuid::Uuid;

fn po_input(supplier_id: Uuid, items: Vec<(Uuid, i32)>) -> CreatePurchaseOrderInput {
    CreatePurchaseOrderInput {
        supplier_id,
        order_number: None,
        notes: None,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| CreateOrderItemInput {
                product_id,
                quantity,
                unit_cost: Decimal::new(250, 2),
            })
            .collect(),
    }
}

fn so_input(customer_id: Uuid, items: Vec<(Uuid, i32)>) -> CreateSalesOrderInput {
    CreateSalesOrderInput {
        customer_id,
        order_number: None,
        notes: None,
        items: items
            .into_iter()
            .map(|(product_id, quantity)| CreateSalesOrderItemInput {
                product_id,
                quantity,
                unit_price: Decimal::new(999, 2),
            })
            .collect(),
    }
}

#[tokio::test]
async fn purchase_order_receipt_drives_stock_and_derived_status() {
    let mut app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-1", 0).await;
    let location = create_location(&app.db, "Receiving Dock").await;

    let created = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 10)]))
        .await
        .unwrap();
    assert_eq!(created.order.status, "PENDING");
    assert!(created.order.order_number.starts_with("PO-"));
    assert_eq!(created.items[0].quantity_received, 0);

    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    app.drain_events();

    // Partial receipt: 7 of 10.
    let item = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 7,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity_received, 7);
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(7)
    );

    let order = app.services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.order.status, "PARTIAL");

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OrderStatusChanged { new_status, .. } if new_status.as_str() == "PARTIAL"
    )));

    // Remaining receipt: 3 of 10 -> RECEIVED.
    let item = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 3,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity_received, 10);

    let order = app.services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.order.status, "RECEIVED");
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(10)
    );

    // Inbound receipts never cross the threshold downward.
    let events = app.drain_events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::LowStockDetected { .. })));

    let rows = transactions_for_product(&app.db, product.id).await;
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.transaction_type, "PURCHASE");
        assert_eq!(row.destination_location_id, Some(location.id));
        assert_eq!(row.purchase_order_id, Some(created.order.id));
    }
}

#[tokio::test]
async fn over_receipt_rejected_with_no_partial_increment() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-2", 0).await;
    let location = create_location(&app.db, "Receiving Dock").await;

    let created = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 10)]))
        .await
        .unwrap();
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    app.services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 7,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 5,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .expect_err("receiving 5 with only 3 remaining must fail");

    match err {
        ServiceError::BadRequest(msg) => assert!(msg.contains("only 3 of 10")),
        other => panic!("expected BadRequest, got {other:?}"),
    }

    // Counter and stock untouched by the failed attempt.
    let order = app.services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.items[0].quantity_received, 7);
    assert_eq!(order.order.status, "PARTIAL");
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(7)
    );
    assert_eq!(transactions_for_product(&app.db, product.id).await.len(), 1);
}

#[tokio::test]
async fn receipt_requires_a_fulfillable_status() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-3", 0).await;
    let location = create_location(&app.db, "Receiving Dock").await;

    let created = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 10)]))
        .await
        .unwrap();

    // PENDING does not accept receipts.
    let err = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 1,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .expect_err("pending order");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Neither does CANCELLED.
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    let err = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 1,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .expect_err("cancelled order");
    assert!(matches!(err, ServiceError::Conflict(_)));

    assert_eq!(stock_quantity(&app.db, product.id, location.id).await, None);
}

#[tokio::test]
async fn manual_transitions_follow_the_state_machine() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-4", 0).await;

    let created = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 10)]))
        .await
        .unwrap();

    // PENDING -> PROCESSING is not in the transition table.
    let err = app
        .services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Processing)
        .await
        .expect_err("pending cannot jump to processing");
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    // PENDING -> APPROVED -> PROCESSING -> CANCELLED is allowed.
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Processing)
        .await
        .unwrap();
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    // CANCELLED is terminal.
    let err = app
        .services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Pending)
        .await
        .expect_err("terminal status");
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    // The sales mirror uses SHIPPED, not RECEIVED.
    let customer = create_customer(&app.db, "Globex").await;
    let so = app
        .services
        .sales_orders
        .create(app.actor, so_input(customer.id, vec![(product.id, 5)]))
        .await
        .unwrap();
    app.services
        .sales_orders
        .update_status(app.actor, so.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    let err = app
        .services
        .sales_orders
        .update_status(app.actor, so.order.id, OrderStatus::Received)
        .await
        .expect_err("RECEIVED is the purchase-side terminal fulfillment status");
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));
}

#[tokio::test]
async fn order_creation_validates_references_atomically() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-5", 0).await;

    let err = app
        .services
        .purchase_orders
        .create(app.actor, po_input(Uuid::new_v4(), vec![(product.id, 10)]))
        .await
        .expect_err("unknown supplier");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let err = app
        .services
        .purchase_orders
        .create(
            app.actor,
            po_input(supplier.id, vec![(product.id, 10), (Uuid::new_v4(), 1)]),
        )
        .await
        .expect_err("unknown product in second line");
    assert!(matches!(err, ServiceError::NotFound(_)));

    // Nothing persisted by the failed attempts.
    let (orders, total) = app
        .services
        .purchase_orders
        .list(None, 1, 10)
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(orders.is_empty());

    let err = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![]))
        .await
        .expect_err("empty item list");
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn supplied_order_numbers_are_collision_checked() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-6", 0).await;

    let mut input = po_input(supplier.id, vec![(product.id, 1)]);
    input.order_number = Some("PO-CUSTOM-1".to_string());
    app.services
        .purchase_orders
        .create(app.actor, input)
        .await
        .unwrap();

    let mut input = po_input(supplier.id, vec![(product.id, 1)]);
    input.order_number = Some("PO-CUSTOM-1".to_string());
    let err = app
        .services
        .purchase_orders
        .create(app.actor, input)
        .await
        .expect_err("duplicate order number");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn sales_shipment_decrements_stock_and_derives_status() {
    let mut app = TestApp::new().await;
    let customer = create_customer(&app.db, "Globex").await;
    let product = create_product(&app.db, "PART-7", 0).await;
    let location = create_location(&app.db, "Pick Floor").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 20, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let created = app
        .services
        .sales_orders
        .create(app.actor, so_input(customer.id, vec![(product.id, 8)]))
        .await
        .unwrap();
    app.services
        .sales_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    app.drain_events();

    let item = app
        .services
        .sales_orders
        .ship_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ShipItemInput {
                quantity: 8,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity_shipped, 8);
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(12)
    );

    let order = app.services.sales_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.order.status, "SHIPPED");

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::OrderStatusChanged { new_status, .. } if new_status.as_str() == "SHIPPED"
    )));

    let rows = transactions_for_product(&app.db, product.id).await;
    let sale_rows: Vec<_> = rows
        .iter()
        .filter(|r| r.transaction_type == "SALE")
        .collect();
    assert_eq!(sale_rows.len(), 1);
    assert_eq!(sale_rows[0].quantity_change, -8);
    assert_eq!(sale_rows[0].source_location_id, Some(location.id));
    assert_eq!(sale_rows[0].sales_order_id, Some(created.order.id));
}

#[tokio::test]
async fn shipment_with_insufficient_stock_aborts_the_whole_unit() {
    let app = TestApp::new().await;
    let customer = create_customer(&app.db, "Globex").await;
    let product = create_product(&app.db, "PART-8", 0).await;
    let location = create_location(&app.db, "Pick Floor").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 3, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let created = app
        .services
        .sales_orders
        .create(app.actor, so_input(customer.id, vec![(product.id, 8)]))
        .await
        .unwrap();
    app.services
        .sales_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();

    let err = app
        .services
        .sales_orders
        .ship_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ShipItemInput {
                quantity: 5,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .expect_err("only 3 on hand");
    assert!(matches!(
        err,
        ServiceError::InsufficientStock {
            requested: 5,
            available: 3,
            ..
        }
    ));

    // Item counter, header status, stock, and ledger are all unchanged.
    let order = app.services.sales_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.items[0].quantity_shipped, 0);
    assert_eq!(order.order.status, "APPROVED");
    assert_eq!(
        stock_quantity(&app.db, product.id, location.id).await,
        Some(3)
    );
    assert_eq!(transactions_for_product(&app.db, product.id).await.len(), 1);
}

#[tokio::test]
async fn shipment_crossing_reorder_level_emits_low_stock() {
    let mut app = TestApp::new().await;
    let customer = create_customer(&app.db, "Globex").await;
    let product = create_product(&app.db, "PART-9", 10).await;
    let location = create_location(&app.db, "Pick Floor").await;

    app.services
        .stock_transactions
        .record_adjustment(app.actor, product.id, location.id, 15, AdjustmentDirection::In, None)
        .await
        .unwrap();

    let created = app
        .services
        .sales_orders
        .create(app.actor, so_input(customer.id, vec![(product.id, 8)]))
        .await
        .unwrap();
    app.services
        .sales_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();
    app.drain_events();

    // 15 -> 7 crosses the reorder level of 10.
    app.services
        .sales_orders
        .ship_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ShipItemInput {
                quantity: 8,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();

    let events = app.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::LowStockDetected { quantity: 7, .. }
    )));
}

#[tokio::test]
async fn item_on_wrong_order_is_not_found() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product = create_product(&app.db, "PART-10", 0).await;
    let location = create_location(&app.db, "Receiving Dock").await;

    let first = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 5)]))
        .await
        .unwrap();
    let second = app
        .services
        .purchase_orders
        .create(app.actor, po_input(supplier.id, vec![(product.id, 5)]))
        .await
        .unwrap();
    app.services
        .purchase_orders
        .update_status(app.actor, second.order.id, OrderStatus::Approved)
        .await
        .unwrap();

    let err = app
        .services
        .purchase_orders
        .receive_item(
            app.actor,
            second.order.id,
            first.items[0].id,
            ReceiveItemInput {
                quantity: 1,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .expect_err("item belongs to a different order");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn multi_line_orders_derive_status_from_aggregates() {
    let app = TestApp::new().await;
    let supplier = create_supplier(&app.db, "Acme Supply").await;
    let product_a = create_product(&app.db, "PART-11A", 0).await;
    let product_b = create_product(&app.db, "PART-11B", 0).await;
    let location = create_location(&app.db, "Receiving Dock").await;

    let created = app
        .services
        .purchase_orders
        .create(
            app.actor,
            po_input(supplier.id, vec![(product_a.id, 4), (product_b.id, 6)]),
        )
        .await
        .unwrap();
    app.services
        .purchase_orders
        .update_status(app.actor, created.order.id, OrderStatus::Approved)
        .await
        .unwrap();

    // Fully receive line A; line B still open -> PARTIAL.
    app.services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[0].id,
            ReceiveItemInput {
                quantity: 4,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    let order = app.services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.order.status, "PARTIAL");

    // Finish line B -> RECEIVED.
    app.services
        .purchase_orders
        .receive_item(
            app.actor,
            created.order.id,
            created.items[1].id,
            ReceiveItemInput {
                quantity: 6,
                location_id: location.id,
                notes: None,
            },
        )
        .await
        .unwrap();
    let order = app.services.purchase_orders.get(created.order.id).await.unwrap();
    assert_eq!(order.order.status, "RECEIVED");
}
