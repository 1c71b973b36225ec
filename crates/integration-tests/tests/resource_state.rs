//! Load transitions and failure mapping through a full store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use dayliz_core::{Address, OrderStatus, Product};
use dayliz_integration_tests::{MemoryBackend, fixtures};
use dayliz_state::Failure;
use dayliz_state::failure::{
    AUTH_MESSAGE, CACHE_MESSAGE, NETWORK_MESSAGE, NOT_FOUND_MESSAGE, SERVER_MESSAGE,
    UNKNOWN_MESSAGE,
};
use dayliz_state::notifier::Outcome;
use dayliz_state::repository::ProductQuery;

fn labels(rows: &[Address]) -> Vec<&str> {
    rows.iter().map(|row| row.label.as_str()).collect()
}

// =============================================================================
// Successful loads
// =============================================================================

#[tokio::test]
async fn test_last_successful_load_wins() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;

    backend.seed_addresses(vec![fixtures::address(user, "Home", true)]);
    assert_eq!(store.addresses().load(&user).await, Outcome::Applied);

    backend.seed_addresses(vec![
        fixtures::address(user, "Work", true),
        fixtures::address(user, "Gym", false),
    ]);
    assert_eq!(store.addresses().load(&user).await, Outcome::Applied);

    let state = store.addresses().state();
    assert_eq!(labels(&state.data), ["Work", "Gym"]);
    assert!(!state.is_loading);
    assert!(state.error_message.is_none());
}

#[tokio::test]
async fn test_load_only_returns_rows_for_user() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;
    let stranger = dayliz_core::UserId::generate();

    backend.seed_orders(vec![
        fixtures::order(user, OrderStatus::Pending),
        fixtures::order(stranger, OrderStatus::Pending),
    ]);
    assert_eq!(store.orders().load(&user).await, Outcome::Applied);
    assert_eq!(store.orders().state().data.len(), 1);
}

#[tokio::test]
async fn test_successful_load_clears_previous_error() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;

    backend.fail_next(Failure::Network("connection reset".into()));
    assert_eq!(store.cart().load(&user).await, Outcome::Failed);
    assert!(store.cart().state().has_error());

    assert_eq!(store.cart().load(&user).await, Outcome::Applied);
    assert!(store.cart().state().error_message.is_none());
}

// =============================================================================
// Failed loads
// =============================================================================

#[tokio::test]
async fn test_failed_load_keeps_previous_data() {
    let failures = [
        (Failure::Network("timeout".into()), NETWORK_MESSAGE.to_string()),
        (Failure::Server(String::new()), SERVER_MESSAGE.to_string()),
        (
            Failure::Server("Row level security violation".into()),
            "Row level security violation".to_string(),
        ),
        (Failure::Auth(String::new()), AUTH_MESSAGE.to_string()),
        (Failure::Cache("disk full".into()), CACHE_MESSAGE.to_string()),
        (Failure::NotFound(String::new()), NOT_FOUND_MESSAGE.to_string()),
        (Failure::Unknown("bad json".into()), UNKNOWN_MESSAGE.to_string()),
    ];

    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;
    backend.seed_addresses(vec![fixtures::address(user, "Home", true)]);
    assert_eq!(store.addresses().load(&user).await, Outcome::Applied);

    for (failure, expected) in failures {
        backend.fail_next(failure);
        assert_eq!(store.addresses().load(&user).await, Outcome::Failed);

        let state = store.addresses().state();
        assert_eq!(labels(&state.data), ["Home"]);
        assert!(!state.is_loading);
        assert_eq!(state.error_message.as_deref(), Some(expected.as_str()));
    }
}

#[tokio::test]
async fn test_failed_first_load_leaves_empty_data() {
    let backend = MemoryBackend::new();
    let store = backend.store();

    backend.fail_next(Failure::Network("dns".into()));
    assert_eq!(store.categories().load().await, Outcome::Failed);

    let state = store.categories().state();
    assert!(state.data.is_empty());
    assert!(!state.is_loading);
    assert_eq!(state.error_message.as_deref(), Some(NETWORK_MESSAGE));
}

#[tokio::test]
async fn test_failure_is_scoped_to_one_resource() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;

    backend.fail_next(Failure::Server(String::new()));
    assert_eq!(store.orders().load(&user).await, Outcome::Failed);
    assert_eq!(store.addresses().load(&user).await, Outcome::Applied);

    assert!(store.orders().state().has_error());
    assert!(!store.addresses().state().has_error());
}

#[tokio::test]
async fn test_load_user_data_reports_first_failure() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let user = backend.user().id;

    assert_eq!(store.load_user_data(&user).await, Outcome::Applied);

    backend.fail_next(Failure::Network("offline".into()));
    assert_eq!(store.load_user_data(&user).await, Outcome::Failed);
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_categories_sorted_by_display_order() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    backend.seed_categories(vec![
        fixtures::category("Snacks", 3, &[("Chips", 2), ("Biscuits", 1)]),
        fixtures::category("Dairy", 1, &[("Milk", 1)]),
        fixtures::category("Fruits", 2, &[]),
    ]);

    assert_eq!(store.categories().load().await, Outcome::Applied);

    let categories = store.categories().state().data;
    let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Dairy", "Fruits", "Snacks"]);

    let snacks = categories.last().unwrap();
    let subs: Vec<_> = store
        .categories()
        .subcategories(snacks.id)
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(subs, ["Biscuits", "Chips"]);
}

#[tokio::test]
async fn test_products_listed_by_subcategory() {
    let backend = MemoryBackend::new();
    let store = backend.store();
    let dairy = fixtures::category("Dairy", 1, &[("Milk", 1), ("Cheese", 2)]);
    let milk = dairy.subcategories[0].id;
    let in_milk = |name: &str, stock| Product {
        category_id: dairy.id,
        subcategory_id: Some(milk),
        ..fixtures::product(name, 6800, stock)
    };
    let mut retired = in_milk("Toned Milk 500ml", 9);
    retired.is_active = false;
    backend.seed_products(vec![
        in_milk("Taaza 1L", 12),
        in_milk("Gold 1L", 0),
        retired,
        Product {
            category_id: dairy.id,
            ..fixtures::product("Cheddar Slices", 14500, 4)
        },
    ]);

    let query = ProductQuery::in_subcategory(milk);
    assert_eq!(store.products().load(&query).await, Outcome::Applied);

    let names: Vec<_> = store
        .products()
        .state()
        .data
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Gold 1L", "Taaza 1L"]);
    assert_eq!(store.products().in_stock().len(), 1);

    let whole_category = ProductQuery::in_category(dairy.id);
    assert_eq!(store.products().load(&whole_category).await, Outcome::Applied);
    assert_eq!(store.products().state().data.len(), 3);
}
