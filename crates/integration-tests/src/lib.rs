//! Integration tests for the Dayliz state layer.
//!
//! [`MemoryBackend`] implements every repository trait over in-memory tables,
//! so a full [`DaylizStore`] can be exercised without a Supabase project.
//! Failures are injected per call with [`MemoryBackend::fail_next`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dayliz-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use dayliz_core::{
    Address, AddressId, CartItem, CartItemId, Category, DefaultFlag, Email, NewAddress,
    NewCartItem, NewOrder, NewPaymentMethod, Order, OrderId, OrderItem, OrderStatus,
    PaymentMethod, PaymentMethodId, PaymentStatus, Product, ProductId, User, UserId, UserProfile,
};
use dayliz_state::failure::{Failure, Result};
use dayliz_state::notifier::NOT_CANCELLABLE_MESSAGE;
use dayliz_state::repository::{
    AuthRepository, CartRepository, CollectionRepository, DefaultRepository, FetchRepository,
    OrderRepository, ProductQuery, ProductRepository, ProfileRepository, SignUp,
};
use dayliz_state::{DaylizStore, Repositories};

/// What the next Google sign-in attempt does.
#[derive(Debug, Clone)]
pub enum GoogleScript {
    /// The user picks the account and the exchange succeeds.
    Account,
    /// The user closes the picker.
    Cancel,
    /// The exchange fails.
    Fail(Failure),
}

/// In-memory stand-in for the Supabase project.
pub struct MemoryBackend {
    user: User,
    password: Mutex<String>,
    signed_in: Mutex<bool>,
    addresses: Mutex<Vec<Address>>,
    payment_methods: Mutex<Vec<PaymentMethod>>,
    cart: Mutex<Vec<CartItem>>,
    orders: Mutex<Vec<Order>>,
    categories: Mutex<Vec<Category>>,
    products: Mutex<Vec<Product>>,
    profile: Mutex<Option<UserProfile>>,
    failures: Mutex<VecDeque<Failure>>,
    google: Mutex<GoogleScript>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    /// A backend with one registered account and no data.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            user: fixtures::user(),
            password: Mutex::new(fixtures::PASSWORD.to_string()),
            signed_in: Mutex::new(false),
            addresses: Mutex::new(Vec::new()),
            payment_methods: Mutex::new(Vec::new()),
            cart: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            categories: Mutex::new(Vec::new()),
            products: Mutex::new(Vec::new()),
            profile: Mutex::new(None),
            failures: Mutex::new(VecDeque::new()),
            google: Mutex::new(GoogleScript::Account),
        })
    }

    /// Repositories for a [`DaylizStore`], all backed by this value.
    #[must_use]
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            auth: self.clone(),
            profile: self.clone(),
            addresses: self.clone(),
            payment_methods: self.clone(),
            cart: self.clone(),
            orders: self.clone(),
            categories: self.clone(),
            products: self.clone(),
        }
    }

    /// A store over this backend.
    #[must_use]
    pub fn store(self: &Arc<Self>) -> DaylizStore {
        DaylizStore::new(self.repositories())
    }

    /// The registered account.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Make the next repository call fail with `failure`.
    pub fn fail_next(&self, failure: Failure) {
        lock(&self.failures).push_back(failure);
    }

    pub fn script_google(&self, script: GoogleScript) {
        *lock(&self.google) = script;
    }

    pub fn seed_addresses(&self, rows: Vec<Address>) {
        *lock(&self.addresses) = rows;
    }

    pub fn seed_payment_methods(&self, rows: Vec<PaymentMethod>) {
        *lock(&self.payment_methods) = rows;
    }

    pub fn seed_orders(&self, rows: Vec<Order>) {
        *lock(&self.orders) = rows;
    }

    pub fn seed_categories(&self, rows: Vec<Category>) {
        *lock(&self.categories) = rows;
    }

    pub fn seed_products(&self, rows: Vec<Product>) {
        *lock(&self.products) = rows;
    }

    /// Change a product's stock after it was listed.
    pub fn set_stock(&self, id: ProductId, stock: u32) {
        if let Some(product) = lock(&self.products).iter_mut().find(|p| p.id == id) {
            product.stock = stock;
        }
    }

    /// Server-side view of the addresses table.
    #[must_use]
    pub fn stored_addresses(&self) -> Vec<Address> {
        lock(&self.addresses).clone()
    }

    #[must_use]
    pub fn stored_cart(&self) -> Vec<CartItem> {
        lock(&self.cart).clone()
    }

    #[must_use]
    pub fn stored_order(&self, id: OrderId) -> Option<Order> {
        lock(&self.orders).iter().find(|order| order.id == id).cloned()
    }

    fn injected(&self) -> Result<()> {
        lock(&self.failures).pop_front().map_or(Ok(()), Err)
    }

    fn require_session(&self) -> Result<()> {
        if *lock(&self.signed_in) {
            Ok(())
        } else {
            Err(Failure::Auth("Your session has expired. Please sign in again.".into()))
        }
    }
}

// =============================================================================
// Default-flag collections
// =============================================================================

fn build_address(user: UserId, draft: NewAddress) -> Address {
    Address {
        id: AddressId::generate(),
        user_id: user,
        label: draft.label,
        recipient_name: draft.recipient_name,
        phone: draft.phone,
        address_line1: draft.address_line1,
        address_line2: draft.address_line2,
        landmark: draft.landmark,
        city: draft.city,
        state: draft.state,
        postal_code: draft.postal_code,
        country: draft.country,
        latitude: draft.latitude,
        longitude: draft.longitude,
        is_default: draft.is_default,
        created_at: Some(Utc::now()),
    }
}

fn build_payment_method(user: UserId, draft: NewPaymentMethod) -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::generate(),
        user_id: user,
        kind: draft.kind,
        label: draft.label,
        card_last4: draft.card_last4,
        card_network: draft.card_network,
        upi_id: draft.upi_id,
        is_default: draft.is_default,
        created_at: Some(Utc::now()),
    }
}

/// Clear the default flag on every row but `id`.
fn demote_others<E: DefaultFlag>(rows: &mut Vec<E>, id: E::Id) {
    let taken = std::mem::take(rows);
    *rows = taken
        .into_iter()
        .map(|row| {
            let keep = row.id() == id && row.is_default();
            row.with_default(keep)
        })
        .collect();
}

macro_rules! memory_default_collection {
    ($entity:ty, $draft:ty, $id:ty, $table:ident, $build:path) => {
        #[async_trait]
        impl FetchRepository<$entity> for MemoryBackend {
            type Scope = UserId;

            async fn fetch_all(&self, user: &UserId) -> Result<Vec<$entity>> {
                self.injected()?;
                Ok(lock(&self.$table)
                    .iter()
                    .filter(|row| row.user_id == *user)
                    .cloned()
                    .collect())
            }
        }

        #[async_trait]
        impl CollectionRepository<$entity> for MemoryBackend {
            async fn create(&self, user: &UserId, draft: $draft) -> Result<$entity> {
                self.injected()?;
                let created = $build(*user, draft);
                let mut rows = lock(&self.$table);
                rows.push(created.clone());
                if created.is_default {
                    demote_others(&mut *rows, created.id);
                }
                Ok(created)
            }

            async fn update(&self, item: &$entity) -> Result<$entity> {
                self.injected()?;
                let mut rows = lock(&self.$table);
                let slot = rows
                    .iter_mut()
                    .find(|row| row.id == item.id)
                    .ok_or_else(|| Failure::NotFound(String::new()))?;
                *slot = item.clone();
                if item.is_default {
                    demote_others(&mut *rows, item.id);
                }
                Ok(item.clone())
            }

            async fn delete(&self, id: $id) -> Result<bool> {
                self.injected()?;
                let mut rows = lock(&self.$table);
                let before = rows.len();
                rows.retain(|row| row.id != id);
                Ok(rows.len() < before)
            }
        }

        #[async_trait]
        impl DefaultRepository<$entity> for MemoryBackend {
            async fn set_default(&self, user: &UserId, id: $id) -> Result<bool> {
                self.injected()?;
                let mut rows = lock(&self.$table);
                if !rows.iter().any(|row| row.id == id && row.user_id == *user) {
                    return Ok(false);
                }
                let taken = std::mem::take(&mut *rows);
                *rows = taken
                    .into_iter()
                    .map(|row| {
                        let is_default = row.id == id;
                        row.with_default(is_default)
                    })
                    .collect();
                Ok(true)
            }
        }
    };
}

memory_default_collection!(Address, NewAddress, AddressId, addresses, build_address);
memory_default_collection!(
    PaymentMethod,
    NewPaymentMethod,
    PaymentMethodId,
    payment_methods,
    build_payment_method
);

// =============================================================================
// Cart
// =============================================================================

#[async_trait]
impl FetchRepository<CartItem> for MemoryBackend {
    type Scope = UserId;

    async fn fetch_all(&self, user: &UserId) -> Result<Vec<CartItem>> {
        self.injected()?;
        Ok(lock(&self.cart)
            .iter()
            .filter(|line| line.user_id == *user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CollectionRepository<CartItem> for MemoryBackend {
    async fn create(&self, user: &UserId, draft: NewCartItem) -> Result<CartItem> {
        self.injected()?;
        let line = CartItem {
            id: CartItemId::generate(),
            user_id: *user,
            product_id: draft.product_id,
            product_name: draft.product_name,
            unit_price: draft.unit_price,
            quantity: draft.quantity,
            image_url: draft.image_url,
            added_at: Some(Utc::now()),
        };
        lock(&self.cart).push(line.clone());
        Ok(line)
    }

    async fn update(&self, item: &CartItem) -> Result<CartItem> {
        self.injected()?;
        let mut cart = lock(&self.cart);
        let slot = cart
            .iter_mut()
            .find(|line| line.id == item.id)
            .ok_or_else(|| Failure::NotFound(String::new()))?;
        *slot = item.clone();
        Ok(item.clone())
    }

    async fn delete(&self, id: CartItemId) -> Result<bool> {
        self.injected()?;
        let mut cart = lock(&self.cart);
        let before = cart.len();
        cart.retain(|line| line.id != id);
        Ok(cart.len() < before)
    }
}

#[async_trait]
impl CartRepository for MemoryBackend {
    async fn clear(&self, user: &UserId) -> Result<bool> {
        self.injected()?;
        lock(&self.cart).retain(|line| line.user_id != *user);
        Ok(true)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl FetchRepository<Order> for MemoryBackend {
    type Scope = UserId;

    async fn fetch_all(&self, user: &UserId) -> Result<Vec<Order>> {
        self.injected()?;
        Ok(lock(&self.orders)
            .iter()
            .filter(|order| order.user_id == *user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CollectionRepository<Order> for MemoryBackend {
    async fn create(&self, user: &UserId, draft: NewOrder) -> Result<Order> {
        self.injected()?;
        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            user_id: *user,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Pending,
            payment_method: draft.payment_method,
            delivery_address: draft.delivery_address,
            address_lat: draft.address_lat,
            address_lng: draft.address_lng,
            items: draft
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            subtotal: draft.subtotal,
            delivery_fee: draft.delivery_fee,
            total_price: draft.total_price,
            created_at: Some(now),
            updated_at: Some(now),
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            refund_status: None,
            refund_initiated_at: None,
        };
        lock(&self.orders).push(order.clone());
        Ok(order)
    }

    async fn update(&self, item: &Order) -> Result<Order> {
        self.injected()?;
        let mut orders = lock(&self.orders);
        let slot = orders
            .iter_mut()
            .find(|order| order.id == item.id)
            .ok_or_else(|| Failure::NotFound(String::new()))?;
        *slot = item.clone();
        Ok(item.clone())
    }

    async fn delete(&self, id: OrderId) -> Result<bool> {
        self.injected()?;
        let mut orders = lock(&self.orders);
        let before = orders.len();
        orders.retain(|order| order.id != id);
        Ok(orders.len() < before)
    }
}

#[async_trait]
impl OrderRepository for MemoryBackend {
    async fn cancel(&self, id: OrderId) -> Result<Order> {
        self.injected()?;
        let mut orders = lock(&self.orders);
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| Failure::NotFound(String::new()))?;
        if !order.is_cancellable() {
            return Err(Failure::Server(NOT_CANCELLABLE_MESSAGE.to_string()));
        }
        let cancellation = order.cancellation(Utc::now());
        *order = order.clone().cancelled(&cancellation);
        Ok(order.clone())
    }
}

// =============================================================================
// Catalogue and profile
// =============================================================================

#[async_trait]
impl FetchRepository<Category> for MemoryBackend {
    type Scope = ();

    async fn fetch_all(&self, _scope: &()) -> Result<Vec<Category>> {
        self.injected()?;
        Ok(lock(&self.categories).clone())
    }
}

#[async_trait]
impl FetchRepository<Product> for MemoryBackend {
    type Scope = ProductQuery;

    async fn fetch_all(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        self.injected()?;
        let (offset, limit) = query.window();
        let term = query.search.as_deref().map(str::to_lowercase);
        let mut rows: Vec<Product> = lock(&self.products)
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| query.category.is_none_or(|c| p.category_id == c))
            .filter(|p| query.subcategory.is_none_or(|s| p.subcategory_id == Some(s)))
            .filter(|p| query.featured.is_none_or(|f| p.is_featured == f))
            .filter(|p| {
                term.as_deref()
                    .is_none_or(|t| p.name.to_lowercase().contains(t))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl ProductRepository for MemoryBackend {
    async fn product(&self, id: ProductId) -> Result<Product> {
        self.injected()?;
        lock(&self.products)
            .iter()
            .find(|p| p.id == id && p.is_active)
            .cloned()
            .ok_or_else(|| Failure::NotFound("Product not found".into()))
    }
}

#[async_trait]
impl ProfileRepository for MemoryBackend {
    async fn fetch(&self, user: &UserId) -> Result<Option<UserProfile>> {
        self.injected()?;
        Ok(lock(&self.profile)
            .clone()
            .filter(|profile| profile.user_id == *user))
    }

    async fn update(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.injected()?;
        let saved = UserProfile {
            updated_at: Some(Utc::now()),
            ..profile.clone()
        };
        *lock(&self.profile) = Some(saved.clone());
        Ok(saved)
    }
}

// =============================================================================
// Auth
// =============================================================================

#[async_trait]
impl AuthRepository for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>> {
        self.injected()?;
        Ok(lock(&self.signed_in).then(|| self.user.clone()))
    }

    async fn sign_in_with_password(&self, email: &Email, password: &str) -> Result<User> {
        self.injected()?;
        if *email != self.user.email || password != lock(&self.password).as_str() {
            return Err(Failure::Auth("Invalid login credentials".into()));
        }
        *lock(&self.signed_in) = true;
        Ok(self.user.clone())
    }

    async fn sign_up(&self, details: SignUp) -> Result<User> {
        self.injected()?;
        if details.email == self.user.email {
            return Err(Failure::Auth("User already registered".into()));
        }
        *lock(&self.signed_in) = true;
        Ok(User {
            id: UserId::generate(),
            email: details.email,
            name: Some(details.name),
            phone: details.phone,
            email_confirmed: false,
            created_at: Some(Utc::now()),
        })
    }

    async fn sign_in_with_google(&self) -> Result<User> {
        self.injected()?;
        let script = lock(&self.google).clone();
        match script {
            GoogleScript::Account => {
                *lock(&self.signed_in) = true;
                Ok(self.user.clone())
            }
            GoogleScript::Cancel => Err(Failure::Cancelled),
            GoogleScript::Fail(failure) => Err(failure),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        self.injected()?;
        *lock(&self.signed_in) = false;
        Ok(())
    }

    async fn change_password(&self, current: &str, new: &str) -> Result<()> {
        self.injected()?;
        self.require_session()?;
        let mut password = lock(&self.password);
        if current != password.as_str() {
            return Err(Failure::Auth("Current password is incorrect".into()));
        }
        if new.len() < 8 {
            return Err(Failure::Auth(
                "Password should be at least 8 characters".into(),
            ));
        }
        *password = new.to_string();
        Ok(())
    }

    async fn request_password_reset(&self, _email: &Email) -> Result<()> {
        self.injected()
    }
}
