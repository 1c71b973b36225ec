//! PostgREST-backed data repositories.

use std::fmt::Display;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use dayliz_core::{
    Address, AddressId, CartItem, CartItemId, Category, DefaultFlag, Entity, NewAddress, NewCartItem,
    NewOrder, NewPaymentMethod, Order, OrderId, OrderItem, OrderStatus, PaymentMethod,
    PaymentMethodId, Product, ProductId, UserId, UserProfile,
};

use super::types::{DefaultPatch, OrderInsert, OrderItemInsert, Owned};
use super::{CATEGORY_CACHE_KEY, SupabaseClient, SupabaseError};
use crate::failure::{Failure, Result};
use crate::notifier::NOT_CANCELLABLE_MESSAGE;
use crate::repository::{
    CartRepository, CollectionRepository, DefaultRepository, FetchRepository, OrderRepository,
    ProductQuery, ProductRepository, ProfileRepository,
};

const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT_REPRESENTATION: &str = "resolution=merge-duplicates,return=representation";
const ORDER_SELECT: &str = "*,order_items(*)";

type Filters<'a> = [(&'a str, String)];

/// `eq.` filter value.
fn eq(value: impl Display) -> String {
    format!("eq.{value}")
}

/// Filter matching every status an order can still be cancelled from.
fn cancellable_filter() -> String {
    let closed: Vec<String> = OrderStatus::NOT_CANCELLABLE
        .iter()
        .map(ToString::to_string)
        .collect();
    format!("not.in.({})", closed.join(","))
}

fn first_row<T>(table: &'static str, rows: Vec<T>) -> std::result::Result<T, SupabaseError> {
    rows.into_iter().next().ok_or(SupabaseError::MissingRow(table))
}

impl SupabaseClient {
    fn table_url(
        &self,
        table: &str,
        select: &str,
        filters: &Filters<'_>,
    ) -> std::result::Result<Url, SupabaseError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", select);
            for (column, value) in filters {
                query.append_pair(column, value);
            }
        }
        Ok(url)
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        select: &str,
        filters: &Filters<'_>,
    ) -> std::result::Result<Vec<T>, SupabaseError> {
        let url = self.table_url(table, select, filters)?;
        let rows: Vec<T> = self.send_json(self.request(Method::GET, url).await).await?;
        debug!(table, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    async fn write_rows<B, T>(
        &self,
        method: Method,
        table: &'static str,
        select: &str,
        filters: &Filters<'_>,
        prefer: &str,
        body: &B,
    ) -> std::result::Result<Vec<T>, SupabaseError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table, select, filters)?;
        let request = self
            .request(method, url)
            .await
            .header("Prefer", prefer)
            .json(body);
        self.send_json(request).await
    }

    async fn insert_row<B, T>(&self, table: &'static str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let rows = self
            .write_rows(Method::POST, table, "*", &[], RETURN_REPRESENTATION, body)
            .await?;
        Ok(first_row(table, rows)?)
    }

    async fn update_row<B, T>(&self, table: &'static str, id: impl Display + Send, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let rows = self
            .write_rows(
                Method::PATCH,
                table,
                "*",
                &[("id", eq(id))],
                RETURN_REPRESENTATION,
                body,
            )
            .await?;
        Ok(first_row(table, rows)?)
    }

    /// Delete matching rows and return how many went.
    async fn delete_rows(
        &self,
        table: &'static str,
        filters: &Filters<'_>,
    ) -> std::result::Result<usize, SupabaseError> {
        let url = self.table_url(table, "id", filters)?;
        let request = self
            .request(Method::DELETE, url)
            .await
            .header("Prefer", RETURN_REPRESENTATION);
        let deleted: Vec<serde_json::Value> = self.send_json(request).await?;
        Ok(deleted.len())
    }

    /// Flag `id` as the user's default and clear the flag everywhere else.
    ///
    /// The target is flagged first so a miss leaves the old default intact.
    async fn promote_default(
        &self,
        table: &'static str,
        user: &UserId,
        id: impl Display + Send,
    ) -> std::result::Result<bool, SupabaseError> {
        let id = id.to_string();
        let promoted: Vec<serde_json::Value> = self
            .write_rows(
                Method::PATCH,
                table,
                "id",
                &[("id", eq(&id)), ("user_id", eq(user))],
                RETURN_REPRESENTATION,
                &DefaultPatch { is_default: true },
            )
            .await?;
        if promoted.is_empty() {
            return Ok(false);
        }

        let _: Vec<serde_json::Value> = self
            .write_rows(
                Method::PATCH,
                table,
                "id",
                &[
                    ("user_id", eq(user)),
                    ("id", format!("neq.{id}")),
                    ("is_default", eq(true)),
                ],
                RETURN_REPRESENTATION,
                &DefaultPatch { is_default: false },
            )
            .await?;
        Ok(true)
    }
}

/// Fetch/create/update/delete for a table of rows owned by one user, with
/// the server-side half of single-default enforcement.
macro_rules! default_collection {
    ($entity:ty, $draft:ty, $id:ty, $table:literal) => {
        #[async_trait]
        impl FetchRepository<$entity> for SupabaseClient {
            type Scope = UserId;

            #[instrument(skip(self), fields(table = $table))]
            async fn fetch_all(&self, user: &UserId) -> Result<Vec<$entity>> {
                Ok(self
                    .select_rows(
                        $table,
                        "*",
                        &[("user_id", eq(user)), ("order", "created_at.asc".to_string())],
                    )
                    .await?)
            }
        }

        #[async_trait]
        impl CollectionRepository<$entity> for SupabaseClient {
            #[instrument(skip_all, fields(table = $table))]
            async fn create(&self, user: &UserId, draft: $draft) -> Result<$entity> {
                let created: $entity = self
                    .insert_row(
                        $table,
                        &Owned {
                            user_id: user,
                            row: &draft,
                        },
                    )
                    .await?;
                if created.is_default() {
                    self.promote_default($table, user, created.id()).await?;
                }
                Ok(created)
            }

            #[instrument(skip_all, fields(table = $table, id = %item.id()))]
            async fn update(&self, item: &$entity) -> Result<$entity> {
                let updated: $entity = self.update_row($table, item.id(), item).await?;
                if updated.is_default() {
                    self.promote_default($table, &updated.user_id, updated.id())
                        .await?;
                }
                Ok(updated)
            }

            #[instrument(skip(self), fields(table = $table))]
            async fn delete(&self, id: $id) -> Result<bool> {
                Ok(self.delete_rows($table, &[("id", eq(id))]).await? > 0)
            }
        }

        #[async_trait]
        impl DefaultRepository<$entity> for SupabaseClient {
            #[instrument(skip(self), fields(table = $table))]
            async fn set_default(&self, user: &UserId, id: $id) -> Result<bool> {
                Ok(self.promote_default($table, user, id).await?)
            }
        }
    };
}

default_collection!(Address, NewAddress, AddressId, "addresses");
default_collection!(PaymentMethod, NewPaymentMethod, PaymentMethodId, "payment_methods");

// =============================================================================
// Cart
// =============================================================================

#[async_trait]
impl FetchRepository<CartItem> for SupabaseClient {
    type Scope = UserId;

    #[instrument(skip(self))]
    async fn fetch_all(&self, user: &UserId) -> Result<Vec<CartItem>> {
        Ok(self
            .select_rows(
                "cart_items",
                "*",
                &[("user_id", eq(user)), ("order", "added_at.asc".to_string())],
            )
            .await?)
    }
}

#[async_trait]
impl CollectionRepository<CartItem> for SupabaseClient {
    #[instrument(skip_all, fields(product_id = %draft.product_id))]
    async fn create(&self, user: &UserId, draft: NewCartItem) -> Result<CartItem> {
        self.insert_row(
            "cart_items",
            &Owned {
                user_id: user,
                row: &draft,
            },
        )
        .await
    }

    #[instrument(skip_all, fields(id = %item.id, quantity = item.quantity))]
    async fn update(&self, item: &CartItem) -> Result<CartItem> {
        self.update_row("cart_items", item.id, item).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CartItemId) -> Result<bool> {
        Ok(self.delete_rows("cart_items", &[("id", eq(id))]).await? > 0)
    }
}

#[async_trait]
impl CartRepository for SupabaseClient {
    #[instrument(skip(self))]
    async fn clear(&self, user: &UserId) -> Result<bool> {
        let removed = self
            .delete_rows("cart_items", &[("user_id", eq(user))])
            .await?;
        debug!(removed, "Cart cleared");
        Ok(true)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Columns a client may change on an existing order.
#[derive(Debug, Serialize)]
struct OrderPatch<'a> {
    status: OrderStatus,
    delivery_address: &'a str,
    address_lat: Option<f64>,
    address_lng: Option<f64>,
    updated_at: chrono::DateTime<Utc>,
}

impl SupabaseClient {
    async fn order_by_id(&self, id: OrderId) -> Result<Order> {
        let rows = self
            .select_rows("orders", ORDER_SELECT, &[("id", eq(id))])
            .await?;
        Ok(first_row("orders", rows)?)
    }
}

#[async_trait]
impl FetchRepository<Order> for SupabaseClient {
    type Scope = UserId;

    #[instrument(skip(self))]
    async fn fetch_all(&self, user: &UserId) -> Result<Vec<Order>> {
        Ok(self
            .select_rows(
                "orders",
                ORDER_SELECT,
                &[("user_id", eq(user)), ("order", "created_at.desc".to_string())],
            )
            .await?)
    }
}

#[async_trait]
impl CollectionRepository<Order> for SupabaseClient {
    /// Insert the order row, then its lines. A failed line insert removes the
    /// half-written order again.
    #[instrument(skip_all, fields(lines = draft.items.len()))]
    async fn create(&self, user: &UserId, draft: NewOrder) -> Result<Order> {
        if draft.items.is_empty() {
            return Err(Failure::Server("Your cart is empty".to_string()));
        }

        let mut order: Order = self
            .insert_row("orders", &OrderInsert::new(user, &draft))
            .await?;

        let lines: Vec<OrderItemInsert<'_>> = draft
            .items
            .iter()
            .map(|item| OrderItemInsert {
                order_id: order.id,
                item,
            })
            .collect();
        let inserted: std::result::Result<Vec<OrderItem>, SupabaseError> = self
            .write_rows(
                Method::POST,
                "order_items",
                "*",
                &[],
                RETURN_REPRESENTATION,
                lines.as_slice(),
            )
            .await;

        match inserted {
            Ok(items) => {
                order.items = items;
                Ok(order)
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Order lines failed, removing order");
                if let Err(cleanup) = self.delete_rows("orders", &[("id", eq(order.id))]).await {
                    warn!(order_id = %order.id, error = %cleanup, "Could not remove partial order");
                }
                Err(e.into())
            }
        }
    }

    #[instrument(skip_all, fields(id = %item.id))]
    async fn update(&self, item: &Order) -> Result<Order> {
        let patch = OrderPatch {
            status: item.status,
            delivery_address: &item.delivery_address,
            address_lat: item.address_lat,
            address_lng: item.address_lng,
            updated_at: Utc::now(),
        };
        let rows: Vec<Order> = self
            .write_rows(
                Method::PATCH,
                "orders",
                ORDER_SELECT,
                &[("id", eq(item.id))],
                RETURN_REPRESENTATION,
                &patch,
            )
            .await?;
        Ok(first_row("orders", rows)?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: OrderId) -> Result<bool> {
        Ok(self.delete_rows("orders", &[("id", eq(id))]).await? > 0)
    }
}

#[async_trait]
impl OrderRepository for SupabaseClient {
    /// Read the order, refuse if it has left the store, then write the
    /// cancellation. The write is filtered on status again so an order that
    /// moved on in between is not touched.
    #[instrument(skip(self))]
    async fn cancel(&self, id: OrderId) -> Result<Order> {
        let order = self.order_by_id(id).await?;
        if !order.is_cancellable() {
            return Err(Failure::Server(NOT_CANCELLABLE_MESSAGE.to_string()));
        }

        let cancellation = order.cancellation(Utc::now());
        let rows: Vec<Order> = self
            .write_rows(
                Method::PATCH,
                "orders",
                ORDER_SELECT,
                &[("id", eq(id)), ("status", cancellable_filter())],
                RETURN_REPRESENTATION,
                &cancellation,
            )
            .await?;

        let cancelled = rows
            .into_iter()
            .next()
            .ok_or_else(|| Failure::Server(NOT_CANCELLABLE_MESSAGE.to_string()))?;
        if cancelled.refund_status.is_some() {
            debug!(order_id = %id, "Refund queued for cancelled order");
        }
        Ok(cancelled)
    }
}

// =============================================================================
// Categories
// =============================================================================

#[async_trait]
impl FetchRepository<Category> for SupabaseClient {
    type Scope = ();

    #[instrument(skip_all)]
    async fn fetch_all(&self, _scope: &()) -> Result<Vec<Category>> {
        if let Some(categories) = self.inner.categories.get(&CATEGORY_CACHE_KEY).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .select_rows(
                "categories",
                "*,subcategories(*)",
                &[
                    ("is_active", eq(true)),
                    ("order", "display_order.asc".to_string()),
                ],
            )
            .await?;

        self.inner
            .categories
            .insert(CATEGORY_CACHE_KEY, categories.clone())
            .await;
        Ok(categories)
    }
}

// =============================================================================
// Products
// =============================================================================

#[async_trait]
impl FetchRepository<Product> for SupabaseClient {
    type Scope = ProductQuery;

    #[instrument(skip(self))]
    async fn fetch_all(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let (offset, limit) = query.window();
        let mut filters = vec![("is_active", eq(true))];
        if let Some(category) = query.category {
            filters.push(("category_id", eq(category)));
        }
        if let Some(subcategory) = query.subcategory {
            filters.push(("subcategory_id", eq(subcategory)));
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filters.push(("name", format!("ilike.*{term}*")));
        }
        if let Some(featured) = query.featured {
            filters.push(("is_featured", eq(featured)));
        }
        filters.push(("order", "name.asc".to_string()));
        filters.push(("offset", offset.to_string()));
        filters.push(("limit", limit.to_string()));

        Ok(self.select_rows("products", "*", &filters).await?)
    }
}

#[async_trait]
impl ProductRepository for SupabaseClient {
    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Product> {
        let rows = self
            .select_rows(
                "products",
                "*",
                &[("id", eq(id)), ("is_active", eq(true))],
            )
            .await?;
        Ok(first_row("products", rows)?)
    }
}

// =============================================================================
// Profile
// =============================================================================

#[async_trait]
impl ProfileRepository for SupabaseClient {
    #[instrument(skip(self))]
    async fn fetch(&self, user: &UserId) -> Result<Option<UserProfile>> {
        let rows: Vec<UserProfile> = self
            .select_rows(
                "user_profiles",
                "*",
                &[("user_id", eq(user)), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Upsert on `user_id`, so the first save creates the row.
    #[instrument(skip_all, fields(user_id = %profile.user_id))]
    async fn update(&self, profile: &UserProfile) -> Result<UserProfile> {
        let stamped = UserProfile {
            updated_at: Some(Utc::now()),
            ..profile.clone()
        };
        let rows: Vec<UserProfile> = self
            .write_rows(
                Method::POST,
                "user_profiles",
                "*",
                &[("on_conflict", "user_id".to_string())],
                UPSERT_REPRESENTATION,
                &stamped,
            )
            .await?;
        Ok(first_row("user_profiles", rows)?)
    }
}
