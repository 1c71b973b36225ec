//! Repository boundary consumed by the notifiers.
//!
//! Every call resolves to `Ok(value)` or a typed [`Failure`]; expected domain
//! errors (network, validation, not-found) never panic. Mutations return the
//! affected entity or a boolean, never the refreshed collection, which is what
//! lets notifiers patch local state instead of re-fetching.

use async_trait::async_trait;

use dayliz_core::{
    CartItem, Category, CategoryId, DefaultFlag, Email, Entity, Order, OrderId, Product, ProductId,
    SubcategoryId, User, UserId, UserProfile,
};

use crate::failure::Result;

/// Read access to a collection.
#[async_trait]
pub trait FetchRepository<E: Entity>: Send + Sync {
    /// What the collection is scoped to (the signed-in user, or `()`).
    type Scope: Send + Sync;

    /// Fetch the full current collection.
    async fn fetch_all(&self, scope: &Self::Scope) -> Result<Vec<E>>;
}

/// Full CRUD over a collection.
#[async_trait]
pub trait CollectionRepository<E: Entity>: FetchRepository<E> {
    /// Insert a row; the returned entity carries the server-assigned ID.
    async fn create(&self, scope: &Self::Scope, draft: E::Draft) -> Result<E>;

    /// Update a row and return the stored version.
    async fn update(&self, item: &E) -> Result<E>;

    /// Delete a row. `Ok(false)` means nothing matched.
    async fn delete(&self, id: E::Id) -> Result<bool>;
}

/// Collections with a single default element.
#[async_trait]
pub trait DefaultRepository<E: DefaultFlag>: CollectionRepository<E> {
    /// Make `id` the default. `Ok(false)` means nothing matched.
    async fn set_default(&self, scope: &Self::Scope, id: E::Id) -> Result<bool>;
}

/// The user's cart.
#[async_trait]
pub trait CartRepository: CollectionRepository<CartItem, Scope = UserId> {
    /// Remove every line. `Ok(false)` means the backend refused.
    async fn clear(&self, user: &UserId) -> Result<bool>;
}

/// The user's orders.
#[async_trait]
pub trait OrderRepository: CollectionRepository<Order, Scope = UserId> {
    /// Cancel an order and return its new state.
    async fn cancel(&self, id: OrderId) -> Result<Order>;
}

/// Product categories, shared by every user.
pub trait CategoryRepository: FetchRepository<Category, Scope = ()> {}

impl<T: FetchRepository<Category, Scope = ()> + ?Sized> CategoryRepository for T {}

/// Which slice of the catalogue to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub subcategory: Option<SubcategoryId>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub featured: Option<bool>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl ProductQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    #[must_use]
    pub fn in_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_subcategory(subcategory: SubcategoryId) -> Self {
        Self {
            subcategory: Some(subcategory),
            ..Self::default()
        }
    }

    /// Rows to skip and take, with page and size clamped to valid ranges.
    #[must_use]
    pub fn window(&self) -> (u32, u32) {
        let size = self.page_size.clamp(1, Self::MAX_PAGE_SIZE);
        let page = self.page.max(1);
        ((page - 1).saturating_mul(size), size)
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            subcategory: None,
            search: None,
            featured: None,
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// The product catalogue, shared by every user.
#[async_trait]
pub trait ProductRepository: FetchRepository<Product, Scope = ProductQuery> {
    /// A single active product, read fresh from the backend.
    ///
    /// Fails with `NotFound` when the product does not exist.
    async fn product(&self, id: ProductId) -> Result<Product>;
}

/// The editable profile row.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `Ok(None)` when the user has no profile row yet.
    async fn fetch(&self, user: &UserId) -> Result<Option<UserProfile>>;

    async fn update(&self, profile: &UserProfile) -> Result<UserProfile>;
}

/// Registration details.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub phone: Option<String>,
}

/// Authentication backend.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// The user of a still-valid stored session, if any.
    async fn current_user(&self) -> Result<Option<User>>;

    async fn sign_in_with_password(&self, email: &Email, password: &str) -> Result<User>;

    async fn sign_up(&self, details: SignUp) -> Result<User>;

    /// Run the Google account picker and exchange its token.
    ///
    /// Returns [`Failure::Cancelled`](crate::failure::Failure::Cancelled) when
    /// the user closes the picker.
    async fn sign_in_with_google(&self) -> Result<User>;

    async fn sign_out(&self) -> Result<()>;

    /// Change the password of the signed-in user.
    async fn change_password(&self, current: &str, new: &str) -> Result<()>;

    async fn request_password_reset(&self, email: &Email) -> Result<()>;
}

/// External Google account picker.
///
/// `Ok(None)` means the user dismissed the picker without choosing an
/// account.
#[async_trait]
pub trait IdTokenProvider: Send + Sync {
    async fn google_id_token(&self) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_window() {
        assert_eq!(ProductQuery::default().window(), (0, 20));

        let third = ProductQuery {
            page: 3,
            page_size: 10,
            ..ProductQuery::default()
        };
        assert_eq!(third.window(), (20, 10));

        let oversized = ProductQuery {
            page: 0,
            page_size: 500,
            ..ProductQuery::default()
        };
        assert_eq!(oversized.window(), (0, 100));
    }
}
