//! Product listing notifier.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use dayliz_core::{Product, ProductId};

use super::{Outcome, ResourceNotifier};
use crate::repository::{ProductQuery, ProductRepository};
use crate::state::ResourceState;

/// The product page currently being browsed.
///
/// Each load replaces the list with the page matching its query. Like the
/// category tree, it is not user data and survives sign-out.
pub struct ProductNotifier {
    state: ResourceNotifier<Vec<Product>>,
    repository: Arc<dyn ProductRepository>,
}

impl ProductNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            state: ResourceNotifier::new("products"),
            repository,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<Product>> {
        self.state.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<Product>>> {
        self.state.subscribe()
    }

    #[instrument(skip(self))]
    pub async fn load(&self, query: &ProductQuery) -> Outcome {
        self.state
            .load("load", self.repository.fetch_all(query))
            .await
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.state().data.into_iter().find(|product| product.id == id)
    }

    /// Listed products that can be added to the cart right now.
    #[must_use]
    pub fn in_stock(&self) -> Vec<Product> {
        self.state()
            .data
            .into_iter()
            .filter(|product| product.has_stock(1))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::failure::{self, Failure};
    use crate::repository::FetchRepository;
    use dayliz_core::{CategoryId, SubcategoryId};

    struct Shelf(Vec<Product>);

    #[async_trait]
    impl FetchRepository<Product> for Shelf {
        type Scope = ProductQuery;

        async fn fetch_all(&self, query: &ProductQuery) -> failure::Result<Vec<Product>> {
            Ok(self
                .0
                .iter()
                .filter(|p| query.category.is_none_or(|c| p.category_id == c))
                .filter(|p| query.subcategory.is_none_or(|s| p.subcategory_id == Some(s)))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl ProductRepository for Shelf {
        async fn product(&self, id: ProductId) -> failure::Result<Product> {
            self.0
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| Failure::NotFound(String::new()))
        }
    }

    fn product(name: &str, category: CategoryId, stock: u32) -> Product {
        Product {
            id: ProductId::generate(),
            name: name.into(),
            description: None,
            price: Decimal::new(5000, 2),
            sale_price: None,
            category_id: category,
            subcategory_id: None,
            image_url: None,
            stock,
            is_featured: false,
            is_active: true,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_load_by_category() {
        let dairy = CategoryId::generate();
        let snacks = CategoryId::generate();
        let milk = product("Milk", dairy, 10);
        let notifier = ProductNotifier::new(Arc::new(Shelf(vec![
            milk.clone(),
            product("Paneer", dairy, 0),
            product("Chips", snacks, 3),
        ])));

        assert_eq!(
            notifier.load(&ProductQuery::in_category(dairy)).await,
            Outcome::Applied
        );
        let names: Vec<_> = notifier.state().data.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["Milk", "Paneer"]);
        assert_eq!(notifier.in_stock().len(), 1);
        assert_eq!(notifier.get(milk.id), Some(milk));

        assert_eq!(
            notifier
                .load(&ProductQuery::in_subcategory(SubcategoryId::generate()))
                .await,
            Outcome::Applied
        );
        assert!(notifier.state().data.is_empty());
    }
}
