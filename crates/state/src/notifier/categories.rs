//! Category catalogue notifier.

use std::sync::Arc;

use tokio::sync::watch;

use dayliz_core::{Category, CategoryId, Subcategory};

use super::{Outcome, ResourceNotifier};
use crate::collection::sort_by_display_order;
use crate::repository::CategoryRepository;
use crate::state::ResourceState;

/// Read-only mirror of the category tree, sorted by display order.
///
/// Not scoped to a user, so it survives sign-out.
pub struct CategoryNotifier {
    state: ResourceNotifier<Vec<Category>>,
    repository: Arc<dyn CategoryRepository>,
}

impl CategoryNotifier {
    #[must_use]
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self {
            state: ResourceNotifier::new("categories"),
            repository,
        }
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<Category>> {
        self.state.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Vec<Category>>> {
        self.state.subscribe()
    }

    pub async fn load(&self) -> Outcome {
        let repository = Arc::clone(&self.repository);
        self.state
            .load("load", async move {
                let mut categories = repository.fetch_all(&()).await?;
                sort_by_display_order(&mut categories);
                for category in &mut categories {
                    sort_by_display_order(&mut category.subcategories);
                }
                Ok(categories)
            })
            .await
    }

    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.state().data.into_iter().find(|c| c.id == id)
    }

    /// Subcategories of `id`, empty when the category is unknown.
    #[must_use]
    pub fn subcategories(&self, id: CategoryId) -> Vec<Subcategory> {
        self.category(id)
            .map(|category| category.subcategories)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::failure;
    use crate::repository::FetchRepository;
    use dayliz_core::SubcategoryId;

    struct Catalogue(Vec<Category>);

    #[async_trait]
    impl FetchRepository<Category> for Catalogue {
        type Scope = ();

        async fn fetch_all(&self, _scope: &()) -> failure::Result<Vec<Category>> {
            Ok(self.0.clone())
        }
    }

    fn category(name: &str, order: i32, subs: &[(&str, i32)]) -> Category {
        let id = CategoryId::generate();
        Category {
            id,
            name: name.into(),
            icon_name: None,
            theme_color: None,
            display_order: order,
            subcategories: subs
                .iter()
                .map(|(sub, sub_order)| Subcategory {
                    id: SubcategoryId::generate(),
                    category_id: id,
                    name: (*sub).into(),
                    image_url: None,
                    display_order: *sub_order,
                    product_count: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_load_sorts_tree() {
        let snacks = category("Snacks", 3, &[("Chips", 2), ("Biscuits", 1)]);
        let dairy = category("Dairy", 1, &[]);
        let produce = category("Produce", 2, &[]);
        let snacks_id = snacks.id;
        let notifier = CategoryNotifier::new(Arc::new(Catalogue(vec![snacks, dairy, produce])));

        assert_eq!(notifier.load().await, Outcome::Applied);
        let names: Vec<_> = notifier.state().data.into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Dairy", "Produce", "Snacks"]);

        let subs: Vec<_> = notifier
            .subcategories(snacks_id)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(subs, ["Biscuits", "Chips"]);
        assert!(notifier.subcategories(CategoryId::generate()).is_empty());
    }
}
