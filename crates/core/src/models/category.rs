//! Product categories (`categories` with embedded `subcategories`).

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ordered};
use crate::types::{CategoryId, SubcategoryId};

/// A top-level category on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon_name: Option<String>,
    /// Hex colour used for the category tile, e.g. `#4CAF50`.
    pub theme_color: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// A subcategory listed under a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    pub product_count: Option<u32>,
}

// Categories are read-only from the client, so there is no draft type.
impl Entity for Category {
    type Id = CategoryId;
    type Draft = Infallible;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl Ordered for Category {
    fn display_order(&self) -> i32 {
        self.display_order
    }
}

impl Ordered for Subcategory {
    fn display_order(&self) -> i32 {
        self.display_order
    }
}
