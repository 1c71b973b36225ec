//! Catalogue commands.

use clap::Args;

use dayliz_core::{CategoryId, SubcategoryId};
use dayliz_state::DaylizConfig;
use dayliz_state::repository::ProductQuery;

use super::{CliError, ensure_applied, print_json, store};

/// Filters for `dayliz products`.
#[derive(Args)]
pub struct ProductArgs {
    #[arg(long)]
    category: Option<CategoryId>,
    #[arg(long)]
    subcategory: Option<SubcategoryId>,
    /// Case-insensitive name search
    #[arg(long)]
    search: Option<String>,
    /// Only featured products
    #[arg(long)]
    featured: bool,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = ProductQuery::DEFAULT_PAGE_SIZE)]
    page_size: u32,
}

impl From<ProductArgs> for ProductQuery {
    fn from(args: ProductArgs) -> Self {
        Self {
            category: args.category,
            subcategory: args.subcategory,
            search: args.search,
            featured: args.featured.then_some(true),
            page: args.page,
            page_size: args.page_size,
        }
    }
}

/// List categories with their subcategories, in display order.
pub async fn categories(config: &DaylizConfig) -> Result<(), CliError> {
    let store = store(config)?;
    let categories = store.categories();

    let outcome = categories.load().await;
    let state = categories.state();
    ensure_applied("categories", outcome, &state)?;
    print_json(&state.data)
}

/// List one page of products.
pub async fn products(config: &DaylizConfig, args: ProductArgs) -> Result<(), CliError> {
    let store = store(config)?;
    let products = store.products();

    let outcome = products.load(&ProductQuery::from(args)).await;
    let state = products.state();
    ensure_applied("products", outcome, &state)?;
    print_json(&state.data)
}
