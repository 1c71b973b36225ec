//! Cart commands.

use serde::Serialize;

use dayliz_core::{CartItem, CartItemId, ProductId};

use super::{CliError, Session, ensure_applied, print_json};

#[derive(Serialize)]
struct CartView {
    lines: Vec<CartItem>,
    item_count: u64,
    subtotal: String,
}

async fn load(session: &Session) -> Result<(), CliError> {
    let cart = session.store.cart();
    let outcome = cart.load(session.user_id()).await;
    ensure_applied("cart", outcome, &cart.state())
}

fn print_cart(session: &Session) -> Result<(), CliError> {
    let cart = session.store.cart();
    print_json(&CartView {
        lines: cart.state().data,
        item_count: cart.item_count(),
        subtotal: cart.subtotal().to_string(),
    })
}

pub async fn list(session: &Session) -> Result<(), CliError> {
    load(session).await?;
    print_cart(session)
}

pub async fn add(session: &Session, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    load(session).await?;
    let cart = session.store.cart();
    let outcome = cart.add_item(session.user_id(), product_id, quantity).await;
    ensure_applied("cart", outcome, &cart.state())?;
    print_cart(session)
}

pub async fn set_quantity(
    session: &Session,
    id: CartItemId,
    quantity: u32,
) -> Result<(), CliError> {
    load(session).await?;
    let cart = session.store.cart();
    let outcome = cart.update_quantity(id, quantity).await;
    ensure_applied("cart", outcome, &cart.state())?;
    print_cart(session)
}

pub async fn remove(session: &Session, id: CartItemId) -> Result<(), CliError> {
    load(session).await?;
    let cart = session.store.cart();
    let outcome = cart.remove(id).await;
    ensure_applied("cart", outcome, &cart.state())?;
    print_cart(session)
}

pub async fn clear(session: &Session) -> Result<(), CliError> {
    let cart = session.store.cart();
    let outcome = cart.clear(session.user_id()).await;
    ensure_applied("cart", outcome, &cart.state())?;
    print_cart(session)
}
