//! Order commands.

use dayliz_core::OrderId;

use super::{CliError, Session, ensure_applied, print_json};

pub async fn list(session: &Session) -> Result<(), CliError> {
    let orders = session.store.orders();
    let outcome = orders.load(session.user_id()).await;
    let state = orders.state();
    ensure_applied("orders", outcome, &state)?;
    print_json(&state.data)
}

/// Cancel an order. The list is loaded first so an order that is already
/// shipped is refused without a round trip.
pub async fn cancel(session: &Session, id: OrderId) -> Result<(), CliError> {
    let orders = session.store.orders();
    let outcome = orders.load(session.user_id()).await;
    ensure_applied("orders", outcome, &orders.state())?;

    let outcome = orders.cancel(id).await;
    ensure_applied("orders", outcome, &orders.state())?;
    print_json(&orders.get(id))
}
