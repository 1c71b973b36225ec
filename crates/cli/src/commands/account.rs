//! Address, payment method and profile commands.

use clap::Args;
use serde::Serialize;

use dayliz_core::{AddressId, NewAddress, PaymentMethodId, User, UserProfile};

use super::{CliError, Session, ensure_applied, print_json};

/// Fields for a new address.
#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Short name shown in the picker (Home, Work, ...)
    #[arg(long, default_value = "Home")]
    label: String,
    #[arg(long)]
    recipient: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    line1: String,
    #[arg(long)]
    line2: Option<String>,
    #[arg(long)]
    landmark: Option<String>,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long, default_value = "India")]
    country: String,
    #[arg(long, requires = "lng")]
    lat: Option<f64>,
    #[arg(long, requires = "lat")]
    lng: Option<f64>,
    /// Make this the default delivery address
    #[arg(long)]
    default: bool,
}

impl From<AddressArgs> for NewAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            label: args.label,
            recipient_name: args.recipient,
            phone: args.phone,
            address_line1: args.line1,
            address_line2: args.line2,
            landmark: args.landmark,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
            latitude: args.lat,
            longitude: args.lng,
            is_default: args.default,
        }
    }
}

async fn load_addresses(session: &Session) -> Result<(), CliError> {
    let addresses = session.store.addresses();
    let outcome = addresses.load(session.user_id()).await;
    ensure_applied("addresses", outcome, &addresses.state())
}

fn print_addresses(session: &Session) -> Result<(), CliError> {
    print_json(&session.store.addresses().state().data)
}

pub async fn list_addresses(session: &Session) -> Result<(), CliError> {
    load_addresses(session).await?;
    print_addresses(session)
}

pub async fn add_address(session: &Session, args: AddressArgs) -> Result<(), CliError> {
    load_addresses(session).await?;
    let addresses = session.store.addresses();
    let outcome = addresses.create(session.user_id(), args.into()).await;
    ensure_applied("addresses", outcome, &addresses.state())?;
    print_addresses(session)
}

pub async fn remove_address(session: &Session, id: AddressId) -> Result<(), CliError> {
    load_addresses(session).await?;
    let addresses = session.store.addresses();
    let outcome = addresses.delete(id).await;
    ensure_applied("addresses", outcome, &addresses.state())?;
    print_addresses(session)
}

pub async fn default_address(session: &Session, id: AddressId) -> Result<(), CliError> {
    load_addresses(session).await?;
    let addresses = session.store.addresses();
    let outcome = addresses.set_default(session.user_id(), id).await;
    ensure_applied("addresses", outcome, &addresses.state())?;
    print_addresses(session)
}

pub async fn list_payment_methods(session: &Session) -> Result<(), CliError> {
    let methods = session.store.payment_methods();
    let outcome = methods.load(session.user_id()).await;
    let state = methods.state();
    ensure_applied("payment_methods", outcome, &state)?;
    print_json(&state.data)
}

pub async fn default_payment_method(
    session: &Session,
    id: PaymentMethodId,
) -> Result<(), CliError> {
    let methods = session.store.payment_methods();
    let outcome = methods.load(session.user_id()).await;
    ensure_applied("payment_methods", outcome, &methods.state())?;

    let outcome = methods.set_default(session.user_id(), id).await;
    let state = methods.state();
    ensure_applied("payment_methods", outcome, &state)?;
    print_json(&state.data)
}

#[derive(Serialize)]
struct ProfileView<'a> {
    user: &'a User,
    profile: Option<UserProfile>,
}

pub async fn show_profile(session: &Session) -> Result<(), CliError> {
    let profile = session.store.profile();
    let outcome = profile.load(session.user_id()).await;
    let state = profile.state();
    ensure_applied("profile", outcome, &state)?;
    print_json(&ProfileView {
        user: &session.user,
        profile: state.data,
    })
}
