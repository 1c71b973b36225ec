//! Dayliz CLI - inspect and manage a Dayliz account from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalogue (no sign-in needed)
//! dayliz categories
//! dayliz products --category <CATEGORY_ID> --search paneer
//!
//! # Saved addresses
//! dayliz addresses list
//! dayliz addresses add --label Home --recipient "Meera" --phone +919800000000 \
//!     --line1 "12 MG Road" --city Tura --state Meghalaya --postal-code 794001 --default
//! dayliz addresses default <ADDRESS_ID>
//!
//! # Cart and orders
//! dayliz cart add --product-id <UUID> --quantity 2
//! dayliz cart set <CART_ITEM_ID> 3
//! dayliz orders cancel <ORDER_ID>
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - project credentials (see `DaylizConfig`)
//! - `DAYLIZ_EMAIL`, `DAYLIZ_PASSWORD` - account used for user-scoped commands
//!
//! Every command prints the resulting resource state as JSON on stdout.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use dayliz_core::{AddressId, CartItemId, OrderId, PaymentMethodId, ProductId};
use dayliz_state::{DaylizConfig, telemetry};

mod commands;

#[derive(Parser)]
#[command(name = "dayliz")]
#[command(author, version, about = "Dayliz account CLI")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List product categories and their subcategories
    Categories,
    /// List products, filtered by category, subcategory or name
    Products(commands::catalog::ProductArgs),
    /// Manage saved delivery addresses
    Addresses {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Manage saved payment methods
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// View and cancel orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// View the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add(commands::account::AddressArgs),
    /// Delete an address
    Remove { id: AddressId },
    /// Make an address the default
    Default { id: AddressId },
}

#[derive(Subcommand)]
enum PaymentAction {
    /// List saved payment methods
    List,
    /// Make a payment method the default
    Default { id: PaymentMethodId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    List,
    /// Add a product at its catalogue price (merges with an existing line)
    Add {
        #[arg(long)]
        product_id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set { id: CartItemId, quantity: u32 },
    /// Remove a line
    Remove { id: CartItemId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, newest first
    List,
    /// Cancel an order that has not left the store yet
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the signed-in user and their profile row
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match DaylizConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing(cli.json_logs);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialised before the tracing subscriber
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(cli.json_logs);

    let result: Result<(), commands::CliError> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &DaylizConfig) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Categories => commands::catalog::categories(config).await,
        Commands::Products(args) => commands::catalog::products(config, args).await,
        Commands::Addresses { action } => {
            let session = commands::Session::sign_in(config).await?;
            match action {
                AddressAction::List => commands::account::list_addresses(&session).await,
                AddressAction::Add(args) => commands::account::add_address(&session, args).await,
                AddressAction::Remove { id } => {
                    commands::account::remove_address(&session, id).await
                }
                AddressAction::Default { id } => {
                    commands::account::default_address(&session, id).await
                }
            }
        }
        Commands::Payments { action } => {
            let session = commands::Session::sign_in(config).await?;
            match action {
                PaymentAction::List => commands::account::list_payment_methods(&session).await,
                PaymentAction::Default { id } => {
                    commands::account::default_payment_method(&session, id).await
                }
            }
        }
        Commands::Cart { action } => {
            let session = commands::Session::sign_in(config).await?;
            match action {
                CartAction::List => commands::cart::list(&session).await,
                CartAction::Add {
                    product_id,
                    quantity,
                } => commands::cart::add(&session, product_id, quantity).await,
                CartAction::Set { id, quantity } => {
                    commands::cart::set_quantity(&session, id, quantity).await
                }
                CartAction::Remove { id } => commands::cart::remove(&session, id).await,
                CartAction::Clear => commands::cart::clear(&session).await,
            }
        }
        Commands::Orders { action } => {
            let session = commands::Session::sign_in(config).await?;
            match action {
                OrderAction::List => commands::orders::list(&session).await,
                OrderAction::Cancel { id } => commands::orders::cancel(&session, id).await,
            }
        }
        Commands::Profile { action } => {
            let session = commands::Session::sign_in(config).await?;
            match action {
                ProfileAction::Show => commands::account::show_profile(&session).await,
            }
        }
    }
}
