//! The session-scoped set of notifiers.

use std::sync::Arc;

use tracing::{info, instrument};

use dayliz_core::{Address, PaymentMethod, UserId};

use crate::notifier::{
    AddressNotifier, AuthNotifier, CartNotifier, CategoryNotifier, OrderNotifier, Outcome,
    PaymentMethodNotifier, ProductNotifier, ProfileNotifier,
};
use crate::repository::{
    AuthRepository, CartRepository, CategoryRepository, DefaultRepository, OrderRepository,
    ProductRepository, ProfileRepository,
};
use crate::supabase::SupabaseClient;

/// Every repository a [`DaylizStore`] needs.
#[derive(Clone)]
pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub profile: Arc<dyn ProfileRepository>,
    pub addresses: Arc<dyn DefaultRepository<Address, Scope = UserId>>,
    pub payment_methods: Arc<dyn DefaultRepository<PaymentMethod, Scope = UserId>>,
    pub cart: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
}

impl Repositories {
    /// Back every repository with the same Supabase client.
    #[must_use]
    pub fn supabase(client: &SupabaseClient) -> Self {
        Self {
            auth: Arc::new(client.clone()),
            profile: Arc::new(client.clone()),
            addresses: Arc::new(client.clone()),
            payment_methods: Arc::new(client.clone()),
            cart: Arc::new(client.clone()),
            orders: Arc::new(client.clone()),
            categories: Arc::new(client.clone()),
            products: Arc::new(client.clone()),
        }
    }
}

/// All resource notifiers for one app session.
///
/// Cheaply cloneable via `Arc`. Signing out resets every user-scoped notifier;
/// the catalogue (categories and products) is shared by all users and is kept.
#[derive(Clone)]
pub struct DaylizStore {
    inner: Arc<DaylizStoreInner>,
}

struct DaylizStoreInner {
    auth: AuthNotifier,
    profile: ProfileNotifier,
    addresses: AddressNotifier,
    payment_methods: PaymentMethodNotifier,
    cart: CartNotifier,
    orders: OrderNotifier,
    categories: CategoryNotifier,
    products: ProductNotifier,
}

impl DaylizStore {
    #[must_use]
    pub fn new(repositories: Repositories) -> Self {
        Self {
            inner: Arc::new(DaylizStoreInner {
                auth: AuthNotifier::new(repositories.auth),
                profile: ProfileNotifier::new(repositories.profile),
                addresses: AddressNotifier::with_single_default(
                    "addresses",
                    repositories.addresses,
                ),
                payment_methods: PaymentMethodNotifier::with_single_default(
                    "payment_methods",
                    repositories.payment_methods,
                ),
                cart: CartNotifier::new(repositories.cart, Arc::clone(&repositories.products)),
                orders: OrderNotifier::new(repositories.orders),
                categories: CategoryNotifier::new(repositories.categories),
                products: ProductNotifier::new(repositories.products),
            }),
        }
    }

    #[must_use]
    pub fn auth(&self) -> &AuthNotifier {
        &self.inner.auth
    }

    #[must_use]
    pub fn profile(&self) -> &ProfileNotifier {
        &self.inner.profile
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressNotifier {
        &self.inner.addresses
    }

    #[must_use]
    pub fn payment_methods(&self) -> &PaymentMethodNotifier {
        &self.inner.payment_methods
    }

    #[must_use]
    pub fn cart(&self) -> &CartNotifier {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderNotifier {
        &self.inner.orders
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryNotifier {
        &self.inner.categories
    }

    #[must_use]
    pub fn products(&self) -> &ProductNotifier {
        &self.inner.products
    }

    /// ID of the signed-in user.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.inner.auth.current_user().map(|user| user.id)
    }

    /// Load every user-scoped resource concurrently.
    ///
    /// Returns the first outcome that was not `Applied`, in resource order,
    /// or `Applied` when everything loaded.
    #[instrument(skip(self))]
    pub async fn load_user_data(&self, user: &UserId) -> Outcome {
        let (profile, addresses, payment_methods, cart, orders) = tokio::join!(
            self.inner.profile.load(user),
            self.inner.addresses.load(user),
            self.inner.payment_methods.load(user),
            self.inner.cart.load(user),
            self.inner.orders.load(user),
        );

        [profile, addresses, payment_methods, cart, orders]
            .into_iter()
            .find(|outcome| !outcome.is_applied())
            .unwrap_or(Outcome::Applied)
    }

    /// Sign out and drop everything that belonged to the user.
    ///
    /// When the backend refuses the sign-out, the session and data are kept
    /// and the auth notifier carries the error.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Outcome {
        let outcome = self.inner.auth.logout().await;
        if outcome.is_applied() {
            self.inner.profile.reset();
            self.inner.addresses.reset();
            self.inner.payment_methods.reset();
            self.inner.cart.reset();
            self.inner.orders.reset();
            info!("User-scoped state cleared");
        }
        outcome
    }
}
