//! Entities mirrored from the Dayliz backend.
//!
//! Field names follow the Supabase column names so rows deserialize directly.
//! Each collection entity has a `New*` draft without an ID; IDs are assigned
//! by the database on insert.

pub mod address;
pub mod cart;
pub mod category;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use address::{Address, NewAddress};
pub use cart::{CartItem, NewCartItem};
pub use category::{Category, Subcategory};
pub use order::{
    CUSTOMER_CANCELLATION_REASON, Cancellation, MINIMUM_ORDER_RUPEES, NewOrder, NewOrderItem, Order,
    OrderItem,
};
pub use payment::{NewPaymentMethod, PaymentMethod};
pub use product::Product;
pub use user::{User, UserProfile};
