//! Sample rows.

use chrono::Utc;
use rust_decimal::Decimal;

use dayliz_core::{
    Address, AddressId, Category, CategoryId, Email, NewAddress, Order, OrderId, OrderItem,
    OrderStatus, PaymentMethod, PaymentMethodId, PaymentMethodKind, PaymentStatus, Product,
    ProductId, Subcategory, SubcategoryId, User, UserId,
};

pub const EMAIL: &str = "meera@dayliz.in";
pub const PASSWORD: &str = "Tura-794001";

/// The registered account.
///
/// # Panics
///
/// Never in practice: [`EMAIL`] is a valid address.
#[must_use]
pub fn user() -> User {
    User {
        id: UserId::generate(),
        email: Email::parse(EMAIL).unwrap_or_else(|e| panic!("fixture email: {e}")),
        name: Some("Meera Sangma".to_string()),
        phone: Some("+919800000000".to_string()),
        email_confirmed: true,
        created_at: Some(Utc::now()),
    }
}

#[must_use]
pub fn new_address(label: &str, is_default: bool) -> NewAddress {
    NewAddress {
        label: label.to_string(),
        recipient_name: "Meera Sangma".to_string(),
        phone: "+919800000000".to_string(),
        address_line1: "12 MG Road".to_string(),
        address_line2: None,
        landmark: Some("Near City Mall".to_string()),
        city: "Tura".to_string(),
        state: "Meghalaya".to_string(),
        postal_code: "794001".to_string(),
        country: "India".to_string(),
        latitude: None,
        longitude: None,
        is_default,
    }
}

/// A stored address owned by `user`.
#[must_use]
pub fn address(user: UserId, label: &str, is_default: bool) -> Address {
    let draft = new_address(label, is_default);
    Address {
        id: AddressId::generate(),
        user_id: user,
        label: draft.label,
        recipient_name: draft.recipient_name,
        phone: draft.phone,
        address_line1: draft.address_line1,
        address_line2: draft.address_line2,
        landmark: draft.landmark,
        city: draft.city,
        state: draft.state,
        postal_code: draft.postal_code,
        country: draft.country,
        latitude: draft.latitude,
        longitude: draft.longitude,
        is_default,
        created_at: Some(Utc::now()),
    }
}

#[must_use]
pub fn payment_method(user: UserId, kind: PaymentMethodKind, is_default: bool) -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::generate(),
        user_id: user,
        kind,
        label: kind.to_string(),
        card_last4: (kind == PaymentMethodKind::Card).then(|| "4242".to_string()),
        card_network: (kind == PaymentMethodKind::Card).then(|| "Visa".to_string()),
        upi_id: (kind == PaymentMethodKind::Upi).then(|| "meera@okaxis".to_string()),
        is_default,
        created_at: Some(Utc::now()),
    }
}

/// An active product priced in paise with `stock` units on hand.
#[must_use]
pub fn product(name: &str, paise: i64, stock: u32) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        description: None,
        price: Decimal::new(paise, 2),
        sale_price: None,
        category_id: CategoryId::generate(),
        subcategory_id: None,
        image_url: None,
        stock,
        is_featured: false,
        is_active: true,
        created_at: Some(Utc::now()),
    }
}

#[must_use]
pub fn order(user: UserId, status: OrderStatus) -> Order {
    let price = Decimal::new(27500, 2);
    Order {
        id: OrderId::generate(),
        user_id: user,
        status,
        payment_status: PaymentStatus::Pending,
        payment_method: PaymentMethodKind::Cod,
        delivery_address: "12 MG Road, Tura, Meghalaya 794001, India".to_string(),
        address_lat: None,
        address_lng: None,
        items: vec![OrderItem {
            product_id: ProductId::generate(),
            product_name: "Amul Butter 500g".to_string(),
            quantity: 1,
            price,
        }],
        subtotal: price,
        delivery_fee: Decimal::ZERO,
        total_price: price,
        created_at: Some(Utc::now()),
        updated_at: None,
        delivered_at: None,
        cancelled_at: None,
        cancellation_reason: None,
        refund_status: None,
        refund_initiated_at: None,
    }
}

/// A category with subcategories given as `(name, display_order)`.
#[must_use]
pub fn category(name: &str, display_order: i32, subcategories: &[(&str, i32)]) -> Category {
    let id = CategoryId::generate();
    Category {
        id,
        name: name.to_string(),
        icon_name: None,
        theme_color: None,
        display_order,
        subcategories: subcategories
            .iter()
            .map(|&(sub, order)| Subcategory {
                id: SubcategoryId::generate(),
                category_id: id,
                name: sub.to_string(),
                image_url: None,
                display_order: order,
                product_count: None,
            })
            .collect(),
    }
}
