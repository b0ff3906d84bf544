//! Order Model
//!
//! Orders carry a copy of the shipping address and every line carries the
//! product name and unit price captured at order time, so later catalog or
//! address edits never rewrite history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::address::AddressSnapshot;
use crate::money::Money;
use crate::util::{millis_to_rfc3339, opt_millis_to_rfc3339};

/// Order status
///
/// ```text
/// pending --pay----> paid --ship--> shipped --deliver--> delivered
///    |                 |
///    +----cancel-------+--> cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Cancellation is allowed before the order leaves the warehouse
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    pub fn can_pay(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Next fulfilment step driven by the back office
    pub fn next_fulfilment(&self) -> Option<OrderStatus> {
        match self {
            Self::Paid => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

/// Simulated payment channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    #[default]
    Wechat,
    Alipay,
    Balance,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wechat => "wechat",
            Self::Alipay => "alipay",
            Self::Balance => "balance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wechat" => Ok(Self::Wechat),
            "alipay" => Ok(Self::Alipay),
            "balance" => Ok(Self::Balance),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Order header row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_no: String,
    pub user_id: i64,
    /// Null once the referenced address has been deleted
    pub address_id: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(rename = "total_cents"))]
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_time: Option<i64>,
    pub delivery_time: Option<i64>,
    pub remark: Option<String>,
    pub ship_name: String,
    pub ship_phone: String,
    pub ship_province: Option<String>,
    pub ship_city: Option<String>,
    pub ship_district: Option<String>,
    pub ship_detail: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    pub fn address_snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            name: self.ship_name.clone(),
            phone: self.ship_phone.clone(),
            province: self.ship_province.clone(),
            city: self.ship_city.clone(),
            district: self.ship_district.clone(),
            detail: self.ship_detail.clone(),
        }
    }
}

/// Order line row, joined with the product's current image for display
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i64,
    #[cfg_attr(feature = "db", sqlx(rename = "price_cents"))]
    pub price: Money,
    pub created_at: i64,
}

impl OrderItem {
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Order with its lines
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One requested line of a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price the client displayed; must match the catalog when given
    #[serde(default)]
    pub price: Option<Money>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub address_id: i64,
    pub items: Vec<OrderItemInput>,
    pub remark: Option<String>,
}

/// Mock payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: i64,
    /// `wechat` | `alipay` | `balance`, default `wechat`
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemView {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i64,
    pub price: Money,
    pub subtotal: Money,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub order_no: String,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_time: Option<String>,
    pub delivery_time: Option<String>,
    pub remark: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub address: AddressSnapshot,
    pub items: Vec<OrderItemView>,
}

impl From<&OrderDetail> for OrderView {
    fn from(detail: &OrderDetail) -> Self {
        let o = &detail.order;
        Self {
            id: o.id,
            order_no: o.order_no.clone(),
            user_id: o.user_id,
            address_id: o.address_id,
            total_amount: o.total_amount,
            status: o.status,
            payment_method: o.payment_method,
            payment_time: opt_millis_to_rfc3339(o.payment_time),
            delivery_time: opt_millis_to_rfc3339(o.delivery_time),
            remark: o.remark.clone(),
            created_at: millis_to_rfc3339(o.created_at),
            updated_at: millis_to_rfc3339(o.updated_at),
            address: o.address_snapshot(),
            items: detail.items.iter().map(OrderItemView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Shipped.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());

        assert!(OrderStatus::Pending.can_pay());
        assert!(!OrderStatus::Paid.can_pay());

        assert_eq!(OrderStatus::Paid.next_fulfilment(), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::Shipped.next_fulfilment(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Pending.next_fulfilment(), None);
        assert_eq!(OrderStatus::Cancelled.next_fulfilment(), None);
    }

    #[test]
    fn test_status_parse_and_serde() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("alipay".parse::<PaymentMethod>(), Ok(PaymentMethod::Alipay));
        assert!("paypal".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::Wechat);
    }

    #[test]
    fn test_item_input_price_optional() {
        let input: OrderItemInput =
            serde_json::from_str(r#"{"product_id":1,"quantity":2}"#).unwrap();
        assert!(input.price.is_none());

        let input: OrderItemInput =
            serde_json::from_str(r#"{"product_id":1,"quantity":2,"price":15.5}"#).unwrap();
        assert_eq!(input.price, Some(Money::from_cents(1550)));
    }

    #[test]
    fn test_view_uses_address_snapshot_and_subtotals() {
        let detail = OrderDetail {
            order: Order {
                id: 9,
                order_no: "WO20240301123045000001".to_string(),
                user_id: 1,
                address_id: None,
                total_amount: Money::from_cents(3700),
                status: OrderStatus::Pending,
                payment_method: None,
                payment_time: None,
                delivery_time: None,
                remark: None,
                ship_name: "张三".to_string(),
                ship_phone: "13800138000".to_string(),
                ship_province: Some("浙江".to_string()),
                ship_city: None,
                ship_district: None,
                ship_detail: "文一路 1 号".to_string(),
                created_at: 0,
                updated_at: 0,
            },
            items: vec![OrderItem {
                id: 1,
                order_id: 9,
                product_id: 3,
                product_name: "桶装水".to_string(),
                product_image: None,
                quantity: 2,
                price: Money::from_cents(1850),
                created_at: 0,
            }],
        };

        let view = OrderView::from(&detail);
        assert_eq!(view.address.name, "张三");
        assert_eq!(view.items[0].subtotal, Money::from_cents(3700));
        assert!(view.payment_time.is_none());
    }
}
