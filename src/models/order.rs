use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 订单状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    PendingPayment,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// 状态变更时对应的履约状态，待支付不改变履约状态
    pub fn fulfillment(&self) -> Option<FulfillmentStatus> {
        match self {
            OrderStatus::PendingPayment => None,
            OrderStatus::Confirmed => Some(FulfillmentStatus::AwaitingFulfillment),
            OrderStatus::Processing => Some(FulfillmentStatus::Processing),
            OrderStatus::Shipped => Some(FulfillmentStatus::Shipped),
            OrderStatus::Delivered => Some(FulfillmentStatus::Fulfilled),
            OrderStatus::Cancelled => Some(FulfillmentStatus::Cancelled),
        }
    }
}

/// 履约状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    #[default]
    NotFulfilled,
    AwaitingFulfillment,
    AwaitingShipment,
    Processing,
    Shipped,
    Fulfilled,
    Cancelled,
}

/// 支付状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

/// 顾客信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// 订单行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_title: Option<String>,
    pub quantity: i64,
    /// 单价（分）
    pub unit_price: i64,
    /// 行合计（分）
    pub total: i64,
}

/// 收货地址
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// 订单实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// 订单号，格式 `FF-{year}-{NNN}`
    pub order_number: String,
    pub status: OrderStatus,
    /// 订单总额（分）
    pub total: i64,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub shipping_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
}

impl Order {
    /// 应用管理端更新
    ///
    /// 状态变化会同步履约状态；发货且未指定送达日期时默认三天后送达。
    pub fn apply_update(&mut self, update: UpdateOrderRequest, now: DateTime<Utc>) {
        if let Some(tracking_number) = update.tracking_number {
            self.tracking_number = Some(tracking_number);
        }
        if let Some(tracking_url) = update.tracking_url {
            self.tracking_url = Some(tracking_url);
        }
        if let Some(fulfillment) = update.fulfillment_status {
            self.fulfillment_status = fulfillment;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(date) = update.estimated_delivery_date {
            self.estimated_delivery_date = Some(date);
        }

        if let Some(status) = update.status {
            self.status = status;
            if let Some(fulfillment) = status.fulfillment() {
                self.fulfillment_status = fulfillment;
            }
            if status == OrderStatus::Shipped && update.estimated_delivery_date.is_none() {
                self.estimated_delivery_date = Some(now + Duration::days(3));
            }
        }

        self.updated_at = now;
    }
}

/// 管理端创建订单请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    #[serde(default = "default_shipping_method")]
    pub shipping_method: String,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

fn default_shipping_method() -> String {
    "standard".into()
}

fn default_currency() -> String {
    "CHF".into()
}

/// 管理端更新订单请求，只接受以下字段，其余字段被忽略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub notes: Option<String>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

impl UpdateOrderRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.tracking_number.is_none()
            && self.tracking_url.is_none()
            && self.fulfillment_status.is_none()
            && self.notes.is_none()
            && self.estimated_delivery_date.is_none()
    }
}

/// 订单列表过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub customer_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        let created = Utc::now();
        Order {
            id: "order_t".into(),
            order_number: "FF-2024-099".into(),
            status: OrderStatus::Confirmed,
            total: 1000,
            currency_code: "CHF".into(),
            created_at: created,
            updated_at: created,
            estimated_delivery_date: None,
            customer: Customer {
                id: "customer_t".into(),
                first_name: "Lea".into(),
                last_name: "Graf".into(),
                email: "lea@example.com".into(),
                phone: None,
            },
            items: Vec::new(),
            shipping_address: ShippingAddress {
                first_name: "Lea".into(),
                last_name: "Graf".into(),
                address_1: "Seestrasse 1".into(),
                address_2: None,
                city: "Zug".into(),
                postal_code: "6300".into(),
                country_code: "CH".into(),
                phone: None,
            },
            shipping_method: "standard".into(),
            notes: None,
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::AwaitingFulfillment,
            tracking_number: None,
            tracking_url: None,
        }
    }

    #[test]
    fn test_shipping_sets_fulfillment_and_delivery() {
        let mut order = sample_order();
        let now = Utc::now();
        order.apply_update(
            UpdateOrderRequest {
                status: Some(OrderStatus::Shipped),
                tracking_number: Some("CH-POST-1".into()),
                ..Default::default()
            },
            now,
        );

        assert_eq!(order.fulfillment_status, FulfillmentStatus::Shipped);
        assert_eq!(order.estimated_delivery_date, Some(now + Duration::days(3)));
        assert_eq!(order.tracking_number.as_deref(), Some("CH-POST-1"));
    }

    #[test]
    fn test_status_overrides_explicit_fulfillment() {
        let mut order = sample_order();
        order.apply_update(
            UpdateOrderRequest {
                status: Some(OrderStatus::Delivered),
                fulfillment_status: Some(FulfillmentStatus::Processing),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let update: UpdateOrderRequest =
            serde_json::from_str(r#"{"total": 1, "customer": "x"}"#).unwrap();
        assert!(update.is_empty());
    }
}
