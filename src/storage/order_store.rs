use chrono::{DateTime, Datelike, NaiveDate, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{
    CreateOrderRequest, Customer, FulfillmentStatus, Order, OrderFilter, OrderItem, OrderStatus,
    PaymentStatus, ShippingAddress, UpdateOrderRequest,
};

#[derive(Debug, Default)]
struct OrderBook {
    orders: Vec<Order>,
    /// 已分配的订单序号
    sequence: u32,
}

/// 进程内订单库
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    inner: Arc<RwLock<OrderBook>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带演示订单的订单库
    pub fn seeded() -> Self {
        let orders = demo_orders();
        let sequence = orders.len() as u32;
        Self {
            inner: Arc::new(RwLock::new(OrderBook { orders, sequence })),
        }
    }

    /// 按状态和顾客过滤，最新的排在前面
    ///
    /// 状态为 `all` 时不过滤。
    pub fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .orders
            .iter()
            .filter(|order| match filter.status.as_deref() {
                None | Some("all") => true,
                Some(status) => order.status.as_str() == status,
            })
            .filter(|order| match filter.customer_id.as_deref() {
                None => true,
                Some(customer) => order.customer.id == customer,
            })
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.inner.read().orders.iter().find(|o| o.id == id).cloned()
    }

    /// 创建订单并分配订单号
    pub fn create(&self, request: CreateOrderRequest) -> Order {
        let now = Utc::now();
        let mut book = self.inner.write();
        book.sequence += 1;

        let total = request.items.iter().map(|item| item.total).sum();
        let fulfillment_status = request.status.fulfillment().unwrap_or_default();
        let order = Order {
            id: format!("order_{}", now.timestamp_millis()),
            order_number: format!("FF-{}-{:03}", now.year(), book.sequence),
            status: request.status,
            total,
            currency_code: request.currency_code,
            created_at: now,
            updated_at: now,
            estimated_delivery_date: request.estimated_delivery_date,
            customer: request.customer,
            items: request.items,
            shipping_address: request.shipping_address,
            shipping_method: request.shipping_method,
            notes: request.notes,
            payment_status: request.payment_status,
            fulfillment_status,
            tracking_number: None,
            tracking_url: None,
        };

        book.orders.push(order.clone());
        order
    }

    /// 应用更新，订单不存在时返回 None
    pub fn update(&self, id: &str, update: UpdateOrderRequest) -> Option<Order> {
        let mut book = self.inner.write();
        let order = book.orders.iter_mut().find(|o| o.id == id)?;
        order.apply_update(update, Utc::now());
        Some(order.clone())
    }

    pub fn delete(&self, id: &str) -> Option<Order> {
        let mut book = self.inner.write();
        let index = book.orders.iter().position(|o| o.id == id)?;
        Some(book.orders.remove(index))
    }

    pub fn len(&self) -> usize {
        self.inner.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().orders.is_empty()
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn customer(id: &str, first: &str, last: &str, email: &str, phone: Option<&str>) -> Customer {
    Customer {
        id: id.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: email.into(),
        phone: phone.map(Into::into),
    }
}

fn item(n: u32, title: &str, variant: &str, unit_price: i64) -> OrderItem {
    OrderItem {
        id: format!("item_{n}"),
        product_id: format!("prod_{n}"),
        variant_id: Some(format!("var_{n}")),
        title: title.into(),
        variant_title: Some(variant.into()),
        quantity: 1,
        unit_price,
        total: unit_price,
    }
}

fn address(customer: &Customer, street: &str, city: &str, postal: &str) -> ShippingAddress {
    ShippingAddress {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        address_1: street.into(),
        address_2: None,
        city: city.into(),
        postal_code: postal.into(),
        country_code: "CH".into(),
        phone: customer.phone.clone(),
    }
}

fn demo_orders() -> Vec<Order> {
    let anna = customer(
        "customer_1",
        "Anna",
        "Mueller",
        "anna.mueller@example.com",
        Some("+41 79 123 45 67"),
    );
    let marco = customer(
        "customer_2",
        "Marco",
        "Rossi",
        "marco.rossi@example.com",
        Some("+41 76 987 65 43"),
    );
    let sophie = customer("customer_3", "Sophie", "Weber", "sophie.weber@example.com", None);
    let thomas = customer(
        "customer_4",
        "Thomas",
        "Schneider",
        "thomas.schneider@example.com",
        Some("+41 78 555 12 34"),
    );

    let mut anna_address = address(&anna, "Bahnhofstrasse 123", "Zurich", "8001");
    anna_address.address_2 = Some("Apt 4B".into());

    vec![
        Order {
            id: "order_1".into(),
            order_number: "FF-2024-001".into(),
            status: OrderStatus::Delivered,
            total: 29999,
            currency_code: "CHF".into(),
            created_at: at(2024, 1, 15, 10, 0),
            updated_at: at(2024, 1, 20, 14, 30),
            estimated_delivery_date: Some(at(2024, 1, 20, 0, 0)),
            shipping_address: anna_address,
            customer: anna,
            items: vec![
                item(1, "Eco Trail Runner", "Forest Green, Size 42", 17999),
                item(2, "Sustainable Socks (3-pack)", "Mixed Colors", 2999),
            ],
            shipping_method: "standard".into(),
            notes: Some("Please ring the doorbell twice".into()),
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Shipped,
            tracking_number: Some("CH-POST-123456789".into()),
            tracking_url: Some("https://www.post.ch/track/123456789".into()),
        },
        Order {
            id: "order_2".into(),
            order_number: "FF-2024-002".into(),
            status: OrderStatus::Shipped,
            total: 15999,
            currency_code: "CHF".into(),
            created_at: at(2024, 1, 20, 9, 15),
            updated_at: at(2024, 1, 22, 11, 45),
            estimated_delivery_date: Some(at(2024, 1, 25, 0, 0)),
            shipping_address: address(&marco, "Via Roma 45", "Lugano", "6900"),
            customer: marco,
            items: vec![item(3, "Refurbished Urban Sneaker", "Ocean Blue, Size 43", 13999)],
            shipping_method: "express".into(),
            notes: None,
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Shipped,
            tracking_number: Some("CH-POST-987654321".into()),
            tracking_url: Some("https://www.post.ch/track/987654321".into()),
        },
        Order {
            id: "order_3".into(),
            order_number: "FF-2024-003".into(),
            status: OrderStatus::PendingPayment,
            total: 8999,
            currency_code: "CHF".into(),
            created_at: at(2024, 1, 25, 16, 30),
            updated_at: at(2024, 1, 25, 16, 30),
            estimated_delivery_date: Some(at(2024, 1, 30, 0, 0)),
            shipping_address: address(&sophie, "Mühlegasse 12", "Bern", "3011"),
            customer: sophie,
            items: vec![item(4, "Eco Casual Loafer", "Natural Brown, Size 39", 8999)],
            shipping_method: "standard".into(),
            notes: Some("Leave package at door if not home".into()),
            payment_status: PaymentStatus::Pending,
            fulfillment_status: FulfillmentStatus::NotFulfilled,
            tracking_number: None,
            tracking_url: None,
        },
        Order {
            id: "order_4".into(),
            order_number: "FF-2024-004".into(),
            status: OrderStatus::Processing,
            total: 12499,
            currency_code: "CHF".into(),
            created_at: at(2024, 1, 26, 14, 20),
            updated_at: at(2024, 1, 27, 9, 0),
            estimated_delivery_date: Some(at(2024, 2, 2, 0, 0)),
            shipping_address: address(&thomas, "Industriestrasse 88", "Basel", "4056"),
            customer: thomas,
            items: vec![item(5, "Sustainable Hiking Boot", "Mountain Grey, Size 44", 12499)],
            shipping_method: "standard".into(),
            notes: None,
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::AwaitingShipment,
            tracking_number: None,
            tracking_url: None,
        },
    ]
}
