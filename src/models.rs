use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

// ============================================================================
// Domain Models
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Order {
    pub order_id: i32,
    pub customer_id: Option<String>,
    pub employee_id: Option<i32>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub shipped_date: Option<NaiveDate>,
    pub ship_via: Option<i32>,
    pub freight: Option<Decimal>,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: Option<String>,
    pub row_version: i32,
}

/// One line of an order. Identity is the composite (order_id, product_id).
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct OrderLineItem {
    pub order_id: i32,
    pub product_id: i32,
    pub unit_price: Decimal,
    pub quantity: i16,
    pub discount: f32,
    pub row_version: i32,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Displayed total for an order: sum of unit_price * quantity across its
/// line items. The stored discount fraction is intentionally not applied.
pub fn total_cost<'a, I>(items: I) -> Decimal
where
    I: IntoIterator<Item = &'a OrderLineItem>,
{
    items.into_iter().map(OrderLineItem::line_total).sum()
}

// ============================================================================
// Read Models (derived per query, never persisted)
// ============================================================================

/// One row of the paged orders listing: grouped join of orders, customers,
/// employees and line items, with the aggregated total.
#[derive(Serialize, Clone, Debug, FromRow)]
pub struct OrderSummary {
    pub order_id: i32,
    pub customer_name: String,
    pub order_date: Option<NaiveDate>,
    pub total_cost: Decimal,
    pub assigned_to: String,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_country: Option<String>,
}

/// Order row joined with the display names of its references.
#[derive(Serialize, Clone, Debug, FromRow)]
pub struct OrderWithNames {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub customer_name: Option<String>,
    pub employee_name: Option<String>,
    pub shipper_name: Option<String>,
}

/// Full order details view: header, line items with product names, and the
/// recomputed total.
#[derive(Serialize, Clone, Debug)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub header: OrderWithNames,
    pub line_items: Vec<LineItemRow>,
    pub total_cost: Decimal,
}

#[derive(Serialize, Clone, Debug, FromRow)]
pub struct LineItemRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: OrderLineItem,
    pub product_name: String,
}

/// Row of the line-items listing, joined with its order and product.
#[derive(Serialize, Clone, Debug, FromRow)]
pub struct LineItemListRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: OrderLineItem,
    pub product_name: String,
    pub order_date: Option<NaiveDate>,
}

// ============================================================================
// Lookup References (id + display name, for client-side select lists)
// ============================================================================

#[derive(Serialize, Clone, Debug, FromRow)]
pub struct CustomerRef {
    pub customer_id: String,
    pub company_name: String,
}

#[derive(Serialize, Clone, Debug, FromRow)]
pub struct EmployeeRef {
    pub employee_id: i32,
    pub first_name: String,
}

#[derive(Serialize, Clone, Debug, FromRow)]
pub struct ProductRef {
    pub product_id: i32,
    pub product_name: String,
}

#[derive(Serialize, Clone, Debug, FromRow)]
pub struct ShipperRef {
    pub shipper_id: i32,
    pub company_name: String,
}

// ============================================================================
// Write Payloads
// ============================================================================

/// Create payload: the order's own fields plus the fields of its first line
/// item. Both rows are written in a single transaction.
#[derive(Deserialize, Clone, Debug)]
pub struct NewOrder {
    pub customer_id: Option<String>,
    pub employee_id: Option<i32>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub shipped_date: Option<NaiveDate>,
    pub ship_via: Option<i32>,
    pub freight: Option<Decimal>,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: Option<String>,
    pub product_id: i32,
    pub unit_price: Decimal,
    pub quantity: i16,
    pub discount: f32,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();
        if self.customer_id.as_deref().map_or(true, |c| c.trim().is_empty()) {
            messages.push("customer_id is required".to_string());
        }
        validate_line_fields(self.unit_price, self.quantity, self.discount, &mut messages);
        if let Some(freight) = self.freight {
            if freight < Decimal::ZERO {
                messages.push("freight must not be negative".to_string());
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(messages))
        }
    }
}

/// Edit payload. `row_version` is the version the client read; the update
/// only applies if the row still carries it.
#[derive(Deserialize, Clone, Debug)]
pub struct UpdateOrder {
    pub customer_id: Option<String>,
    pub employee_id: Option<i32>,
    pub order_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub shipped_date: Option<NaiveDate>,
    pub ship_via: Option<i32>,
    pub freight: Option<Decimal>,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: Option<String>,
    pub row_version: i32,
}

impl UpdateOrder {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();
        if self.customer_id.as_deref().map_or(true, |c| c.trim().is_empty()) {
            messages.push("customer_id is required".to_string());
        }
        if let Some(freight) = self.freight {
            if freight < Decimal::ZERO {
                messages.push("freight must not be negative".to_string());
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(messages))
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewLineItem {
    pub order_id: i32,
    pub product_id: i32,
    pub unit_price: Decimal,
    pub quantity: i16,
    pub discount: f32,
}

impl NewLineItem {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();
        validate_line_fields(self.unit_price, self.quantity, self.discount, &mut messages);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(messages))
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct UpdateLineItem {
    pub unit_price: Decimal,
    pub quantity: i16,
    pub discount: f32,
    pub row_version: i32,
}

impl UpdateLineItem {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut messages = Vec::new();
        validate_line_fields(self.unit_price, self.quantity, self.discount, &mut messages);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(messages))
        }
    }
}

fn validate_line_fields(
    unit_price: Decimal,
    quantity: i16,
    discount: f32,
    messages: &mut Vec<String>,
) {
    if unit_price < Decimal::ZERO {
        messages.push("unit_price must not be negative".to_string());
    }
    if quantity <= 0 {
        messages.push(format!("quantity must be positive, got {quantity}"));
    }
    if !(0.0..=1.0).contains(&discount) {
        messages.push(format!(
            "discount must be a fraction between 0 and 1, got {discount}"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(order_id: i32, product_id: i32, price: &str, quantity: i16) -> OrderLineItem {
        OrderLineItem {
            order_id,
            product_id,
            unit_price: Decimal::from_str(price).unwrap(),
            quantity,
            discount: 0.0,
            row_version: 1,
        }
    }

    #[test]
    fn total_cost_sums_price_times_quantity() {
        // Order 10248: 12 x 14.00 + 10 x 9.80 = 266.00
        let items = vec![line(10248, 11, "14.00", 12), line(10248, 42, "9.80", 10)];
        assert_eq!(total_cost(&items), Decimal::from_str("266.00").unwrap());
    }

    #[test]
    fn total_cost_of_no_items_is_zero() {
        assert_eq!(total_cost(&[]), Decimal::ZERO);
    }

    #[test]
    fn total_cost_ignores_discount() {
        let mut discounted = line(10248, 11, "10.00", 2);
        discounted.discount = 0.25;
        assert_eq!(total_cost(&[discounted]), Decimal::from_str("20.00").unwrap());
    }

    #[test]
    fn line_total_is_exact() {
        assert_eq!(
            line(1, 1, "9.80", 10).line_total(),
            Decimal::from_str("98.00").unwrap()
        );
    }

    fn new_order() -> NewOrder {
        NewOrder {
            customer_id: Some("VINET".to_string()),
            employee_id: Some(5),
            order_date: None,
            required_date: None,
            shipped_date: None,
            ship_via: Some(3),
            freight: Some(Decimal::from_str("32.38").unwrap()),
            ship_name: Some("Vins et alcools Chevalier".to_string()),
            ship_address: None,
            ship_city: Some("Reims".to_string()),
            ship_region: None,
            ship_postal_code: None,
            ship_country: Some("France".to_string()),
            product_id: 11,
            unit_price: Decimal::from_str("14.00").unwrap(),
            quantity: 12,
            discount: 0.0,
        }
    }

    #[test]
    fn valid_new_order_passes() {
        assert!(new_order().validate().is_ok());
    }

    #[test]
    fn new_order_requires_customer() {
        let mut order = new_order();
        order.customer_id = None;
        match order.validate().unwrap_err() {
            AppError::Validation(messages) => {
                assert!(messages.iter().any(|m| m.contains("customer_id")));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn new_order_rejects_bad_line_fields() {
        let mut order = new_order();
        order.quantity = 0;
        order.discount = 1.5;
        order.unit_price = Decimal::from_str("-1").unwrap();
        match order.validate().unwrap_err() {
            AppError::Validation(messages) => assert_eq!(messages.len(), 3),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn update_line_item_rejects_zero_quantity() {
        let update = UpdateLineItem {
            unit_price: Decimal::ONE,
            quantity: 0,
            discount: 0.0,
            row_version: 1,
        };
        assert!(update.validate().is_err());
    }
}
