use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
    dtos::reportdtos::*,
    models::ordermodel::{Order, OrderStatus, PaymentMethod},
};

const TOP_PRODUCTS: usize = 5;

pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Aggregates the orders placed inside the report window.
pub fn build_summary(days: i64, orders: &[Order]) -> ReportSummaryDto {
    let mut summary = ReportSummaryDto {
        days,
        total_orders: orders.len() as i64,
        ..Default::default()
    };

    let mut by_status: BTreeMap<&str, (OrderStatus, i64)> = BTreeMap::new();
    let mut by_method: BTreeMap<&str, (PaymentMethod, i64, f64)> = BTreeMap::new();
    let mut daily: BTreeMap<chrono::NaiveDate, (i64, f64)> = BTreeMap::new();
    let mut products: BTreeMap<String, (i64, f64)> = BTreeMap::new();

    for order in orders {
        if order.is_paid {
            summary.paid_orders += 1;
        }
        if order.requires_prescription {
            summary.prescription_orders += 1;
        }
        summary.revenue += order.total_price;

        by_status
            .entry(order.status.to_str())
            .or_insert((order.status, 0))
            .1 += 1;

        let method = by_method
            .entry(order.payment_method.to_str())
            .or_insert((order.payment_method, 0, 0.0));
        method.1 += 1;
        method.2 += order.total_price;

        let day = daily.entry(order.created_at.date_naive()).or_insert((0, 0.0));
        day.0 += 1;
        day.1 += order.total_price;

        for item in order.order_items.iter() {
            let product = products.entry(item.name.clone()).or_insert((0, 0.0));
            product.0 += item.qty as i64;
            product.1 += item.line_total();
        }
    }

    summary.by_status = by_status
        .into_values()
        .map(|(status, count)| StatusCount { status, count })
        .collect();

    summary.by_payment_method = by_method
        .into_values()
        .map(|(payment_method, count, revenue)| MethodCount {
            payment_method,
            count,
            revenue,
        })
        .collect();

    summary.daily = daily
        .into_iter()
        .map(|(day, (orders, revenue))| DailyPoint { day, orders, revenue })
        .collect();

    let mut top: Vec<TopProduct> = products
        .into_iter()
        .map(|(name, (qty, revenue))| TopProduct { name, qty, revenue })
        .collect();
    top.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    top.truncate(TOP_PRODUCTS);
    summary.top_products = top;

    summary
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sqlx::types::Json;
    use uuid::Uuid;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::ordermodel::OrderItem;

    fn order(day: u32, total: f64, status: OrderStatus, method: PaymentMethod, paid: bool) -> Order {
        Order {
            order_items: Json(vec![OrderItem {
                product: Uuid::nil(),
                name: if total > 100.0 { "Insulin" } else { "Vitamin C" }.to_string(),
                price: total,
                qty: 1,
                prescription_required: total > 100.0,
            }]),
            requires_prescription: total > 100.0,
            status,
            payment_method: method,
            is_paid: paid,
            created_at: Utc.with_ymd_and_hms(2025, 3, day, 10, 0, 0).unwrap(),
            ..MemoryStore::order_for(Uuid::new_v4(), total)
        }
    }

    #[test]
    fn summary_counts_and_revenue() {
        let orders = vec![
            order(1, 500.0, OrderStatus::Delivered, PaymentMethod::Mpesa, true),
            order(1, 50.0, OrderStatus::Pending, PaymentMethod::Cod, false),
            order(2, 50.0, OrderStatus::Rejected, PaymentMethod::Cod, false),
        ];

        let summary = build_summary(7, &orders);

        assert_eq!(summary.days, 7);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.paid_orders, 1);
        assert_eq!(summary.prescription_orders, 1);
        assert_eq!(summary.revenue, 600.0);
        assert_eq!(summary.by_status.len(), 3);
        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].orders, 2);
        assert_eq!(summary.daily[0].revenue, 550.0);

        let cod = summary
            .by_payment_method
            .iter()
            .find(|m| m.payment_method == PaymentMethod::Cod)
            .unwrap();
        assert_eq!(cod.count, 2);
        assert_eq!(cod.revenue, 100.0);

        assert_eq!(summary.top_products[0].name, "Insulin");
        assert_eq!(summary.top_products[1].qty, 2);
    }

    #[test]
    fn empty_window() {
        let summary = build_summary(30, &[]);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.revenue, 0.0);
        assert!(summary.daily.is_empty());
    }
}
