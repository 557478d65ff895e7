use chrono::NaiveDateTime;
use diesel::sql_types::{BigInt, Double, Text};
use diesel::{Queryable, QueryableByName};
use serde::{Deserialize, Serialize};

#[derive(Queryable, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub role: String,
    pub push_token: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub category: String,
    pub visible: bool,
    pub in_stock: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub client_name: String,
    pub client_surname: String,
    pub client_phone: String,
    pub delivery_address: String,
    pub status: String,
    pub total_price: f64,
    pub waiter_id: Option<i64>,
    pub guest_push_token: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Queryable, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(QueryableByName, Debug, Clone, Serialize)]
pub struct StatusCount {
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

#[derive(QueryableByName, Debug, Clone, Serialize)]
pub struct DayCount {
    #[diesel(sql_type = Text)]
    pub day: String,
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

#[derive(QueryableByName, Debug, Clone, Serialize)]
pub struct DayRevenue {
    #[diesel(sql_type = Text)]
    pub day: String,
    #[diesel(sql_type = Double)]
    pub revenue: f64,
}

#[derive(QueryableByName, Debug)]
pub struct AverageCheck {
    #[diesel(sql_type = Double)]
    pub average: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: i64,
    pub count_by_status: Vec<StatusCount>,
    pub total_revenue: f64,
    pub average_check: f64,
}

/// The summary endpoint is the composition of the three range queries:
/// the order total is the sum of the by-status counts and the revenue
/// total is the sum of the per-day revenue rows.
pub fn summarize(
    count_by_status: Vec<StatusCount>,
    revenue_by_day: &[DayRevenue],
    average_check: f64,
) -> OrderSummary {
    let total_orders = count_by_status.iter().map(|row| row.count).sum();
    let total_revenue = revenue_by_day.iter().map(|row| row.revenue).sum();

    OrderSummary {
        total_orders,
        count_by_status,
        total_revenue,
        average_check,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_row(status: &str, count: i64) -> StatusCount {
        StatusCount { status: status.to_owned(), count }
    }

    #[test]
    fn summary_totals_are_sums_of_their_parts() {
        let by_status = vec![
            status_row("PENDING", 5),
            status_row("PREPARING", 3),
            status_row("COMPLETED", 12),
        ];
        let revenue = vec![
            DayRevenue { day: "2024-03-01".into(), revenue: 120.5 },
            DayRevenue { day: "2024-03-02".into(), revenue: 79.5 },
        ];

        let summary = summarize(by_status, &revenue, 10.0);

        assert_eq!(summary.total_orders, 20);
        assert_eq!(summary.total_revenue, 200.0);
        assert_eq!(summary.average_check, 10.0);
        assert_eq!(summary.count_by_status.len(), 3);
    }

    #[test]
    fn summary_of_empty_range_is_zero() {
        let summary = summarize(vec![], &[], 0.0);

        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_revenue, 0.0);
    }

    #[test]
    fn user_responses_never_carry_the_password_hash() {
        let user = User {
            id: 1,
            email: "admin@example.com".into(),
            password: "$2b$12$secret-hash".into(),
            name: "Ann".into(),
            surname: "Smith".into(),
            phone: "+10000000000".into(),
            role: "ADMIN".into(),
            push_token: None,
            created_at: chrono::NaiveDateTime::from_timestamp_opt(0, 0).unwrap(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "admin@example.com");
    }
}
