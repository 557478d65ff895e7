use actix::Message;
use chrono::NaiveDateTime;
use diesel::QueryResult;
use serde::Deserialize;

use crate::services::db_models::{
    DayCount, DayRevenue, MenuItem, Order, OrderPage, OrderWithItems, StatusCount, Token, User,
};
use crate::services::insertable::{MenuItemChangeset, OrderChangeset, UserChangeset};

// users

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<User>>")]
pub struct FetchUsers;

#[derive(Message)]
#[rtype(result = "QueryResult<User>")]
pub struct FetchUser(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<User>")]
pub struct FetchUserByEmail(pub String);

#[derive(Message)]
#[rtype(result = "QueryResult<User>")]
pub struct AddUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub role: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<User>")]
pub struct UpdateUser {
    pub user_id: i64,
    pub changes: UserChangeset,
}

#[derive(Message)]
#[rtype(result = "QueryResult<()>")]
pub struct SetUserPassword {
    pub user_id: i64,
    pub password: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<User>")]
pub struct RemoveUser(pub i64);

// menu

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<MenuItem>>")]
pub struct FetchMenu {
    pub category: Option<String>,
    pub visible: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_desc: bool,
}

impl FetchMenu {
    pub fn is_unfiltered(&self) -> bool {
        self.category.is_none()
            && self.visible.is_none()
            && self.in_stock.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.sort_by.is_none()
    }
}

#[derive(Message)]
#[rtype(result = "QueryResult<MenuItem>")]
pub struct FetchMenuItem(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<MenuItem>")]
pub struct AddMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub category: String,
    pub visible: bool,
    pub in_stock: bool,
}

#[derive(Message)]
#[rtype(result = "QueryResult<MenuItem>")]
pub struct UpdateMenuItem {
    pub menu_id: i64,
    pub changes: MenuItemChangeset,
}

#[derive(Message)]
#[rtype(result = "QueryResult<MenuItem>")]
pub struct RemoveMenuItem(pub i64);

// orders

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Message)]
#[rtype(result = "QueryResult<OrderPage>")]
pub struct FetchOrders {
    pub page: i64,
    pub page_size: i64,
    pub status: Option<String>,
    pub client_name: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: bool,
}

#[derive(Message)]
#[rtype(result = "QueryResult<OrderWithItems>")]
pub struct FetchOrder(pub i64);

#[derive(Message)]
#[rtype(result = "QueryResult<OrderWithItems>")]
pub struct AddOrder {
    pub client_name: String,
    pub client_surname: String,
    pub client_phone: String,
    pub delivery_address: String,
    pub status: String,
    pub total_price: f64,
    pub waiter_id: Option<i64>,
    pub guest_push_token: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<OrderWithItems>")]
pub struct UpdateOrder {
    pub order_id: i64,
    pub changes: OrderChangeset,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Order>")]
pub struct SetOrderStatus {
    pub order_id: i64,
    pub status: String,
    pub waiter_id: Option<i64>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Order>")]
pub struct RemoveOrder(pub i64);

// order stats; bounds are inclusive and optional on both ends

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<StatusCount>>")]
pub struct OrdersCountByStatus {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<DayCount>>")]
pub struct OrdersCountByDay {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<DayRevenue>>")]
pub struct RevenueByDay {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Message)]
#[rtype(result = "QueryResult<f64>")]
pub struct FetchAverageCheck {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

// refresh tokens

#[derive(Message)]
#[rtype(result = "QueryResult<Token>")]
pub struct AddToken {
    pub user_id: i64,
    pub refresh_token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "QueryResult<Token>")]
pub struct FindValidToken {
    pub user_id: i64,
    pub refresh_token: String,
}

#[derive(Message)]
#[rtype(result = "QueryResult<usize>")]
pub struct RemoveToken(pub String);

// push tokens

#[derive(Message)]
#[rtype(result = "QueryResult<Vec<String>>")]
pub struct FetchAdminPushTokens;

#[derive(Message)]
#[rtype(result = "QueryResult<Option<String>>")]
pub struct FetchPushToken(pub i64);
