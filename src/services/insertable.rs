use chrono::NaiveDateTime;
use diesel::{AsChangeset, Insertable};
use serde::Serialize;

use crate::schema::menu_items;
use crate::schema::order_items;
use crate::schema::orders;
use crate::schema::tokens;
use crate::schema::users;

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub category: String,
    pub visible: bool,
    pub in_stock: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = orders)]
pub struct NewOrder {
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

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = tokens)]
pub struct NewToken {
    pub user_id: i64,
    pub refresh_token: String,
    pub expires_at: NaiveDateTime,
}

#[derive(AsChangeset, Default, Clone)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub push_token: Option<String>,
}

impl UserChangeset {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.name.is_none()
            && self.surname.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.push_token.is_none()
    }
}

#[derive(AsChangeset, Default, Clone)]
#[diesel(table_name = menu_items)]
pub struct MenuItemChangeset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub visible: Option<bool>,
    pub in_stock: Option<bool>,
}

impl MenuItemChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category.is_none()
            && self.visible.is_none()
            && self.in_stock.is_none()
    }
}

#[derive(AsChangeset, Clone)]
#[diesel(table_name = orders)]
pub struct OrderChangeset {
    pub client_name: Option<String>,
    pub client_surname: Option<String>,
    pub client_phone: Option<String>,
    pub delivery_address: Option<String>,
    pub total_price: Option<f64>,
    pub updated_at: NaiveDateTime,
}

impl OrderChangeset {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none()
            && self.client_surname.is_none()
            && self.client_phone.is_none()
            && self.delivery_address.is_none()
            && self.total_price.is_none()
    }
}
