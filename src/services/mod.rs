use actix_web::{get, HttpResponse, Responder};
use chrono::NaiveDateTime;

use crate::types::ApiError;

pub mod auth_handling;
pub mod db_models;
pub mod db_utils;
pub mod insertable;
pub mod messages;
pub mod notify_handling;
pub mod pg_handling;
pub mod redis_handling;

#[get("/")]
pub async fn home_page() -> impl Responder {
    HttpResponse::Ok().body("Gurme back-office service")
}

/// Parses optional `YYYY-MM-DD` range bounds into timestamps at midnight.
/// Both bounds are optional; a malformed date fails the request.
pub fn parse_date_bounds(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), ApiError> {
    let parse = |value: &str| {
        chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.and_hms_opt(0, 0, 0).unwrap())
            .map_err(|_| ApiError::Validation(format!("Invalid date: {value}")))
    };

    let start = start.map(parse).transpose()?;
    let end = end.map(parse).transpose()?;

    Ok((start, end))
}

// sub-route "/auth"
pub mod auth_route {
    use actix_web::web::{Data, Json};
    use actix_web::{get, post, HttpRequest, HttpResponse};
    use diesel::result::Error as DbError;
    use serde::Deserialize;
    use serde_json::json;

    use crate::services::auth_handling::{
        authenticate, clear_refresh_cookie, decode_refresh_token, hash_password,
        issue_token_pair, refresh_cookie, verify_password, REFRESH_COOKIE,
    };
    use crate::services::db_utils::AppState;
    use crate::services::messages::{AddUser, FetchUserByEmail, FindValidToken, RemoveToken};
    use crate::types::{ApiError, Role};

    #[derive(Deserialize)]
    pub struct LoginBody {
        pub email: String,
        pub password: String,
    }

    #[post("/login")]
    pub async fn login(state: Data<AppState>, body: Json<LoginBody>) -> Result<HttpResponse, ApiError> {
        if body.email.trim().is_empty() || body.password.is_empty() {
            return Err(ApiError::Validation("Email and password are required".to_owned()));
        }

        let found = match state.pg_db.send(FetchUserByEmail(body.email.trim().to_owned())).await {
            Ok(Ok(user)) => Some(user),
            Ok(Err(DbError::NotFound)) => None,
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };

        // one uniform failure for both unknown email and wrong password
        let user = match found {
            Some(user) if verify_password(&body.password, &user.password) => user,
            _ => return Err(ApiError::Unauthorized("Email or password is incorrect".to_owned())),
        };

        let pair = issue_token_pair(state.get_ref(), user.id).await?;

        Ok(HttpResponse::Ok()
            .cookie(refresh_cookie(&state.config, &pair.refresh_token))
            .json(json!({ "accessToken": pair.access_token })))
    }

    #[derive(Deserialize)]
    pub struct RegisterBody {
        pub email: String,
        pub password: String,
        pub name: String,
        pub surname: String,
        pub phone: String,
        pub role: Option<String>,
        pub secret: Option<String>,
    }

    #[post("/register")]
    pub async fn register(
        state: Data<AppState>,
        body: Json<RegisterBody>,
    ) -> Result<HttpResponse, ApiError> {
        let body = body.into_inner();
        let email = body.email.trim().to_owned();

        if email.is_empty() || body.password.len() < 6 {
            return Err(ApiError::Validation(
                "Email and a password of at least 6 characters are required".to_owned(),
            ));
        }

        let mut role = Role::User;
        if let Some(wanted) = body.role.as_deref() {
            let wanted = Role::parse(wanted)
                .ok_or_else(|| ApiError::Validation(format!("Unknown role: {wanted}")))?;

            if wanted != Role::User {
                match body.secret.as_deref() {
                    None => {
                        return Err(ApiError::Forbidden(
                            "A secret key is required to assign a custom role".to_owned(),
                        ))
                    }
                    Some(secret) if secret != state.config.registration_secret => {
                        return Err(ApiError::Forbidden(
                            "Invalid secret key for role assignment".to_owned(),
                        ))
                    }
                    Some(_) => role = wanted,
                }
            }
        }

        match state.pg_db.send(FetchUserByEmail(email.clone())).await {
            Ok(Ok(_)) => return Err(ApiError::Conflict("User already exists".to_owned())),
            Ok(Err(DbError::NotFound)) => {}
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        }

        let password = hash_password(&state.config, &body.password)?;

        let user = match state
            .pg_db
            .send(AddUser {
                email,
                password,
                name: body.name,
                surname: body.surname,
                phone: body.phone,
                role: role.as_str().to_owned(),
            })
            .await
        {
            Ok(Ok(user)) => user,
            Ok(Err(DbError::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ))) => return Err(ApiError::Conflict("User already exists".to_owned())),
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };

        let pair = issue_token_pair(state.get_ref(), user.id).await?;

        Ok(HttpResponse::Ok()
            .cookie(refresh_cookie(&state.config, &pair.refresh_token))
            .json(json!({ "accessToken": pair.access_token })))
    }

    #[post("/refresh")]
    pub async fn refresh(state: Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let cookie = req
            .cookie(REFRESH_COOKIE)
            .ok_or_else(|| ApiError::Unauthorized("Missing refresh token".to_owned()))?;
        let old_token = cookie.value().to_owned();

        let claims = decode_refresh_token(&state.config, &old_token)?;

        match state
            .pg_db
            .send(FindValidToken { user_id: claims.id, refresh_token: old_token.clone() })
            .await
        {
            Ok(Ok(_)) => {}
            Ok(Err(DbError::NotFound)) => {
                return Err(ApiError::Unauthorized("Invalid refresh token".to_owned()))
            }
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        }

        // rotation: the superseded token must never be accepted again
        match state.pg_db.send(RemoveToken(old_token)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        }

        let pair = issue_token_pair(state.get_ref(), claims.id).await?;

        Ok(HttpResponse::Ok()
            .cookie(refresh_cookie(&state.config, &pair.refresh_token))
            .json(json!({ "accessToken": pair.access_token })))
    }

    #[post("/logout")]
    pub async fn logout(state: Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(cookie) = req.cookie(REFRESH_COOKIE) {
            // idempotent: deleting an already-absent token is still a logout
            match state.pg_db.send(RemoveToken(cookie.value().to_owned())).await {
                Ok(_) => {}
                Err(err) => return Err(ApiError::Internal(err.to_string())),
            }
        }

        Ok(HttpResponse::Ok()
            .cookie(clear_refresh_cookie())
            .json(json!({ "message": "Logged out" })))
    }

    #[get("/me")]
    pub async fn me(state: Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        let user = authenticate(state.get_ref(), &req).await?;

        Ok(HttpResponse::Ok().json(user))
    }
}

// sub-route "/menu"
pub mod menu_route {
    use actix_web::web::{Data, Json, Path, Query};
    use actix_web::{delete, get, patch, post, HttpRequest, HttpResponse};
    use diesel::result::Error as DbError;
    use serde::Deserialize;
    use tracing::warn;

    use crate::services::auth_handling::require_role;
    use crate::services::db_models::MenuItem;
    use crate::services::db_utils::AppState;
    use crate::services::insertable::MenuItemChangeset;
    use crate::services::messages::{
        AddMenuItem, FetchMenu, FetchMenuItem, RemoveMenuItem, UpdateMenuItem,
    };
    use crate::services::redis_handling::{cache_menu, get_cached_menu, invalidate_menu};
    use crate::types::{ApiError, Category, Role};

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MenuQuery {
        pub category: Option<String>,
        pub visible: Option<bool>,
        pub in_stock: Option<bool>,
        pub min_price: Option<f64>,
        pub max_price: Option<f64>,
        pub sort_by: Option<String>,
        pub sort_order: Option<String>,
    }

    #[get("")]
    pub async fn view_menu(
        state: Data<AppState>,
        query: Query<MenuQuery>,
    ) -> Result<HttpResponse, ApiError> {
        let query = query.into_inner();

        // an unknown category is ignored rather than failing the request
        let category = query
            .category
            .as_deref()
            .and_then(Category::parse)
            .map(|cat| cat.as_str().to_owned());

        let msg = FetchMenu {
            category,
            visible: query.visible,
            in_stock: query.in_stock,
            min_price: query.min_price,
            max_price: query.max_price,
            sort_by: query.sort_by,
            sort_desc: matches!(query.sort_order.as_deref(), Some("desc")),
        };

        let cacheable = msg.is_unfiltered();

        if cacheable {
            if let Ok(menu_json) = get_cached_menu(&state.redis_db) {
                if let Ok(menu) = serde_json::from_str::<Vec<MenuItem>>(&menu_json) {
                    return Ok(HttpResponse::Ok().json(menu));
                }
            }
        }

        match state.pg_db.send(msg).await {
            Ok(Ok(items)) => {
                if cacheable {
                    if let Err(err) = cache_menu(&state.redis_db, &items) {
                        warn!("unable to cache menu: {err}");
                    }
                }
                Ok(HttpResponse::Ok().json(items))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/{menu_id}")]
    pub async fn get_item(state: Data<AppState>, path: Path<i64>) -> Result<HttpResponse, ApiError> {
        match state.pg_db.send(FetchMenuItem(path.into_inner())).await {
            Ok(Ok(item)) => Ok(HttpResponse::Ok().json(item)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("Menu item with that id not found".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateMenuItemBody {
        pub name: String,
        pub description: Option<String>,
        pub price: f64,
        pub image_url: Option<String>,
        pub category: String,
        #[serde(default = "enabled")]
        pub visible: bool,
        #[serde(default = "enabled")]
        pub in_stock: bool,
    }

    fn enabled() -> bool {
        true
    }

    #[post("")]
    pub async fn create_item(
        state: Data<AppState>,
        req: HttpRequest,
        body: Json<CreateMenuItemBody>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let body = body.into_inner();

        if body.name.trim().is_empty() {
            return Err(ApiError::Validation("Name is required".to_owned()));
        }
        if body.price <= 0.0 {
            return Err(ApiError::Validation("Price must be positive".to_owned()));
        }
        let category = Category::parse(&body.category)
            .ok_or_else(|| ApiError::Validation(format!("Unknown category: {}", body.category)))?;

        match state
            .pg_db
            .send(AddMenuItem {
                name: body.name,
                description: body.description,
                price: body.price,
                image_url: body.image_url,
                category: category.as_str().to_owned(),
                visible: body.visible,
                in_stock: body.in_stock,
            })
            .await
        {
            Ok(Ok(item)) => {
                invalidate_menu(&state.redis_db);
                Ok(HttpResponse::Created().json(item))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateMenuItemBody {
        pub name: Option<String>,
        pub description: Option<String>,
        pub price: Option<f64>,
        pub image_url: Option<String>,
        pub category: Option<String>,
        pub visible: Option<bool>,
        pub in_stock: Option<bool>,
    }

    #[patch("/{menu_id}")]
    pub async fn update_item(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
        body: Json<UpdateMenuItemBody>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let body = body.into_inner();

        if let Some(price) = body.price {
            if price <= 0.0 {
                return Err(ApiError::Validation("Price must be positive".to_owned()));
            }
        }

        let category = match body.category.as_deref() {
            Some(raw) => Some(
                Category::parse(raw)
                    .ok_or_else(|| ApiError::Validation(format!("Unknown category: {raw}")))?
                    .as_str()
                    .to_owned(),
            ),
            None => None,
        };

        let changes = MenuItemChangeset {
            name: body.name,
            description: body.description,
            price: body.price,
            image_url: body.image_url,
            category,
            visible: body.visible,
            in_stock: body.in_stock,
        };

        if changes.is_empty() {
            return Err(ApiError::Validation("No update data provided".to_owned()));
        }

        match state
            .pg_db
            .send(UpdateMenuItem { menu_id: path.into_inner(), changes })
            .await
        {
            Ok(Ok(item)) => {
                invalidate_menu(&state.redis_db);
                Ok(HttpResponse::Ok().json(item))
            }
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("Menu item with that id not found".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[delete("/{menu_id}")]
    pub async fn delete_item(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        match state.pg_db.send(RemoveMenuItem(path.into_inner())).await {
            Ok(Ok(item)) => {
                invalidate_menu(&state.redis_db);
                Ok(HttpResponse::Ok().json(item))
            }
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("Menu item with that id not found".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }
}

// sub-route "/orders"
pub mod order_route {
    use actix_web::web::{Data, Json, Path, Query};
    use actix_web::{delete, get, patch, post, HttpRequest, HttpResponse};
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DbError};
    use serde::Deserialize;
    use serde_json::json;

    use crate::services::auth_handling::{authenticate, require_role};
    use crate::services::db_models::summarize;
    use crate::services::db_utils::AppState;
    use crate::services::insertable::OrderChangeset;
    use crate::services::messages::{
        AddOrder, FetchAverageCheck, FetchOrder, FetchOrders, OrderItemInput, OrdersCountByDay,
        OrdersCountByStatus, RemoveOrder, RevenueByDay, SetOrderStatus, UpdateOrder,
    };
    use crate::services::notify_handling::{notify_admins, notify_user};
    use crate::services::parse_date_bounds;
    use crate::types::{ApiError, OrderStatus, Role};

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrdersQuery {
        pub page: Option<i64>,
        pub page_size: Option<i64>,
        pub status: Option<String>,
        pub client_name: Option<String>,
        pub sort_by: Option<String>,
        pub sort_order: Option<String>,
    }

    #[get("")]
    pub async fn get_orders(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<OrdersQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin, Role::Waiter]).await?;

        let query = query.into_inner();

        if let Some(raw) = query.status.as_deref() {
            if raw != "all" && OrderStatus::parse(raw).is_none() {
                return Err(ApiError::Validation(format!("Unknown status: {raw}")));
            }
        }

        let msg = FetchOrders {
            page: query.page.unwrap_or(1).max(1),
            page_size: query.page_size.unwrap_or(10).max(1),
            status: query.status,
            client_name: query.client_name,
            sort_by: query.sort_by,
            sort_desc: matches!(query.sort_order.as_deref(), Some("desc")),
        };

        match state.pg_db.send(msg).await {
            Ok(Ok(page)) => Ok(HttpResponse::Ok().json(page)),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/{order_id}")]
    pub async fn get_order(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        let order_id = path.into_inner();

        match state.pg_db.send(FetchOrder(order_id)).await {
            Ok(Ok(order)) => Ok(HttpResponse::Ok().json(order)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound(format!("Order with id {order_id} not found")))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateOrderBody {
        pub client_name: String,
        pub client_surname: String,
        pub client_phone: String,
        pub delivery_address: String,
        pub status: Option<String>,
        pub waiter_id: Option<i64>,
        pub total_price: f64,
        pub items: Vec<OrderItemInput>,
    }

    fn validate_items(items: &[OrderItemInput]) -> Result<(), ApiError> {
        if items.is_empty() {
            return Err(ApiError::Validation("An order needs at least one item".to_owned()));
        }
        if items.iter().any(|item| item.quantity < 1) {
            return Err(ApiError::Validation("Item quantity must be at least 1".to_owned()));
        }
        Ok(())
    }

    async fn place_order(state: &AppState, msg: AddOrder) -> Result<HttpResponse, ApiError> {
        match state.pg_db.send(msg).await {
            Ok(Ok(created)) => {
                notify_admins(
                    state,
                    "New order",
                    &format!(
                        "New order from {} {}",
                        created.order.client_name, created.order.client_surname
                    ),
                )
                .await;

                Ok(HttpResponse::Created().json(created))
            }
            Ok(Err(DbError::DatabaseError(DatabaseErrorKind::UnableToSendCommand, info))) => {
                Err(ApiError::BadRequest(info.message().to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[post("")]
    pub async fn create_order(
        state: Data<AppState>,
        body: Json<CreateOrderBody>,
    ) -> Result<HttpResponse, ApiError> {
        let body = body.into_inner();
        validate_items(&body.items)?;

        let status = match body.status.as_deref() {
            Some(raw) => OrderStatus::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("Unknown status: {raw}")))?,
            None => OrderStatus::Pending,
        };

        place_order(
            state.get_ref(),
            AddOrder {
                client_name: body.client_name,
                client_surname: body.client_surname,
                client_phone: body.client_phone,
                delivery_address: body.delivery_address,
                status: status.as_str().to_owned(),
                total_price: body.total_price,
                waiter_id: body.waiter_id,
                guest_push_token: None,
                items: body.items,
            },
        )
        .await
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateGuestOrderBody {
        pub client_name: String,
        pub client_surname: String,
        pub client_phone: String,
        pub delivery_address: String,
        pub push_token: Option<String>,
        pub total_price: f64,
        pub items: Vec<OrderItemInput>,
    }

    #[post("/guest")]
    pub async fn create_guest_order(
        state: Data<AppState>,
        body: Json<CreateGuestOrderBody>,
    ) -> Result<HttpResponse, ApiError> {
        let body = body.into_inner();
        validate_items(&body.items)?;

        place_order(
            state.get_ref(),
            AddOrder {
                client_name: body.client_name,
                client_surname: body.client_surname,
                client_phone: body.client_phone,
                delivery_address: body.delivery_address,
                status: OrderStatus::Pending.as_str().to_owned(),
                total_price: body.total_price,
                waiter_id: None,
                guest_push_token: body.push_token,
                items: body.items,
            },
        )
        .await
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateOrderBody {
        pub client_name: Option<String>,
        pub client_surname: Option<String>,
        pub client_phone: Option<String>,
        pub delivery_address: Option<String>,
        pub total_price: Option<f64>,
    }

    #[patch("/{order_id}")]
    pub async fn update_order(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
        body: Json<UpdateOrderBody>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let body = body.into_inner();
        let order_id = path.into_inner();

        let changes = OrderChangeset {
            client_name: body.client_name,
            client_surname: body.client_surname,
            client_phone: body.client_phone,
            delivery_address: body.delivery_address,
            total_price: body.total_price,
            updated_at: chrono::Utc::now().naive_utc(),
        };

        if changes.is_empty() {
            return Err(ApiError::Validation("No update data provided".to_owned()));
        }

        match state.pg_db.send(UpdateOrder { order_id, changes }).await {
            Ok(Ok(order)) => Ok(HttpResponse::Ok().json(order)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound(format!("Order with id {order_id} not found")))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateStatusBody {
        pub status: String,
        pub waiter_id: Option<i64>,
    }

    #[patch("/{order_id}/status")]
    pub async fn update_order_status(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
        body: Json<UpdateStatusBody>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin, Role::Waiter]).await?;

        let body = body.into_inner();
        let order_id = path.into_inner();

        let status = OrderStatus::parse(&body.status)
            .ok_or_else(|| ApiError::Validation(format!("Unknown status: {}", body.status)))?;

        let order = match state
            .pg_db
            .send(SetOrderStatus {
                order_id,
                status: status.as_str().to_owned(),
                waiter_id: body.waiter_id,
            })
            .await
        {
            Ok(Ok(order)) => order,
            Ok(Err(DbError::NotFound)) => {
                return Err(ApiError::NotFound(format!("Order with id {order_id} not found")))
            }
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };

        if let Some(waiter) = order.waiter_id {
            notify_user(
                state.get_ref(),
                waiter,
                "Order status updated",
                &format!("Order #{order_id} is now {}", order.status),
            )
            .await;
        }

        if let Some(token) = order.guest_push_token.as_deref() {
            state
                .push
                .send(
                    token,
                    "Your order status changed",
                    &format!("Order #{order_id} is now \"{}\"", order.status),
                )
                .await;
        }

        Ok(HttpResponse::Ok().json(order))
    }

    #[delete("/{order_id}")]
    pub async fn delete_order(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let order_id = path.into_inner();

        match state.pg_db.send(RemoveOrder(order_id)).await {
            Ok(Ok(order)) => Ok(HttpResponse::Ok().json(order)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound(format!("Order with id {order_id} not found")))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatsQuery {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    #[get("/stats/status")]
    pub async fn orders_count_by_status(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<StatsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let (start, end) =
            parse_date_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;

        match state.pg_db.send(OrdersCountByStatus { start, end }).await {
            Ok(Ok(rows)) => Ok(HttpResponse::Ok().json(rows)),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/stats/count-by-day")]
    pub async fn orders_count_by_day(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<StatsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let (start, end) =
            parse_date_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;

        match state.pg_db.send(OrdersCountByDay { start, end }).await {
            Ok(Ok(rows)) => Ok(HttpResponse::Ok().json(rows)),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/stats/revenue-by-day")]
    pub async fn revenue_by_day(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<StatsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let (start, end) =
            parse_date_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;

        match state.pg_db.send(RevenueByDay { start, end }).await {
            Ok(Ok(rows)) => Ok(HttpResponse::Ok().json(rows)),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/stats/average-check")]
    pub async fn average_check(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<StatsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let (start, end) =
            parse_date_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;

        match state.pg_db.send(FetchAverageCheck { start, end }).await {
            Ok(Ok(avg)) => Ok(HttpResponse::Ok().json(json!({ "averageCheck": avg }))),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/stats/summary")]
    pub async fn summary_stats(
        state: Data<AppState>,
        req: HttpRequest,
        query: Query<StatsQuery>,
    ) -> Result<HttpResponse, ApiError> {
        require_role(state.get_ref(), &req, &[Role::Admin]).await?;

        let (start, end) =
            parse_date_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;

        let (by_status, revenue, avg) = futures::join!(
            state.pg_db.send(OrdersCountByStatus { start, end }),
            state.pg_db.send(RevenueByDay { start, end }),
            state.pg_db.send(FetchAverageCheck { start, end }),
        );

        let by_status = match by_status {
            Ok(Ok(rows)) => rows,
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };
        let revenue = match revenue {
            Ok(Ok(rows)) => rows,
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };
        let avg = match avg {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => return Err(ApiError::Internal(err.to_string())),
            Err(err) => return Err(ApiError::Internal(err.to_string())),
        };

        Ok(HttpResponse::Ok().json(summarize(by_status, &revenue, avg)))
    }
}

// sub-route "/users"
pub mod user_route {
    use actix_web::web::{Data, Json, Path};
    use actix_web::{delete, get, patch, post, HttpRequest, HttpResponse};
    use diesel::result::{DatabaseErrorKind, Error as DbError};
    use serde::Deserialize;
    use serde_json::json;

    use crate::services::auth_handling::{authenticate, hash_password, verify_password};
    use crate::services::db_utils::AppState;
    use crate::services::insertable::UserChangeset;
    use crate::services::messages::{
        AddUser, FetchUser, FetchUsers, RemoveUser, SetUserPassword, UpdateUser,
    };
    use crate::types::{ApiError, Role};

    #[get("")]
    pub async fn get_users(state: Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        match state.pg_db.send(FetchUsers).await {
            Ok(Ok(users)) => Ok(HttpResponse::Ok().json(users)),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[get("/{user_id}")]
    pub async fn get_user(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        match state.pg_db.send(FetchUser(path.into_inner())).await {
            Ok(Ok(user)) => Ok(HttpResponse::Ok().json(user)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("User with that id not found".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    pub struct CreateUserBody {
        pub email: String,
        pub password: String,
        pub name: String,
        pub surname: String,
        pub phone: String,
        pub role: Option<String>,
    }

    #[post("")]
    pub async fn create_user(
        state: Data<AppState>,
        req: HttpRequest,
        body: Json<CreateUserBody>,
    ) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        let body = body.into_inner();

        if body.email.trim().is_empty() || body.password.len() < 6 {
            return Err(ApiError::Validation(
                "Email and a password of at least 6 characters are required".to_owned(),
            ));
        }

        let role = match body.role.as_deref() {
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("Unknown role: {raw}")))?,
            None => Role::User,
        };

        let password = hash_password(&state.config, &body.password)?;

        match state
            .pg_db
            .send(AddUser {
                email: body.email.trim().to_owned(),
                password,
                name: body.name,
                surname: body.surname,
                phone: body.phone,
                role: role.as_str().to_owned(),
            })
            .await
        {
            Ok(Ok(user)) => Ok(HttpResponse::Created().json(user)),
            Ok(Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))) => {
                Err(ApiError::Conflict("User already exists".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateUserBody {
        pub email: Option<String>,
        pub password: Option<String>,
        pub name: Option<String>,
        pub surname: Option<String>,
        pub phone: Option<String>,
        pub role: Option<String>,
        pub push_token: Option<String>,
    }

    #[patch("/{user_id}")]
    pub async fn update_user(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
        body: Json<UpdateUserBody>,
    ) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        let body = body.into_inner();

        let role = match body.role.as_deref() {
            Some(raw) => Some(
                Role::parse(raw)
                    .ok_or_else(|| ApiError::Validation(format!("Unknown role: {raw}")))?
                    .as_str()
                    .to_owned(),
            ),
            None => None,
        };

        let password = match body.password.as_deref() {
            Some(raw) => Some(hash_password(&state.config, raw)?),
            None => None,
        };

        let changes = UserChangeset {
            email: body.email,
            password,
            name: body.name,
            surname: body.surname,
            phone: body.phone,
            role,
            push_token: body.push_token,
        };

        if changes.is_empty() {
            return Err(ApiError::Validation("No update data provided".to_owned()));
        }

        match state
            .pg_db
            .send(UpdateUser { user_id: path.into_inner(), changes })
            .await
        {
            Ok(Ok(user)) => Ok(HttpResponse::Ok().json(user)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("User with that id not found".to_owned()))
            }
            Ok(Err(DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))) => {
                Err(ApiError::Conflict("User already exists".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[delete("/{user_id}")]
    pub async fn delete_user(
        state: Data<AppState>,
        req: HttpRequest,
        path: Path<i64>,
    ) -> Result<HttpResponse, ApiError> {
        authenticate(state.get_ref(), &req).await?;

        match state.pg_db.send(RemoveUser(path.into_inner())).await {
            Ok(Ok(user)) => Ok(HttpResponse::Ok().json(user)),
            Ok(Err(DbError::NotFound)) => {
                Err(ApiError::NotFound("User with that id not found".to_owned()))
            }
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ChangePasswordBody {
        pub old_password: String,
        pub new_password: String,
    }

    #[post("/changePassword")]
    pub async fn change_password(
        state: Data<AppState>,
        req: HttpRequest,
        body: Json<ChangePasswordBody>,
    ) -> Result<HttpResponse, ApiError> {
        let user = authenticate(state.get_ref(), &req).await?;

        if body.new_password.len() < 6 {
            return Err(ApiError::Validation(
                "New password must be at least 6 characters".to_owned(),
            ));
        }

        if !verify_password(&body.old_password, &user.password) {
            return Err(ApiError::BadRequest("Old password does not match".to_owned()));
        }

        let password = hash_password(&state.config, &body.new_password)?;

        match state
            .pg_db
            .send(SetUserPassword { user_id: user.id, password })
            .await
        {
            Ok(Ok(())) => Ok(HttpResponse::Ok().json(json!({ "message": "Password changed" }))),
            Ok(Err(err)) => Err(ApiError::Internal(err.to_string())),
            Err(err) => Err(ApiError::Internal(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_date_bounds;

    #[test]
    fn date_bounds_parse_at_midnight() {
        let (start, end) = parse_date_bounds(Some("2024-03-01"), Some("2024-03-31")).unwrap();

        assert_eq!(start.unwrap().to_string(), "2024-03-01 00:00:00");
        assert_eq!(end.unwrap().to_string(), "2024-03-31 00:00:00");
    }

    #[test]
    fn missing_bounds_stay_open() {
        let (start, end) = parse_date_bounds(None, Some("2024-03-31")).unwrap();

        assert!(start.is_none());
        assert!(end.is_some());

        let (start, end) = parse_date_bounds(None, None).unwrap();
        assert!(start.is_none());
        assert!(end.is_none());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(parse_date_bounds(Some("31-03-2024"), None).is_err());
        assert!(parse_date_bounds(Some("not-a-date"), None).is_err());
    }
}
