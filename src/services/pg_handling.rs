use std::collections::HashMap;

use actix::Handler;
use chrono::NaiveDateTime;
use diesel::{
    r2d2::{ConnectionManager, Pool, PooledConnection},
    result::{DatabaseErrorKind, Error},
    sql_types::Timestamp,
    ExpressionMethods, PgConnection, PgTextExpressionMethods, QueryDsl, QueryResult, RunQueryDsl,
};

use crate::services::db_models::{
    AverageCheck, DayCount, DayRevenue, MenuItem, Order, OrderItem, OrderPage, OrderWithItems,
    StatusCount, Token, User,
};
use crate::services::db_utils::PgActor;
use crate::services::insertable::{NewMenuItem, NewOrder, NewOrderItem, NewToken, NewUser};
use crate::services::messages::{
    AddMenuItem, AddOrder, AddToken, AddUser, FetchAdminPushTokens, FetchAverageCheck, FetchMenu,
    FetchMenuItem, FetchOrder, FetchOrders, FetchPushToken, FetchUser, FetchUserByEmail,
    FetchUsers, FindValidToken, OrdersCountByDay, OrdersCountByStatus, RemoveMenuItem,
    RemoveOrder, RemoveToken, RemoveUser, RevenueByDay, SetOrderStatus, SetUserPassword,
    UpdateMenuItem, UpdateOrder, UpdateUser,
};

fn establish_connection(
    pool: &Pool<ConnectionManager<PgConnection>>,
) -> Result<PooledConnection<ConnectionManager<PgConnection>>, Error> {
    match pool.get() {
        Ok(val) => Ok(val),
        Err(_) => Err(connection_err()),
    }
}

fn connection_err() -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::ClosedConnection,
        Box::new("Failed to establish connection".to_owned()),
    )
}

fn get_db_err(msg: &str) -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::UnableToSendCommand,
        Box::new(msg.to_owned()),
    )
}

fn epoch() -> NaiveDateTime {
    NaiveDateTime::from_timestamp_opt(0, 0).unwrap()
}

fn range_bounds(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    (
        start.unwrap_or_else(epoch),
        end.unwrap_or_else(|| chrono::Utc::now().naive_utc()),
    )
}

fn load_items_for(
    conn: &mut PgConnection,
    order_ids: &[i64],
) -> QueryResult<HashMap<i64, Vec<OrderItem>>> {
    use crate::schema::order_items::{dsl::order_items, order_id as item_order_id};

    let rows = order_items
        .filter(item_order_id.eq_any(order_ids))
        .get_results::<OrderItem>(conn)?;

    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row);
    }

    Ok(grouped)
}

// -- users --------------------------------------------------------------

impl Handler<FetchUsers> for PgActor {
    type Result = QueryResult<Vec<User>>;

    fn handle(&mut self, _msg: FetchUsers, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::{dsl::users, id};

        let mut conn = establish_connection(&self.0)?;

        users.order(id.asc()).get_results::<User>(&mut conn)
    }
}

impl Handler<FetchUser> for PgActor {
    type Result = QueryResult<User>;

    fn handle(&mut self, msg: FetchUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::users;

        let mut conn = establish_connection(&self.0)?;

        users.find(msg.0).first(&mut conn)
    }
}

impl Handler<FetchUserByEmail> for PgActor {
    type Result = QueryResult<User>;

    fn handle(&mut self, msg: FetchUserByEmail, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::{dsl::users, email};

        let mut conn = establish_connection(&self.0)?;

        users.filter(email.eq(msg.0)).first(&mut conn)
    }
}

impl Handler<AddUser> for PgActor {
    type Result = QueryResult<User>;

    fn handle(&mut self, msg: AddUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::users;

        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(users)
            .values(NewUser {
                email: msg.email,
                password: msg.password,
                name: msg.name,
                surname: msg.surname,
                phone: msg.phone,
                role: msg.role,
                created_at: chrono::Utc::now().naive_utc(),
            })
            .get_result::<User>(&mut conn)
    }
}

impl Handler<UpdateUser> for PgActor {
    type Result = QueryResult<User>;

    fn handle(&mut self, msg: UpdateUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::dsl::users;

        let mut conn = establish_connection(&self.0)?;

        diesel::update(users.find(msg.user_id))
            .set(msg.changes)
            .get_result::<User>(&mut conn)
    }
}

impl Handler<SetUserPassword> for PgActor {
    type Result = QueryResult<()>;

    fn handle(&mut self, msg: SetUserPassword, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::{dsl::users, password};

        let mut conn = establish_connection(&self.0)?;

        diesel::update(users.find(msg.user_id))
            .set(password.eq(msg.password))
            .execute(&mut conn)?;

        Ok(())
    }
}

impl Handler<RemoveUser> for PgActor {
    type Result = QueryResult<User>;

    fn handle(&mut self, msg: RemoveUser, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::{dsl::orders, waiter_id};
        use crate::schema::tokens::{dsl::tokens, user_id as token_user_id};
        use crate::schema::users::dsl::users;

        let mut conn = establish_connection(&self.0)?;

        let user = users.find(msg.0).first::<User>(&mut conn)?;

        conn.build_transaction().run(move |trx_conn| {
            diesel::update(orders.filter(waiter_id.eq(msg.0)))
                .set(waiter_id.eq(None::<i64>))
                .execute(trx_conn)?;

            diesel::delete(tokens.filter(token_user_id.eq(msg.0))).execute(trx_conn)?;

            diesel::delete(users.find(msg.0)).execute(trx_conn)?;

            Ok(user)
        })
    }
}

impl Handler<FetchAdminPushTokens> for PgActor {
    type Result = QueryResult<Vec<String>>;

    fn handle(&mut self, _msg: FetchAdminPushTokens, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::{dsl::users, push_token, role};

        let mut conn = establish_connection(&self.0)?;

        let rows = users
            .filter(role.eq("ADMIN"))
            .filter(push_token.is_not_null())
            .select(push_token)
            .get_results::<Option<String>>(&mut conn)?;

        Ok(rows.into_iter().flatten().collect())
    }
}

impl Handler<FetchPushToken> for PgActor {
    type Result = QueryResult<Option<String>>;

    fn handle(&mut self, msg: FetchPushToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::users::{dsl::users, push_token};

        let mut conn = establish_connection(&self.0)?;

        users.find(msg.0).select(push_token).first(&mut conn)
    }
}

// -- menu ---------------------------------------------------------------

impl Handler<FetchMenu> for PgActor {
    type Result = QueryResult<Vec<MenuItem>>;

    fn handle(&mut self, msg: FetchMenu, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::{
            category, created_at, dsl::menu_items, id, in_stock, name, price, visible,
        };

        let mut conn = establish_connection(&self.0)?;

        let mut query = menu_items.into_boxed();

        if let Some(wanted) = msg.category {
            query = query.filter(category.eq(wanted));
        }
        if let Some(flag) = msg.visible {
            query = query.filter(visible.eq(flag));
        }
        if let Some(flag) = msg.in_stock {
            query = query.filter(in_stock.eq(flag));
        }
        if let Some(bound) = msg.min_price {
            query = query.filter(price.ge(bound));
        }
        if let Some(bound) = msg.max_price {
            query = query.filter(price.le(bound));
        }

        query = match (msg.sort_by.as_deref(), msg.sort_desc) {
            (Some("name"), false) => query.order(name.asc()),
            (Some("name"), true) => query.order(name.desc()),
            (Some("price"), false) => query.order(price.asc()),
            (Some("price"), true) => query.order(price.desc()),
            (Some("createdAt"), false) => query.order(created_at.asc()),
            (Some("createdAt"), true) => query.order(created_at.desc()),
            _ => query.order(id.asc()),
        };

        query.get_results::<MenuItem>(&mut conn)
    }
}

impl Handler<FetchMenuItem> for PgActor {
    type Result = QueryResult<MenuItem>;

    fn handle(&mut self, msg: FetchMenuItem, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::dsl::menu_items;

        let mut conn = establish_connection(&self.0)?;

        menu_items.find(msg.0).first(&mut conn)
    }
}

impl Handler<AddMenuItem> for PgActor {
    type Result = QueryResult<MenuItem>;

    fn handle(&mut self, msg: AddMenuItem, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::dsl::menu_items;

        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(menu_items)
            .values(NewMenuItem {
                name: msg.name,
                description: msg.description,
                price: msg.price,
                image_url: msg.image_url,
                category: msg.category,
                visible: msg.visible,
                in_stock: msg.in_stock,
                created_at: chrono::Utc::now().naive_utc(),
            })
            .get_result::<MenuItem>(&mut conn)
    }
}

impl Handler<UpdateMenuItem> for PgActor {
    type Result = QueryResult<MenuItem>;

    fn handle(&mut self, msg: UpdateMenuItem, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::dsl::menu_items;

        let mut conn = establish_connection(&self.0)?;

        diesel::update(menu_items.find(msg.menu_id))
            .set(msg.changes)
            .get_result::<MenuItem>(&mut conn)
    }
}

impl Handler<RemoveMenuItem> for PgActor {
    type Result = QueryResult<MenuItem>;

    fn handle(&mut self, msg: RemoveMenuItem, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::dsl::menu_items;
        use crate::schema::order_items::{dsl::order_items, id as item_pk};

        let mut conn = establish_connection(&self.0)?;

        let item = menu_items.find(msg.0).first::<MenuItem>(&mut conn)?;

        conn.build_transaction().run(move |trx_conn| {
            // NOTE: matches the order_items primary key against the menu id,
            // not menu_item_id; kept as-is, see DESIGN.md
            diesel::delete(order_items.filter(item_pk.eq(msg.0))).execute(trx_conn)?;

            diesel::delete(menu_items.find(msg.0)).execute(trx_conn)?;

            Ok(item)
        })
    }
}

// -- orders -------------------------------------------------------------

impl Handler<FetchOrders> for PgActor {
    type Result = QueryResult<OrderPage>;

    fn handle(&mut self, msg: FetchOrders, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::{
            client_name, created_at, dsl::orders, id, status, total_price,
        };

        let mut conn = establish_connection(&self.0)?;

        let mut query = orders.into_boxed();
        let mut count_query = orders.into_boxed();

        if let Some(wanted) = msg.status.as_deref() {
            if wanted != "all" {
                query = query.filter(status.eq(wanted.to_owned()));
                count_query = count_query.filter(status.eq(wanted.to_owned()));
            }
        }
        if let Some(part) = msg.client_name.as_deref() {
            let pattern = format!("%{part}%");
            query = query.filter(client_name.ilike(pattern.clone()));
            count_query = count_query.filter(client_name.ilike(pattern));
        }

        query = match (msg.sort_by.as_deref(), msg.sort_desc) {
            (Some("createdAt"), false) => query.order(created_at.asc()),
            (Some("createdAt"), true) => query.order(created_at.desc()),
            (Some("totalPrice"), false) => query.order(total_price.asc()),
            (Some("totalPrice"), true) => query.order(total_price.desc()),
            (Some("status"), false) => query.order(status.asc()),
            (Some("status"), true) => query.order(status.desc()),
            (Some("clientName"), false) => query.order(client_name.asc()),
            (Some("clientName"), true) => query.order(client_name.desc()),
            (Some("id"), false) => query.order(id.asc()),
            _ => query.order(id.desc()),
        };

        let total = count_query.count().get_result::<i64>(&mut conn)?;

        let page_rows = query
            .limit(msg.page_size)
            .offset((msg.page - 1) * msg.page_size)
            .get_results::<Order>(&mut conn)?;

        let order_ids: Vec<i64> = page_rows.iter().map(|order| order.id).collect();
        let mut grouped = load_items_for(&mut conn, &order_ids)?;

        let page = page_rows
            .into_iter()
            .map(|order| {
                let items = grouped.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect();

        Ok(OrderPage {
            orders: page,
            total,
            page: msg.page,
            page_size: msg.page_size,
        })
    }
}

impl Handler<FetchOrder> for PgActor {
    type Result = QueryResult<OrderWithItems>;

    fn handle(&mut self, msg: FetchOrder, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::dsl::orders;

        let mut conn = establish_connection(&self.0)?;

        let order = orders.find(msg.0).first::<Order>(&mut conn)?;
        let mut grouped = load_items_for(&mut conn, &[order.id])?;
        let items = grouped.remove(&order.id).unwrap_or_default();

        Ok(OrderWithItems { order, items })
    }
}

impl Handler<AddOrder> for PgActor {
    type Result = QueryResult<OrderWithItems>;

    fn handle(&mut self, msg: AddOrder, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::menu_items::{dsl::menu_items, id as menu_pk};
        use crate::schema::order_items::dsl::order_items;
        use crate::schema::orders::dsl::orders;

        let mut conn = establish_connection(&self.0)?;

        let wanted: Vec<i64> = msg.items.iter().map(|item| item.menu_item_id).collect();
        let existing = menu_items
            .select(menu_pk)
            .filter(menu_pk.eq_any(&wanted))
            .get_results::<i64>(&mut conn)?;

        let mut missing: Vec<i64> = wanted
            .iter()
            .filter(|menu_id| !existing.contains(menu_id))
            .copied()
            .collect();
        missing.dedup();

        if !missing.is_empty() {
            return Err(get_db_err(&format!(
                "One or more menu items in the order do not exist: {missing:?}"
            )));
        }

        conn.build_transaction().run(move |trx_conn| {
            let now = chrono::Utc::now().naive_utc();

            let order = diesel::insert_into(orders)
                .values(NewOrder {
                    client_name: msg.client_name,
                    client_surname: msg.client_surname,
                    client_phone: msg.client_phone,
                    delivery_address: msg.delivery_address,
                    status: msg.status,
                    total_price: msg.total_price,
                    waiter_id: msg.waiter_id,
                    guest_push_token: msg.guest_push_token,
                    created_at: now,
                    updated_at: now,
                })
                .get_result::<Order>(trx_conn)?;

            let rows: Vec<NewOrderItem> = msg
                .items
                .iter()
                .map(|item| NewOrderItem {
                    order_id: order.id,
                    menu_item_id: item.menu_item_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect();

            let items = diesel::insert_into(order_items)
                .values(rows)
                .get_results::<OrderItem>(trx_conn)?;

            Ok(OrderWithItems { order, items })
        })
    }
}

impl Handler<UpdateOrder> for PgActor {
    type Result = QueryResult<OrderWithItems>;

    fn handle(&mut self, msg: UpdateOrder, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::dsl::orders;

        let mut conn = establish_connection(&self.0)?;

        let order = diesel::update(orders.find(msg.order_id))
            .set(msg.changes)
            .get_result::<Order>(&mut conn)?;

        let mut grouped = load_items_for(&mut conn, &[order.id])?;
        let items = grouped.remove(&order.id).unwrap_or_default();

        Ok(OrderWithItems { order, items })
    }
}

impl Handler<SetOrderStatus> for PgActor {
    type Result = QueryResult<Order>;

    fn handle(&mut self, msg: SetOrderStatus, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::orders::{dsl::orders, status, updated_at, waiter_id};

        let mut conn = establish_connection(&self.0)?;

        let now = chrono::Utc::now().naive_utc();

        // any status may overwrite any other; transitions are not validated
        match msg.waiter_id {
            Some(waiter) => diesel::update(orders.find(msg.order_id))
                .set((status.eq(msg.status), waiter_id.eq(waiter), updated_at.eq(now)))
                .get_result::<Order>(&mut conn),
            None => diesel::update(orders.find(msg.order_id))
                .set((status.eq(msg.status), updated_at.eq(now)))
                .get_result::<Order>(&mut conn),
        }
    }
}

impl Handler<RemoveOrder> for PgActor {
    type Result = QueryResult<Order>;

    fn handle(&mut self, msg: RemoveOrder, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::order_items::{dsl::order_items, id as item_pk};
        use crate::schema::orders::dsl::orders;

        let mut conn = establish_connection(&self.0)?;

        let order = orders.find(msg.0).first::<Order>(&mut conn)?;

        conn.build_transaction().run(move |trx_conn| {
            // NOTE: matches the order_items primary key against the order id,
            // not order_id; kept as-is, see DESIGN.md
            diesel::delete(order_items.filter(item_pk.eq(msg.0))).execute(trx_conn)?;

            diesel::delete(orders.find(msg.0)).execute(trx_conn)?;

            Ok(order)
        })
    }
}

// -- order stats --------------------------------------------------------

impl Handler<OrdersCountByStatus> for PgActor {
    type Result = QueryResult<Vec<StatusCount>>;

    fn handle(&mut self, msg: OrdersCountByStatus, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;
        let (start, end) = range_bounds(msg.start, msg.end);

        diesel::sql_query(
            "SELECT status, COUNT(*) AS count FROM orders \
             WHERE created_at BETWEEN $1 AND $2 GROUP BY status",
        )
        .bind::<Timestamp, _>(start)
        .bind::<Timestamp, _>(end)
        .get_results::<StatusCount>(&mut conn)
    }
}

impl Handler<OrdersCountByDay> for PgActor {
    type Result = QueryResult<Vec<DayCount>>;

    fn handle(&mut self, msg: OrdersCountByDay, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;
        let (start, end) = range_bounds(msg.start, msg.end);

        diesel::sql_query(
            "SELECT to_char(created_at, 'YYYY-MM-DD') AS day, COUNT(*) AS count \
             FROM orders WHERE created_at BETWEEN $1 AND $2 \
             GROUP BY day ORDER BY day ASC",
        )
        .bind::<Timestamp, _>(start)
        .bind::<Timestamp, _>(end)
        .get_results::<DayCount>(&mut conn)
    }
}

impl Handler<RevenueByDay> for PgActor {
    type Result = QueryResult<Vec<DayRevenue>>;

    fn handle(&mut self, msg: RevenueByDay, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;
        let (start, end) = range_bounds(msg.start, msg.end);

        diesel::sql_query(
            "SELECT to_char(created_at, 'YYYY-MM-DD') AS day, \
             SUM(total_price)::float8 AS revenue \
             FROM orders WHERE created_at BETWEEN $1 AND $2 \
             GROUP BY day ORDER BY day ASC",
        )
        .bind::<Timestamp, _>(start)
        .bind::<Timestamp, _>(end)
        .get_results::<DayRevenue>(&mut conn)
    }
}

impl Handler<FetchAverageCheck> for PgActor {
    type Result = QueryResult<f64>;

    fn handle(&mut self, msg: FetchAverageCheck, _ctx: &mut Self::Context) -> Self::Result {
        let mut conn = establish_connection(&self.0)?;
        let (start, end) = range_bounds(msg.start, msg.end);

        let row = diesel::sql_query(
            "SELECT COALESCE(AVG(total_price), 0)::float8 AS average \
             FROM orders WHERE created_at BETWEEN $1 AND $2",
        )
        .bind::<Timestamp, _>(start)
        .bind::<Timestamp, _>(end)
        .get_result::<AverageCheck>(&mut conn)?;

        Ok(row.average)
    }
}

// -- refresh tokens -----------------------------------------------------

impl Handler<AddToken> for PgActor {
    type Result = QueryResult<Token>;

    fn handle(&mut self, msg: AddToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::tokens::dsl::tokens;

        let mut conn = establish_connection(&self.0)?;

        diesel::insert_into(tokens)
            .values(NewToken {
                user_id: msg.user_id,
                refresh_token: msg.refresh_token,
                expires_at: msg.expires_at,
            })
            .get_result::<Token>(&mut conn)
    }
}

impl Handler<FindValidToken> for PgActor {
    type Result = QueryResult<Token>;

    fn handle(&mut self, msg: FindValidToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::tokens::{dsl::tokens, expires_at, refresh_token, user_id};

        let mut conn = establish_connection(&self.0)?;

        tokens
            .filter(user_id.eq(msg.user_id))
            .filter(refresh_token.eq(msg.refresh_token))
            .filter(expires_at.gt(chrono::Utc::now().naive_utc()))
            .first::<Token>(&mut conn)
    }
}

impl Handler<RemoveToken> for PgActor {
    type Result = QueryResult<usize>;

    fn handle(&mut self, msg: RemoveToken, _ctx: &mut Self::Context) -> Self::Result {
        use crate::schema::tokens::{dsl::tokens, refresh_token};

        let mut conn = establish_connection(&self.0)?;

        diesel::delete(tokens.filter(refresh_token.eq(msg.0))).execute(&mut conn)
    }
}
