use actix::{Addr, SyncArbiter};
use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use services::db_utils::{get_db_pool, AppState, PgActor};
use services::notify_handling::PushClient;
use types::AppConfig;

mod schema;
mod services;
mod types;

fn init_pg_db(config: &AppConfig) -> Addr<PgActor> {
    let pool = get_db_pool(&config.pg_database_url).expect("Failed to build postgres pool");

    SyncArbiter::start(5, move || PgActor(pool.clone()))
}

fn init_redis_db(config: &AppConfig) -> redis::Client {
    redis::Client::open(config.redis_database_uri.clone()).expect("Failed to open redis client")
}

fn build_cors(origins: &str) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE", "OPTIONS"])
        .allow_any_header();

    if origins.trim().is_empty() {
        return cors.allow_any_origin();
    }

    let mut cors = cors.supports_credentials();
    for origin in origins.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        cors = cors.allowed_origin(origin);
    }

    cors
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pg_db = init_pg_db(&config);
    let redis_db = init_redis_db(&config);
    let push = PushClient::from_config(&config);

    let bind_addr = config.bind_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(build_cors(&config.cors_origins))
            .app_data(Data::new(AppState {
                pg_db: pg_db.clone(),
                redis_db: redis_db.clone(),
                push: push.clone(),
                config: config.clone(),
            }))
            .service(services::home_page)
            .service(
                web::scope("/auth")
                    .service(services::auth_route::login)
                    .service(services::auth_route::register)
                    .service(services::auth_route::refresh)
                    .service(services::auth_route::logout)
                    .service(services::auth_route::me),
            )
            .service(
                web::scope("/menu")
                    .service(services::menu_route::view_menu)
                    .service(services::menu_route::create_item)
                    .service(services::menu_route::get_item)
                    .service(services::menu_route::update_item)
                    .service(services::menu_route::delete_item),
            )
            .service(
                web::scope("/orders")
                    // stats come first so "stats" is never captured as an order id
                    .service(services::order_route::orders_count_by_status)
                    .service(services::order_route::orders_count_by_day)
                    .service(services::order_route::revenue_by_day)
                    .service(services::order_route::average_check)
                    .service(services::order_route::summary_stats)
                    .service(services::order_route::get_orders)
                    .service(services::order_route::create_order)
                    .service(services::order_route::create_guest_order)
                    .service(services::order_route::get_order)
                    .service(services::order_route::update_order)
                    .service(services::order_route::update_order_status)
                    .service(services::order_route::delete_order),
            )
            .service(
                web::scope("/users")
                    .service(services::user_route::change_password)
                    .service(services::user_route::get_users)
                    .service(services::user_route::create_user)
                    .service(services::user_route::get_user)
                    .service(services::user_route::update_user)
                    .service(services::user_route::delete_user),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
