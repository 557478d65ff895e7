use tracing::warn;

use crate::services::db_models::MenuItem;

pub const MENU_CACHE_KEY: &str = "menu_cache";

pub fn get_cached_menu(db: &redis::Client) -> Result<String, String> {
    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(_) => return Err("Failed to establish connection with redis".into()),
    };

    match redis::cmd("GET").arg(MENU_CACHE_KEY).query::<String>(&mut conn) {
        Ok(menu_json) => Ok(menu_json),
        Err(_) => Err("Menu cache is empty".into()),
    }
}

pub fn cache_menu(db: &redis::Client, items: &[MenuItem]) -> Result<(), String> {
    let menu_json = match serde_json::to_string(items) {
        Ok(menu) => menu,
        Err(_) => return Err("Failed to compose JSON object of menu".into()),
    };

    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(_) => return Err("Failed to establish connection with redis".into()),
    };

    redis::cmd("SET")
        .arg(MENU_CACHE_KEY)
        .arg(menu_json)
        .execute(&mut conn);

    Ok(())
}

/// Called on every menu write; a stale cache is worse than a cold one.
pub fn invalidate_menu(db: &redis::Client) {
    let mut conn = match db.get_connection() {
        Ok(conn) => conn,
        Err(err) => {
            warn!("unable to invalidate menu cache: {err}");
            return;
        }
    };

    redis::cmd("DEL").arg(MENU_CACHE_KEY).execute(&mut conn);
}
