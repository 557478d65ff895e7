use actix::{Actor, Addr, SyncContext};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

use crate::services::notify_handling::PushClient;
use crate::types::{AppConfig, PoolInitializationError};

pub struct PgActor(pub Pool<ConnectionManager<PgConnection>>);

pub struct AppState {
    pub pg_db: Addr<PgActor>,
    pub redis_db: redis::Client,
    pub push: PushClient,
    pub config: AppConfig,
}

impl Actor for PgActor {
    type Context = SyncContext<Self>;
}

pub fn get_db_pool(db_url: &str) -> Result<Pool<ConnectionManager<PgConnection>>, PoolInitializationError> {
    let manager: ConnectionManager<PgConnection> = ConnectionManager::<PgConnection>::new(db_url);
    match Pool::builder().build(manager) {
        Ok(val) => Ok(val),
        Err(err) => Err(PoolInitializationError(err.to_string()))
    }
}
