pub mod database;
pub mod queue;
pub mod service;
pub mod session;
pub mod snowflake;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use tokio::sync::{broadcast, Mutex};

use crate::{config::Settings, error::Error, routes::ws};

pub use database::Database;
pub use queue::Queue;
pub use session::Session;
pub use snowflake::Snowflake;
pub use user::User;

type Snowcloud = snowcloud::MultiThread<43, 8, 12>;
const EPOCH: u64 = 1650667342000;
const PRIMARY_ID: i64 = 1;

/// Pending push events per websocket before slow clients start lagging.
const CHANNEL_CAPACITY: usize = 256;

pub struct AppState {
    pub database: Mutex<Database>,
    snowcloud: Snowcloud,
    pub tx: ws::Sender,
    pub settings: Settings,
}

impl AppState {
    pub fn new(database: Database, settings: Settings) -> Result<AppState, Error> {
        let snowcloud = Snowcloud::new(PRIMARY_ID, EPOCH)?;
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);

        Ok(AppState {
            database: Mutex::new(database),
            snowcloud,
            tx,
            settings,
        })
    }

    pub fn next_snowflake(&self) -> Result<Snowflake, Error> {
        match self.snowcloud.next_id() {
            Ok(snowflake) => Ok(Snowflake::from(snowflake.id())),
            Err(err) => {
                warn!("Failed to generate snowflake: {}", err);
                Err(err.into())
            }
        }
    }
}

/// Seconds since the unix epoch.
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
