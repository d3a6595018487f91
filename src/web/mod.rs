pub mod api;
pub mod api_doc;
pub mod auth;
pub mod server;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::oracle::OverpassOracle;
use crate::scheduler::{FileLocationStore, NotificationScheduler};

pub use server::run_server;

/// Everything the request handlers share.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<FileLocationStore>,
    pub oracle: Arc<dyn OverpassOracle>,
    pub scheduler: Arc<Mutex<NotificationScheduler>>,
}
