//! Clinical records service for hospital stays: nursing sheets and their
//! documentation sections, the price list and the staff directory.

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod section;
pub mod seed;

pub use config::AppConfig;
pub use db::{MemoryStore, PgStore, Store};
pub use error::{Error, Result};
pub use handlers::router;
pub use section::Section;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
