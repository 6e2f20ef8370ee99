pub mod admin;
pub mod app;
pub mod board;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod state;

pub use app::router;
pub use board::Board;
pub use config::Config;
pub use state::AppState;
