// Library interface for testing

pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod db_postgres;
pub mod oauth;
pub mod queries;
pub mod rows;
pub mod schema;
pub mod session;
pub mod store;
pub mod tracker;

pub use config::Settings;
pub use oauth::{CodeProvider, ConsoleCodeProvider, FixedCodeProvider, OAuthEndpoints};
pub use rows::ActivityRow;
pub use tracker::{run, RunReport};
