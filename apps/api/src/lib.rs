pub mod config;
pub mod db;
pub mod documents;
pub mod errors;
pub mod models;
pub mod payments;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;
pub mod synthesis;
pub mod workflow;
