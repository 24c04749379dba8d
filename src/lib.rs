pub mod browse;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod sources;
pub mod state;
pub mod storage;
pub mod stores;
