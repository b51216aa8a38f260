pub mod climate;
pub mod config;
pub mod error;
pub mod esg;
pub mod pagination;
pub mod timeseries;
pub mod user;
