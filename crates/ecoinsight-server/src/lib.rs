pub mod app;
pub mod auth;
pub mod error;
pub mod external;
pub mod routes;
pub mod state;
