pub mod alpaca;
pub mod baseline;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod heartbeat;
pub mod model;
pub mod supervisor;
pub mod tracker;
