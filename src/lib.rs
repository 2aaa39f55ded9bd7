pub mod client;
pub mod cmd;
pub mod config;
pub mod gateway;
pub mod live;
pub mod logs;
pub mod types;
