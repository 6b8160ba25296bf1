#![forbid(unsafe_code)]

pub mod bookmark;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;
pub mod notify;
pub mod omnivore;
pub mod pinboard;
pub mod server;
