pub mod catalog;
pub mod chrono_util;
pub mod client;
pub mod config;
pub mod logging;
pub mod output;
pub mod ranking;
pub mod reporter;
pub mod scrape;
pub mod table;
