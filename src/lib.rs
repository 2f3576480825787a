pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod geocode;
pub mod net;
pub mod report;
pub mod shell;
pub mod snapshot;
pub mod store;
