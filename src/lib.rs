pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod model;
pub mod numeric;
pub mod ordered;
pub mod output;
pub mod parser;
pub mod sources;
pub mod stats;
pub mod store;
pub mod timeseries;
