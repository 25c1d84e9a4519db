pub mod config;
pub mod humanize;
pub mod ingest;
pub mod item;
pub mod magnet;
pub mod media;
pub mod observability;
pub mod pipeline;
pub mod store;
