//! pinacquire - Pinterest profile media discovery and download.
//!
//! Discovery walks a profile's rendered pages and paged API responses,
//! extracting a deduplicated set of records from whatever JSON shape they
//! arrive in. Downloads fetch each record's asset at bounded concurrency,
//! falling back through lower resolutions and skipping files already on
//! disk.

pub mod config;
pub mod discovery;
pub mod manifest;
pub mod models;
pub mod scrapers;
pub mod services;
pub mod storage;
pub mod utils;
