// src/lib.rs

//! Unofficial data-access library for the Lectio school portal.

pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod crawler;
pub mod dom;
pub mod error;
pub mod models;
pub mod scrape;
pub mod session;
pub mod storage;
pub mod utils;
