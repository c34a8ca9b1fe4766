//! Library Management Engine
//!
//! An in-memory catalog of books and members backed by SQLite, driven by a
//! line-oriented JSON protocol on stdin/stdout.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::{Catalog, Services};
