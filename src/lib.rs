//! Library exports for the storefront session client, shared between the binary and tests.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod startup;
pub mod state;
pub mod storage;
pub mod utils;
