//! Core traits.

pub mod client;

pub use client::{HmcClient, OsMessageReceiver, CONSOLE_URI};
