//! # zhmc Session
//!
//! Opening and closing sessions with an HMC, and `FakedHmc`, an in-memory
//! HMC that implements `HmcClient` for tests and dry runs.
//!
//! The HMC REST transport itself is provided by a `Connector`; this crate
//! only validates the connection parameters and decides whether the session
//! is logged off when it is closed.

pub mod auth;
pub mod faked;
pub mod session;

pub use auth::{parse_hmc_host, HmcAuth};
pub use faked::{FakedHmc, HmcDefinition};
pub use session::{Connector, Credentials, Session, SessionFactory, SessionSpec};
