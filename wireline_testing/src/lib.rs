//! Test utilities for `wireline`.
//!
//! [`logger`] serialises access to a global [`logtest::Logger`] so tests can
//! assert on emitted `log` records. The [`peer`] helpers stand up loopback
//! TCP servers for a client session to talk to.
//!
//! ```rust,no_run
//! use wireline_testing::peer::spawn_echo_server;
//!
//! # async fn example() -> std::io::Result<()> {
//! let addr = spawn_echo_server().await?;
//! println!("echo server on {addr}");
//! # Ok(())
//! # }
//! ```

pub mod logging;
pub mod peer;

pub use logging::{LoggerHandle, logger};
pub use peer::{LocalPeer, spawn_echo_server};
