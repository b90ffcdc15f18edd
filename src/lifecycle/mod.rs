//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller closes the server
//!
//! Shutdown (shutdown.rs):
//!     trigger → accept loop exits → listener socket dropped
//!     → in-flight connections run to completion
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
