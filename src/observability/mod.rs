//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listener, connections and the parser produce:
//!     → logging.rs (structured log events, one span per connection)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
