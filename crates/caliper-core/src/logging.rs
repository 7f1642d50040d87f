//! Logging facilities for Caliper.
//!
//! Caliper uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "caliper_core";
    /// Signal system target.
    pub const SIGNAL: &str = "caliper_core::signal";
    /// Task scheduler target.
    pub const SCHEDULER: &str = "caliper_core::scheduler";
}
