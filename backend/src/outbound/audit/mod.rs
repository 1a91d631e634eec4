//! Driven adapters for the audit side channel.

mod tracing_sink;

pub use tracing_sink::TracingPermissionAudit;
