//! RAII guard for the active-connection gauge.

/// Increments the active-connection gauge on creation and decrements it on
/// drop.
pub(super) struct ActiveConnection;

impl ActiveConnection {
    pub(super) fn new() -> Self {
        crate::metrics::inc_connections();
        Self
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) { crate::metrics::dec_connections(); }
}
