/// Upward interface: receives every payload the decoder accepted.
///
/// Called without the bus lock held, so an implementation may answer by
/// calling [`SliceBus::send_data`](crate::SliceBus::send_data) on the same
/// bus. It should not block for long; it runs in the receive context.
pub trait Router {
    /// Handle `payload` that arrived on `local_cport`.
    fn dispatch(&self, local_cport: u8, payload: &[u8]);
}

impl<F> Router for F
where
    F: Fn(u8, &[u8]),
{
    fn dispatch(&self, local_cport: u8, payload: &[u8]) {
        self(local_cport, payload)
    }
}
