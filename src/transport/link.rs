use tracing::debug;

use super::channel::{ErrorProbability, NoisyChannel};

/// Two endpoints bound so that each side's outbound queue is the other
/// side's inbound queue.
#[derive(Debug)]
pub struct LoopbackLink {
    client: NoisyChannel,
    device: NoisyChannel,
}

impl LoopbackLink {
    /// Creates a noise-free link.
    #[must_use]
    pub fn new() -> Self {
        let client = NoisyChannel::new();
        let device = client.peer();
        debug!("created loopback link");
        Self { client, device }
    }

    /// Creates a link with per-endpoint corruption probabilities.
    #[must_use]
    pub fn with_error_probability(client: ErrorProbability, device: ErrorProbability) -> Self {
        let Self {
            client: client_endpoint,
            device: device_endpoint,
        } = Self::new();
        Self {
            client: client_endpoint.with_error_probability(client),
            device: device_endpoint.with_error_probability(device),
        }
    }

    /// Applies `configure` to the client-facing endpoint.
    #[must_use]
    pub fn map_client(mut self, configure: impl FnOnce(NoisyChannel) -> NoisyChannel) -> Self {
        self.client = configure(self.client);
        self
    }

    /// Applies `configure` to the device-facing endpoint.
    #[must_use]
    pub fn map_device(mut self, configure: impl FnOnce(NoisyChannel) -> NoisyChannel) -> Self {
        self.device = configure(self.device);
        self
    }

    /// Splits the link into its `(client, device)` endpoints.
    #[must_use]
    pub fn into_endpoints(self) -> (NoisyChannel, NoisyChannel) {
        (self.client, self.device)
    }
}

impl Default for LoopbackLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::{assert_eq, assert_ne};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn client_writes_arrive_at_device_unmodified() {
        let (mut client, mut device) = LoopbackLink::new().into_endpoints();

        client.write(b"M28 abc.g\n");

        assert_eq!(10, device.bytes_available());
        assert_eq!(b"M28 abc.g\n".to_vec(), device.read_line());
    }

    #[test]
    fn device_writes_arrive_at_client_unmodified() {
        let (mut client, mut device) = LoopbackLink::new().into_endpoints();

        device.write(b"ok\n");

        assert_eq!(3, client.bytes_available());
        assert_eq!(b"ok\n".to_vec(), client.read(3));
    }

    #[test]
    fn endpoints_share_queues_in_opposite_directions() {
        let (client, device) = LoopbackLink::new().into_endpoints();

        assert!(Rc::ptr_eq(client.outbound(), device.inbound()));
        assert!(Rc::ptr_eq(device.outbound(), client.inbound()));
    }

    #[test]
    fn device_noise_only_affects_device_writes() {
        let (mut client, mut device) = LoopbackLink::with_error_probability(
            ErrorProbability::default(),
            ErrorProbability::builder().write(1.0).build(),
        )
        .map_device(|device| device.with_noise_source(StdRng::seed_from_u64(9)))
        .into_endpoints();

        client.write(b"M105\n");
        device.write(b"T:20 E:0 B:20\n");

        assert_eq!(b"M105\n".to_vec(), device.read_line());
        assert_ne!(b"T:20 E:0 B:20\n".to_vec(), client.read(14));
    }

    #[test]
    fn endpoint_reset_drops_pending_bytes() {
        let (mut client, device) = LoopbackLink::new().into_endpoints();
        client.write(b"M20\n");

        client.reset();

        assert_eq!(0, device.bytes_available());
    }
}
