use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bon::Builder;
use rand::{Rng, RngCore};
use strum_macros::Display;
use tracing::info;

use super::buffer::ByteBuffer;

/// A byte queue shared between the two endpoints of a link.
pub(crate) type SharedBuffer = Rc<RefCell<ByteBuffer>>;

/// Channel operation that noise can be injected into.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Display)]
pub enum NoiseOp {
    #[strum(to_string = "read")]
    Read,
    #[strum(to_string = "write")]
    Write,
}

/// Per-operation probability of corrupting one byte of a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Builder)]
pub struct ErrorProbability {
    #[builder(default)]
    read: f64,
    #[builder(default)]
    write: f64,
}

impl ErrorProbability {
    /// Probability applied to `op`, clamped to `[0, 1]`.
    #[must_use]
    pub fn for_op(self, op: NoiseOp) -> f64 {
        let raw = match op {
            NoiseOp::Read => self.read,
            NoiseOp::Write => self.write,
        };
        if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
    }
}

/// One endpoint of a duplex byte link with optional transmission noise.
///
/// `write` appends to the outbound queue and `read`/`read_line` consume from
/// the inbound queue. When a peer exists the queues are shared with it, so
/// this endpoint's outbound queue is the peer's inbound queue.
pub struct NoisyChannel {
    inbound: SharedBuffer,
    outbound: SharedBuffer,
    error_probability: ErrorProbability,
    noise_source: Box<dyn RngCore>,
}

impl NoisyChannel {
    /// Creates an unconnected endpoint with its own pair of queues.
    #[must_use]
    pub fn new() -> Self {
        Self::from_buffers(SharedBuffer::default(), SharedBuffer::default())
    }

    fn from_buffers(inbound: SharedBuffer, outbound: SharedBuffer) -> Self {
        Self {
            inbound,
            outbound,
            error_probability: ErrorProbability::default(),
            noise_source: Box::new(rand::rng()),
        }
    }

    /// Creates the opposite endpoint, whose inbound queue is this endpoint's
    /// outbound queue and vice versa.
    #[must_use]
    pub fn peer(&self) -> Self {
        Self::from_buffers(Rc::clone(&self.outbound), Rc::clone(&self.inbound))
    }

    /// Sets the corruption probabilities for this endpoint.
    #[must_use]
    pub fn with_error_probability(mut self, error_probability: ErrorProbability) -> Self {
        self.error_probability = error_probability;
        self
    }

    /// Replaces the random source used for corruption.
    #[must_use]
    pub fn with_noise_source(mut self, noise_source: impl RngCore + 'static) -> Self {
        self.noise_source = Box::new(noise_source);
        self
    }

    /// Returns the configured corruption probabilities.
    #[must_use]
    pub fn error_probability(&self) -> ErrorProbability {
        self.error_probability
    }

    /// Sends bytes to the peer, possibly corrupted.
    pub fn write(&mut self, data: &[u8]) {
        let data = self.add_noise(data.to_vec(), NoiseOp::Write);
        self.outbound.borrow_mut().append(&data);
    }

    /// Reads up to `num_bytes` received bytes, possibly corrupted.
    pub fn read(&mut self, num_bytes: usize) -> Vec<u8> {
        let data = self.inbound.borrow_mut().read(num_bytes);
        self.add_noise(data, NoiseOp::Read)
    }

    /// Reads through the next `\n`, or everything buffered if none arrived.
    pub fn read_line(&mut self) -> Vec<u8> {
        let line = self.inbound.borrow_mut().read_line();
        self.add_noise(line, NoiseOp::Read)
    }

    /// Number of received bytes waiting to be read.
    #[must_use]
    pub fn bytes_available(&self) -> usize {
        self.inbound.borrow().len()
    }

    /// Returns `true` when a complete received line is waiting.
    #[must_use]
    pub fn has_line(&self) -> bool {
        self.inbound.borrow().has_line()
    }

    /// Clears both queues attached to this endpoint.
    pub fn reset(&mut self) {
        self.inbound.borrow_mut().clear();
        self.outbound.borrow_mut().clear();
    }

    pub(crate) fn inbound(&self) -> &SharedBuffer {
        &self.inbound
    }

    pub(crate) fn outbound(&self) -> &SharedBuffer {
        &self.outbound
    }

    fn add_noise(&mut self, mut data: Vec<u8>, op: NoiseOp) -> Vec<u8> {
        if data.is_empty() {
            return data;
        }
        let probability = self.error_probability.for_op(op);
        if probability == 0.0 || !self.noise_source.random_bool(probability) {
            return data;
        }

        let index = self.noise_source.random_range(0..data.len());
        // XOR with a non-zero mask so the replacement always differs.
        let mask = self.noise_source.random_range(1..=u8::MAX);
        data[index] ^= mask;
        info!(%op, num_bytes = data.len(), index, "data error");
        data
    }
}

impl Default for NoisyChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NoisyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoisyChannel")
            .field("inbound", &self.inbound.borrow().len())
            .field("outbound", &self.outbound.borrow().len())
            .field("error_probability", &self.error_probability)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_ne};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    use super::*;

    fn always(op: NoiseOp) -> ErrorProbability {
        match op {
            NoiseOp::Read => ErrorProbability::builder().read(1.0).build(),
            NoiseOp::Write => ErrorProbability::builder().write(1.0).build(),
        }
    }

    #[test]
    fn write_is_visible_on_peer_without_noise() {
        let mut sender = NoisyChannel::new();
        let mut receiver = sender.peer();

        sender.write(b"M115\n");

        assert_eq!(5, receiver.bytes_available());
        assert_eq!(b"M115\n".to_vec(), receiver.read(5));
        assert_eq!(0, sender.bytes_available());
    }

    #[test]
    fn peer_shares_queue_identity() {
        let channel = NoisyChannel::new();
        let peer = channel.peer();

        assert!(Rc::ptr_eq(channel.outbound(), peer.inbound()));
        assert!(Rc::ptr_eq(channel.inbound(), peer.outbound()));
        assert!(!Rc::ptr_eq(channel.inbound(), channel.outbound()));
    }

    #[rstest]
    #[case::seed_1(1)]
    #[case::seed_7(7)]
    #[case::seed_42(42)]
    fn certain_write_noise_always_changes_payload(#[case] seed: u64) {
        let mut sender = NoisyChannel::new()
            .with_error_probability(always(NoiseOp::Write))
            .with_noise_source(StdRng::seed_from_u64(seed));
        let mut receiver = sender.peer();
        let payload = b"Writing to file: abc.g\n";

        sender.write(payload);
        let received = receiver.read(payload.len());

        assert_eq!(payload.len(), received.len());
        assert_ne!(payload.to_vec(), received);
        let differing = payload
            .iter()
            .zip(&received)
            .filter(|(left, right)| left != right)
            .count();
        assert_eq!(1, differing);
    }

    #[test]
    fn certain_read_noise_corrupts_read_line() {
        let mut sender = NoisyChannel::new();
        let mut receiver = sender
            .peer()
            .with_error_probability(always(NoiseOp::Read))
            .with_noise_source(StdRng::seed_from_u64(3));

        sender.write(b"ok\n");

        assert_ne!(b"ok\n".to_vec(), receiver.read_line());
    }

    #[test]
    fn noise_is_deterministic_for_a_seed() {
        let corrupt = |seed| {
            let mut sender = NoisyChannel::new()
                .with_error_probability(always(NoiseOp::Write))
                .with_noise_source(StdRng::seed_from_u64(seed));
            let mut receiver = sender.peer();
            sender.write(b"G29\n");
            receiver.read(4)
        };

        assert_eq!(corrupt(11), corrupt(11));
    }

    #[test]
    fn empty_payload_is_never_corrupted() {
        let mut receiver = NoisyChannel::new()
            .with_error_probability(always(NoiseOp::Read))
            .with_noise_source(StdRng::seed_from_u64(5));

        assert_eq!(Vec::<u8>::new(), receiver.read(4));
        assert_eq!(Vec::<u8>::new(), receiver.read_line());
    }

    #[test]
    fn reset_clears_both_directions() {
        let mut channel = NoisyChannel::new();
        let mut peer = channel.peer();
        channel.write(b"M20\n");
        peer.write(b"ok\n");

        channel.reset();

        assert_eq!(0, channel.bytes_available());
        assert_eq!(0, peer.bytes_available());
    }

    #[rstest]
    #[case(-0.5, 0.0)]
    #[case(0.25, 0.25)]
    #[case(3.0, 1.0)]
    #[case(f64::NAN, 0.0)]
    fn error_probability_is_clamped(#[case] raw: f64, #[case] expected: f64) {
        let probability = ErrorProbability::builder().read(raw).build();
        assert_eq!(expected, probability.for_op(NoiseOp::Read));
        assert_eq!(0.0, probability.for_op(NoiseOp::Write));
    }
}
