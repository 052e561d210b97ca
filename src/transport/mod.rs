mod buffer;
mod channel;
mod link;

pub use self::buffer::ByteBuffer;
pub use self::channel::{ErrorProbability, NoiseOp, NoisyChannel};
pub use self::link::LoopbackLink;

/// Byte-level serial port contract shared by raw endpoints and the
/// client-facing printer adapter.
///
/// Observations take `&mut self` because an adapter may advance the device
/// before answering.
pub trait SerialPort {
    /// Queues bytes for the device.
    fn write(&mut self, data: &[u8]);

    /// Reads up to `num_bytes` received bytes.
    fn read(&mut self, num_bytes: usize) -> Vec<u8>;

    /// Reads through the next `\n`, or everything received if none arrived.
    fn read_line(&mut self) -> Vec<u8>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> usize;

    /// Drops buffered bytes in both directions.
    fn reset(&mut self);
}

impl SerialPort for NoisyChannel {
    fn write(&mut self, data: &[u8]) {
        NoisyChannel::write(self, data);
    }

    fn read(&mut self, num_bytes: usize) -> Vec<u8> {
        NoisyChannel::read(self, num_bytes)
    }

    fn read_line(&mut self) -> Vec<u8> {
        NoisyChannel::read_line(self)
    }

    fn bytes_available(&mut self) -> usize {
        NoisyChannel::bytes_available(self)
    }

    fn reset(&mut self) {
        NoisyChannel::reset(self);
    }
}
