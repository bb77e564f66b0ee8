use crate::models::config::BusConfig;
use crate::models::error::StreamError;
use crate::processing::double_buffer::DoubleBuffer;

/// Serial audio bus capability consumed by the streaming engine.
///
/// `transmit` and `receive` hand the shared double buffer to the bus for
/// continuous circular transfer. The bus then reports segment completions
/// out of band (host backends post them on a channel) until `stop`, which
/// must halt the transfer synchronously: once it returns, no further
/// completion may be delivered.
pub trait AudioBus: Send {
    /// Configure the bus. Called once per stream, after `set_rate`.
    fn init(&mut self, config: &BusConfig) -> Result<(), StreamError>;

    /// Release the bus configuration.
    fn deinit(&mut self) -> Result<(), StreamError>;

    /// Halt an in-progress transfer synchronously.
    fn stop(&mut self) -> Result<(), StreamError>;

    /// Suspend an in-progress transfer without losing position.
    fn pause(&mut self) -> Result<(), StreamError>;

    /// Continue a transfer suspended by `pause`.
    fn resume(&mut self) -> Result<(), StreamError>;

    /// Select the sample frequency in Hz.
    fn set_rate(&mut self, frequency: u32) -> Result<(), StreamError>;

    /// Begin continuous circular transmission from the buffer.
    fn transmit(&mut self, buffer: DoubleBuffer) -> Result<(), StreamError>;

    /// Begin continuous circular reception into the buffer.
    fn receive(&mut self, buffer: DoubleBuffer) -> Result<(), StreamError>;
}
