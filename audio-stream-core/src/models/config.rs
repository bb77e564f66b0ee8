/// Frame standard on the serial audio bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusStandard {
    Philips,
    MsbJustified,
    LsbJustified,
    PcmShort,
    PcmLong,
}

/// Transfer direction and clock ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusMode {
    MasterTransmit,
    MasterReceive,
    SlaveTransmit,
    SlaveReceive,
}

/// Idle level of the bus clock line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolarity {
    Low,
    High,
}

/// Sample word layout within a bus frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit data on a 16-bit frame.
    B16,
    /// 16-bit data on a 32-bit frame.
    B16Extended,
    B24,
    B32,
}

impl SampleFormat {
    /// Bytes one sample occupies on the wire.
    pub fn sample_bytes(&self) -> u32 {
        match self {
            Self::B16 | Self::B16Extended => 2,
            Self::B24 | Self::B32 => 4,
        }
    }
}

/// Configuration for the serial audio bus.
///
/// Forwarded verbatim to the transport by `WavSession::configure`; the
/// engine itself interprets none of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Frame standard (default: Philips).
    pub standard: BusStandard,

    /// Direction and clock role (default: master transmit).
    pub mode: BusMode,

    /// Idle clock polarity (default: low).
    pub polarity: ClockPolarity,

    /// Sample word layout (default: 16-bit data on a 32-bit frame).
    pub format: SampleFormat,

    /// Whether the master clock output pin is driven (default: true).
    pub mclk_output: bool,

    /// Sample frequency in Hz (default: 44100).
    pub frequency: u32,
}

impl BusConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.frequency == 0 {
            return Err("frequency must be positive".into());
        }
        Ok(())
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            standard: BusStandard::Philips,
            mode: BusMode::MasterTransmit,
            polarity: ClockPolarity::Low,
            format: SampleFormat::B16Extended,
            mclk_output: true,
            frequency: 44100,
        }
    }
}
