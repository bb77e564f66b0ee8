//! PCM sources feeding the loopback bus receive path.

use std::f32::consts::TAU;

/// Generator of interleaved 16-bit little-endian stereo PCM.
pub trait PcmSource: Send {
    /// Fill `frame` with the next samples.
    fn fill(&mut self, frame: &mut [u8]);
}

/// Silence.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl PcmSource for Silence {
    fn fill(&mut self, frame: &mut [u8]) {
        frame.fill(0);
    }
}

/// Fixed-frequency sine tone, same signal on both channels.
#[derive(Debug, Clone)]
pub struct SineSource {
    phase: f32,
    step: f32,
    amplitude: f32,
}

impl SineSource {
    /// A tone of `frequency` Hz at `sample_rate`, at half full scale.
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate as f32,
            amplitude: 0.5,
        }
    }
}

impl PcmSource for SineSource {
    fn fill(&mut self, frame: &mut [u8]) {
        let mut frames = frame.chunks_exact_mut(4);
        for chunk in &mut frames {
            let sample = (self.phase.sin() * self.amplitude * i16::MAX as f32) as i16;
            let bytes = sample.to_le_bytes();
            chunk[0..2].copy_from_slice(&bytes);
            chunk[2..4].copy_from_slice(&bytes);
            self.phase += self.step;
            if self.phase > TAU {
                self.phase -= TAU;
            }
        }
        frames.into_remainder().fill(0);
    }
}
