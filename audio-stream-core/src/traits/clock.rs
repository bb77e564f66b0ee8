/// Timing capability: blocking millisecond delay.
///
/// Validated at `init` for the benefit of application code that paces
/// polling loops; the engine itself never sleeps.
pub trait Clock: Send {
    fn delay_ms(&self, ms: u32);
}
