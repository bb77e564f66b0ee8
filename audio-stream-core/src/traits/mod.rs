pub mod audio_bus;
pub mod clock;
pub mod diagnostics;
pub mod storage;
