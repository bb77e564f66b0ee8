pub mod double_buffer;
pub mod wav_header;
