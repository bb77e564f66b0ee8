pub mod wav_session;
