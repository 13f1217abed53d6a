//! Audiobook building: speech per passage, silence, FFmpeg assembly.

pub mod assembler;
pub mod chapters;
pub mod interleaved;
pub mod metadata;
pub mod synth;
