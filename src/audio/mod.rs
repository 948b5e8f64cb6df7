//! The decoder adapter: the only place this crate touches container/codec
//! decoding, treated everywhere else as an external collaborator per §6.

pub mod decoder;

pub use decoder::{Decoder, SymphoniaDecoder};
