//! IQ sample codec
//!
//! 24-bit receive samples to normalized floats, and normalized transmit
//! samples to 16-bit outbound frames.

pub mod decoder;
pub mod encoder;

pub use decoder::{decode_sample24, RowDecoder};
pub use encoder::{encode_sample16, encode_tx_frame, EncodedFrame};
