//! Mail addressing
//!
//! Decoding of administrator-supplied addresses and alias recipients into
//! their stored parts.

mod address;

pub use address::{decode_address, decode_target, AddressError, AddressParts};
