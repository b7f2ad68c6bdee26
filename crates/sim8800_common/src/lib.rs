pub mod lights;
pub mod panel;

pub use lights::{DebugText, Lights};
pub use panel::{DebugSink, IndicatorSink, SwitchInput};

/// Number of address lights (A0–A15) on the front panel.
pub const ADDRESS_BITS: usize = 16;
/// Number of data lights (D0–D7) on the front panel.
pub const DATA_BITS: usize = 8;

/// Split `value` into `N` bits, least significant bit first.
///
/// Bits above position 15 are always off.
pub fn to_bits<const N: usize>(value: u16) -> [bool; N] {
    let mut bits = [false; N];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = i < 16 && (value >> i) & 1 != 0;
    }
    bits
}

/// Inverse of [`to_bits`]: rebuild a word from bits stored LSB first.
pub fn from_bits(bits: &[bool]) -> u16 {
    bits.iter()
        .take(16)
        .enumerate()
        .fold(0u16, |acc, (i, &on)| if on { acc | (1 << i) } else { acc })
}
