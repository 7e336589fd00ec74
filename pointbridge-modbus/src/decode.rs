//! Decoding of raw coil and register data into point values.

use pointbridge_common::NativeType;

use crate::config::WordOrder;

/// Number of coils/discrete inputs to read for a value of `native_type`.
pub fn bits_needed(native_type: NativeType) -> u16 {
    native_type.bit_width()
}

/// Number of 16-bit registers to read for a value of `native_type`.
pub fn registers_needed(native_type: NativeType) -> u16 {
    native_type.bit_width().div_ceil(16)
}

/// Reinterpret the low `bit_width` bits of `raw` as `native_type`.
fn interpret(raw: u32, native_type: NativeType) -> f64 {
    match native_type {
        NativeType::Boolean => (raw & 1) as f64,
        NativeType::Byte => (raw as u8) as f64,
        NativeType::Int16 => (raw as u16 as i16) as f64,
        NativeType::UInt16 => (raw as u16) as f64,
        NativeType::Int32 => (raw as i32) as f64,
        NativeType::UInt32 => raw as f64,
        NativeType::Single => f32::from_bits(raw) as f64,
    }
}

/// Assemble consecutive bits, first bit least significant.
///
/// Returns `None` when fewer bits than the type needs were returned.
pub fn decode_bits(bits: &[bool], native_type: NativeType) -> Option<f64> {
    let width = usize::from(bits_needed(native_type));
    if bits.len() < width {
        return None;
    }

    let raw = bits[..width]
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &bit)| acc | (u32::from(bit) << i));

    Some(interpret(raw, native_type))
}

/// Decode register words.
///
/// `sub_address` selects the bit of the register for `Boolean` and the byte
/// (0 = high, 1 = low) for `Byte`. Returns `None` when fewer registers than
/// the type needs were returned.
pub fn decode_registers(
    words: &[u16],
    native_type: NativeType,
    sub_address: u32,
    word_order: WordOrder,
) -> Option<f64> {
    if words.len() < usize::from(registers_needed(native_type)) {
        return None;
    }

    let raw = match native_type {
        NativeType::Boolean => u32::from(words[0]).checked_shr(sub_address)? & 1,
        NativeType::Byte => match sub_address {
            0 => u32::from(words[0] >> 8),
            1 => u32::from(words[0] & 0x00ff),
            _ => return None,
        },
        NativeType::Int16 | NativeType::UInt16 => u32::from(words[0]),
        NativeType::Int32 | NativeType::UInt32 | NativeType::Single => {
            let (high, low) = match word_order {
                WordOrder::Big => (words[0], words[1]),
                WordOrder::Little => (words[1], words[0]),
            };
            (u32::from(high) << 16) | u32::from(low)
        }
    };

    Some(interpret(raw, native_type))
}
