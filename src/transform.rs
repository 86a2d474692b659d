//! Case conversion applied in place to a message buffer.

use crate::protocol::ConversionMode;

/// Convert the case of every ASCII letter in `message`.
///
/// Non-alphabetic and non-ASCII bytes are left as they are, so the length
/// never changes and nothing is allocated.
pub fn apply_case(message: &mut [u8], mode: ConversionMode) {
    match mode {
        ConversionMode::Upper => message.make_ascii_uppercase(),
        ConversionMode::Lower => message.make_ascii_lowercase(),
        ConversionMode::None => {}
    }
}
