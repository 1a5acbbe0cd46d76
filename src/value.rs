//! Value encoder: turns a `<type> <value>` CLI pair into a little-endian
//! byte pattern (the needle for `search`/`filter`, the payload for `write`).

use std::fmt;
use std::str::FromStr;

use crate::numeric::{parse_c_signed, parse_c_unsigned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid type {0:?}: expected one of i8/i16/i32/i64/u8/u16/u32/u64")]
pub struct TypeError(String);

/// The `<type>` CLI argument: `{i,u}{8,16,32,64}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    pub signedness: Signedness,
    pub width_bits: u8,
}

impl ValueType {
    pub fn width_bytes(&self) -> usize {
        self.width_bits as usize / 8
    }
}

impl FromStr for ValueType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let signedness = match chars.next() {
            Some('i') => Signedness::Signed,
            Some('u') => Signedness::Unsigned,
            _ => return Err(TypeError(s.to_string())),
        };
        let width_bits: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| TypeError(s.to_string()))?;
        if !matches!(width_bits, 8 | 16 | 32 | 64) {
            return Err(TypeError(s.to_string()));
        }
        Ok(Self {
            signedness,
            width_bits,
        })
    }
}

/// An immutable little-endian byte pattern, 1/2/4/8 bytes wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Needle(Vec<u8>);

impl Needle {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Needle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for b in self.0.iter().rev() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value {0:?} for type {1:?}")]
pub struct ValueError(String, ValueType);

/// Parses `text` per `ty`'s signedness (C-style decimal/hex/octal) and
/// encodes the low `ty.width_bytes()` bytes in little-endian order.
/// Overflow/range validation is intentionally not performed: the high bytes
/// of the 64-bit intermediate are simply discarded.
pub fn encode(ty: ValueType, text: &str) -> Result<Needle, ValueError> {
    let raw: u64 = match ty.signedness {
        Signedness::Signed => {
            parse_c_signed(text).ok_or_else(|| ValueError(text.to_string(), ty))? as u64
        }
        Signedness::Unsigned => {
            parse_c_unsigned(text).ok_or_else(|| ValueError(text.to_string(), ty))?
        }
    };
    let bytes = raw.to_le_bytes();
    Ok(Needle(bytes[..ty.width_bytes()].to_vec()))
}
