//! `strtoul`/`strtoll`-style textual integer parsing: decimal, `0x`/`0X` hex,
//! and `0`-prefixed octal, with an optional leading sign. Shared by the
//! value encoder (CLI `<value>`) and the candidate-address lines read from
//! stdin by `filter`/`write`.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::one_of,
    combinator::{map_res, opt, recognize},
    sequence::{pair, preceded},
    IResult,
};

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn is_oct_digit(c: char) -> bool {
    ('0'..='7').contains(&c)
}

fn is_dec_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn unsigned_magnitude(i: &str) -> IResult<&str, u64> {
    alt((
        map_res(
            preceded(alt((tag("0x"), tag("0X"))), take_while1(is_hex_digit)),
            |s| u64::from_str_radix(s, 16),
        ),
        map_res(
            preceded(tag("0"), take_while1(is_oct_digit)),
            |s| u64::from_str_radix(s, 8),
        ),
        map_res(take_while1(is_dec_digit), |s: &str| s.parse::<u64>()),
    ))(i)
}

fn signed_magnitude(i: &str) -> IResult<&str, (Option<char>, u64)> {
    pair(opt(one_of("+-")), unsigned_magnitude)(i)
}

/// Parses an unsigned C-style integer literal. Returns `None` on any
/// malformed input (empty string, trailing garbage, out-of-range digits).
pub fn parse_c_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    match recognize(unsigned_magnitude)(text) {
        Ok(("", _)) => unsigned_magnitude(text).ok().map(|(_, v)| v),
        _ => None,
    }
}

/// Parses a signed C-style integer literal, magnitude identical to
/// [`parse_c_unsigned`], with an optional leading `+`/`-`.
pub fn parse_c_signed(text: &str) -> Option<i64> {
    let text = text.trim();
    let (rest, (sign, magnitude)) = signed_magnitude(text).ok()?;
    if !rest.is_empty() {
        return None;
    }
    let magnitude = i64::try_from(magnitude).ok()?;
    Some(if sign == Some('-') { -magnitude } else { magnitude })
}
