use nom::{
    bytes::complete::{tag, take_while, take_while1},
    combinator::{all_consuming, map, opt},
    multi::many0,
    sequence::{preceded, separated_pair, terminated, tuple},
    IResult,
};

use enumflags2::{bitflags, BitFlags};

/// returns true if a character is a hexadecimal digit
fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// parses 0 or more spaces and tabs
fn whitespace(i: &str) -> IResult<&str, &str> {
    take_while(|c| " \t".contains(c))(i)
}

/// execute and return the child parser's result, ignoring leading and
/// trailing spaces and tabs
fn spaced<'a, O>(
    f: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    preceded(whitespace, terminated(f, whitespace))
}

/// parses a lower-case hexadecimal address
fn hex_addr(i: &str) -> IResult<&str, u64> {
    // `take_while1` requires at least one character
    let (i, num) = take_while1(is_hex_digit)(i)?;
    // the kernel only ever emits well-formed hex here
    let u = u64::from_str_radix(num, 16).expect("our hex parser is wrong");
    Ok((i, u))
}

/// parses an address range in the form 0000-ffff
fn hex_addr_range(i: &str) -> IResult<&str, (u64, u64)> {
    separated_pair(hex_addr, tag("-"), hex_addr)(i)
}

/// a single access bit on a memory mapping, as seen in the `rwxp` flags
/// column of `/proc/<pid>/maps`
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Read,
    Write,
    Execute,
    Shared,
}

/// parses mapping permissions as seen in `/proc/:pid/maps`, e.g. `rw-p`
fn flags(i: &str) -> IResult<&str, BitFlags<Flag>> {
    /// parses a single permission bit. for example, the readable
    /// bit can be either "r" or "-".
    fn bit(c: char, flag: Flag) -> impl Fn(&str) -> IResult<&str, Option<Flag>> {
        move |i: &str| -> IResult<&str, Option<Flag>> {
            let (i, ch) = nom::character::complete::anychar(i)?;
            Ok((i, if ch == c { Some(flag) } else { None }))
        }
    }
    let (i, (r, w, x, p)) = tuple((
        bit('r', Flag::Read),
        bit('w', Flag::Write),
        bit('x', Flag::Execute),
        bit('s', Flag::Shared),
    ))(i)?;
    Ok((i, [r, w, x, p].into_iter().flatten().collect()))
}

/// parses a decimal number as a u64
fn dec_number(i: &str) -> IResult<&str, u64> {
    let (i, s) = take_while1(|c: char| c.is_ascii_digit())(i)?;
    // FIXME: reckless use of expect
    let num: u64 = s.parse().expect("our decimal parser is wrong");
    Ok((i, num))
}

/// parses a hexadecimal number as a u64
fn hex_number(i: &str) -> IResult<&str, u64> {
    let (i, s) = take_while1(is_hex_digit)(i)?;
    // FIXME: reckless use of expect
    let num = u64::from_str_radix(s, 16).expect("our hexadecimal parser is wrong");
    Ok((i, num))
}

/// parses a Linux device number in form major:minor; we don't need the
/// value, only to consume it
fn dev(i: &str) -> IResult<&str, ()> {
    map(separated_pair(hex_number, tag(":"), hex_number), |_| ())(i)
}

fn path(i: &str) -> IResult<&str, String> {
    fn is_path_character(c: char) -> bool {
        !c.is_whitespace()
    }
    map(take_while(is_path_character), str::to_string)(i)
}

/// A contiguous range of a process's virtual address space with uniform
/// access permissions. `start < end`, `end` exclusive, both page-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: u64,
    pub end: u64,
    pub flags: BitFlags<Flag>,
    pub path: String,
}

impl Region {
    pub fn is_writable(&self) -> bool {
        self.flags.contains(Flag::Write)
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

fn region(i: &str) -> IResult<&str, Region> {
    let (i, ((start, end), flags, _offset, _dev, _inode, path)) = tuple((
        spaced(hex_addr_range),
        spaced(flags),
        spaced(hex_addr),
        spaced(dev),
        spaced(dec_number),
        spaced(path),
    ))(i)?;
    Ok((
        i,
        Region {
            start,
            end,
            flags,
            path,
        },
    ))
}

fn regions(i: &str) -> IResult<&str, Vec<Region>> {
    all_consuming(many0(terminated(region, opt(tag("\n")))))(i)
}

#[derive(Debug, thiserror::Error)]
#[error("could not parse /proc/<pid>/maps")]
pub struct EnumError;

/// Parses the full contents of a `/proc/<pid>/maps`-format stream into an
/// ordered, non-overlapping list of regions. The kernel already emits
/// regions in ascending `start` order; this function does not re-sort.
pub fn parse(maps: &str) -> Result<Vec<Region>, EnumError> {
    match regions(maps) {
        Ok((_, regions)) => Ok(regions),
        Err(_) => Err(EnumError),
    }
}
