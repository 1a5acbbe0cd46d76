//! Streaming matcher: finds every offset in a region matching a fixed
//! needle, using a bounded sliding buffer so peak memory is independent of
//! the region's size and a match straddling any read boundary is still
//! found.

use std::io::Read;

#[derive(Debug, thiserror::Error)]
#[error("scan at {addr:#x}: {source}")]
pub struct ScanError {
    addr: u64,
    #[source]
    source: std::io::Error,
}

/// Scans `[0, len)` of `reader` (positioned at the region's start) for every
/// occurrence of `needle`, calling `on_match(region_start + offset)` for
/// each, in ascending order. `region_start` is only used to compute the
/// addresses passed to `on_match`; `reader` itself is relative.
///
/// `page_size` bounds the buffer at `page_size + needle.len() - 1` bytes,
/// regardless of `len`.
pub fn scan_region<R: Read>(
    reader: &mut R,
    region_start: u64,
    len: u64,
    needle: &[u8],
    page_size: usize,
    mut on_match: impl FnMut(u64),
) -> Result<(), ScanError> {
    if needle.is_empty() || len < needle.len() as u64 {
        return Ok(());
    }

    let capacity = page_size + needle.len() - 1;
    let mut buf = vec![0u8; capacity];
    let mut buf_off: usize = 0;
    let mut file_off: u64 = 0;

    while file_off < len {
        let to_read = std::cmp::min(
            std::cmp::min(len - file_off, (capacity - buf_off) as u64),
            page_size as u64,
        ) as usize;

        let n = reader
            .read(&mut buf[buf_off..buf_off + to_read])
            .map_err(|source| ScanError {
                addr: region_start + file_off,
                source,
            })?;
        if n == 0 {
            // short region: the kernel gave us less than the nominal
            // end, which is normal near unmapped boundaries.
            break;
        }
        let buf_base = file_off - buf_off as u64;
        buf_off += n;
        file_off += n as u64;

        let mut read_off = 0usize;
        while buf_off - read_off >= needle.len() {
            match find(&buf[read_off..buf_off], needle) {
                None => {
                    read_off = read_off.max(buf_off - needle.len() + 1);
                    break;
                }
                Some(i) => {
                    let absolute = read_off + i;
                    on_match(region_start + buf_base + absolute as u64);
                    read_off = absolute + 1;
                }
            }
        }

        buf.copy_within(read_off..buf_off, 0);
        buf_off -= read_off;
    }

    Ok(())
}

/// First occurrence of `needle` in `haystack`, or `None`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn matches(data: &[u8], needle: &[u8], page_size: usize) -> Vec<u64> {
        let mut cursor = Cursor::new(data.to_vec());
        let mut out = Vec::new();
        scan_region(&mut cursor, 0, data.len() as u64, needle, page_size, |addr| {
            out.push(addr)
        })
        .unwrap();
        out
    }

    #[test]
    fn finds_single_match() {
        let mut data = vec![0u8; 0x1000];
        data[0x234..0x238].copy_from_slice(&[0xcd, 0xab, 0x34, 0x12]);
        assert_eq!(matches(&data, &[0xcd, 0xab, 0x34, 0x12], 4096), vec![0x234]);
    }

    #[test]
    fn finds_overlapping_matches() {
        // needle ABAB occurring at offsets 0 and 2 in ABABAB
        let data = b"ABABAB";
        assert_eq!(matches(data, b"ABAB", 4096), vec![0, 2]);
    }

    #[test]
    fn repeated_u16_pattern() {
        let data = [0xaa, 0xbb, 0xaa, 0xbb, 0xaa, 0xbb];
        assert_eq!(matches(&data, &[0xaa, 0xbb], 4096), vec![0, 2, 4]);
    }

    #[test]
    fn straddles_every_page_boundary_offset() {
        let needle = [1, 2, 3, 4];
        for k in 1..needle.len() {
            let page = 16usize;
            let mut data = vec![0u8; page * 2];
            let pos = page - k;
            data[pos..pos + needle.len()].copy_from_slice(&needle);
            assert_eq!(
                matches(&data, &needle, page),
                vec![pos as u64],
                "needle at offset {} (page-{}) not found with page_size={}",
                pos,
                k,
                page
            );
        }
    }

    #[test]
    fn region_shorter_than_needle_yields_nothing() {
        assert_eq!(matches(&[1, 2], &[1, 2, 3, 4], 4096), Vec::<u64>::new());
    }

    #[test]
    fn empty_region_yields_nothing() {
        assert_eq!(matches(&[], &[1, 2], 4096), Vec::<u64>::new());
    }

    #[test]
    fn terminates_on_short_region() {
        struct Short {
            remaining: Vec<u8>,
        }
        impl Read for Short {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.remaining.is_empty() {
                    return Ok(0);
                }
                let n = buf.len().min(self.remaining.len());
                buf[..n].copy_from_slice(&self.remaining[..n]);
                self.remaining.drain(..n);
                Ok(n)
            }
        }
        let mut r = Short {
            remaining: vec![0u8; 10],
        };
        // nominal length far exceeds what the reader actually yields
        let mut out = Vec::new();
        scan_region(&mut r, 0, 1_000_000, &[0, 0], 4096, |addr| out.push(addr)).unwrap();
        // should terminate cleanly instead of looping forever
        assert!(!out.is_empty());
    }

    #[test]
    fn reads_never_request_more_than_page_size() {
        struct Tracking {
            data: Vec<u8>,
            pos: usize,
            page_size: usize,
        }
        impl Read for Tracking {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                assert!(
                    buf.len() <= self.page_size,
                    "scan_region requested {} bytes in one read, more than page_size {}",
                    buf.len(),
                    self.page_size
                );
                let n = buf.len().min(self.data.len() - self.pos);
                buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
                self.pos += n;
                Ok(n)
            }
        }

        let page_size = 16;
        let needle = [1u8, 2, 3, 4];
        let mut data = vec![0u8; page_size * 5];
        data[page_size * 2 + 3..page_size * 2 + 7].copy_from_slice(&needle);
        let mut reader = Tracking {
            data: data.clone(),
            pos: 0,
            page_size,
        };
        let mut out = Vec::new();
        scan_region(&mut reader, 0, data.len() as u64, &needle, page_size, |addr| {
            out.push(addr)
        })
        .unwrap();
        assert_eq!(out, vec![(page_size * 2 + 3) as u64]);
    }
}
