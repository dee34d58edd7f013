//! Intel HEX loader for the 4 KiB code ROM.
//!
//! Parses the classic colon-delimited ASCII record format in a single
//! forward pass, verifying the checksum of every record before it is
//! applied to the ROM image.

use std::fmt;
use std::io::{self, BufRead};

use crate::memory::ROM_SIZE;

const RECORD_TYPE_DATA: u8 = 0x00;
const RECORD_TYPE_EOF: u8 = 0x01;

/// Errors that can occur while loading an Intel HEX image.
#[derive(Debug)]
pub enum IntelHexError {
    /// Underlying I/O failure while reading the source.
    Io(io::Error),
    /// The input contained no data records at all.
    NoRecords,
    /// A record's line was shorter than its declared byte count required.
    Truncated { line: usize },
    /// A data record targets an address outside the 4 KiB ROM.
    AddressOutOfRange { line: usize, address: u32 },
    /// A record's checksum byte did not match the computed checksum.
    ChecksumMismatch {
        line: usize,
        expected: u8,
        found: u8,
    },
    /// A line did not start with `:` or contained non-hex-digit payload.
    Malformed { line: usize },
}

impl fmt::Display for IntelHexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntelHexError::Io(e) => write!(f, "I/O error reading HEX image: {e}"),
            IntelHexError::NoRecords => write!(f, "HEX image contained no records"),
            IntelHexError::Truncated { line } => {
                write!(f, "line {line}: record shorter than its byte count")
            }
            IntelHexError::AddressOutOfRange { line, address } => write!(
                f,
                "line {line}: address {address:#06x} is outside the 4 KiB ROM"
            ),
            IntelHexError::ChecksumMismatch {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: checksum mismatch (expected {expected:#04x}, found {found:#04x})"
            ),
            IntelHexError::Malformed { line } => write!(f, "line {line}: malformed HEX record"),
        }
    }
}

impl std::error::Error for IntelHexError {}

impl From<io::Error> for IntelHexError {
    fn from(e: io::Error) -> Self {
        IntelHexError::Io(e)
    }
}

fn hex_byte(s: &[u8], line: usize) -> Result<u8, IntelHexError> {
    let text = std::str::from_utf8(s).map_err(|_| IntelHexError::Malformed { line })?;
    u8::from_str_radix(text, 16).map_err(|_| IntelHexError::Malformed { line })
}

/// Load an Intel HEX image from `reader` into `rom`, returning the number
/// of data bytes written.
///
/// Only record types `00` (data) and `01` (end-of-file) are recognized;
/// extended segment/linear address records are not supported, matching
/// this emulator's flat 4 KiB code space.
pub fn load<R: BufRead>(reader: R, rom: &mut [u8; ROM_SIZE]) -> Result<usize, IntelHexError> {
    let mut bytes_loaded = 0usize;
    let mut saw_record = false;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let body = line
            .strip_prefix(':')
            .ok_or(IntelHexError::Malformed { line: line_no })?;
        let body = body.as_bytes();
        if body.len() < 10 {
            return Err(IntelHexError::Truncated { line: line_no });
        }

        let byte_count = hex_byte(&body[0..2], line_no)? as usize;
        let addr_hi = hex_byte(&body[2..4], line_no)?;
        let addr_lo = hex_byte(&body[4..6], line_no)?;
        let record_type = hex_byte(&body[6..8], line_no)?;
        let address = ((addr_hi as u32) << 8) | addr_lo as u32;

        let expected_len = 8 + byte_count * 2 + 2;
        if body.len() < expected_len {
            return Err(IntelHexError::Truncated { line: line_no });
        }

        let mut checksum = byte_count as u32 + addr_hi as u32 + addr_lo as u32 + record_type as u32;
        let mut data = Vec::with_capacity(byte_count);
        for i in 0..byte_count {
            let b = hex_byte(&body[8 + i * 2..8 + i * 2 + 2], line_no)?;
            checksum += b as u32;
            data.push(b);
        }
        let found_checksum = hex_byte(&body[8 + byte_count * 2..8 + byte_count * 2 + 2], line_no)?;
        let expected_checksum = (!(checksum as u8)).wrapping_add(1);
        if found_checksum != expected_checksum {
            return Err(IntelHexError::ChecksumMismatch {
                line: line_no,
                expected: expected_checksum,
                found: found_checksum,
            });
        }

        match record_type {
            RECORD_TYPE_DATA => {
                saw_record = true;
                let end = address as usize + byte_count;
                if end > ROM_SIZE {
                    return Err(IntelHexError::AddressOutOfRange {
                        line: line_no,
                        address,
                    });
                }
                rom[address as usize..end].copy_from_slice(&data);
                bytes_loaded += byte_count;
            }
            RECORD_TYPE_EOF => break,
            _ => {
                // Extended address / start address records: ignored, not
                // needed for a flat 4 KiB code space.
            }
        }
    }

    if !saw_record {
        return Err(IntelHexError::NoRecords);
    }

    Ok(bytes_loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rom() -> [u8; ROM_SIZE] {
        [0u8; ROM_SIZE]
    }

    #[test]
    fn loads_single_data_record() {
        // 3 bytes 0x01 0x02 0x03 at address 0x0000
        let image = ":03000000010203F7\r\n:00000001FF\r\n";
        let mut rom = rom();
        let n = load(Cursor::new(image), &mut rom).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&rom[0..3], &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn rejects_bad_checksum() {
        let image = ":03000000010203FF\r\n:00000001FF\r\n";
        let mut rom = rom();
        let err = load(Cursor::new(image), &mut rom).unwrap_err();
        assert!(matches!(err, IntelHexError::ChecksumMismatch { .. }));
    }

    #[test]
    fn rejects_out_of_range_address() {
        // address 0x0FFF with 2 bytes overruns the 4KiB ROM
        let image = ":020FFF00AABB8B\r\n:00000001FF\r\n";
        let mut rom = rom();
        let err = load(Cursor::new(image), &mut rom).unwrap_err();
        assert!(matches!(err, IntelHexError::AddressOutOfRange { .. }));
    }

    #[test]
    fn empty_input_is_no_records() {
        let mut rom = rom();
        let err = load(Cursor::new(""), &mut rom).unwrap_err();
        assert!(matches!(err, IntelHexError::NoRecords));
    }

    #[test]
    fn stops_at_eof_record() {
        let image = ":00000001FF\r\n:03000000010203F1\r\n";
        let mut rom = rom();
        let n = load(Cursor::new(image), &mut rom).unwrap();
        assert_eq!(n, 0);
        assert_eq!(&rom[0..3], &[0, 0, 0]);
    }
}
