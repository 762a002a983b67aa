//! Header+payload framing (spec.md §6): every logical exchange is a
//! fixed-layout header followed by `length` payload bytes. Multi-byte
//! fields are little-endian, matching the choice already made for the
//! persistence layout in `columnstore_core::persistence`.

use std::io::{self, Read, Write};

use columnstore_core::error::StatusCode;

/// Wire representation of [`StatusCode`] — a plain `u32` tag, stable across
/// versions since it is the first thing read off every response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatusWire {
    OkDone = 0,
    OkWaitForResponse = 1,
    UnknownCommand = 2,
    ObjectNotFound = 3,
    IncorrectFormat = 4,
    QueryUnsupported = 5,
    ExecutionError = 6,
}

impl StatusWire {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OkDone => StatusWire::OkDone,
            StatusCode::OkWaitForResponse => StatusWire::OkWaitForResponse,
            StatusCode::UnknownCommand => StatusWire::UnknownCommand,
            StatusCode::ObjectNotFound => StatusWire::ObjectNotFound,
            StatusCode::IncorrectFormat => StatusWire::IncorrectFormat,
            StatusCode::QueryUnsupported => StatusWire::QueryUnsupported,
            StatusCode::ExecutionError => StatusWire::ExecutionError,
        }
    }

    fn from_u32(v: u32) -> io::Result<Self> {
        Ok(match v {
            0 => StatusWire::OkDone,
            1 => StatusWire::OkWaitForResponse,
            2 => StatusWire::UnknownCommand,
            3 => StatusWire::ObjectNotFound,
            4 => StatusWire::IncorrectFormat,
            5 => StatusWire::QueryUnsupported,
            6 => StatusWire::ExecutionError,
            other => return Err(io::Error::new(io::ErrorKind::InvalidData, format!("unknown status code {other}"))),
        })
    }
}

/// Fixed-layout exchange header. `length` is `u32::MAX` to signal the
/// print sub-protocol's end-of-stream sentinel (spec.md §6 describes this
/// as "length = -1"; frames are unsigned on the wire, so `u32::MAX` is the
/// bit-identical encoding of a little-endian `-1i32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub status: StatusWire,
    pub length: u32,
}

pub const PRINT_END_SENTINEL: u32 = u32::MAX;

impl Header {
    pub fn new(status: StatusWire, length: u32) -> Self {
        Header { status, length }
    }

    pub fn ok_done() -> Self {
        Header::new(StatusWire::OkDone, 0)
    }

    pub fn print_end() -> Self {
        Header::new(StatusWire::OkDone, PRINT_END_SENTINEL)
    }

    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&(self.status as u32).to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> io::Result<Self> {
        let mut status_buf = [0u8; 4];
        r.read_exact(&mut status_buf)?;
        let mut length_buf = [0u8; 4];
        r.read_exact(&mut length_buf)?;
        Ok(Header {
            status: StatusWire::from_u32(u32::from_le_bytes(status_buf))?,
            length: u32::from_le_bytes(length_buf),
        })
    }
}

pub fn write_message(w: &mut impl Write, status: StatusWire, payload: &[u8]) -> io::Result<()> {
    Header::new(status, payload.len() as u32).write_to(w)?;
    w.write_all(payload)?;
    w.flush()
}

pub fn read_payload(r: &mut impl Read, header: &Header) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; header.length as usize];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_bytes() {
        let mut buf = Vec::new();
        Header::new(StatusWire::ExecutionError, 42).write_to(&mut buf).unwrap();
        let mut cursor = &buf[..];
        let header = Header::read_from(&mut cursor).unwrap();
        assert_eq!(header, Header::new(StatusWire::ExecutionError, 42));
    }

    #[test]
    fn print_end_sentinel_is_u32_max() {
        assert_eq!(Header::print_end().length, u32::MAX);
    }

    #[test]
    fn message_round_trip_with_payload() {
        let mut buf = Vec::new();
        write_message(&mut buf, StatusWire::OkDone, b"hello").unwrap();
        let mut cursor = &buf[..];
        let header = Header::read_from(&mut cursor).unwrap();
        assert_eq!(header.length, 5);
        let payload = read_payload(&mut cursor, &header).unwrap();
        assert_eq!(payload, b"hello");
    }
}
