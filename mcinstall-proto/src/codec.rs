//! Length-prefixed property-list frame codec over any `Read`/`Write` stream.
//!
//! Each frame is: `[u32 big-endian length][plist payload]`.

use std::io::{self, Cursor, Read, Write};

use plist::Value;

/// Maximum accepted incoming frame payload (16 MiB).
pub const MAX_FRAME: u32 = 16 * 1024 * 1024;

/// Encodes `msg` as an XML property list frame and writes it to `w`.
pub fn encode<W: Write>(w: &mut W, msg: &Value) -> io::Result<()> {
    let mut payload = Vec::new();
    msg.to_writer_xml(&mut payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame exceeds u32::MAX"))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(&payload)?;
    w.flush()
}

/// Reads one frame from `r` and parses its payload.
///
/// XML and binary property lists are both accepted.
pub fn decode(r: &mut impl Read) -> io::Result<Value> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    let len = u32::from_be_bytes(buf);
    if len > MAX_FRAME {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "frame exceeds 16 MiB limit",
        ));
    }
    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload)?;
    Value::from_reader(Cursor::new(payload))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
