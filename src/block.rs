//! Length-prefixed unit blocks.
//!
//! Every persisted structure is written as `[u32 count][count units]`, all
//! little-endian with no padding. Blocks can be concatenated; a reader has to
//! know which blocks to expect.

use std::io::{Read, Write};

use crate::error::{DawgError, Result};

/// Buffer size used for writers.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Fixed-width unit stored in a block.
pub(crate) trait BlockUnit: Copy {
    const SIZE: usize;

    fn decode(bytes: &[u8]) -> Self;

    fn encode<W: Write>(self, writer: &mut W) -> std::io::Result<()>;
}

impl BlockUnit for u32 {
    const SIZE: usize = 4;

    fn decode(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn encode<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

/// Bytes taken by a block of `len` units, header included.
pub(crate) fn block_size<U: BlockUnit>(len: usize) -> usize {
    4 + len * U::SIZE
}

pub(crate) fn write_block<W: Write, U: BlockUnit>(writer: &mut W, units: &[U]) -> Result<()> {
    let count = u32::try_from(units.len())
        .map_err(|_| DawgError::InvalidFormat("too many units for one block"))?;
    writer.write_all(&count.to_le_bytes())?;
    for &unit in units {
        unit.encode(writer)?;
    }
    Ok(())
}

pub(crate) fn read_block<R: Read, U: BlockUnit>(reader: &mut R) -> Result<Vec<U>> {
    let mut count_bytes = [0u8; 4];
    reader.read_exact(&mut count_bytes)?;
    let count = u32::from_le_bytes(count_bytes) as usize;

    // Reads in bounded chunks so a corrupt count cannot force a huge allocation.
    let mut units = Vec::new();
    let mut buf = vec![0u8; U::SIZE * 4096];
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(4096);
        let bytes = &mut buf[..n * U::SIZE];
        reader.read_exact(bytes)?;
        units.extend(bytes.chunks_exact(U::SIZE).map(U::decode));
        remaining -= n;
    }
    Ok(units)
}

/// Parses one block from the front of `bytes` and returns the rest.
pub(crate) fn parse_block<U: BlockUnit>(bytes: &[u8]) -> Result<(Vec<U>, &[u8])> {
    if bytes.len() < 4 {
        return Err(DawgError::InvalidFormat("block header truncated"));
    }
    let count = u32::decode(&bytes[..4]) as usize;
    let end = count
        .checked_mul(U::SIZE)
        .and_then(|n| n.checked_add(4))
        .ok_or(DawgError::InvalidFormat("block size overflow"))?;
    if end > bytes.len() {
        return Err(DawgError::InvalidFormat("block truncated"));
    }
    let units = bytes[4..end].chunks_exact(U::SIZE).map(U::decode).collect();
    Ok((units, &bytes[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_parse_agree() {
        let units: Vec<u32> = vec![1, 0xdead_beef, 0, u32::MAX];
        let mut buf = Vec::new();
        write_block(&mut buf, &units).unwrap();
        assert_eq!(buf.len(), block_size::<u32>(units.len()));

        let read: Vec<u32> = read_block(&mut buf.as_slice()).unwrap();
        assert_eq!(read, units);

        buf.extend_from_slice(b"tail");
        let (parsed, rest) = parse_block::<u32>(&buf).unwrap();
        assert_eq!(parsed, units);
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn truncated_blocks_fail() {
        let mut buf = Vec::new();
        write_block(&mut buf, &[7u32, 8, 9]).unwrap();
        buf.pop();
        assert!(matches!(
            read_block::<_, u32>(&mut buf.as_slice()),
            Err(DawgError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_block::<u32>(&buf),
            Err(DawgError::InvalidFormat(_))
        ));
        assert!(parse_block::<u32>(&buf[..2]).is_err());
    }

    #[test]
    fn huge_count_does_not_allocate_up_front() {
        let buf = u32::MAX.to_le_bytes();
        assert!(read_block::<_, u32>(&mut &buf[..]).is_err());
        assert!(parse_block::<u32>(&buf).is_err());
    }
}
