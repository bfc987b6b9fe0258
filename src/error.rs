use std::fmt;
use std::io;

/// Errors raised while building, packing, reading or writing a dictionary.
#[derive(Debug)]
pub enum DawgError {
    /// Underlying I/O failure.
    Io(io::Error),
    /// A persisted stream is truncated or otherwise malformed.
    InvalidFormat(&'static str),
    /// A key was inserted out of lexicographic order.
    ///
    /// Contains the previously inserted key and the rejected one.
    Order { previous: Vec<u8>, key: Vec<u8> },
    /// The same key was inserted twice.
    Duplicate(Vec<u8>),
    /// A key contains the byte 0, which is reserved for the end-of-key label.
    NulByte(Vec<u8>),
    /// A value does not fit into 31 bits.
    ValueOutOfRange(u32),
    /// No offset could be encoded for the state at this double-array index.
    OffsetOverflow { index: u32 },
    /// A guide does not have the same number of units as its double array.
    GuideMismatch { units: usize, guide_units: usize },
}

pub type Result<T> = std::result::Result<T, DawgError>;

impl fmt::Display for DawgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DawgError::Io(e) => write!(f, "io error: {}", e),
            DawgError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            DawgError::Order { previous, key } => write!(
                f,
                "key {:?} must not come after {:?}",
                String::from_utf8_lossy(key),
                String::from_utf8_lossy(previous)
            ),
            DawgError::Duplicate(key) => {
                write!(f, "duplicate key {:?}", String::from_utf8_lossy(key))
            }
            DawgError::NulByte(key) => {
                write!(f, "key {:?} contains a zero byte", String::from_utf8_lossy(key))
            }
            DawgError::ValueOutOfRange(v) => {
                write!(f, "value {} exceeds the 31-bit value range", v)
            }
            DawgError::OffsetOverflow { index } => {
                write!(f, "no encodable offset for unit {}", index)
            }
            DawgError::GuideMismatch { units, guide_units } => write!(
                f,
                "guide has {} units but the dictionary has {}",
                guide_units, units
            ),
        }
    }
}

impl std::error::Error for DawgError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DawgError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DawgError {
    fn from(e: io::Error) -> Self {
        // A short read while decoding a block means the stream was cut off.
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DawgError::InvalidFormat("unexpected end of stream")
        } else {
            DawgError::Io(e)
        }
    }
}
