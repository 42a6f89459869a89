use std::io;

/// Custom Result type for bintrack operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the bintrack library, encompassing all possible
/// error cases that can occur while opening and querying indexed track files.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Structural errors in the on-disk format
    #[error("Error processing file structure: {0}")]
    FormatError(#[from] FormatError),

    /// Errors inflating a compressed data block
    #[error("Error inflating data block at offset {offset}: {source}")]
    DecompressionError {
        /// File offset of the block that failed to inflate
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Standard I/O errors
    #[error("Error with IO: {0}")]
    IoError(#[from] io::Error),

    /// UTF-8 conversion errors
    #[error("Error with UTF8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

/// Errors specific to parsing and validating the binary file structure.
///
/// All of these are fatal for the current open or query; a file that trips
/// one cannot be read further. A chromosome name that is simply absent from
/// the dictionary is NOT an error and yields an empty query result instead.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The leading magic number matches neither supported kind in either
    /// byte order
    #[error("Unrecognized magic number: {0:#010x}")]
    UnknownMagic(u32),

    /// The header carries no chromosome tree offset, so no name to id
    /// mapping is possible
    #[error("Chromosome B+ tree offset is zero")]
    MissingChromTree,

    /// The chromosome B+ tree does not start with its expected magic
    #[error("Invalid chromosome tree magic: {0:#010x}")]
    ChromTreeMagic(u32),

    /// A wig data block declared an encoding type other than 1 (bedGraph),
    /// 2 (variable step) or 3 (fixed step)
    #[error("Unknown wig encoding type: {0}")]
    UnknownWigEncoding(u8),

    /// A read ran past the end of the decoded region
    #[error("Unexpected end of data: needed {needed} bytes at position {position}")]
    UnexpectedEof { position: usize, needed: usize },

    /// A NUL-terminated string ran to the end of the buffer without a NUL
    #[error("Unterminated string at position {0}")]
    UnterminatedString(usize),

    /// An absolute file offset points before the metadata region that
    /// contains the structure it belongs to
    #[error("Offset {0} points outside the metadata region")]
    BadOffset(u64),

    /// A leaf block descriptor points past the end of the fetched data
    #[error("Data block at offset {offset} ({size} bytes) exceeds the fetched range")]
    TruncatedBlock { offset: u64, size: u64 },
}
