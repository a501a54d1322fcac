//! Display command sequences.
//!
//! A sequence is a flat byte buffer of `{ opcode, delay_ms, payload_len, payload.. }`
//! records, as found in the `panel-init-sequence` / `panel-exit-sequence`
//! properties and in the init/exit entries of a panel firmware image.

use alloc::vec::Vec;
use core::fmt;

/// Size of a command header on the wire.
pub const HEADER_LEN: usize = 3;

/// Header preceding every command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    /// Transport specific command / data type tag.
    pub opcode: u8,
    /// Delay in milliseconds after the command has been sent.
    pub delay_ms: u8,
    /// Number of payload bytes following the header.
    pub payload_len: u8,
}

impl CommandHeader {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            opcode: bytes[0],
            delay_ms: bytes[1],
            payload_len: bytes[2],
        }
    }
}

/// A single command borrowed from a [`CommandSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command<'a> {
    header: CommandHeader,
    payload: &'a [u8],
}

impl<'a> Command<'a> {
    pub fn header(&self) -> CommandHeader {
        self.header
    }

    pub fn opcode(&self) -> u8 {
        self.header.opcode
    }

    pub fn delay_ms(&self) -> u8 {
        self.header.delay_ms
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

/// Error returned when a command buffer is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// Fewer than [`HEADER_LEN`] bytes were left where a header was expected.
    TruncatedHeader { offset: usize, remaining: usize },
    /// A header declared more payload bytes than the buffer holds.
    PayloadOverrun {
        offset: usize,
        declared: u8,
        remaining: usize,
    },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedHeader { offset, remaining } => write!(
                f,
                "malformed sequence: {remaining} trailing byte(s) at offset {offset}"
            ),
            Self::PayloadOverrun {
                offset,
                declared,
                remaining,
            } => write!(
                f,
                "malformed sequence: command at offset {offset} declares {declared} payload bytes, {remaining} left"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    header: CommandHeader,
    offset: usize,
}

/// An immutable, parsed list of display commands.
///
/// The sequence owns a copy of the raw buffer; commands are stored as
/// (header, payload offset) pairs into it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSequence {
    data: Vec<u8>,
    entries: Vec<Entry>,
}

impl CommandSequence {
    /// A sequence without commands.
    pub const EMPTY: Self = Self {
        data: Vec::new(),
        entries: Vec::new(),
    };

    /// Parses a raw command buffer.
    ///
    /// The whole buffer must be consumed by complete commands, anything else
    /// is rejected. An empty buffer yields an empty sequence.
    pub fn parse(raw: &[u8]) -> Result<Self, SequenceError> {
        let count = Self::count(raw)?;

        let data = raw.to_vec();
        let mut entries = Vec::with_capacity(count);
        let mut pos = 0;
        for _ in 0..count {
            let header = CommandHeader::from_bytes(&data[pos..pos + HEADER_LEN]);
            pos += HEADER_LEN;
            entries.push(Entry {
                header,
                offset: pos,
            });
            pos += usize::from(header.payload_len);
        }

        Ok(Self { data, entries })
    }

    // validation pass, returns the number of commands in `raw`
    fn count(raw: &[u8]) -> Result<usize, SequenceError> {
        let mut pos = 0;
        let mut count = 0;

        while pos < raw.len() {
            let remaining = raw.len() - pos;
            if remaining < HEADER_LEN {
                return Err(SequenceError::TruncatedHeader {
                    offset: pos,
                    remaining,
                });
            }

            let header = CommandHeader::from_bytes(&raw[pos..]);
            let remaining = remaining - HEADER_LEN;
            if usize::from(header.payload_len) > remaining {
                return Err(SequenceError::PayloadOverrun {
                    offset: pos,
                    declared: header.payload_len,
                    remaining,
                });
            }

            pos += HEADER_LEN + usize::from(header.payload_len);
            count += 1;
        }

        Ok(count)
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the command at `index`.
    pub fn get(&self, index: usize) -> Option<Command<'_>> {
        self.entries.get(index).map(|entry| self.command(entry))
    }

    /// Iterates over the commands in wire order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Command<'_>> + '_ {
        self.entries.iter().map(|entry| self.command(entry))
    }

    /// The raw buffer the sequence was parsed from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn command(&self, entry: &Entry) -> Command<'_> {
        let end = entry.offset + usize::from(entry.header.payload_len);
        Command {
            header: entry.header,
            payload: &self.data[entry.offset..end],
        }
    }
}
