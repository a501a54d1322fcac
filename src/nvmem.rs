//! Byte addressable nonvolatile storage, such as a panel EEPROM.

/// Random access reads from a nonvolatile store.
pub trait NvmemStore {
    /// Error type
    type Error: core::fmt::Debug;

    /// Fills `buf` with the bytes starting at `offset`.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: NvmemStore + ?Sized> NvmemStore for &mut T {
    type Error = T::Error;

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::read(self, offset, buf)
    }
}

/// Error reading from a [`SliceStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub offset: u32,
    pub len: usize,
}

/// A store backed by an in-memory image.
#[derive(Debug, Clone, Copy)]
pub struct SliceStore<'a> {
    image: &'a [u8],
}

impl<'a> SliceStore<'a> {
    pub fn new(image: &'a [u8]) -> Self {
        Self { image }
    }
}

impl NvmemStore for SliceStore<'_> {
    type Error = OutOfRange;

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        let err = OutOfRange {
            offset,
            len: buf.len(),
        };
        let start = usize::try_from(offset).map_err(|_| err)?;
        let end = start.checked_add(buf.len()).ok_or(err)?;
        let src = self.image.get(start..end).ok_or(err)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}
