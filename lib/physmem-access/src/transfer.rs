use physmem_addresses::{CACHE_LINE_SIZE, PageOffset};
use physmem_map::{PageWindow, WindowError};

/// Staging buffer for bulk transfers, one cache line of native words.
///
/// Large copies into device memory are split into chunks of at most
/// [`TransferBuffer::CAPACITY`] words; the final chunk may be partial.
#[derive(Debug, Clone)]
pub struct TransferBuffer {
    words: [usize; Self::CAPACITY],
    len: usize,
}

impl TransferBuffer {
    pub const CAPACITY: usize = CACHE_LINE_SIZE / size_of::<usize>();

    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; Self::CAPACITY],
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.words[..self.len]
    }

    /// Bytes currently staged.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.len * size_of::<usize>()
    }

    /// Replace the contents with the next words of `words`, at most one buffer full.
    ///
    /// Returns how many words were staged; `0` once `words` is exhausted.
    pub fn stage(&mut self, words: &mut impl Iterator<Item = usize>) -> usize {
        self.len = 0;
        for (slot, word) in self.words.iter_mut().zip(words) {
            *slot = word;
            self.len += 1;
        }
        self.len
    }

    /// Copy the staged words to `offset` in one transfer and empty the buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// The destination does not fit into the page.
    pub fn flush_to(&mut self, window: &mut PageWindow<'_>, offset: PageOffset) -> Result<usize, WindowError> {
        let bytes = self.byte_len();
        window.write_from(offset, self.as_slice())?;
        self.len = 0;
        Ok(bytes)
    }

    /// Replace the contents with up to `count` words read from `offset` in one transfer.
    ///
    /// # Errors
    /// The source does not fit into the page.
    pub fn load_from(
        &mut self,
        window: &PageWindow<'_>,
        offset: PageOffset,
        count: usize,
    ) -> Result<&[usize], WindowError> {
        let count = count.min(Self::CAPACITY);
        window.read_into(offset, &mut self.words[..count])?;
        self.len = count;
        Ok(self.as_slice())
    }
}

impl Default for TransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}
