//! A linear cursor over 5-bit words, with bit-exact re-packing across the
//! 5-bit/8-bit boundary matching bech32's `convertbits`.

use crate::error::InvoiceError;

/// A sequence of 5-bit words (each 0..=31) with a monotonic read/write cursor.
#[derive(Clone, Debug, Default)]
pub struct WordCursor {
    words: Vec<u8>,
    position: usize,
}

impl WordCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words(words: Vec<u8>) -> Self {
        Self { words, position: 0 }
    }

    pub fn into_words(self) -> Vec<u8> {
        self.words
    }

    pub fn words(&self) -> &[u8] {
        &self.words
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    pub fn words_remaining(&self) -> usize {
        self.words.len() - self.position
    }

    /// Appends `word_count` words holding `value`, most-significant 5 bits
    /// first. `word_count` must be greater than zero.
    pub fn write_uint_be(&mut self, value: u64, word_count: usize) {
        assert!(word_count > 0, "write_uint_be: word_count must be > 0");
        for shift in (0..word_count).rev() {
            let word = ((value >> (shift * 5)) & 0x1f) as u8;
            self.words.push(word);
        }
    }

    /// Re-packs 8-bit `buf` into 5-bit words and appends them. When `pad` is
    /// true the final word is zero-padded on the low bits if the bit length
    /// is not a multiple of 5; when false, a non-multiple-of-5 bit length is
    /// simply truncated (no partial trailing word is emitted), matching
    /// bech32's `convertbits` with `pad=false`.
    pub fn write_bytes(&mut self, buf: &[u8], pad: bool) {
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;
        for &byte in buf {
            acc = (acc << 8) | byte as u32;
            bits += 8;
            while bits >= 5 {
                bits -= 5;
                self.words.push(((acc >> bits) & 0x1f) as u8);
            }
        }
        if pad && bits > 0 {
            self.words.push(((acc << (5 - bits)) & 0x1f) as u8);
        }
    }

    /// Consumes `word_count` words and folds them MSB-first into an integer.
    pub fn read_uint_be(&mut self, word_count: usize) -> Result<u64, InvoiceError> {
        if self.words_remaining() < word_count {
            return Err(InvoiceError::TruncatedPayload(
                "read_uint_be past end of word stream".into(),
            ));
        }
        let mut value: u64 = 0;
        for _ in 0..word_count {
            value = (value << 5) | self.words[self.position] as u64;
            self.position += 1;
        }
        Ok(value)
    }

    /// Consumes `word_count` words and re-packs them into 8-bit bytes. When
    /// `pad` is false, a trailing partial byte fragment is discarded rather
    /// than emitted, since it encodes no information.
    pub fn read_bytes(&mut self, word_count: usize, pad: bool) -> Result<Vec<u8>, InvoiceError> {
        if self.words_remaining() < word_count {
            return Err(InvoiceError::TruncatedPayload(
                "read_bytes past end of word stream".into(),
            ));
        }
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;
        let mut out = Vec::with_capacity(word_count * 5 / 8);
        for _ in 0..word_count {
            let word = self.words[self.position] as u32;
            self.position += 1;
            acc = (acc << 5) | word;
            bits += 5;
            if bits >= 8 {
                bits -= 8;
                out.push(((acc >> bits) & 0xff) as u8);
            }
        }
        if pad && bits > 0 {
            out.push(((acc << (8 - bits)) & 0xff) as u8);
        }
        Ok(out)
    }
}
