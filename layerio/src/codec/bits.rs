//! Bit-level access over byte streams
//!
//! Bits are packed most-significant first within each byte. A cursor holds at
//! most 7 leftover bits between calls; bit counts run from 0 to [`MAX_BITS`].

use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;

/// Largest bit count accepted by `read_bits` and `write_bits`
pub const MAX_BITS: i32 = 31;

fn check_nbits(nbits: i32, value: i64) -> Result<u32> {
    u32::try_from(nbits)
        .ok()
        .filter(|&n| n <= MAX_BITS.unsigned_abs())
        .ok_or_else(|| StreamError::bit_range(nbits, value))
}

fn low_bits(n: u32) -> u64 {
    (1u64 << n) - 1
}

/// Reading cursor
pub struct BitReader<A = ()> {
    input: Input<A>,
    acc: u64,
    nacc: u32,
}

impl<A: Clone + Send + 'static> BitReader<A> {
    #[must_use]
    pub fn new(input: Input<A>) -> Self {
        Self {
            input,
            acc: 0,
            nacc: 0,
        }
    }

    /// Read the next `nbits` bits as an unsigned number
    ///
    /// # Errors
    /// `BitRange` for `nbits` outside `0..=31`, `NoMoreInput` if the stream
    /// ends first. Bytes read before the failure stay buffered and are
    /// returned by the next call.
    pub fn read_bits(&mut self, nbits: i32) -> Result<u32> {
        let n = check_nbits(nbits, 0)?;
        while self.nacc < n {
            let byte = self.input.read_byte()?;
            self.acc = (self.acc << 8) | u64::from(byte);
            self.nacc += 8;
        }
        self.nacc -= n;
        let value = (self.acc >> self.nacc) & low_bits(n);
        self.acc &= low_bits(self.nacc);
        u32::try_from(value).map_err(|_| StreamError::Overflow)
    }

    /// Discard buffered bits up to the next byte boundary, returning how many
    /// were dropped
    pub fn drop_bits(&mut self) -> u32 {
        let dropped = self.nacc;
        self.acc = 0;
        self.nacc = 0;
        dropped
    }

    /// Bits read from the stream but not yet returned
    #[must_use]
    pub fn buffered_bits(&self) -> u32 {
        self.nacc
    }

    /// Give the stream back; buffered bits are dropped
    #[must_use]
    pub fn into_inner(self) -> Input<A> {
        self.input
    }
}

/// Writing cursor
pub struct BitWriter<A = ()> {
    output: Output<A>,
    acc: u64,
    nacc: u32,
}

impl<A: Clone + Send + 'static> BitWriter<A> {
    #[must_use]
    pub fn new(output: Output<A>) -> Self {
        Self {
            output,
            acc: 0,
            nacc: 0,
        }
    }

    /// Append the low `nbits` bits of `value`; full bytes go to the stream
    ///
    /// # Errors
    /// `BitRange` for `nbits` outside `0..=31` or a `value` outside
    /// `0..2^nbits`; any write failure.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn write_bits(&mut self, value: i64, nbits: i32) -> Result<()> {
        let n = check_nbits(nbits, value)?;
        if value < 0 || value as u64 > low_bits(n) {
            return Err(StreamError::bit_range(nbits, value));
        }
        self.acc = (self.acc << n) | value as u64;
        self.nacc += n;
        while self.nacc >= 8 {
            self.nacc -= 8;
            let byte = (self.acc >> self.nacc) as u8;
            self.acc &= low_bits(self.nacc);
            self.output.write_byte(byte)?;
        }
        Ok(())
    }

    /// Write the partial byte, if any, padded with zero bits
    ///
    /// # Errors
    /// Any write failure.
    #[allow(clippy::cast_possible_truncation)]
    pub fn flush_bits(&mut self) -> Result<()> {
        if self.nacc == 0 {
            return Ok(());
        }
        let byte = (self.acc << (8 - self.nacc)) as u8;
        self.acc = 0;
        self.nacc = 0;
        self.output.write_byte(byte)
    }

    #[must_use]
    pub fn buffered_bits(&self) -> u32 {
        self.nacc
    }

    /// Flush the partial byte and give the stream back
    ///
    /// # Errors
    /// Any write failure.
    pub fn into_inner(mut self) -> Result<Output<A>> {
        self.flush_bits()?;
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, output_buffer};

    #[test]
    fn test_msb_first_packing() {
        let out = output_buffer();
        let mut writer = BitWriter::new(out.clone());
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b1, 1).unwrap();
        writer.write_bits(0b0011, 4).unwrap();
        writer.write_bits(0b11, 2).unwrap();
        assert_eq!(writer.buffered_bits(), 2);
        writer.flush_bits().unwrap();
        assert_eq!(out.close().unwrap(), [0b1011_0011, 0b1100_0000]);
    }

    #[test]
    fn test_reader_splits_bytes() {
        let input = input_bytes(vec![0b1011_0011, 0b1100_0000]);
        let mut reader = BitReader::new(input);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(7).unwrap(), 0b1_0011_11);
        assert_eq!(reader.drop_bits(), 6);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_bit_counts_out_of_range() {
        let mut reader = BitReader::new(input_bytes(vec![0; 8]));
        assert!(matches!(reader.read_bits(32), Err(StreamError::BitRange { nbits: 32, .. })));
        assert!(matches!(reader.read_bits(-1), Err(StreamError::BitRange { nbits: -1, .. })));
        assert_eq!(reader.read_bits(0).unwrap(), 0);

        let mut writer = BitWriter::new(output_buffer());
        assert!(matches!(writer.write_bits(0, 32), Err(StreamError::BitRange { .. })));
        assert!(matches!(writer.write_bits(8, 3), Err(StreamError::BitRange { value: 8, .. })));
        assert!(matches!(writer.write_bits(-1, 3), Err(StreamError::BitRange { .. })));
    }

    #[test]
    fn test_thirty_one_bits() {
        let out = output_buffer();
        let mut writer = BitWriter::new(out.clone());
        writer.write_bits(0x7FFF_FFFF, 31).unwrap();
        writer.into_inner().unwrap();
        let mut reader = BitReader::new(input_bytes(out.close().unwrap()));
        assert_eq!(reader.read_bits(31).unwrap(), 0x7FFF_FFFF);
        assert_eq!(reader.buffered_bits(), 1);
    }
}
