//! Fixed-width numbers, generic over byte order
//!
//! The endianness modules [`le`](super::le) and [`be`](super::be) fix `O`;
//! these functions are the shared bodies.

use byteorder::ByteOrder;

use crate::error::{Result, StreamError};
use crate::input::Input;
use crate::output::Output;

/// Target of [`write_int_checked`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    U8,
    I8,
    U16,
    I16,
    I32,
}

impl IntWidth {
    fn range(self) -> (i64, i64) {
        match self {
            Self::U8 => (0, i64::from(u8::MAX)),
            Self::I8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
            Self::U16 => (0, i64::from(u16::MAX)),
            Self::I16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
            Self::I32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
        }
    }

    #[must_use]
    pub fn fits(self, value: i64) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&value)
    }
}

fn read_array<A: Clone + Send + 'static, const N: usize>(input: &Input<A>) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf, 0, N)?;
    Ok(buf)
}

pub fn read_u8<A: Clone + Send + 'static>(input: &Input<A>) -> Result<u8> {
    input.read_byte()
}

pub fn read_i8<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i8> {
    Ok(i8::from_ne_bytes([input.read_byte()?]))
}

pub fn read_u16<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<u16> {
    Ok(O::read_u16(&read_array::<A, 2>(input)?))
}

pub fn read_i16<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<i16> {
    Ok(O::read_i16(&read_array::<A, 2>(input)?))
}

pub fn read_i32<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<i32> {
    Ok(O::read_i32(&read_array::<A, 4>(input)?))
}

/// A 32-bit value as the host's native signed integer
///
/// # Errors
/// `Overflow` where `isize` is narrower than 32 bits and the value does not fit.
pub fn read_i32_native<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<isize> {
    let value = read_i32::<O, A>(input)?;
    isize::try_from(value).map_err(|_| StreamError::Overflow)
}

/// A 32-bit value widened to `i64`; cannot overflow
pub fn read_real_i32<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<i64> {
    read_i32::<O, A>(input).map(i64::from)
}

pub fn read_i64<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<i64> {
    Ok(O::read_i64(&read_array::<A, 8>(input)?))
}

pub fn read_f32<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<f32> {
    Ok(O::read_f32(&read_array::<A, 4>(input)?))
}

pub fn read_f64<O: ByteOrder, A: Clone + Send + 'static>(input: &Input<A>) -> Result<f64> {
    Ok(O::read_f64(&read_array::<A, 8>(input)?))
}

pub fn write_u8<A: Clone + Send + 'static>(output: &Output<A>, value: u8) -> Result<()> {
    output.write_byte(value)
}

pub fn write_i8<A: Clone + Send + 'static>(output: &Output<A>, value: i8) -> Result<()> {
    output.write_byte(value.to_ne_bytes()[0])
}

pub fn write_u16<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: u16) -> Result<()> {
    let mut buf = [0u8; 2];
    O::write_u16(&mut buf, value);
    output.write_all(&buf)
}

pub fn write_i16<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: i16) -> Result<()> {
    let mut buf = [0u8; 2];
    O::write_i16(&mut buf, value);
    output.write_all(&buf)
}

pub fn write_i32<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: i32) -> Result<()> {
    let mut buf = [0u8; 4];
    O::write_i32(&mut buf, value);
    output.write_all(&buf)
}

/// Native integer written as 32 bits
///
/// # Errors
/// `Overflow` if `value` does not fit in `i32`.
pub fn write_i32_native<O: ByteOrder, A: Clone + Send + 'static>(
    output: &Output<A>,
    value: isize,
) -> Result<()> {
    let value = i32::try_from(value).map_err(|_| StreamError::Overflow)?;
    write_i32::<O, A>(output, value)
}

pub fn write_i64<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: i64) -> Result<()> {
    let mut buf = [0u8; 8];
    O::write_i64(&mut buf, value);
    output.write_all(&buf)
}

pub fn write_f32<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: f32) -> Result<()> {
    let mut buf = [0u8; 4];
    O::write_f32(&mut buf, value);
    output.write_all(&buf)
}

pub fn write_f64<O: ByteOrder, A: Clone + Send + 'static>(output: &Output<A>, value: f64) -> Result<()> {
    let mut buf = [0u8; 8];
    O::write_f64(&mut buf, value);
    output.write_all(&buf)
}

/// Write `value` in the narrower representation `width`
///
/// # Errors
/// `Overflow` if `value` is outside the range of `width`; nothing is written then.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn write_int_checked<O: ByteOrder, A: Clone + Send + 'static>(
    output: &Output<A>,
    width: IntWidth,
    value: i64,
) -> Result<()> {
    if !width.fits(value) {
        return Err(StreamError::Overflow);
    }
    match width {
        IntWidth::U8 => write_u8(output, value as u8),
        IntWidth::I8 => write_i8(output, value as i8),
        IntWidth::U16 => write_u16::<O, A>(output, value as u16),
        IntWidth::I16 => write_i16::<O, A>(output, value as i16),
        IntWidth::I32 => write_i32::<O, A>(output, value as i32),
    }
}
