//! Binary codec over streams
//!
//! | type | bytes |
//! |------|-------|
//! | u8, i8 | 1 |
//! | u16, i16 | 2 |
//! | i32, f32 | 4 |
//! | i64, f64 | 8 |
//!
//! [`le`] and [`be`] expose the same function names with opposite byte order.
//! Little-endian is the default and is re-exported here, so `codec::read_u16`
//! is `codec::le::read_u16`.
//!
//! Bit-level access lives in [`bits`].

pub mod bits;
pub mod numeric;

pub use bits::{BitReader, BitWriter, MAX_BITS};
pub use le::*;
pub use numeric::IntWidth;

macro_rules! endian_module {
    ($(#[$doc:meta])* $name:ident, $order:ty) => {
        $(#[$doc])*
        pub mod $name {
            use crate::codec::numeric::{self, IntWidth};
            use crate::error::Result;
            use crate::input::Input;
            use crate::output::Output;

            pub fn read_u8<A: Clone + Send + 'static>(input: &Input<A>) -> Result<u8> {
                numeric::read_u8(input)
            }

            pub fn read_i8<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i8> {
                numeric::read_i8(input)
            }

            pub fn read_u16<A: Clone + Send + 'static>(input: &Input<A>) -> Result<u16> {
                numeric::read_u16::<$order, A>(input)
            }

            pub fn read_i16<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i16> {
                numeric::read_i16::<$order, A>(input)
            }

            pub fn read_i32<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i32> {
                numeric::read_i32::<$order, A>(input)
            }

            /// # Errors
            /// `Overflow` if the value does not fit the native integer.
            pub fn read_i32_native<A: Clone + Send + 'static>(input: &Input<A>) -> Result<isize> {
                numeric::read_i32_native::<$order, A>(input)
            }

            pub fn read_real_i32<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i64> {
                numeric::read_real_i32::<$order, A>(input)
            }

            pub fn read_i64<A: Clone + Send + 'static>(input: &Input<A>) -> Result<i64> {
                numeric::read_i64::<$order, A>(input)
            }

            pub fn read_f32<A: Clone + Send + 'static>(input: &Input<A>) -> Result<f32> {
                numeric::read_f32::<$order, A>(input)
            }

            pub fn read_f64<A: Clone + Send + 'static>(input: &Input<A>) -> Result<f64> {
                numeric::read_f64::<$order, A>(input)
            }

            pub fn write_u8<A: Clone + Send + 'static>(output: &Output<A>, value: u8) -> Result<()> {
                numeric::write_u8(output, value)
            }

            pub fn write_i8<A: Clone + Send + 'static>(output: &Output<A>, value: i8) -> Result<()> {
                numeric::write_i8(output, value)
            }

            pub fn write_u16<A: Clone + Send + 'static>(output: &Output<A>, value: u16) -> Result<()> {
                numeric::write_u16::<$order, A>(output, value)
            }

            pub fn write_i16<A: Clone + Send + 'static>(output: &Output<A>, value: i16) -> Result<()> {
                numeric::write_i16::<$order, A>(output, value)
            }

            pub fn write_i32<A: Clone + Send + 'static>(output: &Output<A>, value: i32) -> Result<()> {
                numeric::write_i32::<$order, A>(output, value)
            }

            /// # Errors
            /// `Overflow` if the value does not fit in 32 bits.
            pub fn write_i32_native<A: Clone + Send + 'static>(
                output: &Output<A>,
                value: isize,
            ) -> Result<()> {
                numeric::write_i32_native::<$order, A>(output, value)
            }

            pub fn write_i64<A: Clone + Send + 'static>(output: &Output<A>, value: i64) -> Result<()> {
                numeric::write_i64::<$order, A>(output, value)
            }

            pub fn write_f32<A: Clone + Send + 'static>(output: &Output<A>, value: f32) -> Result<()> {
                numeric::write_f32::<$order, A>(output, value)
            }

            pub fn write_f64<A: Clone + Send + 'static>(output: &Output<A>, value: f64) -> Result<()> {
                numeric::write_f64::<$order, A>(output, value)
            }

            /// # Errors
            /// `Overflow` if `value` is outside the range of `width`.
            pub fn write_int_checked<A: Clone + Send + 'static>(
                output: &Output<A>,
                width: IntWidth,
                value: i64,
            ) -> Result<()> {
                numeric::write_int_checked::<$order, A>(output, width, value)
            }
        }
    };
}

endian_module!(
    /// Little-endian byte order (the default)
    le,
    byteorder::LittleEndian
);

endian_module!(
    /// Big-endian byte order
    be,
    byteorder::BigEndian
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::memory::{input_bytes, output_buffer};

    #[test]
    fn test_le_is_default() {
        let out = output_buffer();
        write_u16(&out, 0xABCD).unwrap();
        be::write_u16(&out, 0xABCD).unwrap();
        assert_eq!(out.close().unwrap(), [0xCD, 0xAB, 0xAB, 0xCD]);
    }

    #[test]
    fn test_wide_read_of_negative() {
        let input = input_bytes(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(read_real_i32(&input).unwrap(), -1);
    }

    #[test]
    fn test_opposite_order_swaps_bytes() {
        let out = output_buffer();
        le::write_i32(&out, 0x1122_3344).unwrap();
        let input = input_bytes(out.close().unwrap());
        assert_eq!(be::read_i32(&input).unwrap(), 0x4433_2211);
    }
}
