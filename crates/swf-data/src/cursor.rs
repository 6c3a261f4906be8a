use crate::error::{Error, ErrorFlags, Result};

/// Bounds-checked little endian reader over the absolute byte range `[start, end)` of a buffer.
///
/// Offsets are always absolute positions in the backing buffer, so records read
/// through a sliced cursor report the same offsets as the top-level stream.
///
/// Reads crossing `end` raise [`Error::OutOfBounds`] when [`ErrorFlags::OUT_OF_BOUNDS`]
/// is enabled. Otherwise the missing bytes read as zero and the cursor stops at `end`.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
    offset: usize,
    flags: ErrorFlags,
    bit_buffer: u8,
    bit_count: u8,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8], flags: ErrorFlags) -> Self {
        Self::with_range(data, 0, data.len(), flags)
    }

    /// Creates a cursor over `[start, end)`. Both bounds are clamped to the buffer.
    pub fn with_range(data: &'a [u8], start: usize, end: usize, flags: ErrorFlags) -> Self {
        let end = end.min(data.len());
        let start = start.min(end);
        Self {
            data,
            start,
            end,
            offset: start,
            flags,
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn flags(&self) -> ErrorFlags {
        self.flags
    }

    /// Bytes left before `end`.
    pub fn remaining(&self) -> usize {
        self.end - self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.end
    }

    /// Returns a cursor over the absolute range `[start, end)`, which must lie inside this cursor's range.
    pub fn slice(&self, start: usize, end: usize) -> Result<Cursor<'a>> {
        if start < self.start || end > self.end || start > end {
            self.flags.check(Error::OutOfBounds {
                offset: start,
                end: self.end,
                length: end.saturating_sub(start),
            })?;
        }
        let end = end.clamp(self.start, self.end);
        let start = start.clamp(self.start, end);
        Ok(Self::with_range(self.data, start, end, self.flags))
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8]> {
        self.align();
        let available = self.remaining();
        if length > available {
            self.flags.check(Error::OutOfBounds {
                offset: self.offset,
                end: self.end,
                length,
            })?;
            let bytes = &self.data[self.offset..self.end];
            self.offset = self.end;
            return Ok(bytes);
        }
        let bytes = &self.data[self.offset..self.offset + length];
        self.offset += length;
        Ok(bytes)
    }

    pub fn skip(&mut self, length: usize) -> Result<()> {
        self.take(length).map(|_| ())
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        self.take(length)
    }

    /// Consumes everything up to `end`.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        self.align();
        let bytes = &self.data[self.offset..self.end];
        self.offset = self.end;
        bytes
    }

    /// Reads an unsigned little endian integer of `width` bytes (1 to 8).
    pub fn read_uint(&mut self, width: usize) -> Result<u64> {
        debug_assert!((1..=8).contains(&width));
        let bytes = self.take(width)?;
        Ok(bytes
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_uint(1)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_uint(2)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_uint(4)? as u32)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a signed fixed point number stored on `width` bytes with `frac_bits` fractional bits.
    pub fn read_fixed(&mut self, width: usize, frac_bits: u32) -> Result<f64> {
        let raw = self.read_uint(width)?;
        let shift = 64 - (width as u32) * 8;
        let value = ((raw << shift) as i64) >> shift;
        Ok(value as f64 / (1u64 << frac_bits) as f64)
    }

    /// 8.8 fixed point.
    pub fn read_fixed8(&mut self) -> Result<f64> {
        self.read_fixed(2, 8)
    }

    /// 16.16 fixed point.
    pub fn read_fixed16(&mut self) -> Result<f64> {
        self.read_fixed(4, 16)
    }

    fn next_bit_byte(&mut self) -> Result<u8> {
        if self.offset < self.end {
            let byte = self.data[self.offset];
            self.offset += 1;
            return Ok(byte);
        }
        self.flags.check(Error::OutOfBounds {
            offset: self.offset,
            end: self.end,
            length: 1,
        })?;
        Ok(0)
    }

    /// Reads `n` (at most 32) unsigned bits, most significant first.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for _ in 0..n {
            if self.bit_count == 0 {
                self.bit_buffer = self.next_bit_byte()?;
                self.bit_count = 8;
            }
            self.bit_count -= 1;
            value = (value << 1) | u32::from((self.bit_buffer >> self.bit_count) & 1);
        }
        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads `n` bits as a two's complement signed value.
    pub fn read_sbits(&mut self, n: u32) -> Result<i32> {
        if n == 0 {
            return Ok(0);
        }
        let value = self.read_bits(n)?;
        let shift = 32 - n;
        Ok(((value << shift) as i32) >> shift)
    }

    /// Reads `n` bits as a signed 16.16 fixed point value.
    pub fn read_fbits(&mut self, n: u32) -> Result<f64> {
        Ok(f64::from(self.read_sbits(n)?) / 65536.0)
    }

    /// Drops the pending bits of a partially read byte.
    pub fn align(&mut self) {
        self.bit_count = 0;
    }

    /// Reads a NUL terminated string. Invalid UTF-8 sequences are replaced.
    pub fn read_string(&mut self) -> Result<String> {
        self.align();
        let rest = &self.data[self.offset..self.end];
        let Some(len) = rest.iter().position(|b| *b == 0) else {
            self.flags
                .check(Error::invalid(self.offset, "unterminated string"))?;
            return Ok(String::from_utf8_lossy(self.read_remaining()).into_owned());
        };
        let value = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.offset += len + 1;
        Ok(value)
    }
}
