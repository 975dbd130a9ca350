//! Bounds-checked cursor over an SNG plaintext buffer.

use crate::error::SngError;

/// Little-endian reader over an immutable byte slice.
///
/// Every read checks bounds first; an overrun reports the exact position,
/// requested width, and remaining bytes, which is the only diagnostic a
/// corrupted length-prefixed stream leaves behind.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn ensure(&self, need: usize) -> Result<(), SngError> {
        if self.pos + need > self.data.len() {
            return Err(SngError::ReadPastEnd {
                offset: self.pos,
                need,
                available: self.data.len() - self.pos,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, SngError> {
        self.ensure(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> Result<i8, SngError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, SngError> {
        self.ensure(2)?;
        let b = &self.data[self.pos..self.pos + 2];
        self.pos += 2;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, SngError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, SngError> {
        self.ensure(4)?;
        let b = &self.data[self.pos..self.pos + 4];
        self.pos += 4;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, SngError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_f32(&mut self) -> Result<f32, SngError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, SngError> {
        self.ensure(8)?;
        let b = &self.data[self.pos..self.pos + 8];
        self.pos += 8;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read an `n`-byte fixed field holding a NUL-padded string.
    ///
    /// The cursor always advances by exactly `n`; the returned string stops
    /// at the first NUL.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, SngError> {
        self.ensure(n)?;
        let field = &self.data[self.pos..self.pos + n];
        self.pos += n;

        let len = field.iter().position(|&b| b == 0).unwrap_or(n);
        Ok(String::from_utf8_lossy(&field[..len]).into_owned())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), SngError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}
