//! Big-endian primitive encoding used by parse-unit binaries.
//!
//! Strings are a `u16` byte length followed by UTF-8 bytes.

use std::io::{ErrorKind, Read, Write};

use super::io_utils::classify_io_error;
use crate::error::{ProparseError, Result};

/// Writes primitives to an underlying byte sink.
#[derive(Debug)]
pub struct DataWriter<W: Write> {
    inner: W,
}

impl<W: Write> DataWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .map_err(|e| classify_io_error(e, "Failed to write artifact"))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.put(&value.to_be_bytes())
    }

    pub fn write_utf(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| ProparseError::StringTooLong { len: value.len() })?;
        self.put(&len.to_be_bytes())?;
        self.put(value.as_bytes())
    }
}

/// Reads primitives written by [`DataWriter`].
#[derive(Debug)]
pub struct DataReader<R: Read> {
    inner: R,
}

impl<R: Read> DataReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ProparseError::CorruptArtifact("unexpected end of data".to_string())
            } else {
                classify_io_error(e, "Failed to read artifact")
            }
        })?;
        Ok(buf)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take::<4>().map(i32::from_be_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take::<2>().map(i16::from_be_bytes)
    }

    pub fn read_utf(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.take::<2>()?) as usize;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ProparseError::CorruptArtifact("truncated string".to_string())
            } else {
                classify_io_error(e, "Failed to read artifact")
            }
        })?;
        String::from_utf8(buf)
            .map_err(|_| ProparseError::CorruptArtifact("string is not valid UTF-8".to_string()))
    }
}
