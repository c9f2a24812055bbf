//! TFRecord files: a sequence of length-prefixed, checksummed frames.
//!
//! ```text
//! u64 length (little endian)
//! u32 masked crc32c of length
//! [u8; length] data
//! u32 masked crc32c of data
//! ```
use std::io::{self, Read, Write};

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use convnet_core::internal::*;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Reflected Castagnoli polynomial.
const CASTAGNOLI: u32 = 0x82f6_3b78;

const CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ CASTAGNOLI } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

pub fn crc32c(data: &[u8]) -> u32 {
    !data.iter().fold(!0u32, |crc, &b| CRC_TABLE[((crc ^ b as u32) & 0xff) as usize] ^ (crc >> 8))
}

/// The checksum stored in TFRecord frames.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c(data);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

fn malformed(msg: String) -> convnet_core::anyhow::Error {
    anyhow!(NetError::MalformedRecord(msg))
}

/// Fill `buf` as much as possible, returning how many bytes were read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Iterator over the payloads of a TFRecord stream.
///
/// Stops after the first error.
#[derive(Debug)]
pub struct RecordReader<R: Read> {
    reader: R,
    offset: u64,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> RecordReader<R> {
        RecordReader { reader, offset: 0, done: false }
    }

    /// Byte offset of the next frame.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_record(&mut self) -> NetResult<Option<Vec<u8>>> {
        let mut header = [0u8; 12];
        let got = read_full(&mut self.reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < header.len() {
            return Err(malformed(format!("truncated frame header at offset {}", self.offset)));
        }
        let len = (&header[..8]).read_u64::<LE>()?;
        let len_crc = (&header[8..]).read_u32::<LE>()?;
        if masked_crc32c(&header[..8]) != len_crc {
            return Err(malformed(format!("length checksum mismatch at offset {}", self.offset)));
        }
        let mut data = vec![];
        let got = (&mut self.reader).take(len).read_to_end(&mut data)?;
        let mut footer = [0u8; 4];
        if (got as u64) < len || read_full(&mut self.reader, &mut footer)? < footer.len() {
            return Err(malformed(format!(
                "truncated frame of {len} bytes at offset {}",
                self.offset
            )));
        }
        if masked_crc32c(&data) != (&footer[..]).read_u32::<LE>()? {
            return Err(malformed(format!("data checksum mismatch at offset {}", self.offset)));
        }
        trace!("Read record of {len} bytes at offset {}", self.offset);
        self.offset += 16 + len;
        Ok(Some(data))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = NetResult<Vec<u8>>;

    fn next(&mut self) -> Option<NetResult<Vec<u8>>> {
        if self.done {
            return None;
        }
        let record = self.read_record().transpose();
        if !matches!(record, Some(Ok(_))) {
            self.done = true;
        }
        record
    }
}

/// Writes payloads with TFRecord framing.
#[derive(Debug, new)]
pub struct RecordWriter<W: Write> {
    writer: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn write_record(&mut self, data: &[u8]) -> NetResult<()> {
        let mut len = [0u8; 8];
        (&mut len[..]).write_u64::<LE>(data.len() as u64)?;
        self.writer.write_all(&len)?;
        self.writer.write_u32::<LE>(masked_crc32c(&len))?;
        self.writer.write_all(data)?;
        self.writer.write_u32::<LE>(masked_crc32c(data))?;
        Ok(())
    }

    pub fn flush(&mut self) -> NetResult<()> {
        Ok(self.writer.flush()?)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
