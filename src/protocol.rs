use crate::{Result, error::GpsdJsonError, protocol::registry::Registry};

pub mod registry;
pub mod schema;
#[cfg(feature = "proto-v3")]
pub mod v3;

/// Line-oriented report decoding for any buffered reader
///
/// Each call consumes exactly one line, so a line that fails to decode
/// yields a single error and the next call picks up with the next line.
pub trait GpsdJsonDecode: std::io::BufRead {
    /// Reads and decodes the next non-blank line with `registry`
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_record<M>(&mut self, registry: &Registry<M>, buf: &mut String) -> Result<Option<M>> {
        loop {
            buf.clear();
            let bytes_read = self.read_line(buf).map_err(GpsdJsonError::IoError)?;
            if bytes_read == 0 {
                return Ok(None); // EOF reached
            }

            let line = buf.trim();
            if line.is_empty() {
                continue;
            }

            return registry.decode_str(line).map(Some);
        }
    }

    /// Reads and decodes the next line as a v3 report
    #[cfg(feature = "proto-v3")]
    fn read_report(&mut self, buf: &mut String) -> Result<Option<v3::Message>> {
        self.read_record(v3::registry(), buf)
    }

    /// Turns the reader into an iterator of decoded v3 reports
    #[cfg(feature = "proto-v3")]
    fn reports(self) -> Reports<Self>
    where
        Self: Sized,
    {
        Reports {
            reader: self,
            buf: String::new(),
        }
    }
}

impl<R: std::io::BufRead + ?Sized> GpsdJsonDecode for R {}

/// Iterator over the reports of a line stream
///
/// Yields one item per non-blank line; decode failures are yielded as
/// errors and do not end the iteration. Only end of input does.
#[cfg(feature = "proto-v3")]
#[derive(Debug)]
pub struct Reports<R> {
    reader: R,
    buf: String,
}

#[cfg(feature = "proto-v3")]
impl<R: std::io::BufRead> Iterator for Reports<R> {
    type Item = Result<v3::Message>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_report(&mut self.buf).transpose()
    }
}
