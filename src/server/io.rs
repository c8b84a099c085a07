//! Byte pumping between a storage stream and a data connection socket.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// The line ending translation applied while copying.
#[derive(Debug)]
pub(crate) enum Translation {
    /// Binary passthrough
    None,
    /// Host to wire: a CR is inserted before every LF that doesn't already follow one.
    ToWire(LfToCrlf),
    /// Wire to host: the CR of every CRLF is dropped. Lone CRs are kept.
    FromWire(CrlfToLf),
}

impl Translation {
    fn apply(&mut self, input: &[u8], out: &mut Vec<u8>) {
        match self {
            Translation::None => out.extend_from_slice(input),
            Translation::ToWire(t) => t.encode(input, out),
            Translation::FromWire(t) => t.decode(input, out),
        }
    }

    fn finish(&mut self, out: &mut Vec<u8>) {
        if let Translation::FromWire(t) = self {
            t.finish(out)
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LfToCrlf {
    last_was_cr: bool,
}

impl LfToCrlf {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CrlfToLf {
    // A CR at the end of the previous chunk whose fate depends on the next byte.
    pending_cr: bool,
}

impl CrlfToLf {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b != b'\n' {
                    out.push(b'\r');
                }
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if self.pending_cr {
            self.pending_cr = false;
            out.push(b'\r');
        }
    }
}

/// Tells which side of a copy failed.
#[derive(Debug)]
pub(crate) enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Copies everything from `reader` to `writer`, translating line endings on the way, and flushes
/// the writer at the end. Returns the number of bytes read from `reader`.
pub(crate) async fn copy_data<R, W>(reader: &mut R, writer: &mut W, mut translation: Translation) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut out = Vec::with_capacity(COPY_BUFFER_SIZE);
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await.map_err(CopyError::Read)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        out.clear();
        translation.apply(&buf[..n], &mut out);
        writer.write_all(&out).await.map_err(CopyError::Write)?;
    }
    out.clear();
    translation.finish(&mut out);
    if !out.is_empty() {
        writer.write_all(&out).await.map_err(CopyError::Write)?;
    }
    writer.flush().await.map_err(CopyError::Write)?;
    Ok(total)
}
