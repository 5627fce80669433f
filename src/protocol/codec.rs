//! Wire framing.
//!
//! Requests and responses are newline-delimited, length-prefixed frames:
//!
//! ```text
//! request:   <verb>\n <argc>\n ( <len>\n <len raw bytes> )*
//! response:  ok\n <len>\n <len raw bytes>          success
//!            <other>\n <len>\n <len raw bytes>     error, payload is the message
//! ```
//!
//! Lengths are decimal byte counts. A zero length carries no bytes.
//! The codec never interprets arguments or payloads.

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

use super::command::Command;

// ============================================================================
// Constants
// ============================================================================

/// Status line of a successful response.
pub const STATUS_OK: &str = "ok";

/// Status line written by [`write_response`] for failures.
pub const STATUS_FAILURE: &str = "failure";

/// Upper bound of the initial payload allocation.
const READ_CHUNK: usize = 64 * 1024;

// ============================================================================
// Encoding
// ============================================================================

/// Serializes a command into its request frame.
#[must_use]
pub fn encode_command(command: &Command) -> Vec<u8> {
    let payload: usize = command.args.iter().map(|a| a.len() + 12).sum();
    let mut buf = Vec::with_capacity(command.verb.len() + 8 + payload);

    buf.extend_from_slice(command.verb.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(command.args.len().to_string().as_bytes());
    buf.push(b'\n');

    for arg in &command.args {
        buf.extend_from_slice(arg.len().to_string().as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(arg.as_bytes());
    }

    buf
}

/// Serializes a response frame.
///
/// `Ok` payloads get the `ok` status, `Err` messages get [`STATUS_FAILURE`].
#[must_use]
pub fn encode_response(reply: &std::result::Result<String, String>) -> Vec<u8> {
    let (status, message) = match reply {
        Ok(payload) => (STATUS_OK, payload),
        Err(message) => (STATUS_FAILURE, message),
    };

    let mut buf = Vec::with_capacity(status.len() + message.len() + 16);
    buf.extend_from_slice(status.as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(message.len().to_string().as_bytes());
    buf.push(b'\n');
    buf.extend_from_slice(message.as_bytes());
    buf
}

/// Writes a command frame and flushes.
pub async fn write_command<W>(writer: &mut W, command: &Command) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_command(command)).await?;
    writer.flush().await?;
    Ok(())
}

/// Writes a response frame and flushes.
///
/// This is the server half of the protocol, used by in-process fakes.
pub async fn write_response<W>(
    writer: &mut W,
    reply: &std::result::Result<String, String>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_response(reply)).await?;
    writer.flush().await?;
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Reads one response.
///
/// # Errors
///
/// - [`Error::NoResponse`] if the peer closed before sending a status line,
///   or sent an empty one
/// - [`Error::InvalidResponse`] carrying the payload for any non-`ok` status
/// - [`Error::EndOfStream`] if the peer closed mid-frame
/// - [`Error::Protocol`] for a malformed size line
pub async fn read_response<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let status = match read_line(reader).await? {
        Some(line) if !line.is_empty() => line,
        _ => return Err(Error::NoResponse),
    };

    let message = read_message(reader).await?;

    if status == STATUS_OK {
        Ok(message)
    } else {
        Err(Error::invalid_response(message))
    }
}

/// Reads one command frame.
///
/// Returns `None` if the peer closed cleanly between frames.
pub async fn read_command<R>(reader: &mut R) -> Result<Option<Command>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(verb) = read_line(reader).await? else {
        return Ok(None);
    };

    let count = read_size(reader).await?;
    let mut args = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        args.push(read_message(reader).await?);
    }

    Ok(Some(Command::raw(verb, args)))
}

/// Reads a size line followed by that many raw bytes.
async fn read_message<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let size = read_size(reader).await?;
    if size == 0 {
        return Ok(String::new());
    }

    // The size line is untrusted; grow the buffer only as bytes arrive.
    let limit = u64::try_from(size).unwrap_or(u64::MAX);
    let mut buf = Vec::with_capacity(size.min(READ_CHUNK));
    let read = (&mut *reader).take(limit).read_to_end(&mut buf).await?;
    if read < size {
        return Err(Error::EndOfStream);
    }

    String::from_utf8(buf).map_err(|e| Error::protocol(format!("payload is not UTF-8: {e}")))
}

/// Reads a decimal size line.
async fn read_size<R>(reader: &mut R) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader).await?.ok_or(Error::EndOfStream)?;
    line.trim()
        .parse::<usize>()
        .map_err(|_| Error::protocol(format!("invalid size line: {line:?}")))
}

/// Reads up to and excluding the next `\n`.
///
/// Returns `None` if the stream ended before any byte was read.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = reader.read_until(b'\n', &mut buf).await?;

    if read == 0 {
        return Ok(None);
    }
    if buf.pop() != Some(b'\n') {
        return Err(Error::EndOfStream);
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| Error::protocol(format!("line is not UTF-8: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
