//! Line-based wire codec for the FTP control channel.
//!
//! Commands arrive as `CMD[ SP param]\r\n`; replies go out as either a
//! single line `NNN text\r\n` or, for multi-line bodies, `NNN-first\r\n`
//! continuation lines `NNN last\r\n`.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on an accepted command line, in bytes, before the codec
/// rejects it with `500` rather than buffering unbounded client input.
pub const MAX_COMMAND_LINE: usize = 4096;

/// A parsed `CMD[ SP param]` control line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedCommand {
    /// The command verb, upper-cased.
    pub command: String,
    /// The parameter text, verbatim (may itself contain spaces), or empty.
    pub param: String,
}

/// Reads one control-channel line and splits it into command and parameter.
///
/// Returns `Ok(None)` on clean EOF. A line exceeding [`MAX_COMMAND_LINE`]
/// bytes is reported as [`io::ErrorKind::InvalidData`] so the caller can
/// reply `500` without crashing the connection.
pub async fn read_command_line<R>(reader: &mut R) -> io::Result<Option<ParsedCommand>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let bytes_read = reader.read_until(b'\n', &mut line).await?;
    if bytes_read == 0 {
        return Ok(None);
    }
    if line.len() > MAX_COMMAND_LINE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "command line too long",
        ));
    }

    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }

    let text = String::from_utf8_lossy(&line);
    Ok(Some(parse_line(&text)))
}

fn parse_line(text: &str) -> ParsedCommand {
    match text.split_once(' ') {
        Some((cmd, param)) => ParsedCommand {
            command: cmd.to_ascii_uppercase(),
            param: param.to_string(),
        },
        None => ParsedCommand {
            command: text.to_ascii_uppercase(),
            param: String::new(),
        },
    }
}

/// Writes a reply. A single `text` line produces the single-line form;
/// `extra_lines` (if non-empty) produces the RFC 959 multi-line form, with
/// `text` as the first line and the last element of `extra_lines` as the
/// closing line.
pub async fn write_reply<W>(writer: &mut W, code: u16, text: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_multiline_reply(writer, code, std::iter::once(text)).await
}

/// Writes a multi-line reply from an iterator of lines; the final element
/// closes the reply, everything before it is a continuation line.
pub async fn write_multiline_reply<W, I>(writer: &mut W, code: u16, lines: I) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let lines: Vec<_> = lines.into_iter().collect();
    let mut buf = Vec::new();

    match lines.split_last() {
        None => {
            buf.extend_from_slice(format!("{code} \r\n").as_bytes());
        }
        Some((last, rest)) => {
            for line in rest {
                for physical in line.as_ref().split('\n') {
                    buf.extend_from_slice(format!("{code}-{physical}\r\n").as_bytes());
                }
            }
            let mut physical_lines = last.as_ref().split('\n').peekable();
            while let Some(physical) = physical_lines.next() {
                if physical_lines.peek().is_some() {
                    buf.extend_from_slice(format!("{code}-{physical}\r\n").as_bytes());
                } else {
                    buf.extend_from_slice(format!("{code} {physical}\r\n").as_bytes());
                }
            }
        }
    }

    writer.write_all(&buf).await?;
    writer.flush().await
}
