use super::{
    Reply,
    command::Command,
    error::ControlChanError,
    line_parser::{
        self,
        error::{ParseError, ParseErrorKind},
    },
};

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

// FtpCodec implements tokio's `Decoder` and `Encoder` traits for the control channel, that we'll
// use to decode FTP commands and encode their responses.
//
// A line that fails to parse is yielded as an `Err` item rather than a decoder error, since a
// decoder error would end the stream and with it the session.
#[derive(Debug)]
pub(crate) struct FtpCodec {
    // Stored index of the next index to examine for a '\n' character. This is used to optimize
    // searching. For example, if `decode` was called with `abc`, it would hold `3`, because that
    // is the next index to examine. The next time `decode` is called with `abcde\n`, we will only
    // look at `de\n` before returning.
    next_index: usize,
    max_line_length: usize,
    // Set while skipping the remainder of a line that exceeded `max_line_length`.
    discarding: bool,
}

impl FtpCodec {
    pub fn new(max_line_length: usize) -> Self {
        FtpCodec {
            next_index: 0,
            max_line_length,
            discarding: false,
        }
    }
}

impl Decoder for FtpCodec {
    type Item = Result<Command, ParseError>;
    type Error = ControlChanError;

    // Here we decode the incoming bytes into a meaningful command. We'll split on newlines, and
    // parse the resulting line. This method will be called by tokio.
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match buf[self.next_index..].iter().position(|b| *b == b'\n') {
            Some(newline_offset) => {
                let newline_index = newline_offset + self.next_index;
                let line = buf.split_to(newline_index + 1);
                self.next_index = 0;
                if self.discarding {
                    self.discarding = false;
                    return Ok(Some(Err(ParseErrorKind::LineTooLong.into())));
                }
                if line.len() > self.max_line_length {
                    return Ok(Some(Err(ParseErrorKind::LineTooLong.into())));
                }
                Ok(Some(line_parser::parse(line)))
            }
            None if buf.len() > self.max_line_length => {
                buf.clear();
                self.next_index = 0;
                self.discarding = true;
                Ok(None)
            }
            None if self.discarding => {
                buf.clear();
                self.next_index = 0;
                Ok(None)
            }
            None => {
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    // Here we encode the outgoing response
    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        write_reply(reply, &mut buffer)?;
        buf.extend(&buffer);
        Ok(())
    }
}

fn write_reply(reply: Reply, buffer: &mut Vec<u8>) -> std::io::Result<()> {
    match reply {
        Reply::None => {}
        Reply::CodeAndMsg { code, msg } => {
            if msg.is_empty() {
                writeln!(buffer, "{}\r", code as u32)?;
            } else {
                writeln!(buffer, "{} {}\r", code as u32, msg)?;
            }
        }
        Reply::MultiLine { code, mut lines } => {
            // Get the last line since it needs to be preceded by the response code.
            let last_line = lines.pop().unwrap_or_default();

            // Lines starting with a digit should be indented
            for it in lines.iter_mut() {
                if it.starts_with(|c: char| c.is_ascii_digit()) {
                    it.insert(0, ' ');
                }
            }
            if lines.is_empty() {
                writeln!(buffer, "{} {}\r", code as u32, last_line)?;
            } else {
                write!(buffer, "{}-{}\r\n{} {}\r\n", code as u32, lines.join("\r\n"), code as u32, last_line)?;
            }
        }
        Reply::Sequence(replies) => {
            for reply in replies {
                write_reply(reply, buffer)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::ReplyCode;
    use pretty_assertions::assert_eq;

    fn encode(reply: Reply) -> String {
        let mut codec = FtpCodec::new(4096);
        let mut buf = BytesMut::new();
        codec.encode(reply, &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn encodes_single_line() {
        assert_eq!(encode(Reply::new(ReplyCode::CommandOkay, "Okay")), "200 Okay\r\n");
        assert_eq!(encode(Reply::new(ReplyCode::CommandOkay, "")), "200\r\n");
        assert_eq!(encode(Reply::none()), "");
    }

    #[test]
    fn encodes_multi_line_with_indented_digits() {
        let reply = Reply::new_multiline(ReplyCode::SystemStatus, vec!["Status:", "123 starts with a digit", "End"]);
        assert_eq!(encode(reply), "211-Status:\r\n 123 starts with a digit\r\n211 End\r\n");
    }

    #[test]
    fn encodes_sequence() {
        let reply = Reply::Sequence(vec![
            Reply::new(ReplyCode::ConnectionClosed, "Aborted"),
            Reply::new(ReplyCode::ClosingDataConnection, "Done"),
        ]);
        assert_eq!(encode(reply), "426 Aborted\r\n226 Done\r\n");
    }

    #[test]
    fn decodes_partial_lines() {
        let mut codec = FtpCodec::new(4096);
        let mut buf = BytesMut::from("NO");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"OP\r\nPWD\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::new("NOOP", ""))));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::new("PWD", ""))));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn discards_overlong_line_then_recovers() {
        let mut codec = FtpCodec::new(16);
        let mut buf = BytesMut::from(&b"USER aaaaaaaaaaaaaaaaaaaaaaaaa"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"aaaaaaaaaaaaaaaaaaaaa");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"aaa\r\nNOOP\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Err(ParseErrorKind::LineTooLong.into())));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Ok(Command::new("NOOP", ""))));
    }

    #[test]
    fn rejects_overlong_line_received_at_once() {
        let mut codec = FtpCodec::new(8);
        let mut buf = BytesMut::from(&b"RETR some-long-name\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Err(ParseErrorKind::LineTooLong.into())));
        assert!(buf.is_empty());
    }
}
