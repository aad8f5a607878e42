use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::loader::Loader;
use crate::session::{Listing, ProgramSession, SessionError};
use crate::text;
use crate::word::Word;

pub const HELP: &str = "\
Enter one ULP instruction per line, e.g. `move r0, 0x10` or `jumpr -8, 1, lt`.
Operands may be separated by spaces or commas; registers are r0..r3.

  var(<n>)     append a 16-bit data word, 0..65535
  run <n>      load the program and start it at slot <n>
  list         dump the program as resident on the device
  reset        clear the program
  help         show this text";

/// Size of the firmware's serial line buffer. A line that fills it is dropped.
pub const MAX_LINE_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Var(u64),
    Run(usize),
    List,
    Reset,
    /// Anything else: handed to the assembler as is.
    Instruction(String),
}

/// Classifies a line. The line is normalized first.
pub fn parse_command(line: &str) -> Command {
    let line = text::normalize(line);
    if let Some(value) = parse_var(&line) {
        return Command::Var(value);
    }
    let meta = match text::tokens(&line).as_slice() {
        [] | ["help"] => Some(Command::Help),
        ["list"] => Some(Command::List),
        ["reset"] => Some(Command::Reset),
        ["run", n] if text::is_unsigned(n) => Some(Command::Run(
            text::parse_number(n)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(usize::MAX),
        )),
        _ => None,
    };
    meta.unwrap_or_else(|| Command::Instruction(line))
}

/// `var(<uint>)` with optional blanks inside the parentheses. Literals too
/// large for the parser saturate so the range check still rejects them.
fn parse_var(line: &str) -> Option<u64> {
    let inner = line.strip_prefix("var")?.trim_start();
    let inner = inner.strip_prefix('(')?.strip_suffix(')')?.trim();
    if !text::is_unsigned(inner) {
        return None;
    }
    Some(
        text::parse_number(inner)
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(u64::MAX),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Help,
    Appended { index: usize, word: Word },
    Started { start_index: usize },
    Listing(Listing),
    Reset,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Help => f.write_str(HELP),
            Reply::Appended { index, word } => write!(f, "{:2}: {}", index, word),
            Reply::Started { start_index } => write!(f, "Program started at {}", start_index),
            Reply::Listing(l) => write!(f, "{}", l),
            Reply::Reset => f.write_str("Program cleared"),
        }
    }
}

/// Line-oriented front end over one session and one device.
pub struct Shell<L: Loader> {
    session: ProgramSession,
    loader: L,
}

impl<L: Loader> Shell<L> {
    pub fn new(session: ProgramSession, loader: L) -> Self {
        Self { session, loader }
    }

    pub fn session(&self) -> &ProgramSession {
        &self.session
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn execute(&mut self, line: &str) -> Result<Reply, SessionError> {
        let cmd = parse_command(line);
        debug!(?cmd, "command");
        match cmd {
            Command::Help => Ok(Reply::Help),
            Command::Var(value) => {
                let index = self.session.append_variable(value)?;
                Ok(self.appended(index))
            }
            Command::Run(start_index) => {
                self.session.run(start_index, &mut self.loader)?;
                Ok(Reply::Started { start_index })
            }
            Command::List => Ok(Reply::Listing(self.session.list_snapshot(&mut self.loader)?)),
            Command::Reset => {
                self.session.reset();
                Ok(Reply::Reset)
            }
            Command::Instruction(line) => {
                let index = self.session.append_instruction(&line)?;
                Ok(self.appended(index))
            }
        }
    }

    /// Handles one line exactly as it came off the wire and renders the
    /// answer, `ERROR: ...` included. A trailing `\n` or `\r\n` is dropped and
    /// bytes that are not UTF-8 are replaced, so no input ends the session.
    pub fn respond(&mut self, raw: &[u8], max_line_length: usize) -> String {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.len() >= max_line_length {
            warn!(len = raw.len(), max_line_length, "line dropped");
            return format!(
                "ERROR: max line length ({}) reached -> ignoring \"{}\"",
                max_line_length,
                String::from_utf8_lossy(&raw[..max_line_length])
            );
        }
        match self.execute(&String::from_utf8_lossy(raw)) {
            Ok(reply) => reply.to_string(),
            Err(e) => format!("ERROR: {e}"),
        }
    }

    /// Answers every line of `input` on `out` until end of input. Only I/O
    /// failures of the two streams are returned.
    pub fn serve<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut out: W,
        max_line_length: usize,
    ) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            writeln!(out, "{}", self.respond(&buf, max_line_length))?;
            out.flush()?;
        }
    }

    fn appended(&self, index: usize) -> Reply {
        Reply::Appended { index, word: self.session.slots()[index] }
    }
}
