use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use crate::encode::{Encoder, Format, TIME_FORMAT};
use crate::error::Result;
use crate::line::{Context, Line, MSG_KEY};
use crate::pool;
use crate::style::{KEY_END, KEY_START, STYLE_VAL_ERR, VAL_END, VAL_START};

/// The synchronized byte sink shared by a logger and all its descendants.
///
/// Every physical write is one `write_all` of a fully assembled,
/// newline-terminated line under the lock, so concurrent loggers never tear
/// each other's lines. The lock is held only for the write itself, never
/// while fields are being built.
pub(crate) struct Sink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    fn write_line(&self, data: &[u8]) -> io::Result<()> {
        let mut out = self.out.lock();
        out.write_all(data)
    }
}

/// A structured logger bound to a shared sink.
///
/// A logger owns a pre-rendered context: the fields inherited from its
/// ancestors, already encoded as bytes. Deriving a child via [`Logger::with`]
/// copies those bytes into a fresh buffer, so children are independent of
/// the parent and of each other while sharing one synchronized sink.
///
/// # Examples
///
/// ```
/// use linelog::{Format, Logger};
///
/// let log = Logger::new(std::io::sink(), Format::Text);
/// log.print("starting up")?;
///
/// let child = log.with().str("worker", "7").logger();
/// child.start_record().uint("jobs", 3u32).msg("idle")?;
/// # Ok::<(), linelog::Error>(())
/// ```
pub struct Logger {
    sink: Arc<Sink>,
    colorize: bool,
    format: Format,
    finished: bool,
    context: Vec<u8>,
}

impl Logger {
    /// Creates a root logger writing to `out` in the given format.
    ///
    /// Color styling starts disabled; use [`Logger::stdout`] /
    /// [`Logger::stderr`] for terminal detection or [`Logger::force_color`]
    /// to override.
    pub fn new(out: impl Write + Send + 'static, format: Format) -> Self {
        Self {
            sink: Arc::new(Sink::new(out)),
            colorize: false,
            format,
            finished: false,
            context: pool::acquire(),
        }
    }

    /// Creates a root logger on standard output, with styling enabled when
    /// stdout is a terminal.
    pub fn stdout(format: Format) -> Self {
        let colorize = io::stdout().is_terminal();
        let mut log = Self::new(io::stdout(), format);
        log.colorize = colorize;
        log
    }

    /// Creates a root logger on standard error, with styling enabled when
    /// stderr is a terminal.
    pub fn stderr(format: Format) -> Self {
        let colorize = io::stderr().is_terminal();
        let mut log = Self::new(io::stderr(), format);
        log.colorize = colorize;
        log
    }

    /// Starts deriving a child logger.
    ///
    /// The returned [`Context`] is seeded with a copy of this logger's
    /// rendered context; fields appended to it extend the copy, and
    /// [`Context::logger`] yields the child. Deriving many children
    /// concurrently from one parent is safe because the parent's buffer is
    /// only ever read.
    ///
    /// A finished parent yields a finished child with an empty context; the
    /// child chains normally but writes nothing.
    pub fn with(&self) -> Context {
        let child = Logger {
            sink: Arc::clone(&self.sink),
            colorize: self.colorize,
            format: self.format,
            finished: self.finished,
            context: Vec::new(),
        };
        let mut enc = Encoder::new(self.colorize, self.format);
        if !self.finished {
            enc.buff.extend_from_slice(&self.context);
        }
        Context { child, enc }
    }

    /// Starts one record. Fields are appended to the returned [`Line`] and
    /// the record is flushed with `msg` or `finish`.
    pub fn start_record(&self) -> Line<'_> {
        Line {
            logger: self,
            enc: Encoder::new(self.colorize, self.format),
        }
    }

    /// Marks this logger finished and returns its context buffer to the
    /// pool. Every later print is suppressed as a harmless no-op, and
    /// children derived afterwards inherit the suppression.
    pub fn end_with(&mut self) {
        self.finished = true;
        pool::release(std::mem::take(&mut self.context));
    }

    /// Enables color styling regardless of what the sink is.
    pub fn force_color(&mut self) {
        self.colorize = true;
    }

    /// Whether this logger styles its output.
    pub fn can_colorize(&self) -> bool {
        self.colorize
    }

    /// Writes a bare message line.
    ///
    /// Text mode renders the message as plain trailing text after the
    /// context fields; JSON mode wraps it as a properly escaped `msg`
    /// field. Returns the sink error, if any, exactly once.
    pub fn print(&self, msg: &str) -> Result<()> {
        match self.format {
            Format::Text => self.print_payload(msg.as_bytes()),
            Format::Json => {
                let mut enc = Encoder::new(self.colorize, self.format);
                enc.key(MSG_KEY);
                enc.str_val(msg);
                let buff = enc.take();
                let res = self.print_payload(&buff[2..]);
                pool::release(buff);
                res
            }
        }
    }

    /// Alias for [`Logger::print`].
    pub fn println(&self, msg: &str) -> Result<()> {
        self.print(msg)
    }

    /// Writes a bare message styled as an error when color is enabled.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        if self.colorize {
            self.print(&STYLE_VAL_ERR.apply_to(msg, true))
        } else {
            self.print(msg)
        }
    }

    /// Assembles and writes one line from an already-encoded field payload
    /// (leading separator stripped). Suppressed on a finished logger.
    pub(crate) fn print_payload(&self, payload: &[u8]) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let prefix: &[u8] = if self.context.len() > 2 && self.context[0] == b',' {
            &self.context[2..]
        } else {
            &self.context
        };
        match self.format {
            Format::Text => self.write_text(prefix, payload),
            Format::Json => self.write_json(prefix, payload),
        }
    }

    /// Text shape: `<time> <context>, <payload>\n`, eliding the `", "` when
    /// the context is empty. The timestamp is wall-clock at assembly time.
    fn write_text(&self, prefix: &[u8], payload: &[u8]) -> Result<()> {
        let mut buff = pool::acquire();
        if self.colorize {
            buff.extend_from_slice(VAL_START.as_bytes());
        }
        let _ = write!(buff, "{}", Local::now().format(TIME_FORMAT));
        if self.colorize {
            buff.extend_from_slice(VAL_END.as_bytes());
        }
        buff.push(b' ');
        buff.extend_from_slice(prefix);
        if !prefix.is_empty() {
            buff.extend_from_slice(b", ");
        }
        buff.extend_from_slice(payload);
        buff.push(b'\n');
        let res = self.sink.write_line(&buff);
        pool::release(buff);
        Ok(res?)
    }

    /// JSON shape: `{"time":<unix-micros>, <context>, <payload>}\n`.
    fn write_json(&self, prefix: &[u8], payload: &[u8]) -> Result<()> {
        let mut buff = pool::acquire();
        buff.extend_from_slice(b"{\"");
        if self.colorize {
            buff.extend_from_slice(KEY_START.as_bytes());
        }
        buff.extend_from_slice(b"time");
        if self.colorize {
            buff.extend_from_slice(KEY_END.as_bytes());
        }
        buff.extend_from_slice(b"\":");
        if self.colorize {
            buff.extend_from_slice(VAL_START.as_bytes());
        }
        let _ = write!(buff, "{}", Local::now().timestamp_micros());
        if self.colorize {
            buff.extend_from_slice(VAL_END.as_bytes());
        }
        buff.extend_from_slice(b", ");
        buff.extend_from_slice(prefix);
        if !prefix.is_empty() {
            buff.extend_from_slice(b", ");
        }
        buff.extend_from_slice(payload);
        buff.extend_from_slice(b"}\n");
        let res = self.sink.write_line(&buff);
        pool::release(buff);
        Ok(res?)
    }

    /// Installs a freshly baked context buffer, recycling the old one.
    pub(crate) fn set_context(&mut self, context: Vec<u8>) {
        pool::release(std::mem::replace(&mut self.context, context));
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        pool::release(std::mem::take(&mut self.context));
    }
}
