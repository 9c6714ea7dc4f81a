use std::panic::Location;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::config;
use crate::encode::Encoder;
use crate::error::Result;
use crate::logger::Logger;
use crate::pool;

/// Key under which `msg`/`msgf` render the record message.
pub(crate) const MSG_KEY: &str = "msg";

/// Generates the typed field-append surface shared by [`Line`] and
/// [`Context`]. Each method frames the key, renders the value, and returns
/// the builder so calls chain; repeating a key appends a second field rather
/// than overwriting the first.
macro_rules! field_methods {
    () => {
        /// Appends a string field.
        pub fn str(mut self, key: &str, val: &str) -> Self {
            self.enc.key(key);
            self.enc.str_val(val);
            self
        }

        /// Appends an array-of-strings field. An empty slice renders `[]`.
        pub fn strs<S: AsRef<str>>(mut self, key: &str, vals: &[S]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.str_val(v.as_ref()));
            self
        }

        /// Appends raw bytes rendered as a string value. Invalid UTF-8 is
        /// escaped, never rejected.
        pub fn bytes(mut self, key: &str, val: &[u8]) -> Self {
            self.enc.key(key);
            self.enc.bytes_val(val);
            self
        }

        /// Appends a signed integer field of any width up to 64 bits.
        pub fn int<T: Into<i64>>(mut self, key: &str, val: T) -> Self {
            self.enc.key(key);
            self.enc.int_val(val.into());
            self
        }

        /// Appends an array of signed integers. An empty slice renders `[]`.
        pub fn ints<T: Copy + Into<i64>>(mut self, key: &str, vals: &[T]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.int_val((*v).into()));
            self
        }

        /// Appends an unsigned integer field of any width up to 64 bits.
        pub fn uint<T: Into<u64>>(mut self, key: &str, val: T) -> Self {
            self.enc.key(key);
            self.enc.uint_val(val.into());
            self
        }

        /// Appends an array of unsigned integers. An empty slice renders `[]`.
        pub fn uints<T: Copy + Into<u64>>(mut self, key: &str, vals: &[T]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.uint_val((*v).into()));
            self
        }

        /// Appends a 32-bit float. NaN and the infinities render `null` in
        /// JSON mode and quoted tokens in text mode; finite values use the
        /// shortest decimal that round-trips at 32 bits.
        pub fn float32(mut self, key: &str, val: f32) -> Self {
            self.enc.key(key);
            self.enc.f32_val(val);
            self
        }

        /// Appends an array of 32-bit floats.
        pub fn floats32(mut self, key: &str, vals: &[f32]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.f32_val(*v));
            self
        }

        /// Appends a 64-bit float. Same special-value rules as [`Self::float32`].
        pub fn float64(mut self, key: &str, val: f64) -> Self {
            self.enc.key(key);
            self.enc.f64_val(val);
            self
        }

        /// Appends an array of 64-bit floats.
        pub fn floats64(mut self, key: &str, vals: &[f64]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.f64_val(*v));
            self
        }

        /// Appends a boolean field.
        pub fn bool(mut self, key: &str, val: bool) -> Self {
            self.enc.key(key);
            self.enc.bool_val(val);
            self
        }

        /// Appends an array of booleans.
        pub fn bools(mut self, key: &str, vals: &[bool]) -> Self {
            self.enc.key(key);
            self.enc.array(vals, |e, v| e.bool_val(*v));
            self
        }

        /// Appends a timestamp field in the fixed `YYYY/MM/DD HH:MM:SS`
        /// layout.
        pub fn time<Tz: TimeZone>(mut self, key: &str, val: &DateTime<Tz>) -> Self
        where
            Tz::Offset: std::fmt::Display,
        {
            self.enc.key(key);
            self.enc.time_val(val);
            self
        }

        /// Appends a duration field: a human-readable unit string in text
        /// mode, a quoted nanosecond count in JSON mode.
        pub fn dur(mut self, key: &str, val: Duration) -> Self {
            self.enc.key(key);
            self.enc.dur_val(val);
            self
        }

        /// Appends an arbitrary serializable value, embedded as an escaped
        /// JSON string even in text mode. A value that fails to serialize
        /// degrades to the string `"null"`; logging never panics over a
        /// field value.
        pub fn value<T: Serialize + ?Sized>(mut self, key: &str, val: &T) -> Self {
            self.enc.key(key);
            match serde_json::to_string(val) {
                Ok(json) => self.enc.str_val(&json),
                Err(_) => self.enc.str_val("null"),
            }
            self
        }

        /// Appends the type name of `val` as a string field.
        pub fn type_of<T: ?Sized>(mut self, key: &str, _val: &T) -> Self {
            self.enc.key(key);
            self.enc.str_val(std::any::type_name::<T>());
            self
        }

        /// Appends an `err` field, or nothing at all when the error is
        /// absent. With call-site capture enabled (see [`crate::config`])
        /// an `errLoggedFrom` field holding `file:line` follows.
        #[track_caller]
        pub fn err<E: std::error::Error + ?Sized>(mut self, err: Option<&E>) -> Self {
            let Some(err) = err else {
                return self;
            };
            self.enc.key("err");
            self.enc.str_val(&err.to_string());
            let cfg = config::err_call_site();
            if cfg.print_for_err {
                let (file, line) = config::resolve(Location::caller(), cfg.depth);
                self.enc.key("errLoggedFrom");
                self.enc.str_val(&format!("{}:{}", file, line));
            }
            self
        }
    };
}

/// One log record under construction.
///
/// Obtained from [`Logger::start_record`]; field appends chain by value and
/// [`Line::msg`] or [`Line::finish`] consumes the line, assembles the final
/// output, and performs exactly one synchronized sink write. A line that is
/// dropped instead of finished writes nothing and returns its buffer to the
/// pool.
///
/// # Examples
///
/// ```
/// use linelog::{Format, Logger};
///
/// let log = Logger::new(std::io::sink(), Format::Json);
/// log.start_record()
///     .str("name", "user")
///     .int("age", 30)
///     .bool("married", true)
///     .msg("hello")?;
/// # Ok::<(), linelog::Error>(())
/// ```
pub struct Line<'a> {
    pub(crate) logger: &'a Logger,
    pub(crate) enc: Encoder,
}

impl<'a> Line<'a> {
    field_methods!();

    /// The logger this record will be written through.
    pub fn logger(&self) -> &'a Logger {
        self.logger
    }

    /// Appends the message as a `msg` field, then finishes the record.
    pub fn msg(self, msg: &str) -> Result<()> {
        self.str(MSG_KEY, msg).finish()
    }

    /// Like [`msg`](Self::msg), but renders a format string first.
    ///
    /// # Examples
    ///
    /// ```
    /// use linelog::{Format, Logger};
    ///
    /// let log = Logger::new(std::io::sink(), Format::Json);
    /// log.start_record()
    ///     .str("user", "alice")
    ///     .msgf(format_args!("retry {} of {}", 2, 5))?;
    /// # Ok::<(), linelog::Error>(())
    /// ```
    pub fn msgf(self, args: std::fmt::Arguments<'_>) -> Result<()> {
        self.msg(&args.to_string())
    }

    /// Finishes the record: strips the leading field separator, hands the
    /// payload to the logger for final assembly and the single sink write,
    /// and recycles the buffer. A record with no fields writes nothing.
    pub fn finish(mut self) -> Result<()> {
        let buff = self.enc.take();
        let res = if buff.len() > 2 {
            self.logger.print_payload(&buff[2..])
        } else {
            Ok(())
        };
        pool::release(buff);
        res
    }
}

/// A detached context builder, produced by [`Logger::with`].
///
/// Fields appended here become the inherited context of the child logger
/// that [`Context::logger`] returns. The parent's already-rendered context
/// bytes are copied in as a prefix at creation time, so deriving children
/// never re-encodes fields and never aliases the parent's buffer.
///
/// # Examples
///
/// ```
/// use linelog::{Format, Logger};
///
/// let root = Logger::new(std::io::sink(), Format::Json);
/// let child = root.with().str("service", "api").logger();
/// child.start_record().int("status", 200).msg("ok")?;
/// # Ok::<(), linelog::Error>(())
/// ```
pub struct Context {
    pub(crate) child: Logger,
    pub(crate) enc: Encoder,
}

impl Context {
    field_methods!();

    /// Bakes the accumulated fields in as the child's context and returns
    /// the child logger. The context is immutable from here on; deriving
    /// further children copies it again.
    pub fn logger(mut self) -> Logger {
        let buff = self.enc.take();
        let mut child = self.child;
        child.set_context(buff);
        child
    }
}
