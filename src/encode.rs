use std::io::Write as _;

use chrono::{DateTime, TimeZone};

use crate::escape::append_json_safe;
use crate::pool;
use crate::style::{KEY_END, KEY_START, VAL_END, VAL_ERR_END, VAL_ERR_START, VAL_START};

/// Timestamp layout used for text-mode line prefixes and `time` fields.
pub(crate) const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Output mode of a logger and of every line it produces.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Format {
    /// Human-readable `key=value` pairs behind a wall-clock prefix.
    Text,
    /// One JSON object per line.
    Json,
}

/// Low-level field encoder.
///
/// Owns a pool-leased byte buffer and knows how to frame keys and render
/// every supported scalar into it, honoring the output mode and the color
/// capability. Append-only: bytes already written are never rewritten.
///
/// Every field unconditionally prefixes its own `", "` separator; whoever
/// assembles the final line strips the leading one.
pub(crate) struct Encoder {
    pub(crate) buff: Vec<u8>,
    pub(crate) colorize: bool,
    pub(crate) format: Format,
}

impl Encoder {
    pub(crate) fn new(colorize: bool, format: Format) -> Self {
        Self {
            buff: pool::acquire(),
            colorize,
            format,
        }
    }

    fn is_json(&self) -> bool {
        self.format == Format::Json
    }

    /// Appends `, "key":` (JSON) or `, key=` (text). JSON keys pass through
    /// the escaper before any style wrapping.
    pub(crate) fn key(&mut self, key: &str) {
        if self.is_json() {
            self.buff.extend_from_slice(b", \"");
        } else {
            self.buff.extend_from_slice(b", ");
        }
        if self.colorize {
            self.buff.extend_from_slice(KEY_START.as_bytes());
        }
        if self.is_json() {
            append_json_safe(&mut self.buff, key.as_bytes());
        } else {
            self.buff.extend_from_slice(key.as_bytes());
        }
        if self.colorize {
            self.buff.extend_from_slice(KEY_END.as_bytes());
        }
        if self.is_json() {
            self.buff.extend_from_slice(b"\":");
        } else {
            self.buff.push(b'=');
        }
    }

    fn val_start(&mut self) {
        if self.colorize {
            self.buff.extend_from_slice(VAL_START.as_bytes());
        }
    }

    fn val_end(&mut self) {
        if self.colorize {
            self.buff.extend_from_slice(VAL_END.as_bytes());
        }
    }

    pub(crate) fn int_val(&mut self, val: i64) {
        self.val_start();
        // Writing to a Vec cannot fail.
        let _ = write!(self.buff, "{}", val);
        self.val_end();
    }

    pub(crate) fn uint_val(&mut self, val: u64) {
        self.val_start();
        let _ = write!(self.buff, "{}", val);
        self.val_end();
    }

    pub(crate) fn bool_val(&mut self, val: bool) {
        self.val_start();
        self.buff
            .extend_from_slice(if val { b"true" as &[u8] } else { b"false" });
        self.val_end();
    }

    pub(crate) fn str_val(&mut self, val: &str) {
        self.bytes_val(val.as_bytes());
    }

    /// Renders a quoted string value. Text mode passes the bytes through
    /// raw; JSON mode routes them through the escaper.
    pub(crate) fn bytes_val(&mut self, val: &[u8]) {
        self.buff.push(b'"');
        self.val_start();
        if self.is_json() {
            append_json_safe(&mut self.buff, val);
        } else {
            self.buff.extend_from_slice(val);
        }
        self.val_end();
        self.buff.push(b'"');
    }

    pub(crate) fn f64_val(&mut self, val: f64) {
        if self.float_special(val) {
            return;
        }
        self.val_start();
        let _ = write!(self.buff, "{}", val);
        self.val_end();
    }

    pub(crate) fn f32_val(&mut self, val: f32) {
        if self.float_special(f64::from(val)) {
            return;
        }
        self.val_start();
        let _ = write!(self.buff, "{}", val);
        self.val_end();
    }

    /// NaN and the infinities are not valid JSON numerals. JSON mode renders
    /// them as `null`; text mode renders quoted tokens. Either way they take
    /// the error style so they stand out on a colored terminal.
    fn float_special(&mut self, val: f64) -> bool {
        let token: &[u8] = if val.is_nan() {
            if self.is_json() {
                b"null"
            } else {
                "'NaN'".as_bytes()
            }
        } else if val == f64::NEG_INFINITY {
            if self.is_json() {
                b"null"
            } else {
                "'-\u{221e}'".as_bytes()
            }
        } else if val == f64::INFINITY {
            if self.is_json() {
                b"null"
            } else {
                "'\u{221e}'".as_bytes()
            }
        } else {
            return false;
        };
        if self.colorize {
            self.buff.extend_from_slice(VAL_ERR_START.as_bytes());
        }
        self.buff.extend_from_slice(token);
        if self.colorize {
            self.buff.extend_from_slice(VAL_ERR_END.as_bytes());
        }
        true
    }

    /// Timestamps render in the fixed `YYYY/MM/DD HH:MM:SS` layout, quoted
    /// in JSON mode so the document stays valid.
    pub(crate) fn time_val<Tz: TimeZone>(&mut self, val: &DateTime<Tz>)
    where
        Tz::Offset: std::fmt::Display,
    {
        if self.is_json() {
            self.buff.push(b'"');
        }
        self.val_start();
        let _ = write!(self.buff, "{}", val.format(TIME_FORMAT));
        self.val_end();
        if self.is_json() {
            self.buff.push(b'"');
        }
    }

    /// Durations render as a human-readable unit string in text mode and as
    /// a quoted integer nanosecond count in JSON mode.
    pub(crate) fn dur_val(&mut self, val: std::time::Duration) {
        if self.is_json() {
            self.buff.push(b'"');
            self.val_start();
            let _ = write!(self.buff, "{}", val.as_nanos());
            self.val_end();
            self.buff.push(b'"');
        } else {
            self.str_val(&format!("{:?}", val));
        }
    }

    /// Renders `[v0, v1, ...]`, encoding each element with `each`. An empty
    /// slice renders `[]`.
    pub(crate) fn array<T>(&mut self, vals: &[T], mut each: impl FnMut(&mut Encoder, &T)) {
        self.buff.push(b'[');
        for (i, val) in vals.iter().enumerate() {
            if i > 0 {
                self.buff.extend_from_slice(b", ");
            }
            each(self, val);
        }
        self.buff.push(b']');
    }

    /// Takes the accumulated bytes, leaving the encoder empty.
    pub(crate) fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buff)
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        pool::release(std::mem::take(&mut self.buff));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_encoder() -> Encoder {
        Encoder::new(false, Format::Text)
    }

    fn json_encoder() -> Encoder {
        Encoder::new(false, Format::Json)
    }

    fn contents(enc: &Encoder) -> &str {
        std::str::from_utf8(&enc.buff).unwrap()
    }

    #[test]
    fn key_framing_per_mode() {
        let mut enc = text_encoder();
        enc.key("k");
        assert_eq!(contents(&enc), ", k=");

        let mut enc = json_encoder();
        enc.key("k");
        assert_eq!(contents(&enc), ", \"k\":");
    }

    #[test]
    fn json_keys_are_escaped() {
        let mut enc = json_encoder();
        enc.key("a\"b");
        assert_eq!(contents(&enc), ", \"a\\\"b\":");
    }

    #[test]
    fn empty_array_renders_brackets() {
        let mut enc = json_encoder();
        let vals: [i64; 0] = [];
        enc.array(&vals, |e, v| e.int_val(*v));
        assert_eq!(contents(&enc), "[]");
    }

    #[test]
    fn float_specials_per_mode() {
        let mut enc = json_encoder();
        enc.f64_val(f64::NAN);
        assert_eq!(contents(&enc), "null");

        let mut enc = text_encoder();
        enc.f64_val(f64::NEG_INFINITY);
        assert_eq!(contents(&enc), "'-\u{221e}'");
        let buff = enc.take();
        assert!(buff.ends_with("'".as_bytes()));
    }

    #[test]
    fn duration_modes() {
        let mut enc = json_encoder();
        enc.dur_val(std::time::Duration::from_secs(2));
        assert_eq!(contents(&enc), "\"2000000000\"");

        let mut enc = text_encoder();
        enc.dur_val(std::time::Duration::from_millis(150));
        assert_eq!(contents(&enc), "\"150ms\"");
    }
}
