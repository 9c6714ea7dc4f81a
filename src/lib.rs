//! # Linelog
//!
//! A low-allocation structured logging engine. Typed key/value fields are
//! rendered into human-readable text or single-line JSON, optionally
//! decorated with ANSI styling, and written atomically to a shared sink.
//!
//! ## Key Features
//!
//! * Zero steady-state allocation: every line and logger context leases its
//!   buffer from a recycling pool and hands it back when done
//! * Context inheritance: a child logger carries its parent's fields as
//!   pre-rendered bytes, never re-encoding them
//! * Byte-exact JSON escaping that is also safe for HTML/JS embedding
//! * One atomic sink write per line; concurrent loggers never tear output
//!
//! ## Main Components
//!
//! * [`Logger`]: owns the shared sink and the inherited context, assembles
//!   final lines
//! * [`Line`]: one record under construction, with the typed field-append
//!   surface
//! * [`Context`]: a detached field builder that bakes into a child logger
//! * [`style::Style`]: descriptor the encoder turns into ANSI wrap sequences
//! * [`escape`]: the JSON/HTML-safe string escaper
//!
//! ## Quick Start
//!
//! ```
//! use linelog::{Format, Logger};
//!
//! let log = Logger::new(std::io::sink(), Format::Json);
//!
//! // Derive a child carrying inherited fields.
//! let child = log.with().str("service", "api").str("region", "eu").logger();
//!
//! // Build and flush one record.
//! child
//!     .start_record()
//!     .str("user", "alice")
//!     .int("age", 30)
//!     .bool("admin", false)
//!     .msg("login")?;
//!
//! // Bare message path.
//! child.print("ready")?;
//! # Ok::<(), linelog::Error>(())
//! ```

pub mod config;
mod encode;
pub mod error;
pub mod escape;
pub mod line;
pub mod logger;
mod pool;
pub mod style;

pub use encode::Format;
pub use error::{Error, Result};
pub use line::{Context, Line};
pub use logger::Logger;

/// Formats a message and prints it through the given logger.
///
/// # Examples
///
/// ```
/// use linelog::{logf, Format, Logger};
///
/// let log = Logger::new(std::io::sink(), Format::Text);
/// logf!(log, "listening on port {}", 8080)?;
/// # Ok::<(), linelog::Error>(())
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $($arg:tt)*) => {
        $logger.print(&format!($($arg)*))
    };
}
