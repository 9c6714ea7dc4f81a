//! Process-wide configuration for error call-site capture.
//!
//! When enabled, every `err` field is followed by an `errLoggedFrom` field
//! holding the `file:line` of the logging call. The setting lives behind a
//! single process-wide lock so it can be toggled at any time; changes affect
//! all subsequent `err` calls on every logger.

use std::panic::Location;

use lazy_static::lazy_static;
use parking_lot::RwLock;

/// Call-site capture settings.
///
/// # Examples
///
/// ```
/// use linelog::config::{set_err_call_site, err_call_site, CallSite};
///
/// set_err_call_site(CallSite { print_for_err: true, depth: 1 });
/// assert!(err_call_site().print_for_err);
/// set_err_call_site(CallSite::default());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    /// Emit an `errLoggedFrom` field after each `err` field.
    pub print_for_err: bool,
    /// How many frames above the `err` call to report. Depth 1 is the
    /// direct call site, resolved without capturing a backtrace; deeper
    /// values walk the stack and fall back to `???:0` when the frame cannot
    /// be resolved.
    pub depth: usize,
}

impl Default for CallSite {
    fn default() -> Self {
        Self {
            print_for_err: false,
            depth: 1,
        }
    }
}

lazy_static! {
    static ref ERR_CALL_SITE: RwLock<CallSite> = RwLock::new(CallSite::default());
}

/// Replaces the process-wide call-site capture settings.
pub fn set_err_call_site(cfg: CallSite) {
    *ERR_CALL_SITE.write() = cfg;
}

/// Returns a copy of the current call-site capture settings.
pub fn err_call_site() -> CallSite {
    *ERR_CALL_SITE.read()
}

/// Resolves the call site to report for an `err` field.
///
/// `caller` is the `#[track_caller]` location of the `err` call. Depth 1
/// uses it directly. Greater depths locate that frame in a captured
/// backtrace and step outward; an unresolvable frame reports `???:0` rather
/// than failing the logging call.
pub(crate) fn resolve(caller: &'static Location<'static>, depth: usize) -> (String, u32) {
    if depth <= 1 {
        return (caller.file().to_string(), caller.line());
    }
    outer_frame(caller, depth).unwrap_or_else(|| (String::from("???"), 0))
}

fn outer_frame(caller: &Location<'_>, depth: usize) -> Option<(String, u32)> {
    let backtrace = std::backtrace::Backtrace::force_capture().to_string();
    let frames: Vec<(String, u32)> = backtrace.lines().filter_map(parse_frame).collect();
    let anchor = frames
        .iter()
        .position(|(file, line)| *line == caller.line() && file.ends_with(caller.file()))?;
    frames.get(anchor + depth - 1).cloned()
}

/// Parses one `at <path>:<line>[:<col>]` line of a rendered backtrace.
fn parse_frame(text: &str) -> Option<(String, u32)> {
    let rest = text.trim_start().strip_prefix("at ")?;
    let mut it = rest.rsplitn(3, ':');
    let last = it.next()?;
    let mid = it.next()?;
    let head = it.next();
    if let (Ok(_col), Ok(line), Some(head)) = (last.parse::<u32>(), mid.parse::<u32>(), head) {
        return Some((head.to_string(), line));
    }
    if let Ok(line) = last.parse::<u32>() {
        let file = match head {
            Some(head) => format!("{}:{}", head, mid),
            None => mid.to_string(),
        };
        return Some((file, line));
    }
    None
}
