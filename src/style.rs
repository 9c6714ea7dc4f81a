//! Terminal style adapter.
//!
//! A [`Style`] describes how a token should look; rendering it yields opaque
//! start/end escape sequences that the encoder splices around
//! already-encoded text. Styling never changes the logical content of a
//! line: stripping the sequences back out recovers the unstyled bytes
//! exactly.
//!
//! Whether a sink can actually display color is a capability decided at
//! logger construction (or forced with `force_color`); a style rendered
//! without the capability yields empty sequences, making styling a true
//! no-op.

use colored::Color;
use lazy_static::lazy_static;

/// A logical style: a foreground color plus an optional dim attribute.
///
/// # Examples
///
/// ```
/// use colored::Color;
/// use linelog::style::Style;
///
/// let style = Style { color: Color::Red, dimmed: false };
/// assert_eq!(style.start(true), "\x1b[31m");
/// assert_eq!(style.end(true), "\x1b[0m");
/// assert_eq!(style.start(false), "");
/// ```
#[derive(Clone, Debug)]
pub struct Style {
    /// Foreground color of the token.
    pub color: Color,
    /// Render with reduced intensity (SGR attribute 2).
    pub dimmed: bool,
}

impl Style {
    /// Renders the sequence that begins this style, or an empty string when
    /// the sink has no color capability.
    pub fn start(&self, enabled: bool) -> String {
        if !enabled {
            return String::new();
        }
        let mut seq = String::from("\x1b[");
        if self.dimmed {
            seq.push_str("2;");
        }
        seq.push_str(&self.color.to_fg_str());
        seq.push('m');
        seq
    }

    /// Renders the sequence that ends this style (a full attribute reset),
    /// or an empty string when the sink has no color capability.
    pub fn end(&self, enabled: bool) -> String {
        if enabled {
            String::from("\x1b[0m")
        } else {
            String::new()
        }
    }

    /// Wraps `text` in this style when `enabled`, otherwise returns it
    /// unchanged.
    pub fn apply_to(&self, text: &str, enabled: bool) -> String {
        if !enabled {
            return text.to_string();
        }
        format!("{}{}{}", self.start(true), text, self.end(true))
    }
}

/// Style used for field keys.
pub(crate) static STYLE_KEY: Style = Style {
    color: Color::BrightBlack,
    dimmed: false,
};

/// Style used for field values.
pub(crate) static STYLE_VAL: Style = Style {
    color: Color::BrightBlack,
    dimmed: true,
};

/// Style used for error-valued tokens (NaN, infinities, error messages).
pub(crate) static STYLE_VAL_ERR: Style = Style {
    color: Color::Red,
    dimmed: false,
};

lazy_static! {
    pub(crate) static ref KEY_START: String = STYLE_KEY.start(true);
    pub(crate) static ref KEY_END: String = STYLE_KEY.end(true);
    pub(crate) static ref VAL_START: String = STYLE_VAL.start(true);
    pub(crate) static ref VAL_END: String = STYLE_VAL.end(true);
    pub(crate) static ref VAL_ERR_START: String = STYLE_VAL_ERR.start(true);
    pub(crate) static ref VAL_ERR_END: String = STYLE_VAL_ERR.end(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_style_is_a_noop() {
        let style = Style {
            color: Color::Red,
            dimmed: true,
        };
        assert_eq!(style.start(false), "");
        assert_eq!(style.end(false), "");
        assert_eq!(style.apply_to("x", false), "x");
    }

    #[test]
    fn dimmed_style_carries_both_attributes() {
        let style = Style {
            color: Color::BrightBlack,
            dimmed: true,
        };
        let start = style.start(true);
        assert!(start.starts_with("\x1b[2;"));
        assert!(start.ends_with('m'));
    }
}
