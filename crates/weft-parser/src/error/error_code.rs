//! Stable codes for parser diagnostics.
//!
//! The hundreds digit names the phase that reports the code: `E0xx` for the
//! lexer, `E1xx` for the parser and `E2xx` for elaboration.

use std::fmt;

macro_rules! error_codes {
    ($($(#[$doc:meta])* $code:ident => $description:literal,)*) => {
        /// Error codes for categorizing diagnostics.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($(#[$doc])* $code,)*
        }

        impl ErrorCode {
            /// The code as written in reports, e.g. `"E001"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ErrorCode::$code => stringify!($code),)*
                }
            }

            /// A short lowercase summary of the code.
            pub fn description(self) -> &'static str {
                match self {
                    $(ErrorCode::$code => $description,)*
                }
            }
        }
    };
}

error_codes! {
    E001 => "unterminated string literal",
    E002 => "unexpected character",
    /// Valid escapes are `\n`, `\r`, `\t`, `\\`, `\"`, `\0` and `\u{...}`.
    E003 => "invalid escape sequence",
    /// Unicode escapes take 1 to 6 hexadecimal digits in braces.
    E004 => "invalid unicode escape",
    /// Out of range or a surrogate.
    E005 => "invalid unicode codepoint",
    E006 => "integer literal out of range",

    E100 => "unexpected token",
    /// The input ended inside a statement.
    E101 => "incomplete input",

    /// Names must be defined before the statement that uses them.
    E200 => "undefined name",
    E201 => "duplicate brick definition",
    /// Also reported when a `let` shadows a brick.
    E202 => "duplicate binding",
    /// Grades are 0, 1 or 2.
    E203 => "invalid grade",
    E204 => "missing compose statement",
    E205 => "repeated compose statement",
    /// A brick attribute or the `diagram` header given twice.
    E206 => "repeated attribute",
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_display_by_name() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E205.to_string(), "E205");
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E200.description(), "undefined name");
        assert_eq!(ErrorCode::E204.description(), "missing compose statement");
    }
}
