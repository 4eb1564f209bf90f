use std::{error::Error, fmt};

/// Error produced while turning a literal's source text into a number.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseNumError {
    Int(std::num::ParseIntError),
    Float(std::num::ParseFloatError),
    Overflow { text: String, kind: &'static str },
}

impl fmt::Display for ParseNumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseNumError::Int(err) => write!(f, "integer literal: {}", err),
            ParseNumError::Float(err) => write!(f, "double literal: {}", err),
            ParseNumError::Overflow { text, kind } => {
                write!(f, "{} literal \"{}\" does not fit in 64 bits", kind, text)
            }
        }
    }
}

impl Error for ParseNumError {}

/// Parses a decimal, `0x`, `0o`, or `0b` integer literal, the way the
/// original compiler's lexer accepted `strtol`-style input.
pub fn parse_int_literal(text: &str) -> Result<i64, ParseNumError> {
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0x").or(text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o").or(text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0b").or(text.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (text, 10)
    };

    i64::from_str_radix(digits, radix).map_err(|err| {
        if *err.kind() == std::num::IntErrorKind::PosOverflow
            || *err.kind() == std::num::IntErrorKind::NegOverflow
        {
            ParseNumError::Overflow {
                text: text.to_owned(),
                kind: "integer",
            }
        } else {
            ParseNumError::Int(err)
        }
    })
}

/// Parses a double literal the way `strtod` would, reporting a distinct
/// overflow error when the magnitude cannot be represented.
pub fn parse_float_literal(text: &str) -> Result<f64, ParseNumError> {
    let value: f64 = text.parse().map_err(ParseNumError::Float)?;
    if value.is_infinite() {
        Err(ParseNumError::Overflow {
            text: text.to_owned(),
            kind: "double",
        })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decimal_int() {
        assert_eq!(parse_int_literal("42").unwrap(), 42);
    }

    #[test]
    fn hex_int() {
        assert_eq!(parse_int_literal("0xFF").unwrap(), 255);
    }

    #[test]
    fn octal_int() {
        assert_eq!(parse_int_literal("0o17").unwrap(), 15);
    }

    #[test]
    fn binary_int() {
        assert_eq!(parse_int_literal("0b101").unwrap(), 5);
    }

    #[test]
    fn int_overflow() {
        assert!(matches!(
            parse_int_literal("99999999999999999999"),
            Err(ParseNumError::Overflow { .. })
        ));
    }

    #[test]
    fn float_basic() {
        assert_eq!(parse_float_literal("2.5").unwrap(), 2.5);
    }

    #[test]
    fn float_overflow() {
        assert!(matches!(
            parse_float_literal("1e400"),
            Err(ParseNumError::Overflow { .. })
        ));
    }
}
