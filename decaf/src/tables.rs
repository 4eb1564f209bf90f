//! Static lookup tables: binary-operator precedence, type precedence
//! (numeric coercion ranking), and type width in bytes.

use crate::token::TokenKind;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Priority band per binary operator, matching the original's grouping:
    /// `||`=100, `&&`=200, `==`/`!=`=300, relational=400, `+`/`-`=500,
    /// `*`/`/`/`%`=600. Higher binds tighter.
    static ref BIN_OP_TABLE: HashMap<TokenKind, i32> = {
        let mut m = HashMap::new();
        m.insert(TokenKind::OrOr, 100);
        m.insert(TokenKind::AndAnd, 200);
        m.insert(TokenKind::EqualEqual, 300);
        m.insert(TokenKind::NotEqual, 300);
        m.insert(TokenKind::Less, 400);
        m.insert(TokenKind::LessEqual, 400);
        m.insert(TokenKind::Greater, 400);
        m.insert(TokenKind::GreaterEqual, 400);
        m.insert(TokenKind::Plus, 500);
        m.insert(TokenKind::Minus, 500);
        m.insert(TokenKind::Star, 600);
        m.insert(TokenKind::Slash, 600);
        m.insert(TokenKind::Percent, 600);
        m
    };

    /// Coercion rank: `int` widens to `double` when mixed, never the reverse.
    static ref TYPE_PREC_TABLE: HashMap<&'static str, i32> = {
        let mut m = HashMap::new();
        m.insert("int", 10);
        m.insert("double", 20);
        m
    };

    static ref TYPE_WIDTH_TABLE: HashMap<&'static str, i32> = {
        let mut m = HashMap::new();
        m.insert("int", 4);
        m.insert("double", 8);
        m
    };
}

/// Returns the operator's precedence band, or `-1` if it isn't a binary
/// operator (mirrors the original's "not found" sentinel).
pub fn op_priority(kind: TokenKind) -> i32 {
    *BIN_OP_TABLE.get(&kind).unwrap_or(&-1)
}

pub fn type_priority(ty: &str) -> i32 {
    *TYPE_PREC_TABLE.get(ty).unwrap_or(&-1)
}

pub fn type_width(ty: &str) -> i32 {
    *TYPE_WIDTH_TABLE.get(ty).unwrap_or(&-1)
}

/// The wider of two basic types by coercion rank, or `None` if either type
/// is unknown to the table (class types, which this compiler doesn't lower).
pub fn wider_type<'a>(a: &'a str, b: &'a str) -> Option<&'a str> {
    let pa = type_priority(a);
    let pb = type_priority(b);
    if pa < 0 || pb < 0 {
        None
    } else if pa >= pb {
        Some(a)
    } else {
        Some(b)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn precedence_bands_match_groups() {
        assert_eq!(op_priority(TokenKind::OrOr), 100);
        assert_eq!(op_priority(TokenKind::AndAnd), 200);
        assert_eq!(op_priority(TokenKind::EqualEqual), 300);
        assert_eq!(op_priority(TokenKind::NotEqual), 300);
        assert_eq!(op_priority(TokenKind::Less), 400);
        assert_eq!(op_priority(TokenKind::GreaterEqual), 400);
        assert_eq!(op_priority(TokenKind::Plus), 500);
        assert_eq!(op_priority(TokenKind::Star), 600);
    }

    #[test]
    fn non_operator_priority_is_sentinel() {
        assert_eq!(op_priority(TokenKind::Identifier), -1);
    }

    #[test]
    fn double_outranks_int() {
        assert_eq!(wider_type("int", "double"), Some("double"));
        assert_eq!(wider_type("double", "int"), Some("double"));
        assert_eq!(wider_type("int", "int"), Some("int"));
    }

    #[test]
    fn widths_match_the_original() {
        assert_eq!(type_width("int"), 4);
        assert_eq!(type_width("double"), 8);
    }
}
