//! The linear SSA-style IR: one entry per emitted line, plus the
//! data-section and run-time-error tables the lowering visitor fills in
//! when array-bound checks are reachable.

use crate::token::TokenKind;

#[derive(Clone, Debug, PartialEq)]
pub struct IrEntry {
    pub labels: Vec<String>,
    pub op: TokenKind,
    pub target: String,
    pub lhs: String,
    pub rhs: String,
    pub frame: String,
}

impl IrEntry {
    pub fn new(op: TokenKind, target: &str, lhs: &str, rhs: &str, frame: &str) -> IrEntry {
        IrEntry {
            labels: Vec::new(),
            op,
            target: target.to_owned(),
            lhs: lhs.to_owned(),
            rhs: rhs.to_owned(),
            frame: frame.to_owned(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> IrEntry {
        self.labels = labels;
        self
    }
}

/// A read-only data object destined for the `.data` section, e.g.
/// `(E_neg, ".asciiz", "\"Error near %d: array bound negative (%s)\"")`.
#[derive(Clone, Debug, PartialEq)]
pub struct DataObject {
    pub name: String,
    pub directive: &'static str,
    pub value: String,
}

/// One run-time-error jump target: the label array-bound checks branch to,
/// paired with the data object holding its message.
#[derive(Clone, Debug, PartialEq)]
pub struct RtErrorEntry {
    pub label: &'static str,
    pub data_name: String,
}

pub const L_NEG_BOUND: &str = "L_negBound";
pub const L_UPPER_BOUND: &str = "L_upperBound";
pub const L_E_EXIT: &str = "L_eExit";

/// The ordered IR stream plus its companion tables. Line numbers are
/// implicit (the stream's index + 1); the original keys a `std::map<int,
/// IR_Line*>` by explicit line number, which is equivalent since insertion
/// is always at the current end.
pub struct IrProgram {
    pub entries: Vec<IrEntry>,
    pub data: Vec<DataObject>,
    pub rt_errors: Vec<RtErrorEntry>,
}

impl IrProgram {
    pub fn new() -> IrProgram {
        IrProgram {
            entries: Vec::new(),
            data: Vec::new(),
            rt_errors: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: IrEntry) -> usize {
        self.entries.push(entry);
        self.entries.len()
    }

    /// Registers the negative-bound and upper-bound error data+labels the
    /// first time either is needed; idempotent across repeated calls.
    pub fn ensure_rt_errors(&mut self) {
        if self.rt_errors.is_empty() {
            self.data.push(DataObject {
                name: "E_neg".to_owned(),
                directive: ".asciiz",
                value: "\"Error near %d: array bound negative (%s)\"".to_owned(),
            });
            self.data.push(DataObject {
                name: "E_upper".to_owned(),
                directive: ".asciiz",
                value: "\"Error near %d: array bound exceeds declared size (%s)\"".to_owned(),
            });
            self.rt_errors.push(RtErrorEntry {
                label: L_NEG_BOUND,
                data_name: "E_neg".to_owned(),
            });
            self.rt_errors.push(RtErrorEntry {
                label: L_UPPER_BOUND,
                data_name: "E_upper".to_owned(),
            });
        }
    }

    pub fn has_rt_errors(&self) -> bool {
        !self.rt_errors.is_empty()
    }
}

impl Default for IrProgram {
    fn default() -> IrProgram {
        IrProgram::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ensure_rt_errors_is_idempotent() {
        let mut prog = IrProgram::new();
        prog.ensure_rt_errors();
        prog.ensure_rt_errors();
        assert_eq!(prog.rt_errors.len(), 2);
        assert_eq!(prog.data.len(), 2);
    }

    #[test]
    fn push_returns_one_based_line_number() {
        let mut prog = IrProgram::new();
        let line = prog.push(IrEntry::new(TokenKind::Dec, "a", "int", "", "Env1"));
        assert_eq!(line, 1);
    }
}
