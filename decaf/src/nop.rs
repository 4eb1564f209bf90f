//! NOP-removal pass: the sole optimization level (`-O 0`). Re-indexes the
//! IR stream, folding labels harvested from dropped NOPs onto the nearest
//! following non-NOP entry.

use crate::ir::IrEntry;
use crate::token::TokenKind;

/// Produces a fresh stream with every label-less NOP dropped and every
/// label-bearing NOP's labels folded onto the next surviving entry. A
/// trailing NOP (the last input line) is always kept, labeled or not,
/// since it may still be a forward-jump target with nothing after it to
/// inherit onto.
pub fn remove_nops(entries: &[IrEntry]) -> Vec<IrEntry> {
    let mut out = Vec::new();
    let mut harvested: Vec<String> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let is_last = i + 1 == entries.len();
        if entry.op == TokenKind::Nop && !is_last {
            harvested.extend(entry.labels.iter().cloned());
            continue;
        }

        let mut labels = std::mem::take(&mut harvested);
        labels.extend(entry.labels.iter().cloned());
        out.push(IrEntry {
            labels,
            ..entry.clone()
        });
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn e(op: TokenKind, labels: &[&str]) -> IrEntry {
        IrEntry::new(op, "", "", "", "Env1").with_labels(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn label_less_nop_is_dropped() {
        let input = vec![e(TokenKind::Dec, &[]), e(TokenKind::Nop, &[]), e(TokenKind::Goto, &[])];
        let out = remove_nops(&input);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn labeled_nop_folds_onto_next_entry() {
        let input = vec![e(TokenKind::Dec, &[]), e(TokenKind::Nop, &["L1"]), e(TokenKind::Goto, &["L2"])];
        let out = remove_nops(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].labels, vec!["L1".to_string(), "L2".to_string()]);
    }

    #[test]
    fn trailing_nop_is_kept_even_without_labels() {
        let input = vec![e(TokenKind::Dec, &[]), e(TokenKind::Nop, &[])];
        let out = remove_nops(&input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].op, TokenKind::Nop);
    }

    #[test]
    fn no_label_from_the_original_stream_is_lost() {
        let input = vec![
            e(TokenKind::Nop, &["L1"]),
            e(TokenKind::Nop, &["L2"]),
            e(TokenKind::Dec, &["L3"]),
        ];
        let out = remove_nops(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].labels, vec!["L1", "L2", "L3"]);
    }
}
