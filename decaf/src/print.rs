//! Standard-output printer: symbol-table summary, the data section, and
//! the IR listing. The only module that writes to stdout.

use crate::ir::IrProgram;
use crate::scope::{MemKind, ScopeTree};

fn mem_kind_name(kind: MemKind) -> &'static str {
    match kind {
        MemKind::Stack => "stack",
        MemKind::Heap => "heap",
    }
}

/// Per-frame symbol-table summary: name, type, memKind, offset, width.
/// Frames are printed in creation order; entries within a frame are sorted
/// by declaration offset so the listing reads top-to-bottom the way the
/// declarations appeared in source.
pub fn print_symbol_tables(scope: &ScopeTree) {
    println!("symbol tables:");
    for frame in scope.frame_ids() {
        let mut entries: Vec<_> = scope.frame_entries(frame).collect();
        if entries.is_empty() {
            continue;
        }
        entries.sort_by_key(|(_, info)| info.offset);
        println!("  {}:", scope.frame_name(frame));
        for (name, info) in entries {
            println!(
                "    {:<16} {:<8} {:<6} offset={:<4} width={}",
                name,
                info.ty,
                mem_kind_name(info.mem_kind),
                info.offset,
                info.width
            );
        }
    }
}

/// `.section .data` block holding the run-time-error message strings.
pub fn print_data_section(ir: &IrProgram) {
    if ir.data.is_empty() {
        return;
    }
    println!(".section  .data");
    for obj in &ir.data {
        println!("{}:   {}  {}", obj.name, obj.directive, obj.value);
    }
}

/// Formats one IR line in the fixed column format:
/// `{line:5d} {labels:10s} {op:>7s}: {target:>7s}{sep}{lhs:>7s}{sep}{rhs:>7s} ({frame:>8s})`
/// where `sep` is `,` when the following operand is non-empty, else a space.
pub fn format_ir_line(line: usize, entry: &crate::ir::IrEntry) -> String {
    let labels = if entry.labels.is_empty() {
        String::new()
    } else {
        let mut s = entry.labels.join(":");
        s.push(':');
        s
    };
    let sep1 = if !entry.lhs.is_empty() { ',' } else { ' ' };
    let sep2 = if !entry.rhs.is_empty() { ',' } else { ' ' };
    format!(
        "{:5} {:10} {:>7}: {:>7}{}{:>7}{}{:>7} ({:>8})",
        line, labels, entry.op, entry.target, sep1, entry.lhs, sep2, entry.rhs, entry.frame
    )
}

pub fn print_ir(ir: &IrProgram) {
    for (i, entry) in ir.entries.iter().enumerate() {
        println!("{}", format_ir_line(i + 1, entry));
    }
}

/// Trailing run-time-error target section: a `goto`-reachable label per
/// error kind, each followed by the shared `printf`/`exit` tail already
/// present in the IR stream (emitted by the lowering visitor, not here);
/// this just announces which labels are present, matching the original's
/// end-of-listing summary.
pub fn print_rt_error_targets(ir: &IrProgram) {
    if !ir.has_rt_errors() {
        return;
    }
    println!("run-time error targets:");
    for e in &ir.rt_errors {
        println!("  {} -> {}", e.label, e.data_name);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{IrEntry, IrProgram};
    use crate::token::TokenKind;

    #[test]
    fn data_section_is_silent_when_empty() {
        let ir = IrProgram::new();
        print_data_section(&ir); // should not panic, nothing asserted on stdout
        assert!(ir.data.is_empty());
    }

    #[test]
    fn ir_line_lines_up_labels_and_operand_separators() {
        let entry = IrEntry::new(TokenKind::Dec, "a", "int", "", "Env1").with_labels(vec!["L1".to_owned()]);
        assert_eq!(
            format_ir_line(1, &entry),
            "    1 L1:            dec:       a,    int         (    Env1)"
        );
    }

    #[test]
    fn ir_line_with_no_labels_and_both_operands_uses_commas_on_both_sides() {
        let entry = IrEntry::new(TokenKind::Plus, "t1", "a", "b", "Env2");
        assert_eq!(
            format_ir_line(2, &entry),
            "    2                  +:      t1,      a,      b (    Env2)"
        );
    }

    #[test]
    fn mem_kind_names_are_lowercase() {
        assert_eq!(mem_kind_name(MemKind::Stack), "stack");
        assert_eq!(mem_kind_name(MemKind::Heap), "heap");
    }
}
