//! Rendering: the optimized assembly, the plain-text optimization report,
//! and the IR/CFG dumpers used for debugging a run.

use crate::cfg::Cfg;
use crate::ir::IrLine;
use crate::lexer;

/// Running totals for a single [`crate::context::Context::optimize`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub original_lines: usize,
    pub optimized_lines: usize,
    pub replacements: usize,
    pub removals: usize,
}

/// One applied rewrite, kept for the report and for anyone inspecting a run
/// after the fact. `optimized` is `"(removed)"` for patterns that delete a
/// line outright rather than rewrite it.
#[derive(Debug, Clone)]
pub struct OptimizationEvent {
    pub line_no: usize,
    pub pattern_name: String,
    pub original: String,
    pub optimized: String,
}

impl OptimizationEvent {
    pub fn replacement(line_no: usize, pattern_name: &str, original: &str, optimized: &str) -> Self {
        OptimizationEvent {
            line_no,
            pattern_name: pattern_name.to_string(),
            original: original.to_string(),
            optimized: optimized.to_string(),
        }
    }

    pub fn removal(line_no: usize, pattern_name: &str, original: &str) -> Self {
        OptimizationEvent {
            line_no,
            pattern_name: pattern_name.to_string(),
            original: original.to_string(),
            optimized: "(removed)".to_string(),
        }
    }
}

/// Join the optimized lines back into a text buffer. `optimized` selects
/// between the rewritten buffer and the original one; a scan that legitimately
/// deletes every line (e.g. a single redundant `mov`) must still emit the
/// (empty) rewritten buffer rather than falling back to the input.
pub fn generate_assembly(original_lines: &[String], optimized_lines: &[String], optimized: bool, trailing_newline: bool) -> String {
    let lines = if optimized { optimized_lines } else { original_lines };
    lexer::join_lines(lines, trailing_newline)
}

/// Render the plain-text optimization report.
pub fn generate_report(stats: &Stats, events: &[OptimizationEvent]) -> String {
    let mut out = String::new();
    out.push_str("Optimization Report\n");
    out.push_str("==================\n\n");
    out.push_str("Summary:\n");
    out.push_str(&format!("  Original lines: {}\n", stats.original_lines));
    out.push_str(&format!("  Optimized lines: {}\n", stats.optimized_lines));
    out.push_str(&format!("  Replacements: {}\n", stats.replacements));
    out.push_str(&format!("  Removals: {}\n", stats.removals));

    if !events.is_empty() {
        out.push_str("\nOptimizations Applied:\n");
        for event in events {
            out.push_str(&format!("  Line {}: {}\n", event.line_no, event.pattern_name));
            out.push_str(&format!("    Before: {}\n", event.original));
            out.push_str(&format!("    After:  {}\n", event.optimized));
        }
    }

    out
}

/// Render the IR as `NNNN: kind text` lines, one per record, line numbers
/// zero-padded to four digits.
pub fn dump_ir_text(ir: &[IrLine]) -> String {
    let mut out = String::from("IR:\n");
    for line in ir {
        match line.kind {
            crate::ir::IrKind::Instruction => {
                let ops = line.operands.as_deref().unwrap_or(&[]).join(", ");
                out.push_str(&format!("{:04}: instr {} {}\n", line.line_no, line.mnemonic.as_deref().unwrap_or(""), ops));
            }
            kind => {
                let kind_name = match kind {
                    crate::ir::IrKind::Blank => "blank",
                    crate::ir::IrKind::Directive => "directive",
                    crate::ir::IrKind::Label => "label",
                    crate::ir::IrKind::Text => "text",
                    crate::ir::IrKind::Instruction => unreachable!(),
                };
                out.push_str(&format!("{:04}: {} {}\n", line.line_no, kind_name, line.text));
            }
        }
    }
    out
}

/// Render the CFG as `name:` headers, each block's instructions indented two
/// spaces, followed by its outgoing edges as `  -> target` lines.
pub fn dump_cfg_text(cfg: &Cfg) -> String {
    let mut out = String::from("CFG:\n");
    for block in &cfg.blocks {
        out.push_str(&block.name);
        out.push_str(":\n");
        for instr in &block.instructions {
            out.push_str("  ");
            out.push_str(&instr.mnemonic);
            for (k, operand) in instr.operands.iter().enumerate() {
                out.push_str(if k == 0 { " " } else { ", " });
                out.push_str(operand);
            }
            out.push('\n');
        }
        for edge in &cfg.edges {
            if edge.source == block.name {
                out.push_str("  -> ");
                out.push_str(&edge.target);
                out.push('\n');
            }
        }
    }
    out
}

/// Render the CFG as a Graphviz `digraph`, one boxed node per block with its
/// instructions as `\l`-terminated label lines, and one edge statement per
/// [`crate::cfg::CfgEdge`].
pub fn dump_cfg_dot(cfg: &Cfg) -> String {
    let mut out = String::from("digraph cfg {\n  node [shape=box];\n");
    for block in &cfg.blocks {
        out.push_str("  ");
        out.push_str(&block.name);
        out.push_str(" [label=\"");
        out.push_str(&block.name);
        out.push_str(":\\l");
        for instr in &block.instructions {
            out.push_str(&instr.mnemonic);
            for (k, operand) in instr.operands.iter().enumerate() {
                out.push_str(if k == 0 { " " } else { ", " });
                out.push_str(operand);
            }
            out.push_str("\\l");
        }
        out.push_str("\"];\n");
    }
    for edge in &cfg.edges {
        out.push_str("  ");
        out.push_str(&edge.source);
        out.push_str(" -> ");
        out.push_str(&edge.target);
        out.push_str(";\n");
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::cfg::build_cfg;
    use crate::ir::build_ir;

    #[test]
    fn report_with_no_events_omits_applied_section() {
        let stats = Stats { original_lines: 3, optimized_lines: 2, replacements: 1, removals: 0 };
        let report = generate_report(&stats, &[]);
        assert!(report.contains("Original lines: 3"));
        assert!(!report.contains("Optimizations Applied"));
    }

    #[test]
    fn report_lists_each_event() {
        let stats = Stats::default();
        let events = vec![
            OptimizationEvent::replacement(1, "mov_zero_to_xor", "mov eax, 0", "xor eax, eax"),
            OptimizationEvent::removal(2, "redundant_mov", "mov eax, eax"),
        ];
        let report = generate_report(&stats, &events);
        assert!(report.contains("Line 1: mov_zero_to_xor"));
        assert!(report.contains("After:  xor eax, eax"));
        assert!(report.contains("Line 2: redundant_mov"));
        assert!(report.contains("After:  (removed)"));
    }

    #[test]
    fn generate_assembly_falls_back_to_original_when_optimization_did_not_run() {
        let original = vec!["mov rax, rbx".to_string()];
        let rendered = generate_assembly(&original, &[], false, true);
        assert_eq!(rendered, "mov rax, rbx\n");
    }

    #[test]
    fn generate_assembly_honors_a_fully_emptied_optimized_buffer() {
        let original = vec!["mov rax, rax".to_string()];
        let rendered = generate_assembly(&original, &[], true, true);
        assert_eq!(rendered, "\n");
    }

    #[test]
    fn ir_dump_zero_pads_line_numbers() {
        let ir = build_ir(&["mov rax, rbx".to_string()]);
        let dump = dump_ir_text(&ir);
        assert!(dump.starts_with("IR:\n0001: instr mov rax, rbx"));
    }

    #[test]
    fn cfg_text_and_dot_dumps_include_block_names_and_edges() {
        let lines: Vec<String> = ["a:", "jmp b", "b:", "ret"].iter().map(|s| s.to_string()).collect();
        let cfg = build_cfg(&build_ir(&lines));
        let text = dump_cfg_text(&cfg);
        assert!(text.contains("a:\n  jmp b\n  -> b\n"));
        let dot = dump_cfg_dot(&cfg);
        assert!(dot.starts_with("digraph cfg {\n  node [shape=box];\n"));
        assert!(dot.contains("a -> b;\n"));
    }
}
