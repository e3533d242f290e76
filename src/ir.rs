//! Intermediate representation: a tagged record per source line, built once
//! and shared by the CFG builder and the dumpers. The pattern engine itself
//! never consumes the IR — it rescans `OriginalLines` directly (see
//! `peephole`) — but the IR is cheap enough to build eagerly on every parse.

use crate::lexer::{self, Syntax};

/// The kind of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrKind {
    Blank,
    Directive,
    Label,
    Instruction,
    Text,
}

/// One IR-level record for a source line.
#[derive(Debug, Clone)]
pub struct IrLine {
    /// 1-based, matches the original line index + 1.
    pub line_no: usize,
    pub kind: IrKind,
    /// For `Blank`/`Directive`/`Label`/`Text`: the stripped code text (labels
    /// lose their trailing colon). For `Instruction`: unused (empty).
    pub text: String,
    pub mnemonic: Option<String>,
    pub operands: Option<Vec<String>>,
}

impl IrLine {
    pub fn is_jump_or_return(&self) -> bool {
        match &self.mnemonic {
            Some(m) => is_jump_mnemonic(m) || is_return_mnemonic(m),
            None => false,
        }
    }
}

/// Build the IR for a full buffer of original lines, in order.
pub fn build_ir(lines: &[String]) -> Vec<IrLine> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| build_ir_line(idx + 1, line))
        .collect()
}

fn build_ir_line(line_no: usize, line: &str) -> IrLine {
    let (code, _comment) = lexer::split_comment(line);
    let stripped = code.trim();

    if stripped.is_empty() {
        return IrLine { line_no, kind: IrKind::Blank, text: String::new(), mnemonic: None, operands: None };
    }
    if stripped.starts_with('.') {
        return IrLine { line_no, kind: IrKind::Directive, text: stripped.to_string(), mnemonic: None, operands: None };
    }
    if let Some(label) = stripped.strip_suffix(':') {
        return IrLine { line_no, kind: IrKind::Label, text: label.to_string(), mnemonic: None, operands: None };
    }
    if let Some(instr) = lexer::parse_instruction(code) {
        let operands: Vec<String> = instr
            .operands
            .split(',')
            .map(|tok| tok.trim().to_string())
            .filter(|tok| !tok.is_empty())
            .collect();
        return IrLine {
            line_no,
            kind: IrKind::Instruction,
            text: String::new(),
            mnemonic: Some(instr.mnemonic),
            operands: Some(operands),
        };
    }
    IrLine { line_no, kind: IrKind::Text, text: stripped.to_string(), mnemonic: None, operands: None }
}

/// Unconditional jump mnemonics.
const UNCONDITIONAL_JUMPS: &[&str] = &["jmp", "jmpq", "jmpl", "jmpw"];

/// Conditional jump mnemonics.
const CONDITIONAL_JUMPS: &[&str] = &[
    "jo", "jno", "js", "jns", "je", "jz", "jne", "jnz", "jb", "jnae", "jc", "jnb", "jae", "jnc",
    "jbe", "jna", "ja", "jnbe", "jl", "jnge", "jge", "jnl", "jle", "jng", "jg", "jnle", "jp", "jpe",
    "jnp", "jpo", "jcxz", "jecxz", "jrcxz",
];

pub fn is_conditional_jump(mnemonic: &str) -> bool {
    CONDITIONAL_JUMPS.iter().any(|j| j.eq_ignore_ascii_case(mnemonic))
}

pub fn is_unconditional_jump(mnemonic: &str) -> bool {
    UNCONDITIONAL_JUMPS.iter().any(|j| j.eq_ignore_ascii_case(mnemonic))
}

pub fn is_jump_mnemonic(mnemonic: &str) -> bool {
    is_conditional_jump(mnemonic) || is_unconditional_jump(mnemonic)
}

pub fn is_return_mnemonic(mnemonic: &str) -> bool {
    mnemonic.len() >= 3 && mnemonic[..3].eq_ignore_ascii_case("ret")
}

/// The asymmetric conditional-inversion table, kept verbatim from the
/// original source including its known self-inconsistency (`jnae` maps to
/// `jae`, never to `jb`, even though both would be semantically valid).
const INVERSION_PAIRS: &[(&str, &str)] = &[
    ("je", "jne"),
    ("jz", "jnz"),
    ("jne", "je"),
    ("jnz", "jz"),
    ("jb", "jnb"),
    ("jnae", "jae"),
    ("jc", "jnc"),
    ("jnb", "jb"),
    ("jae", "jnae"),
    ("jnc", "jc"),
    ("jbe", "ja"),
    ("jna", "ja"),
    ("ja", "jbe"),
    ("jnbe", "jbe"),
    ("jl", "jge"),
    ("jnge", "jge"),
    ("jge", "jl"),
    ("jnl", "jl"),
    ("jle", "jg"),
    ("jng", "jg"),
    ("jg", "jle"),
    ("jnle", "jle"),
    ("jo", "jno"),
    ("jno", "jo"),
    ("js", "jns"),
    ("jns", "js"),
    ("jp", "jnp"),
    ("jpe", "jpo"),
    ("jnp", "jp"),
    ("jpo", "jpe"),
];

/// Invert a conditional jump mnemonic per the table above. Returns `None`
/// for mnemonics the table does not cover.
pub fn invert_conditional_jump(mnemonic: &str) -> Option<&'static str> {
    INVERSION_PAIRS
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(mnemonic))
        .map(|(_, to)| *to)
}

/// Operand token an instruction line jumps to, with the indirect-call `*`
/// marker stripped, or `None` if the first operand is not label-shaped.
pub fn jump_target(line: &IrLine) -> Option<String> {
    let first = line.operands.as_ref()?.first()?;
    if lexer::is_label_operand(first) {
        Some(first.trim_start_matches('*').to_string())
    } else {
        None
    }
}

/// Detect the dialect used across a set of already-split lines, honoring an
/// explicit override.
pub fn detect_syntax(configured: Option<Syntax>, lines: &[String]) -> Syntax {
    lexer::detect_syntax(configured, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_blank_directive_label_instruction_text() {
        let ir = build_ir(&[
            "".to_string(),
            ".text".to_string(),
            "foo:".to_string(),
            "  mov rax, rbx".to_string(),
            "???".to_string(),
        ]);
        assert_eq!(ir[0].kind, IrKind::Blank);
        assert_eq!(ir[1].kind, IrKind::Directive);
        assert_eq!(ir[2].kind, IrKind::Label);
        assert_eq!(ir[2].text, "foo");
        assert_eq!(ir[3].kind, IrKind::Instruction);
        assert_eq!(ir[3].mnemonic.as_deref(), Some("mov"));
        assert_eq!(ir[3].operands.as_deref(), Some(&["rax".to_string(), "rbx".to_string()][..]));
        assert_eq!(ir[4].kind, IrKind::Text);
    }

    #[test]
    fn line_numbers_are_one_based() {
        let ir = build_ir(&["a".to_string(), "b".to_string()]);
        assert_eq!(ir[0].line_no, 1);
        assert_eq!(ir[1].line_no, 2);
    }

    #[test]
    fn inversion_table_is_asymmetric_for_jnae() {
        assert_eq!(invert_conditional_jump("jnae"), Some("jae"));
        // The table never maps jnae -> jb, even though that would also hold.
        assert_ne!(invert_conditional_jump("jnae"), Some("jb"));
    }

    #[test]
    fn jump_and_return_mnemonics() {
        assert!(is_jump_mnemonic("JMP"));
        assert!(is_conditional_jump("jle"));
        assert!(!is_conditional_jump("jmp"));
        assert!(is_return_mnemonic("retq"));
        assert!(!is_return_mnemonic("re"));
    }
}
