//! Lexical model: line splitting, comment splitting, instruction tokenization,
//! and the operand sub-grammar (register / immediate / memory / label).
//!
//! Nothing here builds a register-name table or tracks operand size; the
//! optimizer never needs more than "is this a register-shaped token" and
//! "what integer does this immediate denote".

/// Syntax dialect used to interpret operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Intel,
    Att,
}

impl Syntax {
    pub fn is_att(self) -> bool {
        matches!(self, Syntax::Att)
    }
}

/// The base mnemonics that may carry an AT&T size suffix (`b`/`w`/`l`/`q`).
const SUFFIX_MNEMONICS: &[&str] = &[
    "mov", "lea", "add", "sub", "xor", "and", "or", "cmp", "test", "shl", "shr", "sal", "sar",
];

/// Result of splitting raw input text on `\n`.
pub struct SplitLines {
    pub lines: Vec<String>,
    pub trailing_newline: bool,
}

/// Split input on `\n`, recording whether the final byte was itself a newline.
/// Per-line trailing `\r` is preserved untouched (not stripped, not inspected).
pub fn split_lines(text: &str) -> SplitLines {
    if text.is_empty() {
        return SplitLines { lines: Vec::new(), trailing_newline: false };
    }
    let trailing_newline = text.ends_with('\n');
    let body = if trailing_newline { &text[..text.len() - 1] } else { text };
    let lines = body.split('\n').map(|s| s.to_string()).collect();
    SplitLines { lines, trailing_newline }
}

/// Join optimized (or original) lines back into a single buffer, honoring the
/// trailing-newline bit recorded by [`split_lines`].
pub fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}

/// Split a source line into its code and trailing-comment portions. The
/// comment begins at the first `;` or `#` found anywhere in the line and
/// includes that marker; a `comment` of `""` means none was found.
///
/// Known sharp edge: string/character literals are not recognized, so a `#`
/// or `;` inside one is misclassified as a comment marker.
pub fn split_comment(line: &str) -> (&str, &str) {
    match line.find([';', '#']) {
        Some(idx) => (&line[..idx], &line[idx..]),
        None => (line, ""),
    }
}

/// Strip whitespace from a comment's leading edge only (matches the source's
/// `trim_comment`, which never touches the trailing edge).
pub fn trim_comment(comment: &str) -> &str {
    comment.trim_start()
}

/// A line is "directive or label" once its code portion is empty, starts
/// with `.`, or ends with `:` after stripping leading whitespace.
pub fn is_directive_or_label(code: &str) -> bool {
    let trimmed = code.trim_start();
    trimmed.is_empty() || trimmed.starts_with('.') || trimmed.ends_with(':')
}

/// The decomposition of an instruction line: `indent mnemonic spacing operands`.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub indent: String,
    pub mnemonic: String,
    pub spacing: String,
    pub operands: String,
}

/// Tokenize a non-directive, non-label code string into indent/mnemonic/spacing/operands.
/// Fails (returns `None`) unless the first non-space character starts a
/// `[A-Za-z][A-Za-z0-9.]*` run — callers fall back to treating the line as
/// opaque `text` in that case.
pub fn parse_instruction(code: &str) -> Option<Instruction> {
    let indent_len = code.len() - code.trim_start().len();
    let (indent, rest) = code.split_at(indent_len);
    let mut chars = rest.char_indices();
    let first = rest.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let mut mnemonic_end = rest.len();
    for (idx, ch) in &mut chars {
        if !(ch.is_ascii_alphanumeric() || ch == '.') {
            mnemonic_end = idx;
            break;
        }
    }
    let (mnemonic, after_mnemonic) = rest.split_at(mnemonic_end);
    let spacing_len = after_mnemonic.len() - after_mnemonic.trim_start().len();
    let (spacing, operands) = after_mnemonic.split_at(spacing_len);
    Some(Instruction {
        indent: indent.to_string(),
        mnemonic: mnemonic.to_string(),
        spacing: spacing.to_string(),
        operands: operands.to_string(),
    })
}

/// Split a lowercased mnemonic into its base form and an AT&T size suffix,
/// e.g. `movq` -> (`mov`, Some('q')). Suffix stripping is only attempted for
/// the closed set of mnemonic families in [`SUFFIX_MNEMONICS`] and only when
/// the mnemonic is exactly one character longer than the base form.
pub fn split_suffix(mnemonic_lower: &str) -> (String, Option<char>) {
    for base in SUFFIX_MNEMONICS {
        if mnemonic_lower.len() == base.len() + 1 && mnemonic_lower.starts_with(base) {
            let last = mnemonic_lower.as_bytes()[mnemonic_lower.len() - 1] as char;
            if matches!(last, 'b' | 'w' | 'l' | 'q') {
                return (base.to_string(), Some(last));
            }
            break;
        }
    }
    (mnemonic_lower.to_string(), None)
}

/// Reattach a remembered AT&T suffix to a replacement base mnemonic.
pub fn suffixed_name(base: &str, suffix: Option<char>) -> String {
    match suffix {
        Some(c) => format!("{base}{c}"),
        None => base.to_string(),
    }
}

/// The split of a two-operand operand list on the first comma, retaining the
/// exact whitespace flanking the comma so replacements reproduce it.
#[derive(Debug, Clone)]
pub struct OperandPair {
    pub op1: String,
    pub op2: String,
    pub pre_space: String,
    pub post_space: String,
}

/// Split `operands` on the first `,`. Fails if there is no comma.
pub fn parse_operands(operands: &str) -> Option<OperandPair> {
    let comma = operands.find(',')?;
    let (left, right) = (&operands[..comma], &operands[comma + 1..]);
    let left_trimmed_len = left.trim_end().len();
    let pre_space = left[left_trimmed_len..].to_string();
    let post_space_len = right.len() - right.trim_start().len();
    let post_space = right[..post_space_len].to_string();
    Some(OperandPair {
        op1: left.trim().to_string(),
        op2: right.trim().to_string(),
        pre_space,
        post_space,
    })
}

/// Decide the syntax dialect: an explicit override wins; otherwise any `%`
/// anywhere in the original lines selects AT&T, else Intel.
pub fn detect_syntax(configured: Option<Syntax>, lines: &[String]) -> Syntax {
    if let Some(s) = configured {
        return s;
    }
    if lines.iter().any(|l| l.contains('%')) {
        Syntax::Att
    } else {
        Syntax::Intel
    }
}

/// Whether a trimmed operand is register-shaped. AT&T requires a leading
/// `%`; both dialects reject `$`, `*`, `[`, `(` and require the remainder to
/// be purely `[A-Za-z0-9_]+`. No register-name table is consulted.
pub fn is_register(operand: &str, syntax: Syntax) -> bool {
    let operand = operand.trim_start();
    if operand.is_empty() {
        return false;
    }
    let rest = if syntax.is_att() {
        match operand.strip_prefix('%') {
            Some(r) => r,
            None => return false,
        }
    } else {
        operand
    };
    if rest.starts_with('$') || rest.contains(['*', '[', '(']) {
        return false;
    }
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse an operand as a signed integer immediate. `syntax = Some(Att)`
/// requires (and strips) a leading `$` and enables the AT&T octal quirk: a
/// leading `0` followed by another digit is read in base 8. Any other
/// `syntax` (including `None`, used for bare displacement text) parses the
/// literal directly in base 10 unless it carries a `0x` or trailing `h`
/// hex marker.
pub fn parse_immediate(operand: &str, syntax: Option<Syntax>) -> Option<i64> {
    let operand = operand.trim_start();
    let rest = match syntax {
        Some(Syntax::Att) => operand.strip_prefix('$')?,
        _ => operand,
    };
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(hex) = rest.strip_suffix(['h', 'H']) {
        return i64::from_str_radix(hex, 16).ok();
    }
    let base = if matches!(syntax, Some(Syntax::Att)) {
        let bytes = rest.as_bytes();
        if bytes.len() >= 2 && bytes[0] == b'0' && bytes[1].is_ascii_digit() {
            8
        } else {
            10
        }
    } else {
        10
    };
    if base == 8 {
        i64::from_str_radix(rest, 8).ok()
    } else {
        rest.parse::<i64>().ok()
    }
}

pub fn is_immediate_zero(operand: &str, syntax: Syntax) -> bool {
    parse_immediate(operand, Some(syntax)) == Some(0)
}

pub fn is_immediate_one(operand: &str, syntax: Syntax) -> bool {
    parse_immediate(operand, Some(syntax)) == Some(1)
}

pub fn is_immediate_minus_one(operand: &str, syntax: Syntax) -> bool {
    parse_immediate(operand, Some(syntax)) == Some(-1)
}

pub fn is_power_of_two(value: i64) -> bool {
    value > 0 && (value & (value - 1)) == 0
}

pub fn log2(value: i64) -> u32 {
    let mut value = value;
    let mut log = 0;
    while value > 1 {
        value >>= 1;
        log += 1;
    }
    log
}

/// A bare displacement (no explicit syntax): empty is zero in AT&T
/// base-only addressing, otherwise parse it as a plain immediate.
fn is_zero_displacement(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || parse_immediate(trimmed, None) == Some(0)
}

/// Whether `src` is a memory operand whose sole base register is `dest` with
/// zero displacement — Intel `[dest]`, AT&T `(%dest)` or `0(%dest)`. Used by
/// the `redundant_lea` pattern.
pub fn is_identity_lea(src: &str, dest: &str, syntax: Syntax) -> bool {
    if !is_register(dest, syntax) {
        return false;
    }
    let trimmed = src.trim();
    if syntax.is_att() {
        let open = match trimmed.find('(') {
            Some(i) => i,
            None => return false,
        };
        let close = match trimmed[open..].find(')') {
            Some(i) => open + i,
            None => return false,
        };
        if !trimmed[close + 1..].trim().is_empty() {
            return false;
        }
        let disp = &trimmed[..open];
        if !is_zero_displacement(disp) {
            return false;
        }
        let base = trimmed[open + 1..close].trim();
        base.eq_ignore_ascii_case(dest)
    } else {
        if !(trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2) {
            return false;
        }
        let inner = trimmed[1..trimmed.len() - 1].trim();
        inner.eq_ignore_ascii_case(dest)
    }
}

/// Whether an operand is label-shaped: optional leading `*` (indirect call
/// marker), then `[A-Za-z_.][A-Za-z0-9_.]*`.
pub fn is_label_operand(operand: &str) -> bool {
    let op = operand.trim_start_matches('*');
    let mut chars = op.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_trailing_newline() {
        let s = split_lines("mov rax, rbx\n");
        assert_eq!(s.lines, vec!["mov rax, rbx"]);
        assert!(s.trailing_newline);
    }

    #[test]
    fn splits_without_trailing_newline() {
        let s = split_lines("mov rax, rbx");
        assert_eq!(s.lines, vec!["mov rax, rbx"]);
        assert!(!s.trailing_newline);
    }

    #[test]
    fn round_trips_join() {
        let s = split_lines("a\nb\nc\n");
        assert_eq!(join_lines(&s.lines, s.trailing_newline), "a\nb\nc\n");
    }

    #[test]
    fn comment_marker_is_first_semicolon_or_hash() {
        assert_eq!(split_comment("mov rax, 0 ; zero it"), ("mov rax, 0 ", "; zero it"));
        assert_eq!(split_comment("mov rax, 0 # zero it"), ("mov rax, 0 ", "# zero it"));
        assert_eq!(split_comment("mov rax, 0"), ("mov rax, 0", ""));
    }

    #[test]
    fn directive_and_label_predicate() {
        assert!(is_directive_or_label(""));
        assert!(is_directive_or_label("  .text"));
        assert!(is_directive_or_label("foo:"));
        assert!(!is_directive_or_label("  mov rax, rbx"));
    }

    #[test]
    fn tokenizes_instruction() {
        let i = parse_instruction("  movq   %rax, %rbx").unwrap();
        assert_eq!(i.indent, "  ");
        assert_eq!(i.mnemonic, "movq");
        assert_eq!(i.spacing, "   ");
        assert_eq!(i.operands, "%rax, %rbx");
    }

    #[test]
    fn fails_on_non_letter_start() {
        assert!(parse_instruction("  42, 0").is_none());
    }

    #[test]
    fn strips_known_suffixes_only() {
        assert_eq!(split_suffix("movq"), ("mov".to_string(), Some('q')));
        assert_eq!(split_suffix("movl"), ("mov".to_string(), Some('l')));
        assert_eq!(split_suffix("mov"), ("mov".to_string(), None));
        // `ret` is not in the suffix family table.
        assert_eq!(split_suffix("retq"), ("retq".to_string(), None));
    }

    #[test]
    fn operand_pair_preserves_spacing() {
        let p = parse_operands("rax,  0").unwrap();
        assert_eq!(p.op1, "rax");
        assert_eq!(p.op2, "0");
        assert_eq!(p.pre_space, "");
        assert_eq!(p.post_space, "  ");
    }

    #[test]
    fn register_predicate_rejects_sigils() {
        assert!(is_register("rax", Syntax::Intel));
        assert!(!is_register("$1", Syntax::Intel));
        assert!(is_register("%rax", Syntax::Att));
        assert!(!is_register("rax", Syntax::Att));
        assert!(!is_register("[rax]", Syntax::Intel));
    }

    #[test]
    fn immediate_parsing_hex_and_h_suffix() {
        assert_eq!(parse_immediate("0x10", Some(Syntax::Intel)), Some(16));
        assert_eq!(parse_immediate("10h", Some(Syntax::Intel)), Some(16));
        assert_eq!(parse_immediate("$-1", Some(Syntax::Att)), Some(-1));
    }

    #[test]
    fn att_octal_quirk() {
        // Leading 0 followed by a digit is parsed as octal in AT&T.
        assert_eq!(parse_immediate("$010", Some(Syntax::Att)), Some(8));
        assert_eq!(parse_immediate("$10", Some(Syntax::Att)), Some(10));
    }

    #[test]
    fn power_of_two_and_log2() {
        assert!(is_power_of_two(8));
        assert!(!is_power_of_two(6));
        assert_eq!(log2(8), 3);
        assert_eq!(log2(1), 0);
    }

    #[test]
    fn identity_lea_intel_and_att() {
        assert!(is_identity_lea("[rax]", "rax", Syntax::Intel));
        assert!(!is_identity_lea("[rax+8]", "rax", Syntax::Intel));
        assert!(is_identity_lea("(%rax)", "rax", Syntax::Att));
        assert!(is_identity_lea("0(%rax)", "rax", Syntax::Att));
    }

    #[test]
    fn label_operand_allows_leading_star() {
        assert!(is_label_operand(".Lfoo"));
        assert!(is_label_operand("*foo_bar"));
        assert!(!is_label_operand("1foo"));
    }
}
