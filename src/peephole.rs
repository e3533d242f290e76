//! The rewrite catalog: a single left-to-right scan over the original lines,
//! each stop trying one pattern per line and advancing a cursor by however
//! many extra lines it consumed. Order matters here — earlier patterns
//! shadow later ones that would also match (e.g. `sub rax, rax` is caught by
//! the self-move family before it ever reaches the zero-idiom patterns), and
//! the catalog as a whole is not confluent: running it twice over its own
//! output can still find more to do.

use crate::ir;
use crate::lexer::{self, Syntax};
use crate::report::OptimizationEvent;

/// What applying the catalog to one line produced: zero or more lines to
/// emit in its place, the audit event if a pattern fired, and how many of
/// the following lines were consumed alongside it.
pub struct LineOutcome {
    pub output: Vec<String>,
    pub events: Vec<OptimizationEvent>,
    pub replaced: bool,
    pub removed: bool,
    pub skip_lines: usize,
}

impl LineOutcome {
    fn unchanged(line: &str) -> Self {
        LineOutcome { output: vec![line.to_string()], events: Vec::new(), replaced: false, removed: false, skip_lines: 0 }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// A decoded instruction line: mnemonic family, operand pair (if any), and
/// syntax-resolved dest/src roles. Used for both the line under the cursor
/// and the lookahead lines multi-line patterns consult.
struct Parsed {
    indent: String,
    spacing: String,
    base: String,
    suffix: Option<char>,
    has_two_ops: bool,
    pre_space: String,
    post_space: String,
    dest: String,
    src: String,
    dest_reg: bool,
    src_reg: bool,
}

fn parse_line(code: &str, syntax: Syntax) -> Option<Parsed> {
    if lexer::is_directive_or_label(code) {
        return None;
    }
    let instr = lexer::parse_instruction(code)?;
    let lower = instr.mnemonic.to_lowercase();
    let (base, suffix) = lexer::split_suffix(&lower);
    let pair = lexer::parse_operands(&instr.operands);
    let has_two_ops = pair.is_some();
    let (op1, op2, pre_space, post_space) = match &pair {
        Some(p) => (p.op1.clone(), p.op2.clone(), p.pre_space.clone(), p.post_space.clone()),
        None => (String::new(), String::new(), String::new(), String::new()),
    };
    let (dest, src) = if has_two_ops {
        if syntax.is_att() { (op2, op1) } else { (op1, op2) }
    } else {
        (String::new(), String::new())
    };
    let dest_reg = has_two_ops && lexer::is_register(&dest, syntax);
    let src_reg = has_two_ops && lexer::is_register(&src, syntax);
    Some(Parsed {
        indent: instr.indent,
        spacing: instr.spacing,
        base,
        suffix,
        has_two_ops,
        pre_space,
        post_space,
        dest,
        src,
        dest_reg,
        src_reg,
    })
}

/// A mov whose line carries no trailing comment, decoded into (dest, src).
/// Patterns 26/27 require this of their lookahead line so the comment never
/// needs to be merged into the rewritten line.
fn mov_no_comment(line: &str, syntax: Syntax) -> Option<(String, String)> {
    let (code, comment) = lexer::split_comment(line);
    if !is_blank(comment) {
        return None;
    }
    let parsed = parse_line(code, syntax)?;
    if parsed.base == "mov" && parsed.has_two_ops && parsed.dest_reg && parsed.src_reg {
        Some((parsed.dest, parsed.src))
    } else {
        None
    }
}

fn identity_removal(pattern: &str, line: &str, indent: &str, comment: &str, line_no: usize) -> LineOutcome {
    let trimmed_comment = lexer::trim_comment(comment);
    let output = if is_blank(trimmed_comment) { Vec::new() } else { vec![format!("{indent}{trimmed_comment}")] };
    LineOutcome {
        output,
        events: vec![OptimizationEvent::removal(line_no, pattern, line)],
        replaced: false,
        removed: true,
        skip_lines: 0,
    }
}

fn replacement(pattern: &str, line: &str, comment: &str, new_code: &str, line_no: usize) -> LineOutcome {
    let trimmed_comment = lexer::trim_comment(comment);
    let new_line = if is_blank(trimmed_comment) { new_code.to_string() } else { format!("{new_code} {trimmed_comment}") };
    LineOutcome {
        output: vec![new_line.clone()],
        events: vec![OptimizationEvent::replacement(line_no, pattern, line, &new_line)],
        replaced: true,
        removed: false,
        skip_lines: 0,
    }
}

/// A reusable "binary op with a register dest whose src matches a predicate"
/// replacement shape: `mnemonic dest, src` -> `new_mnemonic dest[, dest]`.
/// `keep_operand` controls whether the new instruction repeats `dest` as a
/// second operand (the zero/self idioms) or drops it (inc/dec).
fn binary_to_unary_or_self(
    pattern: &str,
    line: &str,
    comment: &str,
    p: &Parsed,
    new_base: &str,
    keep_operand: bool,
    line_no: usize,
) -> LineOutcome {
    let name = lexer::suffixed_name(new_base, p.suffix);
    let new_code = if keep_operand {
        format!("{}{}{}{},{}{}{}", p.indent, name, p.spacing, p.dest, p.pre_space, p.post_space, p.dest)
    } else {
        format!("{}{}{}{}", p.indent, name, p.spacing, p.dest)
    };
    replacement(pattern, line, comment, &new_code, line_no)
}

/// Patterns 1 and 2: `mov` whose source is the destination register, or the
/// immediate zero.
fn redundant_or_zero_mov(line: &str, comment: &str, indent: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if p.base != "mov" || !p.has_two_ops {
        return None;
    }
    if p.dest_reg && p.src_reg && p.dest.eq_ignore_ascii_case(&p.src) {
        return Some(identity_removal("redundant_mov", line, indent, comment, line_no));
    }
    if p.dest_reg && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(binary_to_unary_or_self("mov_zero_to_xor", line, comment, p, "xor", true, line_no));
    }
    None
}

/// Pattern 24: `lea dest, [dest]` (or the AT&T equivalent) does nothing.
fn redundant_lea(line: &str, comment: &str, indent: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if p.base != "lea" || !p.has_two_ops {
        return None;
    }
    if lexer::is_identity_lea(&p.src, &p.dest, syntax) {
        Some(identity_removal("redundant_lea", line, indent, comment, line_no))
    } else {
        None
    }
}

/// Pattern 26: two register movs into the same destination back to back —
/// the first store is dead. Only the lookahead line is required to be
/// comment-free (matching `asmopt_is_mov_no_comment` in the original,
/// which is never applied to the line under the cursor): a comment on the
/// first `mov` is silently dropped along with the dead store itself.
fn dead_store_move(lines: &[String], idx: usize, p: &Parsed, syntax: Syntax, line_no: usize) -> Option<LineOutcome> {
    if p.base != "mov" || !p.has_two_ops || !p.dest_reg || !p.src_reg {
        return None;
    }
    let next_line = lines.get(idx + 1)?;
    let (next_dest, next_src) = mov_no_comment(next_line, syntax)?;
    if next_dest.eq_ignore_ascii_case(&p.dest) && !next_src.eq_ignore_ascii_case(&p.src) {
        let combined = format!("{}\n{}", lines[idx], next_line);
        Some(LineOutcome {
            output: vec![next_line.clone()],
            events: vec![OptimizationEvent::replacement(line_no, "dead_store_move", &combined, next_line)],
            replaced: true,
            removed: true,
            skip_lines: 1,
        })
    } else {
        None
    }
}

/// Pattern 27: two independent register movs — hoist the second ahead of
/// the first so a scheduler has more to work with. The first line is
/// retained verbatim (just reordered), so its comment is never lost even
/// though only the lookahead line's comment is checked, matching the
/// original's `asmopt_is_mov_no_comment(next_line, ...)` call.
fn schedule_swap_move(lines: &[String], idx: usize, p: &Parsed, syntax: Syntax, line_no: usize) -> Option<LineOutcome> {
    if p.base != "mov" || !p.has_two_ops || !p.dest_reg || !p.src_reg {
        return None;
    }
    let next_line = lines.get(idx + 1)?;
    let (next_dest, next_src) = mov_no_comment(next_line, syntax)?;
    let independent = !p.dest.eq_ignore_ascii_case(&next_dest)
        && !p.dest.eq_ignore_ascii_case(&next_src)
        && !p.src.eq_ignore_ascii_case(&next_dest)
        && !p.src.eq_ignore_ascii_case(&next_src);
    if independent {
        Some(LineOutcome {
            output: vec![next_line.clone(), lines[idx].clone()],
            events: vec![OptimizationEvent::replacement(line_no, "schedule_swap_move", &lines[idx], next_line)],
            replaced: true,
            removed: false,
            skip_lines: 1,
        })
    } else {
        None
    }
}

/// Pattern 28: `mov r, [mem]` / `add r, imm` / `mov [mem], r` collapses into
/// a single memory-operand add, the three-line load-modify-store idiom.
fn load_modify_store(lines: &[String], idx: usize, line: &str, comment: &str, p: &Parsed, syntax: Syntax, line_no: usize) -> Option<LineOutcome> {
    if p.base != "mov" || !p.has_two_ops || !p.dest_reg || p.src.is_empty() || p.src_reg {
        return None;
    }
    let add_line = lines.get(idx + 1)?;
    let store_line = lines.get(idx + 2)?;
    let (add_code, add_comment) = lexer::split_comment(add_line);
    let add_p = parse_line(add_code, syntax)?;
    if add_p.base != "add" || !add_p.has_two_ops || !lexer::is_register(&add_p.dest, syntax) {
        return None;
    }
    if !add_p.dest.eq_ignore_ascii_case(&p.dest) || lexer::parse_immediate(&add_p.src, Some(syntax)).is_none() {
        return None;
    }
    let (store_code, store_comment) = lexer::split_comment(store_line);
    let store_p = parse_line(store_code, syntax)?;
    if store_p.base != "mov" || !store_p.has_two_ops || !lexer::is_register(&store_p.src, syntax) {
        return None;
    }
    if !store_p.src.eq_ignore_ascii_case(&p.dest) || !store_p.dest.eq_ignore_ascii_case(&p.src) {
        return None;
    }

    let add_name = lexer::suffixed_name("add", add_p.suffix);
    let new_code = format!("{}{}{}{},{}{}{}", p.indent, add_name, p.spacing, store_p.dest, add_p.pre_space, add_p.post_space, add_p.src);
    let trimmed_comment = lexer::trim_comment(comment);
    let new_line = if is_blank(trimmed_comment) { new_code } else { format!("{new_code} {trimmed_comment}") };

    let mut output = vec![new_line.clone()];
    let add_trimmed = lexer::trim_comment(add_comment);
    if !is_blank(add_trimmed) {
        output.push(format!("{}{}", add_p.indent, add_trimmed));
    }
    let store_trimmed = lexer::trim_comment(store_comment);
    if !is_blank(store_trimmed) {
        output.push(format!("{}{}", store_p.indent, store_trimmed));
    }

    let combined = format!("{line}\n{add_line}\n{store_line}");
    Some(LineOutcome {
        output,
        events: vec![OptimizationEvent::replacement(line_no, "load_modify_store", &combined, &new_line)],
        replaced: true,
        removed: true,
        skip_lines: 2,
    })
}

/// Pattern 12: `mov a, b` immediately followed by `mov b, a` — the second
/// move just undoes the first.
fn redundant_move_pair(lines: &[String], idx: usize, line: &str, p: &Parsed, syntax: Syntax, line_no: usize) -> Option<LineOutcome> {
    if p.base != "mov" || !p.has_two_ops || !p.dest_reg || !p.src_reg {
        return None;
    }
    let next_line = lines.get(idx + 1)?;
    let (next_code, next_comment) = lexer::split_comment(next_line);
    let next_p = parse_line(next_code, syntax)?;
    if next_p.base != "mov" || !next_p.has_two_ops || !next_p.dest_reg || !next_p.src_reg {
        return None;
    }
    if !p.dest.eq_ignore_ascii_case(&next_p.src) || !p.src.eq_ignore_ascii_case(&next_p.dest) {
        return None;
    }
    let combined = format!("{line}\n{next_line}");
    let mut output = vec![line.to_string()];
    let trimmed_next = lexer::trim_comment(next_comment);
    if !is_blank(trimmed_next) {
        output.push(format!("{}{}", next_p.indent, trimmed_next));
    }
    Some(LineOutcome {
        output,
        events: vec![
            OptimizationEvent {
                line_no,
                pattern_name: "redundant_move_pair".to_string(),
                original: combined,
                optimized: line.to_string(),
            },
            OptimizationEvent::removal(line_no + 1, "redundant_move_pair", next_line),
        ],
        replaced: true,
        removed: true,
        skip_lines: 1,
    })
}

/// Patterns 13/14/19/20: a register operated against itself collapses to a
/// flag-only instruction (`test`) or, for `sub`/`and`, to the zero idiom.
fn self_operand_to_test_or_zero(line: &str, comment: &str, p: &Parsed, line_no: usize) -> Option<LineOutcome> {
    if !p.has_two_ops || !p.dest_reg || !p.src_reg || !p.dest.eq_ignore_ascii_case(&p.src) {
        return None;
    }
    match p.base.as_str() {
        "sub" => Some(binary_to_unary_or_self("sub_self_to_xor", line, comment, p, "xor", true, line_no)),
        "and" => Some(binary_to_unary_or_self("and_self_to_test", line, comment, p, "test", true, line_no)),
        "or" => Some(binary_to_unary_or_self("or_self_to_test", line, comment, p, "test", true, line_no)),
        "cmp" => Some(binary_to_unary_or_self("cmp_self_to_test", line, comment, p, "test", true, line_no)),
        _ => None,
    }
}

/// Patterns 15/17/18: comparisons/arithmetic against an immediate that
/// degenerates to a cheaper equivalent instruction.
fn immediate_idiom(line: &str, comment: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if !p.has_two_ops || !p.dest_reg {
        return None;
    }
    if p.base == "and" && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(binary_to_unary_or_self("and_zero_to_xor", line, comment, p, "xor", true, line_no));
    }
    if p.base == "cmp" && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(binary_to_unary_or_self("cmp_zero_to_test", line, comment, p, "test", true, line_no));
    }
    if p.base == "add" && lexer::is_immediate_minus_one(&p.src, syntax) {
        return Some(binary_to_unary_or_self("add_minus_one_to_dec", line, comment, p, "dec", false, line_no));
    }
    if p.base == "sub" && lexer::is_immediate_minus_one(&p.src, syntax) {
        return Some(binary_to_unary_or_self("sub_minus_one_to_inc", line, comment, p, "inc", false, line_no));
    }
    None
}

/// Pattern 21: an unconditional jump to the label that immediately follows
/// it is a no-op.
fn fallthrough_jump(lines: &[String], idx: usize, line: &str, comment: &str, indent: &str, operands: &str, base: &str, line_no: usize) -> Option<LineOutcome> {
    if operands.trim().is_empty() || !ir::is_unconditional_jump(base) || operands.contains(',') {
        return None;
    }
    let target = operands.trim();
    let next_line = lines.get(idx + 1)?;
    let (next_code, _) = lexer::split_comment(next_line);
    if is_blank(next_code) {
        return None;
    }
    let trimmed = next_code.trim();
    let label = trimmed.strip_suffix(':')?;
    if label == target {
        Some(identity_removal("fallthrough_jump", line, indent, comment, line_no))
    } else {
        None
    }
}

/// Pattern 25: `jcc target` immediately followed by `jmp other` immediately
/// followed by `target:` — invert the condition and drop the unconditional
/// jump, since control never needed two branches here.
fn invert_conditional_jump(
    lines: &[String],
    idx: usize,
    line: &str,
    comment: &str,
    indent: &str,
    spacing: &str,
    operands: &str,
    base: &str,
    line_no: usize,
) -> Option<LineOutcome> {
    if operands.trim().is_empty() || !ir::is_conditional_jump(base) || operands.contains(',') {
        return None;
    }
    let inverted = ir::invert_conditional_jump(base)?;
    let cond_target = operands.trim();
    if !lexer::is_label_operand(cond_target) {
        return None;
    }
    let next_line = lines.get(idx + 1)?;
    let label_line = lines.get(idx + 2)?;
    let (next_code, next_comment) = lexer::split_comment(next_line);
    if lexer::is_directive_or_label(next_code) {
        return None;
    }
    let next_instr = lexer::parse_instruction(next_code)?;
    let next_lower = next_instr.mnemonic.to_lowercase();
    if !ir::is_unconditional_jump(&next_lower) || next_instr.operands.contains(',') {
        return None;
    }
    let jmp_target = next_instr.operands.trim();
    if jmp_target.is_empty() || !lexer::is_label_operand(jmp_target) {
        return None;
    }
    let (label_code, _) = lexer::split_comment(label_line);
    let label_trimmed = label_code.trim();
    let label_name = label_trimmed.strip_suffix(':')?;
    if label_name != cond_target {
        return None;
    }

    let new_code = format!("{indent}{inverted}{spacing}{jmp_target}");
    let trimmed_comment = lexer::trim_comment(comment);
    let new_line = if is_blank(trimmed_comment) { new_code } else { format!("{new_code} {trimmed_comment}") };

    let combined = format!("{line}\n{next_line}");
    let mut output = vec![new_line.clone()];
    let next_trimmed_comment = lexer::trim_comment(next_comment);
    if !is_blank(next_trimmed_comment) {
        output.push(format!("{}{}", next_instr.indent, next_trimmed_comment));
    }
    Some(LineOutcome {
        output,
        events: vec![OptimizationEvent::replacement(line_no, "invert_conditional_jump", &combined, &new_line)],
        replaced: true,
        removed: true,
        skip_lines: 1,
    })
}

/// Pattern 23: `bsf` is AMD Zen's slow path for a BMI1-capable CPU; swap in
/// `tzcnt` when the surrounding code already proves the source is nonzero
/// (the undefined-at-zero behavior of `bsf`/`tzcnt` then can't be observed).
fn bsf_to_tzcnt(lines: &[String], line: &str, comment: &str, p: &Parsed, line_no: usize, syntax: Syntax, target_zen: bool) -> Option<LineOutcome> {
    if p.base != "bsf" || !p.has_two_ops || !p.dest_reg || !p.src_reg || !target_zen {
        return None;
    }
    if !is_zero_guarded(lines, line_no, &p.src, syntax) {
        return None;
    }
    Some(binary_to_unary_or_self("bsf_to_tzcnt", line, comment, p, "tzcnt", true, line_no))
}

/// The two-instructions-back window `bsf_to_tzcnt` requires: a `test s, s`
/// or `cmp s, 0` immediately followed by a `je`/`jz`, both ending at the
/// line before the `bsf` under the cursor.
fn is_zero_guarded(lines: &[String], line_no: usize, src: &str, syntax: Syntax) -> bool {
    if line_no < 3 {
        return false;
    }
    let jump_idx = line_no - 2;
    let test_idx = line_no - 3;
    let (Some(jump_line), Some(test_line)) = (lines.get(jump_idx), lines.get(test_idx)) else { return false };

    let (jump_code, _) = lexer::split_comment(jump_line);
    if lexer::is_directive_or_label(jump_code) {
        return false;
    }
    let Some(jump_instr) = lexer::parse_instruction(jump_code) else { return false };
    let jump_lower = jump_instr.mnemonic.to_lowercase();
    if jump_lower != "jz" && jump_lower != "je" {
        return false;
    }

    let (test_code, _) = lexer::split_comment(test_line);
    if lexer::is_directive_or_label(test_code) {
        return false;
    }
    let Some(test_p) = parse_line(test_code, syntax) else { return false };
    if !test_p.has_two_ops {
        return false;
    }
    match test_p.base.as_str() {
        "test" => test_p.dest_reg && test_p.src_reg && test_p.dest.eq_ignore_ascii_case(src) && test_p.src.eq_ignore_ascii_case(src),
        "cmp" => test_p.dest_reg && test_p.dest.eq_ignore_ascii_case(src) && lexer::is_immediate_zero(&test_p.src, syntax),
        _ => false,
    }
}

/// Pattern 3/4: `imul`/`mul` by one is a no-op; by a power of two is a
/// shift.
fn multiply_idiom(line: &str, comment: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if p.base != "imul" || !p.has_two_ops {
        return None;
    }
    if p.dest_reg && lexer::is_immediate_one(&p.src, syntax) {
        return Some(identity_removal("mul_by_one", line, &p.indent, comment, line_no));
    }
    let value = lexer::parse_immediate(&p.src, Some(syntax))?;
    if p.dest_reg && lexer::is_power_of_two(value) {
        let shift = lexer::log2(value);
        let shift_str = if syntax.is_att() { format!("${shift}") } else { shift.to_string() };
        let name = lexer::suffixed_name("shl", p.suffix);
        let new_code = format!("{}{}{}{},{}{}{}", p.indent, name, p.spacing, p.dest, p.pre_space, p.post_space, shift_str);
        return Some(replacement("mul_power_of_2_to_shift", line, comment, &new_code, line_no));
    }
    None
}

/// Patterns 5-9: arithmetic/logical/shift identities that remove the line
/// outright rather than rewrite it.
fn identity_arithmetic(line: &str, comment: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if !p.has_two_ops || !p.dest_reg {
        return None;
    }
    let is_shift = matches!(p.base.as_str(), "shl" | "shr" | "sal" | "sar");
    if matches!(p.base.as_str(), "add" | "sub") && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(identity_removal("add_sub_zero", line, &p.indent, comment, line_no));
    }
    if is_shift && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(identity_removal("shift_by_zero", line, &p.indent, comment, line_no));
    }
    if p.base == "or" && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(identity_removal("or_zero", line, &p.indent, comment, line_no));
    }
    if p.base == "xor" && lexer::is_immediate_zero(&p.src, syntax) {
        return Some(identity_removal("xor_zero", line, &p.indent, comment, line_no));
    }
    if p.base == "and" && lexer::is_immediate_minus_one(&p.src, syntax) {
        return Some(identity_removal("and_minus_one", line, &p.indent, comment, line_no));
    }
    None
}

/// Patterns 10/11: `add`/`sub` by one is smaller as `inc`/`dec`.
fn add_sub_one_to_inc_dec(line: &str, comment: &str, p: &Parsed, line_no: usize, syntax: Syntax) -> Option<LineOutcome> {
    if !p.has_two_ops || !p.dest_reg {
        return None;
    }
    if p.base == "add" && lexer::is_immediate_one(&p.src, syntax) {
        return Some(binary_to_unary_or_self("add_one_to_inc", line, comment, p, "inc", false, line_no));
    }
    if p.base == "sub" && lexer::is_immediate_one(&p.src, syntax) {
        return Some(binary_to_unary_or_self("sub_one_to_dec", line, comment, p, "dec", false, line_no));
    }
    None
}

/// Pattern 22: align the instruction stream at a `.hot_loop:` label so the
/// loop header doesn't straddle a cache line. Checked on the raw code before
/// any mnemonic parsing, since directives/labels never reach [`parse_line`].
pub const HOT_LOOP_ALIGNMENT: u32 = 64;

fn hot_loop_align(code: &str, line: &str, insert_hot_align: bool, line_no: usize) -> Option<LineOutcome> {
    if !insert_hot_align || code.trim() != ".hot_loop:" {
        return None;
    }
    let align_line = format!("    .align {HOT_LOOP_ALIGNMENT}");
    let report = format!("    .align {HOT_LOOP_ALIGNMENT}\n.hot_loop:");
    Some(LineOutcome {
        output: vec![align_line, line.to_string()],
        events: vec![OptimizationEvent::replacement(line_no, "hot_loop_align", line, &report)],
        replaced: false,
        removed: false,
        skip_lines: 0,
    })
}

/// Apply the catalog to the line at `lines[idx]`. Returns the (possibly
/// multi-line) replacement and how far the cursor should jump afterward.
/// `lines` is always the *original* buffer — every lookahead re-reads from
/// it, never from already-rewritten output, matching the one-pass contract.
pub fn peephole_line(lines: &[String], idx: usize, syntax: Syntax, insert_hot_align: bool, target_zen: bool) -> LineOutcome {
    let line_no = idx + 1;
    let line = &lines[idx];
    let (code, comment) = lexer::split_comment(line);

    if lexer::is_directive_or_label(code) {
        if let Some(outcome) = hot_loop_align(code, line, insert_hot_align, line_no) {
            return outcome;
        }
        return LineOutcome::unchanged(line);
    }

    let Some(instr) = lexer::parse_instruction(code) else {
        return LineOutcome::unchanged(line);
    };
    let Some(p) = parse_line(code, syntax) else {
        return LineOutcome::unchanged(line);
    };

    if let Some(o) = redundant_or_zero_mov(line, comment, &p.indent, &p, line_no, syntax) {
        return o;
    }
    if let Some(o) = redundant_lea(line, comment, &p.indent, &p, line_no, syntax) {
        return o;
    }
    if let Some(o) = dead_store_move(lines, idx, &p, syntax, line_no) {
        return o;
    }
    if let Some(o) = schedule_swap_move(lines, idx, &p, syntax, line_no) {
        return o;
    }
    if let Some(o) = load_modify_store(lines, idx, line, comment, &p, syntax, line_no) {
        return o;
    }
    if let Some(o) = redundant_move_pair(lines, idx, line, &p, syntax, line_no) {
        return o;
    }
    if let Some(o) = self_operand_to_test_or_zero(line, comment, &p, line_no) {
        return o;
    }
    if let Some(o) = immediate_idiom(line, comment, &p, line_no, syntax) {
        return o;
    }
    if let Some(o) = fallthrough_jump(lines, idx, line, comment, &p.indent, &instr.operands, &p.base, line_no) {
        return o;
    }
    if let Some(o) = invert_conditional_jump(lines, idx, line, comment, &p.indent, &p.spacing, &instr.operands, &p.base, line_no) {
        return o;
    }
    if let Some(o) = bsf_to_tzcnt(lines, line, comment, &p, line_no, syntax, target_zen) {
        return o;
    }
    if let Some(o) = multiply_idiom(line, comment, &p, line_no, syntax) {
        return o;
    }
    if let Some(o) = identity_arithmetic(line, comment, &p, line_no, syntax) {
        return o;
    }
    if let Some(o) = add_sub_one_to_inc_dec(line, comment, &p, line_no, syntax) {
        return o;
    }

    LineOutcome::unchanged(line)
}
