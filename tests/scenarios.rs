//! End-to-end scenario and invariant tests driven entirely through the
//! public `Context` API, the way `original_source/tests/test_*.c` exercised
//! the C library through its public header rather than its statics.

use asmopt::Context;

fn optimized(input: &str) -> Context {
    let mut ctx = Context::new("x86-64");
    ctx.parse_string(input);
    ctx.optimize().unwrap();
    ctx
}

#[test]
fn scenario_mov_zero_becomes_xor() {
    let ctx = optimized("mov rax, 0\n");
    assert_eq!(ctx.generate_assembly(), "xor rax, rax\n");
    let stats = ctx.stats();
    assert_eq!((stats.original_lines, stats.optimized_lines, stats.replacements, stats.removals), (1, 1, 1, 0));
}

#[test]
fn scenario_redundant_mov_is_dropped() {
    let ctx = optimized("mov rax, rax\nmov rbx, rcx\n");
    assert_eq!(ctx.generate_assembly(), "mov rbx, rcx\n");
    let stats = ctx.stats();
    assert_eq!((stats.original_lines, stats.optimized_lines, stats.replacements, stats.removals), (2, 1, 0, 1));
}

#[test]
fn scenario_imul_power_of_two_becomes_shift() {
    let ctx = optimized("imul rax, 8\nimul rbx, 3\n");
    assert_eq!(ctx.generate_assembly(), "shl rax, 3\nimul rbx, 3\n");
}

#[test]
fn scenario_redundant_move_pair_collapses_to_one_line() {
    let ctx = optimized("mov rax, rbx\nmov rbx, rax\n");
    assert_eq!(ctx.generate_assembly(), "mov rax, rbx\n");
}

#[test]
fn scenario_hot_loop_align_and_inc_fire_together() {
    let mut ctx = Context::new("x86-64");
    ctx.set_option("hot_align", "1");
    ctx.parse_string(".hot_loop:\n  add rax, 1\n");
    ctx.optimize().unwrap();
    assert_eq!(ctx.generate_assembly(), "    .align 64\n.hot_loop:\n  inc rax\n");
}

#[test]
fn scenario_fallthrough_jump_then_mov_zero() {
    let ctx = optimized("jmp .next\n.next:\nmov rax, 0\n");
    assert_eq!(ctx.generate_assembly(), ".next:\nxor rax, rax\n");
}

#[test]
fn scenario_bsf_to_tzcnt_only_on_zen_with_amd_optimizations() {
    let mut zen = Context::new("x86-64");
    zen.set_target_cpu("zen3");
    zen.parse_string("test rbx, rbx\njz .skip\nbsf rax, rbx\n.skip:\n");
    zen.optimize().unwrap();
    assert_eq!(zen.generate_assembly(), "test rbx, rbx\njz .skip\ntzcnt rax, rbx\n.skip:\n");

    let generic = optimized("test rbx, rbx\njz .skip\nbsf rax, rbx\n.skip:\n");
    assert_eq!(generic.generate_assembly(), "test rbx, rbx\njz .skip\nbsf rax, rbx\n.skip:\n");
}

#[test]
fn invariant_round_trip_identity_at_level_zero() {
    let input = "mov rax, rax ; keep\n.text\nfoo:\n  jmp foo\n";
    let mut ctx = Context::new("x86-64");
    ctx.set_optimization_level(0);
    ctx.parse_string(input);
    ctx.optimize().unwrap();
    assert_eq!(ctx.generate_assembly(), input);
}

#[test]
fn invariant_round_trip_identity_when_no_optimize_set() {
    let input = "mov rax, rax\nimul rbx, 8\n";
    let mut ctx = Context::new("x86-64");
    ctx.set_no_optimize(true);
    ctx.parse_string(input);
    ctx.optimize().unwrap();
    assert_eq!(ctx.generate_assembly(), input);
}

#[test]
fn invariant_round_trip_identity_when_peephole_disabled() {
    let input = "mov rax, rax\n";
    let mut ctx = Context::new("x86-64");
    ctx.disable_optimization("all");
    ctx.parse_string(input);
    ctx.optimize().unwrap();
    assert_eq!(ctx.generate_assembly(), input);
}

#[test]
fn invariant_stats_consistency() {
    let ctx = optimized("mov rax, rax\nmov rbx, 0\nimul rcx, 8\nadd rdx, 1\n");
    let stats = ctx.stats();
    assert_eq!(stats.original_lines, 4);
    // replacements + removals equals the number of rewrite events; there is
    // no direct events accessor on Context, so this is checked indirectly
    // via the report, which lists one "Line N:" entry per event.
    let report = ctx.generate_report();
    let event_lines = report.matches("\n  Line ").count();
    assert_eq!(stats.replacements + stats.removals, event_lines);
}

#[test]
fn invariant_directives_and_labels_survive_unchanged() {
    let ctx = optimized(".text\n.globl main\nmain:\nmov rax, rax\nret\n");
    let out = ctx.generate_assembly();
    assert!(out.contains(".text\n"));
    assert!(out.contains(".globl main\n"));
    assert!(out.contains("main:\n"));
}

#[test]
fn invariant_comment_preserved_on_a_removed_line() {
    let ctx = optimized("  mov rax, rax ; zero cost\n");
    assert_eq!(ctx.generate_assembly(), "  ; zero cost\n");
}

#[test]
fn invariant_emit_is_idempotent() {
    let ctx = optimized("mov rax, 0\nmov rbx, rcx\n");
    assert_eq!(ctx.generate_assembly(), ctx.generate_assembly());
}

#[test]
fn invariant_memory_destination_never_participates_in_register_only_patterns() {
    let ctx = optimized("mov [rax], 0\n");
    // `mov [rax], 0` has no register destination, so mov_zero_to_xor must
    // not fire even though the source is the immediate zero.
    assert_eq!(ctx.generate_assembly(), "mov [rax], 0\n");
}

#[test]
fn property_immediate_one_is_never_rewritten_by_add_or_sub_idioms_other_than_inc_dec() {
    // add/sub by 1 is rewritten (to inc/dec); by any other non-special
    // immediate it must be left untouched.
    let untouched = optimized("add rax, 5\nsub rbx, 7\n");
    assert_eq!(untouched.generate_assembly(), "add rax, 5\nsub rbx, 7\n");
}

#[test]
fn property_imul_by_non_power_of_two_is_unchanged() {
    let ctx = optimized("imul rax, 6\n");
    assert_eq!(ctx.generate_assembly(), "imul rax, 6\n");
}

#[test]
fn att_syntax_round_trips_through_the_same_catalog() {
    let ctx = optimized("movq $0, %rbx\n");
    assert_eq!(ctx.generate_assembly(), "xorq %rbx, %rbx\n");
}

#[test]
fn optimize_without_any_parse_is_an_error() {
    let mut ctx = Context::new("x86-64");
    assert!(ctx.optimize().is_err());
}
