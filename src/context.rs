//! The driving handle: configuration, the parsed buffer, and the results of
//! the last [`Context::optimize`] call. Mirrors a small, explicit lifecycle
//! rather than a builder — `new` then `parse_*` then `optimize` then the
//! `generate_*`/`dump_*` getters, the same order the CLI front-end drives it.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::cfg::{self, Cfg};
use crate::error::{AsmOptError, Result};
use crate::ir::{self, IrLine};
use crate::lexer::{self, Syntax};
use crate::peephole;
use crate::report::{self, OptimizationEvent, Stats};

const DEFAULT_OPTIMIZATION_LEVEL: u8 = 2;

/// Configuration and parsed state for a single optimization run. Not
/// `Clone`/thread-shared by design: one buffer, one pass, like the C API it
/// mirrors.
#[derive(Debug)]
pub struct Context {
    architecture: String,
    target_cpu: String,
    format: Option<Syntax>,
    optimization_level: u8,
    amd_optimizations: bool,
    no_optimize: bool,
    preserve_all: bool,
    enabled_opts: Vec<String>,
    disabled_opts: Vec<String>,
    options: Vec<(String, String)>,

    original_lines: Vec<String>,
    trailing_newline: bool,
    optimized_lines: Vec<String>,
    did_optimize: bool,
    ir: Vec<IrLine>,
    cfg: Cfg,
    events: Vec<OptimizationEvent>,
    stats: Stats,
}

impl Context {
    /// A freshly configured context with the `peephole` pass enabled and
    /// optimization level 2, the same defaults the C API starts from.
    pub fn new(architecture: impl Into<String>) -> Self {
        let architecture = architecture.into();
        let architecture = if architecture.is_empty() { "x86-64".to_string() } else { architecture };
        Context {
            architecture,
            target_cpu: "generic".to_string(),
            format: None,
            optimization_level: DEFAULT_OPTIMIZATION_LEVEL,
            amd_optimizations: true,
            no_optimize: false,
            preserve_all: false,
            enabled_opts: vec!["peephole".to_string()],
            disabled_opts: Vec::new(),
            options: Vec::new(),
            original_lines: Vec::new(),
            trailing_newline: false,
            optimized_lines: Vec::new(),
            did_optimize: false,
            ir: Vec::new(),
            cfg: Cfg::default(),
            events: Vec::new(),
            stats: Stats::default(),
        }
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    /// A free-form key/value slot, append-only like the C option bag — a
    /// later `set_option` with the same key does not erase the earlier one,
    /// lookups (`option_enabled`) just find the first match.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.push((key.into(), value.into()));
    }

    fn option_enabled(&self, key: &str) -> bool {
        self.options.iter().find(|(k, _)| k == key).map(|(_, v)| v == "1").unwrap_or(false)
    }

    /// Clamped to `[0, 4]`, matching the C setter.
    pub fn set_optimization_level(&mut self, level: i32) {
        self.optimization_level = level.clamp(0, 4) as u8;
    }

    pub fn set_target_cpu(&mut self, cpu: impl Into<String>) {
        let cpu = cpu.into();
        self.target_cpu = if cpu.is_empty() { "generic".to_string() } else { cpu };
    }

    pub fn set_format(&mut self, format: Option<Syntax>) {
        self.format = format;
    }

    pub fn set_no_optimize(&mut self, enabled: bool) {
        self.no_optimize = enabled;
    }

    pub fn set_preserve_all(&mut self, enabled: bool) {
        self.preserve_all = enabled;
    }

    pub fn set_amd_optimizations(&mut self, enabled: bool) {
        self.amd_optimizations = enabled;
    }

    /// `"all"` re-enables the `peephole` pass by name; any other name is
    /// appended as-is (duplicates included, exactly like the C source).
    pub fn enable_optimization(&mut self, name: &str) {
        if name == "all" {
            self.enabled_opts.push("peephole".to_string());
        } else {
            self.enabled_opts.push(name.to_string());
        }
    }

    /// `"all"` wipes every enabled name and records a single `"all"` marker
    /// in `disabled_opts`; any other name is appended without deduping.
    pub fn disable_optimization(&mut self, name: &str) {
        if name == "all" {
            self.enabled_opts.clear();
            self.disabled_opts.push("all".to_string());
        } else {
            self.disabled_opts.push(name.to_string());
        }
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.disabled_opts.iter().any(|o| o == "all") || self.disabled_opts.iter().any(|o| o == name)
    }

    fn has_opt(&self, name: &str) -> bool {
        self.enabled_opts.iter().any(|o| o == name)
    }

    /// Parse `assembly` as the buffer to optimize, replacing anything parsed
    /// before. Resets all derived state (IR, CFG, events, stats).
    pub fn parse_string(&mut self, assembly: &str) {
        let split = lexer::split_lines(assembly);
        self.original_lines = split.lines;
        self.trailing_newline = split.trailing_newline;
        self.optimized_lines = Vec::new();
        self.did_optimize = false;
        self.ir = Vec::new();
        self.cfg = Cfg::default();
        self.events = Vec::new();
        self.stats = Stats::default();
        debug!(lines = self.original_lines.len(), "parsed assembly buffer");
    }

    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| AsmOptError::Read { path: path.to_path_buf(), source })?;
        self.parse_string(&text);
        Ok(())
    }

    fn syntax(&self) -> Syntax {
        ir::detect_syntax(self.format, &self.original_lines)
    }

    /// `preserve_all` is tracked and settable but, matching the source this
    /// was distilled from, never consulted here: it is stored for callers
    /// that inspect configuration, not wired into the optimize guard.
    fn should_optimize(&self) -> bool {
        if self.no_optimize || self.optimization_level == 0 {
            return false;
        }
        if self.is_disabled("peephole") {
            return false;
        }
        self.has_opt("peephole")
    }

    /// Run the catalog over the parsed buffer. Builds the IR and CFG
    /// unconditionally (dumping them doesn't require optimization to have
    /// run), then rewrites line by line if [`Context::should_optimize`]
    /// allows it, honoring each pattern's `skip_lines`.
    pub fn optimize(&mut self) -> Result<()> {
        if self.original_lines.is_empty() {
            return Err(AsmOptError::NoInput);
        }
        let syntax = self.syntax();
        self.ir = ir::build_ir(&self.original_lines);
        self.cfg = cfg::build_cfg(&self.ir);

        let insert_hot_align = self.option_enabled("hot_align");
        let target_zen = self.amd_optimizations
            && self.target_cpu.len() >= 3
            && self.target_cpu[..3].eq_ignore_ascii_case("zen")
            && self.target_cpu.as_bytes().get(3).map(|b| b.is_ascii_digit()).unwrap_or(true);

        let do_opt = self.should_optimize();
        self.events.clear();
        let mut optimized = Vec::new();
        let mut replacements = 0usize;
        let mut removals = 0usize;

        let mut i = 0usize;
        while i < self.original_lines.len() {
            if !do_opt {
                optimized.push(self.original_lines[i].clone());
                i += 1;
                continue;
            }
            let outcome = peephole::peephole_line(&self.original_lines, i, syntax, insert_hot_align, target_zen);
            optimized.extend(outcome.output);
            self.events.extend(outcome.events);
            if outcome.replaced {
                replacements += 1;
            }
            if outcome.removed {
                removals += 1;
            }
            i += 1 + outcome.skip_lines;
        }

        self.stats.original_lines = self.original_lines.len();
        self.stats.optimized_lines = if do_opt { optimized.len() } else { self.original_lines.len() };
        self.stats.replacements = replacements;
        self.stats.removals = removals;
        self.optimized_lines = optimized;
        self.did_optimize = do_opt;

        info!(
            original = self.stats.original_lines,
            optimized = self.stats.optimized_lines,
            replacements = self.stats.replacements,
            removals = self.stats.removals,
            "optimization pass complete"
        );
        Ok(())
    }

    pub fn generate_assembly(&self) -> String {
        report::generate_assembly(&self.original_lines, &self.optimized_lines, self.did_optimize, self.trailing_newline)
    }

    pub fn generate_report(&self) -> String {
        report::generate_report(&self.stats, &self.events)
    }

    pub fn dump_ir_text(&self) -> String {
        report::dump_ir_text(&self.ir)
    }

    pub fn dump_cfg_text(&self) -> String {
        report::dump_cfg_text(&self.cfg)
    }

    pub fn dump_cfg_dot(&self) -> String {
        report::dump_cfg_dot(&self.cfg)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn ir(&self) -> &[IrLine] {
        &self.ir
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }
}
