//! CLI front-end: argument parsing, stdin/stdout and file I/O, and writing
//! the report/CFG/dump files the engine produces. The engine itself
//! (`asmopt::Context`) knows nothing about files or process exit codes.

use std::fs;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use asmopt::{AsmOptError, Context, Syntax};

/// x86-64 assembly peephole optimizer.
#[derive(Parser, Debug)]
#[command(name = "asmopt", version, about, long_about = None)]
struct Cli {
    /// Input file, or `-`/omitted to read stdin.
    #[arg(short = 'i', long = "input")]
    input_flag: Option<String>,

    /// Positional form of the input path.
    input_positional: Option<String>,

    /// Output file, or `-`/omitted to write stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Override syntax detection.
    #[arg(short = 'f', long = "format", value_enum)]
    format: Option<FormatArg>,

    /// Set the optimization level (0-4). Accepts `-O0`..`-O4` via a
    /// preprocessing pass since clap's derive can't bind `-O3` to a bare
    /// flag without an attached value.
    #[arg(long = "opt-level", default_value_t = 2)]
    opt_level: u8,

    /// Enable a named optimization (repeatable).
    #[arg(long = "enable")]
    enable: Vec<String>,

    /// Disable a named optimization; `all` disables everything (repeatable).
    #[arg(long = "disable")]
    disable: Vec<String>,

    #[arg(long = "no-optimize")]
    no_optimize: bool,

    #[arg(long = "preserve-all")]
    preserve_all: bool,

    /// Write the optimization report here; `-` writes to stderr.
    #[arg(long = "report")]
    report: Option<String>,

    /// Print stats to stderr after emitting output.
    #[arg(long = "stats")]
    stats: bool,

    /// Write the CFG as Graphviz DOT here.
    #[arg(long = "cfg")]
    cfg: Option<PathBuf>,

    /// Dump the IR to stderr.
    #[arg(long = "dump-ir")]
    dump_ir: bool,

    /// Dump the CFG text form to stderr.
    #[arg(long = "dump-cfg")]
    dump_cfg: bool,

    /// Target architecture (also exposed via the generic option bag as `march`).
    #[arg(short = 'm', long = "march")]
    march: Option<String>,

    /// Target CPU (also exposed via the generic option bag as `mtune`).
    #[arg(long = "mtune")]
    mtune: Option<String>,

    #[arg(long = "amd-optimize", overrides_with = "no_amd_optimize")]
    amd_optimize: bool,

    #[arg(long = "no-amd-optimize", overrides_with = "amd_optimize")]
    no_amd_optimize: bool,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Intel,
    Att,
}

impl From<FormatArg> for Syntax {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Intel => Syntax::Intel,
            FormatArg::Att => Syntax::Att,
        }
    }
}

/// Rewrite bare `-O0`..`-O4` tokens into `--opt-level N` before clap sees
/// them; clap's derive has no clean way to bind a digit-suffixed short flag
/// to a value otherwise.
fn normalize_opt_level_flags(args: impl Iterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    for arg in args {
        if arg.len() == 3 && arg.starts_with("-O") && arg.as_bytes()[2].is_ascii_digit() {
            out.push("--opt-level".to_string());
            out.push(arg[2..].to_string());
        } else {
            out.push(arg);
        }
    }
    out
}

fn read_input(cli: &Cli) -> Result<String, AsmOptError> {
    let path = cli.input_flag.clone().or_else(|| cli.input_positional.clone());
    match path.as_deref() {
        Some("-") | None => {
            if std::io::stdin().is_terminal() && path.is_none() {
                return Err(AsmOptError::InvalidArgument { flag: "--input".to_string() });
            }
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| AsmOptError::Read { path: PathBuf::from("<stdin>"), source })?;
            Ok(buf)
        }
        Some(p) => fs::read_to_string(p).map_err(|source| AsmOptError::Read { path: PathBuf::from(p), source }),
    }
}

fn write_to(path: &Path, text: &str) -> Result<(), AsmOptError> {
    fs::write(path, text).map_err(|source| AsmOptError::Write { path: path.to_path_buf(), source })
}

fn write_output(cli: &Cli, text: &str) -> Result<(), AsmOptError> {
    match cli.output.as_deref() {
        Some("-") | None => {
            print!("{text}");
            std::io::stdout()
                .flush()
                .map_err(|source| AsmOptError::Write { path: PathBuf::from("<stdout>"), source })?;
        }
        Some(p) => write_to(Path::new(p), text)?,
    }
    Ok(())
}

fn write_report(cli: &Cli, ctx: &Context) -> Result<(), AsmOptError> {
    let Some(path) = &cli.report else { return Ok(()) };
    let report = ctx.generate_report();
    if path == "-" {
        eprint!("{report}");
        Ok(())
    } else {
        write_to(Path::new(path), &report)
    }
}

fn run(cli: Cli) -> Result<(), AsmOptError> {
    let text = read_input(&cli)?;

    let mut ctx = Context::new(cli.march.clone().unwrap_or_default());
    ctx.set_optimization_level(cli.opt_level as i32);
    ctx.set_no_optimize(cli.no_optimize);
    ctx.set_preserve_all(cli.preserve_all);
    ctx.set_format(cli.format.map(Syntax::from));
    if let Some(cpu) = &cli.mtune {
        ctx.set_target_cpu(cpu.clone());
    }
    if let Some(march) = &cli.march {
        ctx.set_option("march", march.clone());
    }
    if let Some(mtune) = &cli.mtune {
        ctx.set_option("mtune", mtune.clone());
    }
    if cli.no_amd_optimize {
        ctx.set_amd_optimizations(false);
    } else if cli.amd_optimize {
        ctx.set_amd_optimizations(true);
    }
    for name in &cli.enable {
        ctx.enable_optimization(name);
    }
    for name in &cli.disable {
        ctx.disable_optimization(name);
    }

    ctx.parse_string(&text);
    ctx.optimize()?;

    // Order matches the reference CLI: dumps and side files are written
    // before the optimized assembly itself, so a failure partway through
    // never leaves stdout holding output without its accompanying report.
    if cli.dump_ir {
        eprint!("{}", ctx.dump_ir_text());
    }
    if cli.dump_cfg {
        eprint!("{}", ctx.dump_cfg_text());
    }
    if let Some(path) = &cli.cfg {
        write_to(path, &ctx.dump_cfg_dot())?;
    }
    write_report(&cli, &ctx)?;
    if cli.stats {
        let stats = ctx.stats();
        eprintln!(
            "Statistics:\n  original_lines: {}\n  optimized_lines: {}\n  replacements: {}\n  removals: {}",
            stats.original_lines, stats.optimized_lines, stats.replacements, stats.removals
        );
    }

    write_output(&cli, &ctx.generate_assembly())?;

    Ok(())
}

/// Parse argv, turning clap's own "flag needs a value" and "unknown flag"
/// failures into our own error type so every failure path, CLI or engine,
/// funnels through the same exit-code-1 handling in `main`. `--help` and
/// `--version` are not errors: clap renders them and we exit 0, matching the
/// usage-and-exit behavior of the reference CLI's own argument parser.
fn parse_cli(raw: Vec<String>) -> Result<Cli, ExitCode> {
    Cli::try_parse_from(raw).map_err(|e| {
        use clap::error::ErrorKind;
        if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            print!("{e}");
            return ExitCode::SUCCESS;
        }
        let flag = e
            .context()
            .find(|(kind, _)| *kind == clap::error::ContextKind::InvalidArg)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        eprintln!("error: {}", AsmOptError::InvalidArgument { flag });
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = match parse_cli(normalize_opt_level_flags(std::env::args())) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let default_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.to_string()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_bare_o_flags_into_opt_level() {
        let args = ["asmopt", "-O3", "-i", "foo.s"].into_iter().map(String::from);
        let out = normalize_opt_level_flags(args);
        assert_eq!(out, vec!["asmopt", "--opt-level", "3", "-i", "foo.s"]);
    }

    #[test]
    fn leaves_other_flags_untouched() {
        let args = ["asmopt", "--stats", "-v"].into_iter().map(String::from);
        let out = normalize_opt_level_flags(args);
        assert_eq!(out, vec!["asmopt", "--stats", "-v"]);
    }

    #[test]
    fn parse_cli_rejects_a_flag_missing_its_value() {
        let args = vec!["asmopt".to_string(), "--report".to_string()];
        assert!(parse_cli(args).is_err());
    }

    #[test]
    fn parse_cli_accepts_a_well_formed_invocation() {
        let args = vec!["asmopt".to_string(), "-i".to_string(), "foo.s".to_string()];
        let cli = parse_cli(args).unwrap();
        assert_eq!(cli.input_flag.as_deref(), Some("foo.s"));
    }
}
