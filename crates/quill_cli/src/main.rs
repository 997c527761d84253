//! quill: The quill compiler and interpreter CLI.
//!
//! Usage:
//!   quill run [options] [file...]
//!   quill check [options] [file...]
//!   quill repl

mod render;
mod repl;

use clap::{Args, Parser as ClapParser, Subcommand};
use log::debug;
use quill_compiler::{CompileError, Compilation, SourceText};
use quill_evaluator::{Globals, StdHost};
use quill_options::{CompilerOptions, ProjectConfig, PROJECT_FILE_NAME};
use render::{print_error, report_diagnostics};
use std::path::Path;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "quill", about = "quill - a small statically typed scripting language", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile and run the given files.
    Run(CompileArgs),
    /// Compile the given files and report diagnostics without running them.
    Check(CompileArgs),
    /// Read and run submissions interactively.
    Repl(ReplArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Source files to compile.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Path to quill.json.
    #[arg(short = 'p', long = "project")]
    project: Option<String>,

    /// Treat top-level statements as a script returning its last value.
    #[arg(long)]
    script: bool,

    /// Print the bound tree before lowering.
    #[arg(long = "show-tree")]
    show_tree: bool,

    /// Print the lowered program.
    #[arg(long = "show-program")]
    show_program: bool,

    /// Print the control-flow graph of every function as Graphviz.
    #[arg(long = "show-cfg")]
    show_cfg: bool,

    /// Report warnings as errors.
    #[arg(long = "warnings-as-errors")]
    warnings_as_errors: bool,
}

#[derive(Args, Debug, Default)]
struct ReplArgs {
    #[arg(long = "show-tree")]
    show_tree: bool,

    #[arg(long = "show-program")]
    show_program: bool,
}

impl CompileArgs {
    /// Options set on the command line. Unset flags leave the project file's value.
    fn overrides(&self) -> CompilerOptions {
        let flag = |set: bool| if set { Some(true) } else { None };
        CompilerOptions {
            module_name: None,
            script: flag(self.script),
            show_tree: flag(self.show_tree),
            show_program: flag(self.show_program),
            show_control_flow_graph: flag(self.show_cfg),
            warnings_as_errors: flag(self.warnings_as_errors),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Some(Command::Run(args)) => run_compile(&args, true),
        Some(Command::Check(args)) => run_compile(&args, false),
        Some(Command::Repl(args)) => repl::run(&args),
        None => repl::run(&ReplArgs::default()),
    };
    process::exit(exit_code);
}

fn run_compile(args: &CompileArgs, execute: bool) -> i32 {
    let (files, config) = match resolve_input_files(args) {
        Ok(resolved) => resolved,
        Err(e) => {
            print_error(&e.to_string());
            return 1;
        }
    };
    if files.is_empty() {
        print_error("No input files found.");
        return 1;
    }

    let options = config
        .map(|c| c.options())
        .unwrap_or_default()
        .merge(&args.overrides());

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        match SourceText::load(file) {
            Ok(source) => sources.push(source),
            Err(e) => {
                print_error(&e.to_string());
                return 1;
            }
        }
    }
    debug!("compiling {} file(s)", sources.len());

    let compilation = Compilation::new(sources, options);
    print_requested_output(&compilation);
    if report_diagnostics(&compilation) > 0 || compilation.has_errors() {
        return 2;
    }
    if !execute {
        return 0;
    }

    let mut host = StdHost;
    match compilation.evaluate(&mut Globals::default(), &mut host) {
        Ok(value) => {
            if !value.is_unit() {
                println!("{}", value);
            }
            0
        }
        Err(e) => {
            print_error(&e.to_string());
            3
        }
    }
}

/// Print the tree, program, and graphs the options ask for.
pub(crate) fn print_requested_output(compilation: &Compilation) {
    let options = compilation.options();
    if options.show_tree() {
        print!("{}", compilation.print_tree());
    }
    if options.show_program() {
        print!("{}", compilation.print_program());
    }
    if options.show_control_flow_graph() {
        print!("{}", compilation.control_flow_graphs());
    }
}

/// Files from `-p`, the command line, or a quill.json in the current directory.
fn resolve_input_files(args: &CompileArgs) -> Result<(Vec<String>, Option<ProjectConfig>), CompileError> {
    if let Some(ref project) = args.project {
        let (files, config) = load_files_from_project(project)?;
        // Files named on the command line replace the project's list.
        if args.files.is_empty() {
            return Ok((files, Some(config)));
        }
        return Ok((args.files.clone(), Some(config)));
    }
    if !args.files.is_empty() {
        return Ok((args.files.clone(), None));
    }
    if Path::new(PROJECT_FILE_NAME).exists() {
        let (files, config) = load_files_from_project(PROJECT_FILE_NAME)?;
        return Ok((files, Some(config)));
    }
    Ok((Vec::new(), None))
}

fn load_files_from_project(path: &str) -> Result<(Vec<String>, ProjectConfig), CompileError> {
    let config = quill_options::parse_config_file(Path::new(path))?;
    let root_dir = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    let files = config.resolved_files(root_dir);
    Ok((files, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from(["quill", "run", "a.ql", "b.ql", "--script", "--show-cfg"]);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.files, vec!["a.ql", "b.ql"]);
        let overrides = args.overrides();
        assert_eq!(overrides.script, Some(true));
        assert_eq!(overrides.show_control_flow_graph, Some(true));
        assert_eq!(overrides.show_tree, None);
    }

    #[test]
    fn test_flags_override_project() {
        let cli = Cli::parse_from(["quill", "check", "--show-tree"]);
        let Some(Command::Check(args)) = cli.command else {
            panic!("expected check");
        };
        let file = CompilerOptions {
            script: Some(true),
            show_tree: Some(false),
            ..Default::default()
        };
        let merged = file.merge(&args.overrides());
        assert!(merged.is_script());
        assert!(merged.show_tree());
    }

    #[test]
    fn test_no_subcommand_is_repl() {
        let cli = Cli::parse_from(["quill"]);
        assert!(cli.command.is_none());
    }
}
