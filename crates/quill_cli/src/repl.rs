//! Interactive read-eval-print loop.
//!
//! Every submission is compiled in script mode on top of the previous
//! successful one, so its globals and functions stay visible. Input keeps
//! accumulating while the parse stops inside an unclosed block or
//! parenthesis.

use crate::render::{print_error, report_diagnostics};
use crate::{print_requested_output, ReplArgs};
use log::debug;
use quill_compiler::{Compilation, SourceText};
use quill_core::arena::SyntaxArena;
use quill_evaluator::{Globals, StdHost};
use quill_options::CompilerOptions;
use quill_parser::{is_incomplete_submission, parse_text};
use std::io::{self, BufRead, Write};

const PROMPT: &str = "» ";
const CONTINUATION_PROMPT: &str = "· ";

/// What to do with a line typed at the start of a submission.
#[derive(Debug, PartialEq, Eq)]
enum MetaCommand {
    Quit,
    Reset,
    Unknown(String),
}

fn parse_meta_command(line: &str) -> Option<MetaCommand> {
    let command = line.trim().strip_prefix(':')?;
    Some(match command {
        "quit" | "q" => MetaCommand::Quit,
        "reset" => MetaCommand::Reset,
        other => MetaCommand::Unknown(other.to_string()),
    })
}

/// Whether `text` stops inside an unclosed block or parenthesis.
fn needs_more_input(text: &str) -> bool {
    let arena = SyntaxArena::new();
    let (_, diagnostics) = parse_text(arena.bump(), "<repl>", text);
    is_incomplete_submission(&diagnostics)
}

struct Repl {
    options: CompilerOptions,
    previous: Option<Compilation>,
    globals: Globals,
    submissions: usize,
}

impl Repl {
    fn new(args: &ReplArgs) -> Self {
        Self {
            options: CompilerOptions {
                module_name: Some("repl".into()),
                script: Some(true),
                show_tree: Some(args.show_tree),
                show_program: Some(args.show_program),
                ..Default::default()
            },
            previous: None,
            globals: Globals::default(),
            submissions: 0,
        }
    }

    fn reset(&mut self) {
        self.previous = None;
        self.globals.clear();
        self.submissions = 0;
    }

    fn submit(&mut self, text: &str) {
        self.submissions += 1;
        let source = vec![SourceText::new(format!("<{}>", self.submissions), text)];
        let compilation = match &self.previous {
            Some(previous) => previous.continue_with(source),
            None => Compilation::new(source, self.options.clone()),
        };

        print_requested_output(&compilation);
        report_diagnostics(&compilation);
        if compilation.has_errors() {
            debug!("submission {} rejected", self.submissions);
            return;
        }

        let mut host = StdHost;
        match compilation.evaluate(&mut self.globals, &mut host) {
            Ok(value) => {
                if !value.is_unit() {
                    println!("{}", value);
                }
            }
            Err(e) => print_error(&e.to_string()),
        }
        self.previous = Some(compilation);
    }
}

pub fn run(args: &ReplArgs) -> i32 {
    let mut repl = Repl::new(args);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT });
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                print_error(&e.to_string());
                return 1;
            }
            None => break,
        };

        if buffer.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_meta_command(&line) {
                Some(MetaCommand::Quit) => break,
                Some(MetaCommand::Reset) => {
                    repl.reset();
                    continue;
                }
                Some(MetaCommand::Unknown(name)) => {
                    print_error(&format!("Unknown command ':{}'.", name));
                    continue;
                }
                None => {}
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');
        // A blank line forces an incomplete submission through.
        if !line.trim().is_empty() && needs_more_input(&buffer) {
            continue;
        }
        repl.submit(&buffer);
        buffer.clear();
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_commands() {
        assert_eq!(parse_meta_command(":quit"), Some(MetaCommand::Quit));
        assert_eq!(parse_meta_command("  :reset "), Some(MetaCommand::Reset));
        assert_eq!(parse_meta_command(":nope"), Some(MetaCommand::Unknown("nope".into())));
        assert_eq!(parse_meta_command("x + 1"), None);
    }

    #[test]
    fn test_needs_more_input() {
        assert!(needs_more_input("fn f() {\n"));
        assert!(needs_more_input("print(1,\n"));
        assert!(!needs_more_input("var x = 1\n"));
        assert!(!needs_more_input("var s = \"open\n"));
    }

    #[test]
    fn test_submissions_chain() {
        let mut repl = Repl::new(&ReplArgs::default());
        repl.submit("var x = 40\n");
        repl.submit("var y = x + 2\n");
        assert_eq!(repl.globals.len(), 2);

        repl.submit("undefined_name\n");
        assert_eq!(repl.submissions, 3);
        assert!(repl.previous.as_ref().is_some_and(|c| !c.has_errors()));

        repl.reset();
        assert!(repl.previous.is_none());
        assert!(repl.globals.is_empty());
    }
}
