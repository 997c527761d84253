//! Diagnostic output through miette.

use miette::{LabeledSpan, MietteDiagnostic, NamedSource, Report, Severity};
use quill_compiler::{Compilation, SourceText};
use quill_diagnostics::{Diagnostic, DiagnosticCategory};

/// Print every diagnostic of `compilation` to stderr, then a summary line
/// when there are errors. Returns the error count.
pub fn report_diagnostics(compilation: &Compilation) -> usize {
    for diagnostic in compilation.diagnostics() {
        eprintln!("{:?}", to_report(diagnostic, compilation.sources()));
    }
    let count = compilation.diagnostics().error_count();
    if count > 0 {
        eprintln!("Found {} error{}.", count, if count == 1 { "" } else { "s" });
    }
    count
}

fn to_report(diagnostic: &Diagnostic, sources: &[SourceText]) -> Report {
    let severity = match diagnostic.category {
        DiagnosticCategory::Warning => Severity::Warning,
        DiagnosticCategory::Error => Severity::Error,
    };
    let report = MietteDiagnostic::new(diagnostic.message_text.clone())
        .with_code(format!("QL{}", diagnostic.code))
        .with_severity(severity);

    let source = diagnostic
        .file
        .as_deref()
        .and_then(|file| sources.iter().find(|s| s.file_name == file));
    match (diagnostic.span, source) {
        (Some(span), Some(source)) => {
            let labeled = report.with_label(LabeledSpan::at(span.to_range(), "here"));
            Report::new(labeled)
                .with_source_code(NamedSource::new(&source.file_name, source.text.clone()))
        }
        _ => Report::new(report),
    }
}

pub fn print_error(message: &str) {
    eprintln!("{:?}", miette::miette!("{}", message));
}
