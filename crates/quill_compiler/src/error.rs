use quill_evaluator::EvalError;
use quill_options::OptionsError;
use thiserror::Error;

/// Failures outside the diagnostics model: reading files, loading the
/// project, or running the program.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error("compilation failed with {0} error(s)")]
    Failed(usize),

    #[error("runtime error: {0}")]
    Eval(#[from] EvalError),
}
