use thiserror::Error;

/// A failure while running a bound program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("the program has errors and cannot be run")]
    InvalidProgram,

    #[error("the program has no entry point")]
    NoEntryPoint,

    #[error("division by zero")]
    DivisionByZero,

    #[error("function '{0}' has no body")]
    MissingBody(String),

    #[error("no host implementation for function '{0}'")]
    UnknownFunction(String),

    #[error("cannot convert '{value}' to type '{ty}'")]
    InvalidConversion { value: String, ty: String },

    #[error("operator '{op}' cannot be applied to {operands}")]
    UnsupportedOperation { op: String, operands: String },

    #[error("variable '{0}' was read before it was assigned")]
    UnassignedVariable(String),

    #[error("invalid array size {0}")]
    InvalidArraySize(i64),

    #[error("jump to label '{0}' that is not in the enclosing body")]
    DanglingJump(String),

    #[error("call depth exceeded {0} frames")]
    StackOverflow(usize),

    #[error("failed to read input: {0}")]
    Input(String),
}
