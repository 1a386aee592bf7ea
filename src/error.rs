//! Run errors

use std::fmt;

/// The kind of run error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Loading, compiling or evaluating script text failed
    Script,
    /// Evaluation succeeded but the result is not an integer
    TypeCoercion,
    /// The runner was called with inputs it cannot act on
    InvalidArgument,
    /// The script environment could not be created or prepared
    Bootstrap,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Script => "script error",
            ErrorKind::TypeCoercion => "type coercion error",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Bootstrap => "bootstrap error",
        };
        f.write_str(s)
    }
}

/// A run error carrying the engine's diagnostic text
#[derive(Debug, Clone)]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
    /// Script file being executed when the error happened, if any
    pub file: Option<String>,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Script, msg)
    }

    pub fn coercion(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeCoercion, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, msg)
    }

    pub fn bootstrap(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Bootstrap, msg)
    }

    pub fn is_script(&self) -> bool {
        self.kind == ErrorKind::Script
    }

    pub fn is_coercion(&self) -> bool {
        self.kind == ErrorKind::TypeCoercion
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lua diagnostics from named chunks already start with "path:line:",
        // so the file is only prepended when the message doesn't carry it.
        if let Some(ref file) = self.file {
            if !self.message.starts_with(file.as_str()) {
                write!(f, "{}: ", file)?;
            }
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RunError {}

impl From<mlua::Error> for RunError {
    fn from(e: mlua::Error) -> Self {
        Self::script(engine_message(&e))
    }
}

/// The engine's own diagnostic text, without mlua's kind prefix or the
/// appended stack traceback.
fn engine_message(e: &mlua::Error) -> String {
    let text = match e {
        mlua::Error::RuntimeError(msg) => msg.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => return engine_message(cause),
        other => other.to_string(),
    };
    match text.find("\nstack traceback:") {
        Some(end) => text[..end].to_string(),
        None => text,
    }
}
