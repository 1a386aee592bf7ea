//! Script environment
//!
//! Owns one embedded Lua state for the duration of a run. All globals defined
//! by the entry file persist here and are visible to the inline expression.

use std::fmt;
use std::path::Path;
use mlua::{FromLua, Function, Lua, LuaOptions, StdLib, Value};
use crate::error::RunError;

/// Execution log for one environment, stored as Lua app data so host
/// capabilities can append to it from inside callbacks.
#[derive(Debug, Default)]
pub struct RunLog(pub String);

/// An embedded interpreter instance
pub struct Environment {
    lua: Lua,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("used_memory", &self.lua.used_memory())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Acquire a fresh interpreter with the given standard libraries opened.
    pub fn new(libs: StdLib) -> Result<Self, RunError> {
        let lua = Lua::new_with(libs, LuaOptions::new())
            .map_err(|e| RunError::bootstrap(format!("failed to create Lua state: {}", e)))?;
        lua.set_app_data(RunLog::default());
        tracing::debug!("created script environment");
        Ok(Self { lua })
    }

    /// Direct access to the interpreter, e.g. for registering extra globals.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Load and run a script file as a single chunk.
    ///
    /// A leading `#` line (shebang) is blanked out, keeping line numbers intact.
    pub fn exec_file(&self, path: &Path) -> Result<(), RunError> {
        let shown = path.display().to_string();
        let source = std::fs::read(path).map_err(|e| {
            RunError::script(format!("cannot open {}: {}", shown, e)).with_file(&shown)
        })?;
        let source = strip_shebang(source);

        tracing::debug!(file = %shown, bytes = source.len(), "executing script file");
        self.logf(&format!("> dofile {}", shown));

        self.lua
            .load(&source[..])
            .set_name(format!("@{}", shown))
            .exec()
            .map_err(|e| RunError::from(e).with_file(&shown))
    }

    /// Run a named chunk of source text for its side effects.
    pub fn exec_source(&self, source: &str, name: &str) -> Result<(), RunError> {
        tracing::debug!(chunk = name, "executing chunk");
        self.lua
            .load(source)
            .set_name(format!("={}", name))
            .exec()
            .map_err(RunError::from)
    }

    /// Compile inline script text into an invocable unit without running it.
    ///
    /// The chunk is named after its own text, so diagnostics read
    /// `[string "..."]:1: ...` like any Lua string chunk.
    pub fn compile(&self, source: &str) -> Result<Function, RunError> {
        self.logf(&format!("> load {}", source.trim()));
        self.lua
            .load(source)
            .set_name(source)
            .into_function()
            .map_err(RunError::from)
    }

    /// Call a unit with no arguments, keeping exactly one result.
    /// Missing results are `nil`; extra results are dropped.
    pub fn call_one(&self, unit: &Function) -> Result<Value, RunError> {
        unit.call::<Value>(()).map_err(RunError::from)
    }

    /// Coerce a value to an integer using Lua's conversion rules.
    pub fn to_integer(&self, value: Value) -> Result<i64, RunError> {
        let type_name = value.type_name();
        let shown = match &value {
            Value::Number(n) => format!(" ({})", n),
            Value::String(s) => format!(" ({:?})", s.to_string_lossy()),
            _ => String::new(),
        };
        match self.lua.coerce_integer(value)? {
            Some(n) => Ok(n),
            None => Err(RunError::coercion(format!(
                "expected an integer result, got {}{}",
                type_name, shown
            ))),
        }
    }

    /// Read a global, converting it to `T`.
    pub fn global<T: FromLua>(&self, name: &str) -> Result<T, RunError> {
        self.lua.globals().get::<T>(name).map_err(RunError::from)
    }

    /// Put `dir` in front of `package.path` so `require` finds modules there.
    pub fn prepend_package_path(&self, dir: &Path) -> Result<(), RunError> {
        let package: mlua::Table = self.lua.globals().get("package").map_err(|_| {
            RunError::bootstrap("package library is not loaded")
        })?;
        let current: String = package.get("path")?;
        let dir = dir.display().to_string();
        let sep = std::path::MAIN_SEPARATOR;
        let updated = format!("{dir}{sep}?.lua;{dir}{sep}?{sep}init.lua;{current}");
        package.set("path", updated)?;
        Ok(())
    }

    /// Write a log entry
    pub fn logf(&self, msg: &str) {
        append_log(&self.lua, msg);
    }

    /// Snapshot of the execution log
    pub fn log(&self) -> String {
        self.lua
            .app_data_ref::<RunLog>()
            .map(|log| log.0.clone())
            .unwrap_or_default()
    }
}

/// Append a line to the run log kept in `lua`'s app data.
pub(crate) fn append_log(lua: &Lua, msg: &str) {
    if let Some(mut log) = lua.app_data_mut::<RunLog>() {
        log.0.push_str(msg);
        if !msg.ends_with('\n') {
            log.0.push('\n');
        }
    }
}

fn strip_shebang(mut source: Vec<u8>) -> Vec<u8> {
    if source.first() == Some(&b'#') {
        let end = source.iter().position(|&b| b == b'\n').unwrap_or(source.len());
        source.drain(..end);
    }
    source
}
