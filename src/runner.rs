//! Test runner
//!
//! Executes an optional entry file and an optional inline expression inside a
//! script environment, and turns the expression's result into an integer
//! outcome. Test discovery and execution themselves live in the scripts.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use crate::environment::Environment;
use crate::error::RunError;
use crate::host::Host;

/// Result of one runner invocation: the script's integer code or a failure
pub type RunOutcome = Result<i64, RunError>;

/// Exit status reported for a failed run
pub const FAILURE_STATUS: i32 = -1;

/// Run the entry file and/or the inline expression in `env`.
///
/// The file runs first; if it fails, the inline source is never attempted.
/// A file alone yields `Ok(0)`. Supplying neither is an invalid argument.
pub fn run(env: &Environment, file: Option<&Path>, inline: Option<&str>) -> RunOutcome {
    if file.is_none() && inline.is_none() {
        return Err(RunError::invalid_argument(
            "nothing to run: neither a test file nor an inline expression was given",
        ));
    }

    if let Some(path) = file {
        tracing::info!(file = %path.display(), "running test file");
        env.exec_file(path)?;
    }

    let Some(source) = inline else {
        return Ok(0);
    };

    tracing::info!(expr = source, "evaluating inline expression");
    let unit = env.compile(source)?;
    let value = env.call_one(&unit)?;
    let code = env.to_integer(value)?;
    env.logf(&format!("[result {}]", code));
    Ok(code)
}

/// Map an outcome to a process exit status: the code itself, or `-1`.
///
/// Codes outside `0..=255` map to `-1` too, since the OS keeps only the low
/// 8 bits and e.g. 256 failures would otherwise exit 0.
pub fn exit_status(outcome: &RunOutcome) -> i32 {
    match outcome {
        Ok(code @ 0..=255) => *code as i32,
        Ok(_) | Err(_) => FAILURE_STATUS,
    }
}

/// Build the inline expression that discovers and runs tests with the harness.
///
/// ```
/// let expr = luatest_host::discovery_expression(&["."], true, "*.lua");
/// assert_eq!(expr, r#"return runtests(find_test_files({"."}, 1, "*.lua"))"#);
/// ```
pub fn discovery_expression<S: AsRef<str>>(roots: &[S], recursive: bool, pattern: &str) -> String {
    let roots = roots
        .iter()
        .map(|r| lua_quote(r.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "return runtests(find_test_files({{{}}}, {}, {}))",
        roots,
        if recursive { 1 } else { 0 },
        lua_quote(pattern),
    )
}

/// Quote `s` as a Lua string literal.
pub fn lua_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Entry script executed before the inline expression
    pub file: Option<PathBuf>,
    /// Inline expression; when `None` the discovery expression is used
    pub inline: Option<String>,
    /// Directories searched by the discovery expression
    pub roots: Vec<String>,
    /// Glob matched against test file names
    pub pattern: String,
    /// Descend into subdirectories while discovering
    pub recursive: bool,
    /// Load the bundled harness during bootstrap
    pub prelude: bool,
    /// Directories prepended to `package.path`
    pub package_paths: Vec<PathBuf>,
    /// Verbose mode: print the run log
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            file: None,
            inline: None,
            roots: vec![".".into()],
            pattern: "*.lua".into(),
            recursive: true,
            prelude: true,
            package_paths: Vec::new(),
            verbose: false,
        }
    }
}

impl RunConfig {
    /// The inline expression this config evaluates
    pub fn expression(&self) -> String {
        match self.inline {
            Some(ref expr) => expr.clone(),
            None => discovery_expression(&self.roots[..], self.recursive, &self.pattern),
        }
    }
}

/// Result of one run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Execution log
    pub log: String,
    pub duration: Duration,
}

impl RunReport {
    /// A run passes when it produced the code 0
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Ok(0))
    }

    pub fn exit_status(&self) -> i32 {
        exit_status(&self.outcome)
    }

    /// Write the run log, indented, under a `--- log ---` header
    pub fn write_log(&self, w: &mut impl std::io::Write) -> std::io::Result<()> {
        if self.log.is_empty() {
            return Ok(());
        }
        writeln!(w, "--- log ---")?;
        for line in self.log.lines() {
            writeln!(w, "  {}", line)?;
        }
        Ok(())
    }

    /// Format a summary line
    pub fn summary(&self) -> String {
        match self.outcome {
            Ok(code) => format!("exit code {} ({}ms)", code, self.duration.as_millis()),
            Err(ref e) => format!("could not run tests: {} ({}ms)", e, self.duration.as_millis()),
        }
    }
}

/// The test runner
pub struct TestRunner {
    host: Host,
    config: RunConfig,
}

impl TestRunner {
    /// Create a new runner with the given config
    pub fn new(config: RunConfig) -> Self {
        Self::with_host(Host::new(), config)
    }

    /// Create a new runner with a custom host. The prelude runs only when both
    /// the host and the config enable it; package paths from both are used.
    pub fn with_host(mut host: Host, config: RunConfig) -> Self {
        host.prelude = host.prelude && config.prelude;
        host.package_paths.extend(config.package_paths.iter().cloned());
        Self { host, config }
    }

    /// Get mutable reference to the host (for registering custom capabilities)
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Bootstrap a fresh environment and run the configured file and expression.
    pub fn run_all(&self) -> RunReport {
        let start = Instant::now();

        let env = match self.host.bootstrap() {
            Ok(env) => env,
            Err(e) => {
                return RunReport {
                    outcome: Err(e),
                    log: String::new(),
                    duration: start.elapsed(),
                };
            }
        };

        let expr = self.config.expression();
        let outcome = run(&env, self.config.file.as_deref(), Some(expr.as_str()));
        if let Err(ref e) = outcome {
            env.logf(&format!("[error: {}]", e));
            tracing::warn!(kind = %e.kind, "run failed: {}", e.message);
        }

        let report = RunReport {
            outcome,
            log: env.log(),
            duration: start.elapsed(),
        };
        if self.config.verbose {
            let _ = report.write_log(&mut std::io::stderr());
        }
        report
    }
}

/// Builder API for convenient test runner construction
pub struct TestRunnerBuilder {
    config: RunConfig,
    host: Option<Host>,
}

impl TestRunnerBuilder {
    /// Start building a runner that discovers tests under `root`
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            config: RunConfig {
                roots: vec![root.into()],
                ..Default::default()
            },
            host: None,
        }
    }

    /// Add another discovery root
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.config.roots.push(root.into());
        self
    }

    /// Run this entry script before the expression
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.config.file = Some(file.into());
        self
    }

    /// Evaluate this expression instead of the discovery expression
    pub fn inline(mut self, expr: impl Into<String>) -> Self {
        self.config.inline = Some(expr.into());
        self
    }

    /// Set the test file glob
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    pub fn prelude(mut self, prelude: bool) -> Self {
        self.config.prelude = prelude;
        self
    }

    pub fn package_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.package_paths.push(dir.into());
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Use a custom host
    pub fn host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    /// Build and return the runner
    pub fn build(self) -> TestRunner {
        match self.host {
            Some(host) => TestRunner::with_host(host, self.config),
            None => TestRunner::new(self.config),
        }
    }

    /// Build and run
    pub fn run(self) -> RunReport {
        self.build().run_all()
    }
}

/// Convenience function: create a runner builder for a directory
pub fn runner(root: impl Into<String>) -> TestRunnerBuilder {
    TestRunnerBuilder::new(root)
}

/// Run the Lua tests under `dir` and integrate with `#[test]` by panicking
/// on failure.
///
/// Usage in cargo tests:
/// ```rust,ignore
/// #[test]
/// fn lua_suites() {
///     luatest_host::run_and_assert("tests/lua");
/// }
/// ```
pub fn run_and_assert(dir: impl AsRef<Path>) {
    run_and_assert_with(dir, |_| {});
}

/// Like `run_and_assert` but allows host customization.
pub fn run_and_assert_with(dir: impl AsRef<Path>, customize: impl FnOnce(&mut Host)) {
    let dir = dir.as_ref();
    let mut host = Host::new();
    customize(&mut host);

    let config = RunConfig {
        roots: vec![dir.to_string_lossy().to_string()],
        verbose: std::env::var("LUATEST_VERBOSE").is_ok(),
        ..Default::default()
    };

    let report = TestRunner::with_host(host, config).run_all();
    eprintln!("{}", report.summary());

    match report.outcome {
        Ok(0) => {}
        Ok(failures) => panic!("{} Lua test(s) failed under {}", failures, dir.display()),
        Err(e) => panic!("could not run tests under {}: {}", dir.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn env() -> Environment {
        Host::new().bootstrap().unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_inline_arithmetic() {
        assert_eq!(run(&env(), None, Some("return 1+1")).unwrap(), 2);
    }

    #[test]
    fn test_inline_syntax_error() {
        let err = run(&env(), None, Some("return (")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Script);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_inline_runtime_error() {
        let err = run(&env(), None, Some("error('kaboom')")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Script);
        assert!(err.message.contains("kaboom"));
    }

    #[test]
    fn test_inline_non_integer() {
        let err = run(&env(), None, Some("return 'x'")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeCoercion);
        assert!(err.message.contains("string"));
    }

    #[test]
    fn test_inline_without_value() {
        let err = run(&env(), None, Some("local _ = 1")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeCoercion);
        assert!(err.message.contains("nil"));
    }

    #[test]
    fn test_inline_coercible_values() {
        assert_eq!(run(&env(), None, Some("return 2.0")).unwrap(), 2);
        assert_eq!(run(&env(), None, Some("return '7'")).unwrap(), 7);
        assert_eq!(run(&env(), None, Some("return 5, 'ignored'")).unwrap(), 5);
    }

    #[test]
    fn test_neither_input() {
        let err = run(&env(), None, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_file_without_return_value() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "setup.lua", "local x = 1\n");
        assert_eq!(run(&env(), Some(&file), None).unwrap(), 0);
    }

    #[test]
    fn test_file_globals_visible_to_inline() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "defs.lua", "function triple(n) return n * 3 end\n");
        assert_eq!(run(&env(), Some(&file), Some("return triple(4)")).unwrap(), 12);
    }

    #[test]
    fn test_missing_file_short_circuits() {
        let env = env();
        let err = run(
            &env,
            Some(Path::new("/no/such/suite.lua")),
            Some("inline_ran = true; return 0"),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Script);
        let ran: Option<bool> = env.global("inline_ran").unwrap();
        assert_eq!(ran, None);
    }

    #[test]
    fn test_failing_file_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "bad.lua", "error('setup broke')\n");
        let env = env();
        let err = run(&env, Some(&file), Some("inline_ran = true; return 0")).unwrap_err();
        assert!(err.message.contains("setup broke"));
        let ran: Option<bool> = env.global("inline_ran").unwrap();
        assert_eq!(ran, None);
    }

    #[test]
    fn test_file_error_diagnostic_is_engine_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "bad.lua", "local x = 1\nerror('nope')\n");
        let err = run(&env(), Some(&file), None).unwrap_err();
        let expected = format!("{}:2: nope", file.display());
        assert_eq!(err.message, expected);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_inline_syntax_error_diagnostic_is_engine_text() {
        let err = run(&env(), None, Some("return (")).unwrap_err();
        assert_eq!(err.message, "[string \"return (\"]:1: unexpected symbol near <eof>");
    }

    #[test]
    fn test_repeated_runs_same_class() {
        let env = env();
        assert!(run(&env, None, Some("return 3")).is_ok());
        assert!(run(&env, None, Some("return 3")).is_ok());
        assert!(run(&env, None, Some("return {}")).is_err());
        assert!(run(&env, None, Some("return {}")).is_err());
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(0)), 0);
        assert_eq!(exit_status(&Ok(3)), 3);
        assert_eq!(exit_status(&Err(RunError::script("x"))), -1);
        assert_eq!(exit_status(&Ok(255)), 255);
        assert_eq!(exit_status(&Ok(256)), -1);
        assert_eq!(exit_status(&Ok(512)), -1);
        assert_eq!(exit_status(&Ok(-5)), -1);
        assert_eq!(exit_status(&Ok(i64::MAX)), -1);
    }

    #[test]
    fn test_write_log() {
        let report = RunReport {
            outcome: Ok(0),
            log: "> load return 0\n[result 0]\n".into(),
            duration: Duration::from_millis(1),
        };
        let mut out = Vec::new();
        report.write_log(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--- log ---\n  > load return 0\n  [result 0]\n"
        );

        let empty = RunReport { log: String::new(), ..report };
        let mut out = Vec::new();
        empty.write_log(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_verbose_run_keeps_log() {
        let built = runner(".").inline("return 0").verbose(true).build();
        assert!(built.config().verbose);
        let report = built.run_all();
        assert!(report.passed());
        assert!(report.log.contains("[result 0]"));
    }

    #[test]
    fn test_discovery_expression() {
        assert_eq!(
            discovery_expression(&["."], true, "*.lua"),
            r#"return runtests(find_test_files({"."}, 1, "*.lua"))"#
        );
        assert_eq!(
            discovery_expression(&["a", "b"], false, "test_*.lua"),
            r#"return runtests(find_test_files({"a", "b"}, 0, "test_*.lua"))"#
        );
    }

    #[test]
    fn test_lua_quote() {
        assert_eq!(lua_quote(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(lua_quote("x\ny"), r#""x\ny""#);
        assert_eq!(lua_quote("\u{1}"), r#""\001""#);
        assert_eq!(lua_quote("ünï"), "\"ünï\"");
    }

    #[test]
    fn test_lua_quote_round_trips_through_lua() {
        let env = env();
        let text = "tab\there \"quoted\" back\\slash \u{7}bell";
        let value: String = env
            .lua()
            .load(format!("return {}", lua_quote(text)))
            .eval()
            .unwrap();
        assert_eq!(value, text);
    }

    #[test]
    fn test_discovery_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "math_test.lua", r#"
function test_add() assert_equal(4, 2 + 2) end
function test_sub() assert_equal(1, 3 - 1) end
"#);
        write(dir.path(), "nested/strings_test.lua", r#"
function test_upper() assert_equal("AB", ("ab"):upper()) end
function test_lower() assert_equal("AB", ("ab"):lower()) end
"#);
        write(dir.path(), "helpers.lua", "function test_not_collected() error('x') end\n");

        let root = dir.path().to_string_lossy().to_string();
        let report = runner(root.clone()).pattern("*_test.lua").run();
        assert_eq!(report.outcome.unwrap(), 2);

        let report = runner(root).pattern("*_test.lua").recursive(false).run();
        assert_eq!(report.outcome.unwrap(), 1);
    }

    #[test]
    fn test_report_passed_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok_test.lua", "function test_ok() assert_true(true) end\n");

        let report = runner(dir.path().to_string_lossy().to_string()).run();
        assert!(report.passed());
        assert_eq!(report.exit_status(), 0);
        assert!(report.summary().starts_with("exit code 0"));
        assert!(report.log.contains("[result 0]"));
    }

    #[test]
    fn test_run_all_reports_bootstrap_failure() {
        let mut host = Host::new();
        host.libs = mlua::StdLib::ALL_SAFE | mlua::StdLib::DEBUG;
        let report = runner(".").host(host).run();
        assert_eq!(report.exit_status(), -1);
        assert_eq!(report.outcome.unwrap_err().kind, ErrorKind::Bootstrap);
    }

    #[test]
    fn test_builder_options() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config.lua", "return { level = 3 }");

        let mut built = runner("a")
            .root("b")
            .prelude(false)
            .package_path(dir.path())
            .inline("return require('config').level + (runtests == nil and 10 or 0)")
            .build();
        assert_eq!(built.config().roots, vec!["a".to_string(), "b".to_string()]);
        assert!(!built.host_mut().prelude);
        assert_eq!(built.run_all().outcome.unwrap(), 13);
    }

    #[test]
    fn test_custom_expression_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "entry.lua", "function answer() return 42 end\n");
        let report = runner(".").file(file).inline("return answer()").run();
        assert_eq!(report.outcome.unwrap(), 42);
    }
}
