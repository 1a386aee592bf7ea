//! Host bootstrap
//!
//! The Host holds the capability registry and bootstrap options. It is
//! stateless config: one host can bootstrap many environments.

use std::collections::BTreeMap;
use std::path::PathBuf;
use mlua::StdLib;
use crate::capabilities::BoxedCapability;
use crate::environment::Environment;
use crate::error::RunError;

/// Source of the bundled test harness, defining `find_test_files`,
/// `runtests` and the `assert_*` helpers.
pub const PRELUDE: &str = include_str!("harness/testingunit.lua");

/// Chunk name the prelude is loaded under
pub const PRELUDE_NAME: &str = "testingunit.lua";

/// Name of the global table capabilities are installed into
pub const HOST_TABLE: &str = "host";

/// Bootstraps script environments
pub struct Host {
    /// Registered capabilities, installed as `host.<name>`
    pub capabilities: BTreeMap<String, BoxedCapability>,
    /// Standard libraries opened in each environment
    pub libs: StdLib,
    /// Whether to run the bundled harness after setup
    pub prelude: bool,
    /// Directories prepended to `package.path`
    pub package_paths: Vec<PathBuf>,
}

impl Host {
    /// Create a host with the default capabilities and the prelude enabled
    pub fn new() -> Self {
        Self {
            capabilities: crate::capabilities::default_capabilities(),
            libs: StdLib::ALL_SAFE,
            prelude: true,
            package_paths: Vec::new(),
        }
    }

    /// Register a custom capability
    pub fn register_capability(&mut self, name: impl Into<String>, cap: BoxedCapability) {
        self.capabilities.insert(name.into(), cap);
    }

    /// Acquire a fresh environment and prepare it for the runner.
    ///
    /// Any failure here is fatal to the run and reported as
    /// [`ErrorKind::Bootstrap`](crate::ErrorKind::Bootstrap).
    pub fn bootstrap(&self) -> Result<Environment, RunError> {
        let env = Environment::new(self.libs)?;

        self.install_capabilities(&env)?;

        for dir in &self.package_paths {
            env.prepend_package_path(dir)
                .map_err(|e| RunError::bootstrap(format!("package path {}: {}", dir.display(), e.message)))?;
        }

        if self.prelude {
            env.exec_source(PRELUDE, PRELUDE_NAME)
                .map_err(|e| RunError::bootstrap(format!("failed to load harness: {}", e.message)))?;
            env.logf(&format!("[prelude {} loaded]", PRELUDE_NAME));
        }

        tracing::debug!(
            capabilities = self.capabilities.len(),
            prelude = self.prelude,
            "bootstrapped script environment"
        );
        Ok(env)
    }

    fn install_capabilities(&self, env: &Environment) -> Result<(), RunError> {
        let lua = env.lua();
        let install = || -> mlua::Result<()> {
            let table = lua.create_table()?;
            for (name, cap) in &self.capabilities {
                table.set(name.as_str(), cap.function(lua)?)?;
            }
            lua.globals().set(HOST_TABLE, table)
        };
        install().map_err(|e| RunError::bootstrap(format!("failed to install capabilities: {}", e)))
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
