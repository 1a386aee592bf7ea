//! luatest-host: an embedded Lua host for running Lua test suites
//!
//! The host opens a Lua 5.4 state, loads the standard libraries plus a small
//! set of host capabilities, then executes an optional entry script and an
//! inline expression. The expression's integer result becomes the outcome of
//! the run, and the CLI uses it as its exit status.
//!
//! # Overview
//!
//! ```text
//! Host::bootstrap ──▶ Environment ──▶ run(env, file, inline) ──▶ i64 / RunError
//! ```
//!
//! By default the bundled harness is loaded during bootstrap and the inline
//! expression is
//!
//! ```lua
//! return runtests(find_test_files({"."}, 1, "*.lua"))
//! ```
//!
//! which evaluates to the number of failed tests.
//!
//! # Test files
//!
//! ```lua
//! function setup() counter = 0 end
//!
//! function test_increment()
//!     counter = counter + 1
//!     assert_equal(1, counter)
//! end
//!
//! function test_later()
//!     skip("not ready")
//! end
//! ```
//!
//! # Host capabilities
//!
//! | Function | Description |
//! |----------|-------------|
//! | `host.read_dir(path)` | Sorted entry names of a directory |
//! | `host.is_dir(path)` | Directory check |
//! | `host.is_file(path)` | Regular file check |
//! | `host.join_path(a, b)` | Platform path join |
//! | `host.glob_match(pattern, name)` | Shell glob match |
//! | `host.diff(expected, actual)` | Unified line diff |
//! | `host.log(level, message)` | Log through `tracing` and the run log |

mod environment;
mod host;
mod capabilities;
mod glob;
mod runner;
mod error;

pub use environment::{Environment, RunLog};
pub use host::{Host, PRELUDE, PRELUDE_NAME, HOST_TABLE};
pub use capabilities::{Capability, CapabilityUsage, BoxedCapability, default_capabilities};
pub use glob::{Pattern, glob_match};
pub use runner::{run, exit_status, discovery_expression, lua_quote, RunOutcome, FAILURE_STATUS};
pub use runner::{TestRunner, RunConfig, RunReport, TestRunnerBuilder};
pub use error::{RunError, ErrorKind};

// Convenience functions for cargo test integration
pub use runner::{run_and_assert, run_and_assert_with, runner};
