//! Host capabilities
//!
//! Functions the host exposes to scripts under the `host` global table.
//! Stock Lua has no way to list directories, so the bundled harness relies
//! on these to discover test files.

mod fs;
mod text;
mod log;

use std::collections::BTreeMap;
use mlua::{Function, Lua};

/// Usage information for a capability
pub struct CapabilityUsage {
    /// One-line summary
    pub summary: String,
    /// Lua call syntax, e.g. `(path) -> {name...}`
    pub args: String,
}

/// A host function that can be installed into a script environment
pub trait Capability {
    /// Build the Lua function backing this capability
    fn function(&self, lua: &Lua) -> mlua::Result<Function>;

    /// Return usage information
    fn usage(&self) -> CapabilityUsage;
}

/// A boxed capability
pub type BoxedCapability = Box<dyn Capability>;

/// Return the default set of host capabilities, keyed by their `host.*` name
pub fn default_capabilities() -> BTreeMap<String, BoxedCapability> {
    let mut caps: BTreeMap<String, BoxedCapability> = BTreeMap::new();
    caps.insert("read_dir".into(), Box::new(fs::ReadDir));
    caps.insert("is_dir".into(), Box::new(fs::IsDir));
    caps.insert("is_file".into(), Box::new(fs::IsFile));
    caps.insert("join_path".into(), Box::new(fs::JoinPath));
    caps.insert("glob_match".into(), Box::new(text::GlobMatch));
    caps.insert("diff".into(), Box::new(text::Diff));
    caps.insert("log".into(), Box::new(log::Log));
    caps
}
