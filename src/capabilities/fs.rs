//! Filesystem capabilities: read_dir, is_dir, is_file, join_path

use std::path::Path;
use mlua::{Function, Lua};
use super::{Capability, CapabilityUsage};

// ──────────────────────────────────────────────────────────
// read_dir: sorted entry names of a directory
// ──────────────────────────────────────────────────────────

pub(super) struct ReadDir;

impl Capability for ReadDir {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, path: String| {
            let entries = std::fs::read_dir(&path)
                .map_err(|e| mlua::Error::runtime(format!("read_dir {}: {}", path, e)))?;

            let mut names = Vec::new();
            for entry in entries {
                let entry = entry
                    .map_err(|e| mlua::Error::runtime(format!("read_dir {}: {}", path, e)))?;
                names.push(entry.file_name().to_string_lossy().to_string());
            }
            names.sort();
            Ok(names)
        })
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "List the entries of a directory, sorted by name".into(),
            args: "(path) -> {name...}".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// is_dir / is_file
// ──────────────────────────────────────────────────────────

pub(super) struct IsDir;

impl Capability for IsDir {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, path: String| Ok(Path::new(&path).is_dir()))
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Report whether a path is a directory".into(),
            args: "(path) -> boolean".into(),
        }
    }
}

pub(super) struct IsFile;

impl Capability for IsFile {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, path: String| Ok(Path::new(&path).is_file()))
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Report whether a path is a regular file".into(),
            args: "(path) -> boolean".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// join_path: platform path join
// ──────────────────────────────────────────────────────────

pub(super) struct JoinPath;

impl Capability for JoinPath {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, (base, name): (String, String)| {
            Ok(Path::new(&base).join(name).to_string_lossy().to_string())
        })
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Join two path components with the platform separator".into(),
            args: "(base, name) -> string".into(),
        }
    }
}
