//! Text capabilities: glob_match, diff

use mlua::{Function, Lua};
use similar::TextDiff;
use super::{Capability, CapabilityUsage};

pub(super) struct GlobMatch;

impl Capability for GlobMatch {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, (pattern, name): (String, String)| {
            crate::glob::glob_match(&pattern, &name).map_err(|e| mlua::Error::runtime(e.to_string()))
        })
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Match a name against a shell glob pattern".into(),
            args: "(pattern, name) -> boolean".into(),
        }
    }
}

/// Unified line diff; empty when both texts are equal.
pub(super) struct Diff;

impl Capability for Diff {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|_, (expected, actual): (String, String)| {
            if expected == actual {
                return Ok(String::new());
            }
            let diff = TextDiff::from_lines(&expected, &actual);
            Ok(diff.unified_diff().header("expected", "actual").to_string())
        })
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Unified line diff between two strings".into(),
            args: "(expected, actual) -> string".into(),
        }
    }
}
