//! log: route script messages into tracing and the run log

use mlua::{Function, Lua};
use super::{Capability, CapabilityUsage};
use crate::environment::append_log;

pub(super) struct Log;

impl Capability for Log {
    fn function(&self, lua: &Lua) -> mlua::Result<Function> {
        lua.create_function(|lua, (level, message): (String, String)| {
            match level.as_str() {
                "error" => tracing::error!(target: "luatest_host::script", "{}", message),
                "warn" => tracing::warn!(target: "luatest_host::script", "{}", message),
                "info" => tracing::info!(target: "luatest_host::script", "{}", message),
                "debug" => tracing::debug!(target: "luatest_host::script", "{}", message),
                "trace" => tracing::trace!(target: "luatest_host::script", "{}", message),
                other => {
                    return Err(mlua::Error::runtime(format!("log: unknown level {:?}", other)));
                }
            }
            append_log(lua, &format!("[{}] {}", level, message));
            Ok(())
        })
    }

    fn usage(&self) -> CapabilityUsage {
        CapabilityUsage {
            summary: "Log a message at error, warn, info, debug or trace level".into(),
            args: "(level, message)".into(),
        }
    }
}
