//! Built-in scenario sets.
//!
//! Every set runs inside the suite directory, so the artifact paths below are
//! relative to it (`./chili_success.so` and friends).

mod execution;
mod exit_codes;
mod named_execution;
mod named_process;
mod process;

use std::path::Path;

use crate::scenario::ScenarioSet;

/// Names of the built-in sets, in run order.
pub const NAMES: &[&str] = &[
    "execution",
    "process",
    "named_process",
    "named_execution",
    "exit_codes",
];

/// Builds the named set bound to `dir`.
pub fn by_name(name: &str, dir: &Path) -> Option<ScenarioSet> {
    let set = match name {
        "execution" => execution::set(dir),
        "process" => process::set(dir),
        "named_process" => named_process::set(dir),
        "named_execution" => named_execution::set(dir),
        "exit_codes" => exit_codes::set(dir),
        _ => return None,
    };
    Some(set)
}

/// Builds every built-in set bound to `dir`, in run order.
pub fn builtin(dir: &Path) -> Vec<ScenarioSet> {
    NAMES.iter().filter_map(|name| by_name(name, dir)).collect()
}
