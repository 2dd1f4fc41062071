//! The exit status carries the number of failed tests.

use std::path::Path;

use crate::scenario::{predicate, Chili, ScenarioFuture, ScenarioSet};

pub fn set(dir: &Path) -> ScenarioSet {
    ScenarioSet::new("exit_codes", dir).register(
        "test_exit_code_equals_failed_count",
        exit_code_equals_failed_count,
    )
}

// chili_failure.so holds exactly three failing tests.
fn exit_code_equals_failed_count(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_failure.so"]).await?;
        Ok(report.num_failed == 3 && report.process_return == 3)
    })
}
