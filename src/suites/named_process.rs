//! The `process` checks again, selecting single tests by name.

use std::path::Path;

use crate::invoker::Invocation;
use crate::scenario::{predicate, Chili, ScenarioFuture, ScenarioSet};

pub fn set(dir: &Path) -> ScenarioSet {
    ScenarioSet::new("named_process", dir)
        .register("test_named_process_returns_0_on_test_success", returns_0_on_test_success)
        .register(
            "test_named_process_returns_non_0_on_test_failure",
            returns_non_0_on_test_failure,
        )
        .register(
            "test_named_process_returns_non_0_on_suite_setup_error",
            returns_non_0_on_suite_setup_error,
        )
        .register(
            "test_named_process_returns_non_0_when_no_test_suite",
            returns_non_0_when_no_test_suite,
        )
        .register(
            "test_named_process_returns_non_0_when_test_suite_doesnt_exist",
            returns_non_0_when_test_suite_doesnt_exist,
        )
}

fn returns_0_on_test_success(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_success.so:test_success"]).await?;
        Ok(report.process_return == 0 && report.num_succeeded > 0)
    })
}

fn returns_non_0_on_test_failure(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_failure.so:test_failure1"]).await?;
        Ok(report.process_return != 0 && report.num_failed > 0)
    })
}

fn returns_non_0_on_suite_setup_error(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili
            .run(["./chili_suite_setup_error.so:test_success_but_never_runs"])
            .await?;
        Ok(report.process_return != 0 && report.num_executed == 0)
    })
}

fn returns_non_0_when_no_test_suite(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(Invocation::default()).await?;
        Ok(report.process_return != 0)
    })
}

fn returns_non_0_when_test_suite_doesnt_exist(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./non_existent.so:test_missing"]).await?;
        Ok(report.process_return != 0)
    })
}
