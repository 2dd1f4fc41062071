//! Exit status paired with the reported counts, one suite path per run.

use std::path::Path;

use crate::invoker::Invocation;
use crate::scenario::{predicate, Chili, ScenarioFuture, ScenarioSet};

pub fn set(dir: &Path) -> ScenarioSet {
    ScenarioSet::new("process", dir)
        .register("test_process_returns_0_on_test_success", returns_0_on_test_success)
        .register("test_process_returns_non_0_on_test_failure", returns_non_0_on_test_failure)
        .register(
            "test_process_returns_non_0_on_suite_setup_error",
            returns_non_0_on_suite_setup_error,
        )
        .register(
            "test_process_returns_non_0_when_no_test_suite",
            returns_non_0_when_no_test_suite,
        )
        .register(
            "test_process_returns_non_0_when_test_suite_doesnt_exist",
            returns_non_0_when_test_suite_doesnt_exist,
        )
}

fn returns_0_on_test_success(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_success.so"]).await?;
        Ok(report.process_return == 0 && report.num_succeeded > 0)
    })
}

fn returns_non_0_on_test_failure(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_failure.so"]).await?;
        Ok(report.process_return != 0 && report.num_failed > 0)
    })
}

fn returns_non_0_on_suite_setup_error(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili.run(["./chili_suite_setup_error.so"]).await?;
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
        let report = chili.run(["./non_existent.so"]).await?;
        Ok(report.process_return != 0)
    })
}
