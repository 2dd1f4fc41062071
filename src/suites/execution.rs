//! Raw exit codes, checked without reading the summary.

use std::path::Path;

use crate::invoker::Invocation;
use crate::scenario::{predicate, Chili, ScenarioFuture, ScenarioSet};

pub fn set(dir: &Path) -> ScenarioSet {
    ScenarioSet::new("execution", dir)
        .register("test_returns_0_on_test_success", returns_0_on_test_success)
        .register("test_returns_non_0_when_no_test_suite", returns_non_0_when_no_test_suite)
        .register(
            "test_returns_non_0_when_test_suite_doesnt_exist",
            returns_non_0_when_test_suite_doesnt_exist,
        )
}

fn returns_0_on_test_success(chili: Chili) -> ScenarioFuture {
    predicate(async move { Ok(chili.invoke(["./chili_success.so"]).await?.success()) })
}

fn returns_non_0_when_no_test_suite(chili: Chili) -> ScenarioFuture {
    predicate(async move { Ok(!chili.invoke(Invocation::default()).await?.success()) })
}

fn returns_non_0_when_test_suite_doesnt_exist(chili: Chili) -> ScenarioFuture {
    predicate(async move { Ok(!chili.invoke(["./non_existent.so"]).await?.success()) })
}
