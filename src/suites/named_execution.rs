//! Which named tests run, and how they are counted, when things go wrong.

use std::path::Path;

use crate::scenario::{predicate, Chili, ScenarioFuture, ScenarioSet};

pub fn set(dir: &Path) -> ScenarioSet {
    ScenarioSet::new("named_execution", dir)
        .register(
            "test_named_executes_all_tests_even_in_case_of_failure",
            executes_all_tests_even_in_case_of_failure,
        )
        .register(
            "test_named_stops_execution_on_suite_setup_error",
            stops_execution_on_suite_setup_error,
        )
        .register(
            "test_named_stops_execution_on_test_setup_error",
            stops_execution_on_test_setup_error,
        )
        .register(
            "test_named_executes_all_tests_even_when_test_crashes",
            executes_all_tests_even_when_test_crashes,
        )
}

fn executes_all_tests_even_in_case_of_failure(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili
            .run([
                "./chili_failure.so:test_failure1",
                "./chili_failure.so:test_failure2",
                "./chili_failure.so:test_failure3",
            ])
            .await?;
        Ok(report.num_executed == 3 && report.num_failed == report.num_executed)
    })
}

fn stops_execution_on_suite_setup_error(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili
            .run([
                "./chili_suite_setup_error.so:test_success_but_never_runs",
                "./chili_suite_setup_error.so:test_success_another_one_that_never_runs",
            ])
            .await?;
        Ok(report.num_executed == 0)
    })
}

fn stops_execution_on_test_setup_error(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili
            .run([
                "./chili_test_setup_error.so:test_success_but_never_runs",
                "./chili_test_setup_error.so:test_success_another_one_that_never_runs",
            ])
            .await?;
        Ok(report.num_errors == Some(1) && report.num_succeeded == 0)
    })
}

fn executes_all_tests_even_when_test_crashes(chili: Chili) -> ScenarioFuture {
    predicate(async move {
        let report = chili
            .run([
                "./chili_crash.so:test_crash_one",
                "./chili_crash.so:test_crash_two",
            ])
            .await?;
        Ok(report.num_executed == 2 && report.num_errors == Some(report.num_executed))
    })
}
