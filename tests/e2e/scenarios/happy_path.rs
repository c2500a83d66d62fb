use crate::harness::{source_lines, RepoSpec, Scenario};

#[test]
fn test_demo_repository() {
    let main = source_lines(400);
    let util = source_lines(600);
    let late = source_lines(5000);

    Scenario::new("demo_repository")
        .with_repo(
            RepoSpec::new("demo")
                .commit("2023-01-15T10:00:00+00:00", &[("src/main.c", main.as_str())])
                .commit("2023-01-15T11:00:00+00:00", &[("src/util.c", util.as_str())])
                .commit("2023-01-16T11:00:00+00:00", &[("src/late.c", late.as_str())]),
        )
        .assert_no_fatal()
        .assert_row_count(1)
        .assert_date("demo", "2023-01-15")
        .assert_first_commit("demo", 0)
        .assert_analysis_commit("demo", 1)
        .assert_lines("demo", 1000)
        .assert_cost("demo", 140_715.00)
        .assert_table_rows(1)
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_single_commit_repository() {
    let code = source_lines(120);

    Scenario::new("single_commit")
        .with_repo(RepoSpec::new("tiny").commit("2022-06-01T08:00:00+00:00", &[("tool.py", code.as_str())]))
        .assert_first_commit("tiny", 0)
        .assert_analysis_commit("tiny", 0)
        .assert_lines("tiny", 120)
        .assert_counter_runs(1)
        .run()
        .unwrap();
}

#[test]
fn test_rows_follow_input_order() {
    let code = source_lines(10);

    Scenario::new("input_order")
        .with_repo(RepoSpec::new("zeta").commit("2021-01-01T00:00:00+00:00", &[("a.c", code.as_str())]))
        .with_repo(RepoSpec::new("alpha").commit("2020-01-01T00:00:00+00:00", &[("a.c", code.as_str())]))
        .with_repo(RepoSpec::new("mid").commit("2022-01-01T00:00:00+00:00", &[("a.c", code.as_str())]))
        .assert_order(&["zeta", "alpha", "mid"])
        .assert_table_rows(3)
        .run()
        .unwrap();
}

#[test]
fn test_nested_directories_are_counted() {
    let a = source_lines(30);
    let b = source_lines(70);

    Scenario::new("nested_directories")
        .with_repo(
            RepoSpec::new("deep")
                .commit("2023-04-01T12:00:00+00:00", &[("a/b/c/one.rs", a.as_str()), ("x/two.sh", b.as_str())]),
        )
        .assert_lines("deep", 100)
        .run()
        .unwrap();
}
