use crate::harness::{source_lines, RepoSpec, Scenario};

#[test]
fn test_empty_tree_records_zero_without_counting() {
    Scenario::new("empty_tree")
        .with_repo(RepoSpec::new("hollow").empty_commit("2023-01-15T10:00:00+00:00"))
        .assert_row_count(1)
        .assert_lines("hollow", 0)
        .assert_cost("hollow", 0.0)
        .assert_counter_runs(0)
        .run()
        .unwrap();
}

#[test]
fn test_tree_emptied_inside_window() {
    Scenario::new("emptied_tree")
        .with_repo(
            RepoSpec::new("gone")
                .commit("2023-01-15T10:00:00+00:00", &[("a.c", source_lines(50).as_str())])
                .commit_removing("2023-01-15T12:00:00+00:00", &[], &["a.c"]),
        )
        .assert_analysis_commit("gone", 1)
        .assert_lines("gone", 0)
        .assert_counter_runs(0)
        .run()
        .unwrap();
}

#[test]
fn test_repository_without_commits_is_skipped() {
    Scenario::new("no_commits")
        .with_repo(RepoSpec::new("fresh"))
        .with_repo(RepoSpec::new("real").commit("2023-01-15T10:00:00+00:00", &[("a.c", source_lines(3).as_str())]))
        .assert_skipped("fresh")
        .assert_row_count(1)
        .assert_lines("real", 3)
        .assert_no_fatal()
        .assert_table_rows(1)
        .run()
        .unwrap();
}

#[test]
fn test_skip_list_excludes_repository() {
    let code = source_lines(7);

    Scenario::new("skip_list")
        .with_repo(RepoSpec::new("imported").commit("2023-01-15T10:00:00+00:00", &[("a.c", code.as_str())]))
        .with_repo(RepoSpec::new("kept").commit("2023-01-15T10:00:00+00:00", &[("a.c", code.as_str())]))
        .skipping("imported")
        .assert_excluded("imported")
        .assert_order(&["kept"])
        .assert_counter_runs(1)
        .run()
        .unwrap();
}

#[test]
fn test_missing_counter_aborts_run() {
    let previous = "repo,date,first_commit,analysis_commit,total_lines,cost_estimate\n\
                    old,2022-01-01,aaaa,bbbb,5000,700000.00\n";

    Scenario::new("missing_counter")
        .with_repo(RepoSpec::new("any").commit("2023-01-15T10:00:00+00:00", &[("a.c", source_lines(3).as_str())]))
        .with_existing_table(previous)
        .without_counter()
        .assert_fatal()
        .assert_row_count(0)
        .assert_counter_runs(0)
        .assert_table_unchanged(previous)
        .run()
        .unwrap();
}

#[test]
fn test_uncounted_sources_raise_anomaly() {
    Scenario::new("zero_count_anomaly")
        .with_repo(
            RepoSpec::new("java").commit("2023-01-15T10:00:00+00:00", &[("Main.java", "class Main {}\n")]),
        )
        .assert_lines("java", 0)
        .assert_anomaly("java")
        .assert_counter_runs(1)
        .run()
        .unwrap();
}

#[test]
fn test_documentation_only_repository() {
    Scenario::new("docs_only")
        .with_repo(RepoSpec::new("notes").commit("2023-01-15T10:00:00+00:00", &[("README.md", "# notes\n")]))
        .assert_lines("notes", 0)
        .assert_counter_runs(1)
        .run()
        .unwrap();
}
