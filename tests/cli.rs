use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("labelcore 0.1.0"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("labelcore 0.1.0\n");
}

// Compile subcommand tests

#[test]
fn compile_prints_node_tree() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["compile", "tests/fixtures/image_classify.xml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"rectanglelabels\""))
        .stdout(predicate::str::contains("\"tagName\": \"RectangleLabels\""))
        .stdout(predicate::str::contains("\"toname\": \"img\""));
}

#[test]
fn compile_expands_repeater_from_task_data() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "compile",
        "tests/fixtures/repeater.xml",
        "--task",
        "tests/fixtures/task_repeater.yaml",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"page_0\""))
        .stdout(predicate::str::contains("\"name\": \"page_2\""))
        .stdout(predicate::str::contains("page_3").not())
        .stdout(predicate::str::contains("page_{{idx}}").not());
}

#[test]
fn compile_without_task_expands_repeater_to_nothing() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["compile", "tests/fixtures/repeater.xml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("page_0").not());
}

#[test]
fn compile_malformed_config_fails() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["compile", "tests/fixtures/malformed.xml"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration"));
}

#[test]
fn compile_reads_config_path_from_env() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.env("LABELCORE_CONFIG", "tests/fixtures/image_classify.xml");
    cmd.arg("compile");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"choices\""));
}

// Validate subcommand tests

#[test]
fn validate_valid_config_succeeds() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["validate", "tests/fixtures/image_classify.xml"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_config_fails() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["validate", "tests/fixtures/invalid_refs.xml"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("error(s)"))
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn validate_reports_config_error_codes() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["validate", "tests/fixtures/invalid_refs.xml"]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERR_TAG_NOT_FOUND in rectanglelabels.toname: 'photo'"))
        .stdout(predicate::str::contains("ERR_PARENT_TAG"))
        .stdout(predicate::str::contains("ERR_BAD_TYPE in rating.maxrating: 'lots'"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"error_count\": 0"))
        .stdout(predicate::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_json_output_lists_error_codes() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/invalid_refs.xml",
        "--output",
        "json",
    ]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("\"error\": \"ERR_TAG_NOT_FOUND\""))
        .stdout(predicate::str::contains("\"severity\": \"error\""));
}

#[test]
fn validate_task_with_valid_results_succeeds() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_image.json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Validation passed"));
}

#[test]
fn validate_task_reports_result_errors() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_bad_results.json",
    ]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("ERR_TAG_NOT_FOUND in result.from_name: 'ghost'"))
        .stdout(predicate::str::contains("ERR_BAD_TYPE in result.type: 'textarea'"))
        .stdout(predicate::str::contains("ERR_GENERAL in relation.to_id: 'nowhere'"))
        .stdout(predicate::str::contains("[WARN ] ERR_REQUIRED"));
}

#[test]
fn validate_warnings_pass_unless_strict() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_warning.json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 error(s) and 1 warning(s)"));

    let mut strict = Command::cargo_bin("labelcore").unwrap();
    strict.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_warning.json",
        "--strict",
    ]);
    strict.assert().failure();
}

#[test]
fn validate_unsupported_output_fails() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/image_classify.xml",
        "--output",
        "xml",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["validate", "nonexistent_config.xml"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

// Export subcommand tests

#[test]
fn export_prints_first_annotation() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "export",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_image.json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"r1\""))
        .stdout(predicate::str::contains("\"rectanglelabels\": ["))
        .stdout(predicate::str::contains("\"original_width\": 640"))
        .stdout(predicate::str::contains("\"choices\": ["))
        .stdout(predicate::str::contains("\"from_id\": \"r1\""));
}

#[test]
fn export_unknown_annotation_falls_back_to_first() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "export",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_image.json",
        "--annotation",
        "999",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"r2\""));
}

#[test]
fn export_from_prediction_uses_fresh_ids() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "export",
        "tests/fixtures/image_classify.xml",
        "--task",
        "tests/fixtures/task_image.json",
        "--from-prediction",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"x\": 12"))
        .stdout(predicate::str::contains("\"pr1\"").not());
}

#[test]
fn export_requires_task() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args(["export", "tests/fixtures/image_classify.xml"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--task"));
}

#[test]
fn export_task_without_annotations_fails() {
    let mut cmd = Command::cargo_bin("labelcore").unwrap();
    cmd.args([
        "export",
        "tests/fixtures/repeater.xml",
        "--task",
        "tests/fixtures/task_repeater.yaml",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
