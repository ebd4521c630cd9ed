//! Integration tests for the `gts train` and `gts infer` commands.

mod common;

use predicates::prelude::*;

#[test]
fn test_train_missing_pretrained_dir_fails_before_status() {
    let task = common::task(&["pos", "neg"]);
    std::fs::remove_dir(&task.pretrained).unwrap();
    let config = task.config("");

    task.train_cmd(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("pretrained_model_dir"));

    assert!(!task.task_dir.join("task_info.json").exists());
    assert!(!task.task_dir.join("train_label2id.json").exists());
}

#[test]
fn test_train_rejects_unknown_engine() {
    let task = common::task(&["pos"]);
    let config = task.config("");

    task.train_cmd_for(&config, "unknown", "classification")
        .assert()
        .failure()
        .stderr(predicate::str::contains("engine"));
}

#[test]
fn test_train_unsupported_pair_writes_nothing() {
    let task = common::task(&["pos"]);
    let config = task.config("");

    task.train_cmd_for(&config, "bagualu", "nli")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bagualu"));

    assert!(!task.task_dir.join("task_info.json").exists());
}

#[cfg(unix)]
#[test]
fn test_train_success_records_status_and_labels() {
    let task = common::task(&["pos", "neg"]);
    let config = task.config("[pipelines.ft_std]\nprogram = \"sh\"\nargs = [\"-c\", \"exit 0\"]\n");

    task.train_cmd(&config).arg("--json").assert().success();

    let record = task.status_record();
    assert_eq!(record["status"], "Train Success");
    assert_eq!(record["status_code"], 2);
    assert_eq!(record["train_data"], "train.json");
    assert!(record["save_path"].as_str().unwrap().ends_with("outputs"));

    let raw = std::fs::read_to_string(task.task_dir.join("train_label2id.json")).unwrap();
    let label2id: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(label2id["pos"]["id"], 0);
    assert_eq!(label2id["neg"]["id"], 1);
    assert!(task.task_dir.join("outputs").join("args.json").is_file());
}

#[cfg(unix)]
#[test]
fn test_train_failing_pipeline_marks_failed() {
    let task = common::task(&["pos", "neg"]);
    let config = task.config("[pipelines.ft_std]\nprogram = \"sh\"\nargs = [\"-c\", \"exit 1\"]\n");

    task.train_cmd(&config).assert().failure().stderr(predicate::str::contains("Training failed"));

    let record = task.status_record();
    assert_eq!(record["status"], "Train Failed");
    assert_eq!(record["status_code"], 3);
}

#[test]
fn test_train_without_configured_command_leaves_task_untouched() {
    let task = common::task(&["pos"]);
    let config = task.config("");

    task.train_cmd(&config).assert().failure().stderr(predicate::str::contains("ft_std"));

    assert!(!task.task_dir.join("task_info.json").exists());
    assert!(!task.task_dir.join("train_label2id.json").exists());
}

#[cfg(unix)]
#[test]
fn test_infer_after_training_echoes_in_order() {
    let task = common::task(&["pos", "neg"]);
    let model_dir = task.task_dir.join("outputs").join("student_output").join("finetune_output");
    let config = task.config(&format!(
        "[pipelines.ft_std]\nprogram = \"sh\"\nargs = [\"-c\", \"mkdir -p \\\"$0\\\"\", {model:?}]\n\n\
         [pipelines.clf_std]\nprogram = \"sh\"\nargs = [\"-c\", \"cat\"]\n",
        model = model_dir.to_str().unwrap()
    ));
    task.train_cmd(&config).assert().success();

    let input = task.root.path().join("input.jsonl");
    std::fs::write(&input, "{\"content\": \"first\"}\n{\"content\": \"second\"}\n").unwrap();

    let assert = common::gts(task.root.path())
        .arg("--config")
        .arg(&config)
        .arg("infer")
        .arg("--save-path")
        .arg(task.task_dir.join("outputs"))
        .arg("--input")
        .arg(&input)
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results, serde_json::json!([{ "text": "first" }, { "text": "second" }]));
}

#[test]
fn test_infer_unprepared_task_fails() {
    let task = common::task(&["pos"]);
    let input = task.root.path().join("input.jsonl");
    std::fs::write(&input, "{\"content\": \"x\"}\n").unwrap();

    common::gts(task.root.path())
        .arg("infer")
        .arg("--save-path")
        .arg(task.task_dir.join("outputs"))
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("args.json"));
}
