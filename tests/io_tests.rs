// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/io_tests.rs - 输入输出端到端测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod common;

use std::path::Path;

use serde_json::{Value, json};
use url::Url;

use common::{anchor, tensor};
use shanan_detect::{
  Configuration, Detector, FromUrl,
  input::InputWrapper,
  labels::ClassNames,
  output::OutputWrapper,
  task::{ContinuousTask, OneShotTask, Task},
};

fn tensor_frame() -> Value {
  let t = tensor(
    2,
    4,
    &[
      anchor([320.0, 320.0, 100.0, 100.0], 0, 0.8),
      anchor([325.0, 320.0, 100.0, 100.0], 0, 0.6),
      anchor([100.0, 100.0, 64.0, 64.0], 1, 0.7),
    ],
  );
  json!({
    "type": "tensor",
    "shape": t.shape(),
    "strides": t.strides(),
    "data": t.data(),
  })
}

fn observation_frame() -> Value {
  json!({
    "type": "observations",
    "observations": [
      {"label": "helmet", "confidence": 0.95, "bbox": {"x": 0.1, "y": 0.1, "width": 0.2, "height": 0.2}},
      {"label": "vest", "confidence": 0.05, "bbox": {"x": 0.5, "y": 0.5, "width": 0.2, "height": 0.2}}
    ]
  })
}

fn url_for(scheme: &str, path: &Path) -> Url {
  Url::parse(&format!("{}://{}", scheme, path.display())).unwrap()
}

fn config() -> Configuration {
  Configuration::default().with_class_names(ClassNames::new(["helmet", "vest"]))
}

fn read_lines(path: &Path) -> Vec<Value> {
  std::fs::read_to_string(path)
    .unwrap()
    .lines()
    .map(|line| serde_json::from_str(line).unwrap())
    .collect()
}

#[test]
fn jsonl_frames_to_jsonl_output() {
  let dir = tempfile::tempdir().unwrap();
  let input_path = dir.path().join("frames.jsonl");
  let output_path = dir.path().join("detections.jsonl");
  let lines = [
    tensor_frame().to_string(),
    String::new(),
    json!({"type": "pixel_buffer"}).to_string(),
    observation_frame().to_string(),
  ];
  std::fs::write(&input_path, lines.join("\n")).unwrap();

  let input = InputWrapper::from_url(&url_for("jsonl", &input_path)).unwrap();
  let output = OutputWrapper::from_url(&url_for("jsonl", &output_path)).unwrap();
  ContinuousTask::default()
    .run_task(input, Detector::from(config()), output)
    .unwrap();

  let frames = read_lines(&output_path);
  assert_eq!(frames.len(), 3);

  let labels: Vec<&str> = frames[0]["detections"]
    .as_array()
    .unwrap()
    .iter()
    .map(|d| d["label"].as_str().unwrap())
    .collect();
  assert_eq!(labels, vec!["helmet", "vest"]);
  assert_eq!(frames[0]["summary"]["total"], 2);

  assert_eq!(frames[1]["summary"]["total"], 0);

  assert_eq!(frames[2]["detections"][0]["label"], "helmet");
  assert_eq!(frames[2]["summary"]["total"], 1);
}

#[test]
fn frame_limit_stops_continuous_task() {
  let dir = tempfile::tempdir().unwrap();
  let input_path = dir.path().join("frames.json");
  let output_path = dir.path().join("detections.jsonl");
  let frames = Value::Array(vec![observation_frame(); 5]);
  std::fs::write(&input_path, frames.to_string()).unwrap();

  let input = InputWrapper::from_url(&url_for("json", &input_path)).unwrap();
  let output = OutputWrapper::from_url(&url_for("jsonl", &output_path)).unwrap();
  ContinuousTask::default()
    .with_frame_number(Some(2))
    .run_task(input, Detector::from(config()), output)
    .unwrap();

  assert_eq!(read_lines(&output_path).len(), 2);
}

#[test]
fn one_shot_writes_folder_record() {
  let dir = tempfile::tempdir().unwrap();
  let input_path = dir.path().join("frame.json");
  std::fs::write(&input_path, tensor_frame().to_string()).unwrap();
  let records = dir.path().join("records");

  let input = InputWrapper::from_url(&url_for("json", &input_path)).unwrap();
  let output = OutputWrapper::from_url(
    &Url::parse(&format!("folder://{}?record=id", records.display())).unwrap(),
  )
  .unwrap()
  .with_class_names(ClassNames::new(["helmet", "vest"]));
  OneShotTask
    .run_task(input, Detector::from(config()), output)
    .unwrap();

  let mut files = Vec::new();
  let mut pending = vec![records];
  while let Some(dir) = pending.pop() {
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        pending.push(path);
      } else {
        files.push(path);
      }
    }
  }
  assert_eq!(files.len(), 1);
  let content = std::fs::read_to_string(&files[0]).unwrap();
  let ids: Vec<&str> = content
    .lines()
    .map(|line| line.split(", ").next().unwrap())
    .collect();
  assert_eq!(ids, vec!["0", "1"]);
}

#[test]
fn missing_input_file_is_a_hard_error() {
  let dir = tempfile::tempdir().unwrap();
  let url = url_for("jsonl", &dir.path().join("missing.jsonl"));
  assert!(InputWrapper::from_url(&url).is_err());
}

#[test]
fn one_shot_without_frames_fails() {
  let dir = tempfile::tempdir().unwrap();
  let input_path = dir.path().join("empty.json");
  std::fs::write(&input_path, "[]").unwrap();
  let input = InputWrapper::from_url(&url_for("json", &input_path)).unwrap();
  let output = OutputWrapper::from_url(&Url::parse("null://").unwrap()).unwrap();
  assert!(
    OneShotTask
      .run_task(input, Detector::from(config()), output)
      .is_err()
  );
}
