// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/pipeline_scenarios.rs - 检测流水线场景测试
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

use std::{sync::Arc, thread};

use common::{anchor, coco_tensor};
use shanan_detect::{
  Configuration, DetectionPipeline, Detector, InferenceOutput, Model, NormalizedRect, Observation,
  SharedConfiguration, TensorOutput, config::MIN_BOX_EXTENT,
};

fn run(output: &InferenceOutput) -> Vec<shanan_detect::Detection> {
  DetectionPipeline::new().run(output, &Configuration::default())
}

#[test]
fn near_duplicate_same_class_keeps_higher_confidence() {
  let tensor = coco_tensor(&[
    anchor([320.0, 320.0, 100.0, 100.0], 0, 0.8),
    anchor([325.0, 320.0, 100.0, 100.0], 0, 0.6),
  ]);
  let detections = run(&tensor.into());
  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].label(), "person");
  assert_eq!(detections[0].confidence(), 0.8);
}

#[test]
fn identical_boxes_of_different_classes_both_survive() {
  let tensor = coco_tensor(&[
    anchor([320.0, 320.0, 100.0, 100.0], 0, 0.8),
    anchor([320.0, 320.0, 100.0, 100.0], 2, 0.7),
  ]);
  let detections = run(&tensor.into());
  let labels: Vec<&str> = detections.iter().map(|d| d.label()).collect();
  assert_eq!(labels, vec!["person", "car"]);
}

#[test]
fn all_scores_below_threshold_yield_nothing() {
  let tensor = coco_tensor(&[
    anchor([320.0, 320.0, 100.0, 100.0], 0, 0.2),
    anchor([100.0, 100.0, 50.0, 50.0], 5, 0.1),
  ]);
  assert!(run(&tensor.into()).is_empty());
}

#[test]
fn observations_are_filtered_but_otherwise_unchanged() {
  let kept_box = NormalizedRect::new(0.05, 0.1, 0.3, 0.6);
  let output = InferenceOutput::Observations(vec![
    Observation::new("person", 0.1, NormalizedRect::new(0.2, 0.2, 0.2, 0.2)),
    Observation::new("person", 0.87, kept_box),
  ]);
  let detections = run(&output);
  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].label(), "person");
  assert_eq!(detections[0].confidence(), 0.87);
  assert_eq!(detections[0].bbox(), &kept_box);
}

#[test]
fn channel_mismatch_yields_nothing() {
  let tensor = TensorOutput::contiguous(vec![0.9; 50 * 100], vec![1, 50, 100]);
  assert!(run(&tensor.into()).is_empty());
}

#[test]
fn unrecognized_output_yields_nothing() {
  let output = InferenceOutput::Unrecognized("CVPixelBuffer".to_string());
  assert!(run(&output).is_empty());
}

#[test]
fn repeated_runs_are_identical() {
  let tensor = coco_tensor(&[
    anchor([100.0, 100.0, 60.0, 60.0], 3, 0.5),
    anchor([104.0, 100.0, 60.0, 60.0], 3, 0.5),
    anchor([400.0, 300.0, 80.0, 120.0], 16, 0.9),
    anchor([200.0, 500.0, 40.0, 40.0], 0, 0.5),
  ]);
  let output = InferenceOutput::from(tensor);
  let first = run(&output);
  for _ in 0..5 {
    assert_eq!(run(&output), first);
  }
  // 同分时保留先扫描到的锚点
  assert_eq!(first.len(), 3);
  assert_eq!(first[0].label(), "dog");
}

#[test]
fn output_boxes_stay_in_unit_square() {
  let tensor = coco_tensor(&[
    anchor([0.0, 0.0, 200.0, 200.0], 1, 0.9),
    anchor([640.0, 640.0, 200.0, 200.0], 2, 0.9),
    anchor([320.0, 320.0, 2000.0, 2000.0], 3, 0.9),
  ]);
  let detections = run(&tensor.into());
  assert_eq!(detections.len(), 3);
  for d in &detections {
    let b = d.bbox();
    for v in [b.x, b.y, b.width, b.height] {
      assert!((0.0..=1.0).contains(&v));
    }
    assert!(b.width >= MIN_BOX_EXTENT && b.height >= MIN_BOX_EXTENT);
  }
}

#[test]
fn concurrent_calls_share_one_configuration() {
  let shared = SharedConfiguration::new(Configuration::default());
  let detector = Arc::new(Detector::new(shared.clone()));
  let output = Arc::new(InferenceOutput::from(coco_tensor(&[anchor(
    [320.0, 320.0, 100.0, 100.0],
    0,
    0.5,
  )])));

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let detector = Arc::clone(&detector);
      let output = Arc::clone(&output);
      thread::spawn(move || {
        for _ in 0..20 {
          let result = detector.infer(&output).unwrap();
          // 阈值只可能是 0.25 或 0.75 中的一个，结果要么有一个框要么为空
          assert!(result.len() <= 1);
        }
      })
    })
    .collect();

  shared.update(|config| config.set_confidence_threshold(0.75));
  for handle in handles {
    handle.join().unwrap();
  }
  assert!(detector.infer(&output).unwrap().is_empty());
}

#[test]
fn observation_boxes_respect_unit_square_and_extent() {
  let output = InferenceOutput::Observations(vec![
    Observation::new("person", 0.9, NormalizedRect::new(-0.2, 0.5, 0.3, 1.7)),
    Observation::new("car", 0.8, NormalizedRect::new(1.4, -3.0, 0.5, 0.5)),
    Observation::new("dog", 0.9, NormalizedRect::new(0.1, 0.1, 0.0, 0.3)),
    Observation::new("cat", 0.9, NormalizedRect::new(0.1, 0.1, 0.005, 0.3)),
    Observation::new("bird", 0.9, NormalizedRect::new(0.1, 0.1, f32::NAN, 0.3)),
    Observation::new("cup", 0.9, NormalizedRect::new(f32::INFINITY, 0.1, 0.2, 0.3)),
  ]);
  let detections = run(&output);
  let labels: Vec<&str> = detections.iter().map(|d| d.label()).collect();
  assert_eq!(labels, vec!["person", "car"]);
  for d in &detections {
    let b = d.bbox();
    for v in [b.x, b.y, b.width, b.height] {
      assert!((0.0..=1.0).contains(&v));
    }
    assert!(b.width >= MIN_BOX_EXTENT && b.height >= MIN_BOX_EXTENT);
  }
}
