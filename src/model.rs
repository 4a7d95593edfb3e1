// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model.rs - 检测结果与模型特征定义
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

use serde::{Deserialize, Serialize};

use crate::summary::DetectionSummary;

pub mod decode;
pub mod nms;
pub mod pipeline;

pub use self::decode::TensorDecoder;
pub use self::nms::{NonMaxSuppressor, Suppressible};
pub use self::pipeline::{DetectionPipeline, Detector};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 归一化坐标下的矩形框：左上角 (x, y) 与宽高，均以图像边长的比例表示
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl NormalizedRect {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 由模型输入像素空间中的中心点格式 (cx, cy, w, h) 转换，并逐项限制到 [0, 1]
  pub fn from_center_pixels(cx: f32, cy: f32, w: f32, h: f32, side: f32) -> Self {
    Self::new(
      (cx - w / 2.0) / side,
      (cy - h / 2.0) / side,
      w / side,
      h / side,
    )
    .clamped()
  }

  /// 每个分量独立限制到 [0, 1]
  pub fn clamped(self) -> Self {
    Self::new(
      self.x.clamp(0.0, 1.0),
      self.y.clamp(0.0, 1.0),
      self.width.clamp(0.0, 1.0),
      self.height.clamp(0.0, 1.0),
    )
  }

  pub fn right(&self) -> f32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.height
  }

  #[inline]
  pub fn area(&self) -> f32 {
    self.width * self.height
  }

  pub fn center(&self) -> (f32, f32) {
    (self.x + self.width / 2.0, self.y + self.height / 2.0)
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
  }

  /// 交集面积，不相交时为 0
  #[inline]
  pub fn intersection_area(&self, other: &NormalizedRect) -> f32 {
    let x1 = self.x.max(other.x);
    let y1 = self.y.max(other.y);
    let x2 = self.right().min(other.right());
    let y2 = self.bottom().min(other.bottom());

    if x2 <= x1 || y2 <= y1 {
      return 0.0;
    }
    (x2 - x1) * (y2 - y1)
  }

  /// 交并比；无交集或并集面积为 0 时定义为 0
  #[inline]
  pub fn iou(&self, other: &NormalizedRect) -> f32 {
    let intersection = self.intersection_area(other);
    if intersection <= 0.0 {
      return 0.0;
    }

    let union = self.area() + other.area() - intersection;
    if union > 0.0 {
      intersection / union
    } else {
      0.0
    }
  }
}

/// 解码得到、尚未去重的候选框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
  pub class_index: usize,
  pub confidence: f32,
  pub bbox: NormalizedRect,
}

/// 最终检测结果，构造后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  label: String,
  confidence: f32,
  bbox: NormalizedRect,
}

impl Detection {
  pub fn new(label: impl Into<String>, confidence: f32, bbox: NormalizedRect) -> Self {
    Self {
      label: label.into(),
      confidence,
      bbox,
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  pub fn bbox(&self) -> &NormalizedRect {
    &self.bbox
  }
}

/// 单帧检测结果，按置信度降序排列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
    self.items.iter()
  }

  pub fn most_confident(&self) -> Option<&Detection> {
    self.items.first()
  }

  pub fn summary(&self) -> DetectionSummary {
    DetectionSummary::from_detections(&self.items)
  }
}

impl<'a> IntoIterator for &'a DetectResult {
  type Item = &'a Detection;
  type IntoIter = std::slice::Iter<'a, Detection>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPS: f32 = 1e-6;

  #[test]
  fn iou_matches_closed_form() {
    let a = NormalizedRect::new(0.0, 0.0, 0.5, 0.5);
    let b = NormalizedRect::new(0.25, 0.25, 0.5, 0.5);
    // 交集 0.0625，并集 0.4375
    assert!((a.iou(&b) - 0.0625 / 0.4375).abs() < EPS);
    assert!((b.iou(&a) - a.iou(&b)).abs() < EPS);
  }

  #[test]
  fn identical_boxes_have_unit_iou() {
    let a = NormalizedRect::new(0.1, 0.2, 0.3, 0.4);
    assert!((a.iou(&a) - 1.0).abs() < EPS);
  }

  #[test]
  fn disjoint_and_touching_boxes_have_zero_iou() {
    let a = NormalizedRect::new(0.0, 0.0, 0.3, 0.3);
    let far = NormalizedRect::new(0.6, 0.6, 0.3, 0.3);
    let touching = NormalizedRect::new(0.3, 0.0, 0.3, 0.3);
    assert_eq!(a.iou(&far), 0.0);
    assert_eq!(a.iou(&touching), 0.0);
  }

  #[test]
  fn zero_area_boxes_have_zero_iou() {
    let a = NormalizedRect::new(0.5, 0.5, 0.0, 0.0);
    assert_eq!(a.iou(&a), 0.0);
  }

  #[test]
  fn center_pixels_to_normalized_corner() {
    let rect = NormalizedRect::from_center_pixels(320.0, 160.0, 64.0, 128.0, 640.0);
    assert!((rect.x - 0.45).abs() < EPS);
    assert!((rect.y - 0.15).abs() < EPS);
    assert!((rect.width - 0.1).abs() < EPS);
    assert!((rect.height - 0.2).abs() < EPS);
  }

  #[test]
  fn partially_out_of_frame_box_is_clamped_per_component() {
    let rect = NormalizedRect::from_center_pixels(0.0, 700.0, 100.0, 800.0, 640.0);
    assert_eq!(rect.x, 0.0);
    assert!((rect.y - 300.0 / 640.0).abs() < EPS);
    assert!((rect.width - 100.0 / 640.0).abs() < EPS);
    assert_eq!(rect.height, 1.0);
  }

  #[test]
  fn detection_result_exposes_first_as_most_confident() {
    let result = DetectResult::from(vec![
      Detection::new("dog", 0.9, NormalizedRect::new(0.0, 0.0, 0.2, 0.2)),
      Detection::new("cat", 0.4, NormalizedRect::new(0.5, 0.5, 0.2, 0.2)),
    ]);
    assert_eq!(result.len(), 2);
    assert_eq!(result.most_confident().map(Detection::label), Some("dog"));
  }
}
