// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/nms.rs - 按类别的非极大值抑制
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

use tracing::debug;

use crate::{
  labels::LabelTable,
  model::{Candidate, Detection, NormalizedRect},
};

/// 可参与非极大值抑制的框
pub trait Suppressible {
  fn confidence(&self) -> f32;
  fn bbox(&self) -> &NormalizedRect;
  /// 只有同类别的框之间才会互相抑制
  fn same_class(&self, other: &Self) -> bool;
}

impl Suppressible for Candidate {
  fn confidence(&self) -> f32 {
    self.confidence
  }

  fn bbox(&self) -> &NormalizedRect {
    &self.bbox
  }

  fn same_class(&self, other: &Self) -> bool {
    self.class_index == other.class_index
  }
}

impl Suppressible for Detection {
  fn confidence(&self) -> f32 {
    Detection::confidence(self)
  }

  fn bbox(&self) -> &NormalizedRect {
    Detection::bbox(self)
  }

  fn same_class(&self, other: &Self) -> bool {
    self.label() == other.label()
  }
}

/// 贪心抑制：按置信度降序（稳定排序）遍历，
/// 与已保留的同类框 IoU 超过阈值的框被丢弃。结果保持置信度降序。
pub fn suppress_greedy<T: Suppressible>(mut boxes: Vec<T>, iou_threshold: f32) -> Vec<T> {
  boxes.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

  let mut kept: Vec<T> = Vec::with_capacity(boxes.len());
  for candidate in boxes {
    let duplicated = kept
      .iter()
      .filter(|k| k.same_class(&candidate))
      .any(|k| k.bbox().iou(candidate.bbox()) > iou_threshold);
    if !duplicated {
      kept.push(candidate);
    }
  }
  kept
}

/// 非极大值抑制，并在抑制后解析类别名称
#[derive(Debug, Clone, Copy, Default)]
pub struct NonMaxSuppressor;

impl NonMaxSuppressor {
  pub fn new() -> Self {
    Self
  }

  pub fn suppress<L>(
    &self,
    candidates: Vec<Candidate>,
    iou_threshold: f32,
    labels: &L,
  ) -> Vec<Detection>
  where
    L: LabelTable + ?Sized,
  {
    let before = candidates.len();
    let kept = suppress_greedy(candidates, iou_threshold);
    debug!("NMS: {} -> {}", before, kept.len());

    kept
      .into_iter()
      .map(|c| Detection::new(labels.label_of(c.class_index), c.confidence, c.bbox))
      .collect()
  }

  /// 对已带标签的检测结果再做一次抑制，按标签区分类别
  pub fn suppress_detections(&self, detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    suppress_greedy(detections, iou_threshold)
  }
}
