// 该文件是 Shanan （山南西风） 项目的一部分。
// src/summary.rs - 单帧检测结果统计
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

use serde::Serialize;

use crate::model::Detection;

/// 某个标签在一帧中的出现次数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
  pub label: String,
  pub count: usize,
  /// 该标签的最高置信度
  pub best_confidence: f32,
}

/// 单帧检测结果的按标签统计
///
/// 输入应为抑制后的结果（置信度降序），此时标签按首次出现的顺序排列即为置信度顺序。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
  total: usize,
  labels: Vec<LabelCount>,
  #[serde(skip)]
  detections: Vec<Detection>,
}

impl DetectionSummary {
  pub fn from_detections(detections: &[Detection]) -> Self {
    let mut labels: Vec<LabelCount> = Vec::new();
    for detection in detections {
      match labels.iter_mut().find(|c| c.label == detection.label()) {
        Some(entry) => {
          entry.count += 1;
          entry.best_confidence = entry.best_confidence.max(detection.confidence());
        }
        None => labels.push(LabelCount {
          label: detection.label().to_string(),
          count: 1,
          best_confidence: detection.confidence(),
        }),
      }
    }

    Self {
      total: detections.len(),
      labels,
      detections: detections.to_vec(),
    }
  }

  pub fn total(&self) -> usize {
    self.total
  }

  pub fn is_empty(&self) -> bool {
    self.total == 0
  }

  pub fn label_counts(&self) -> &[LabelCount] {
    &self.labels
  }

  /// 精确匹配标签的数量
  pub fn count_of(&self, label: &str) -> usize {
    self
      .labels
      .iter()
      .find(|c| c.label == label)
      .map_or(0, |c| c.count)
  }

  /// 标签包含给定片段的检测数量，例如 "cup" 同时匹配 "cup" 和 "teacup"
  pub fn count_matching(&self, fragment: &str) -> usize {
    self
      .labels
      .iter()
      .filter(|c| c.label.contains(fragment))
      .map(|c| c.count)
      .sum()
  }

  pub fn contains(&self, label: &str) -> bool {
    self.count_of(label) > 0
  }

  /// 置信度最高的前 n 个检测
  pub fn top(&self, n: usize) -> &[Detection] {
    &self.detections[..n.min(self.detections.len())]
  }

  pub fn most_confident(&self) -> Option<&Detection> {
    self.detections.first()
  }
}
