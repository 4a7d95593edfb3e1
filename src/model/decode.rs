// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/decode.rs - 检测张量解码
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

use tracing::{debug, warn};

use crate::{
  config::{CapPolicy, Configuration, MIN_BOX_EXTENT, YOLO11_BOX_CHANNELS},
  model::{Candidate, NormalizedRect},
  tensor::{TensorLayout, TensorOutput},
};

/// 把 `[1, 4 + C, A]` 的检测张量解码为候选框
///
/// 解码过程中完成置信度过滤、坐标归一化和退化框剔除，不做去重。
/// 张量格式不符合预期时返回空序列并记录警告，不会让逐帧循环崩溃。
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorDecoder;

/// 按布局访问张量元素
struct Strided<'a> {
  data: &'a [f32],
  layout: TensorLayout,
}

impl Strided<'_> {
  #[inline]
  fn at(&self, channel: usize, anchor: usize) -> f32 {
    self.data[channel * self.layout.channel_stride + anchor * self.layout.anchor_stride]
  }

  /// 解码单个锚点，低于阈值或退化的框返回 None
  fn candidate(&self, anchor: usize, threshold: f32, side: f32) -> Option<Candidate> {
    // 分数相同时保留索引最小的类别
    let mut max_score = f32::NEG_INFINITY;
    let mut max_class = 0usize;
    for class_index in 0..self.layout.classes {
      let score = self.at(YOLO11_BOX_CHANNELS + class_index, anchor);
      if score > max_score {
        max_score = score;
        max_class = class_index;
      }
    }

    if !(max_score >= threshold) {
      return None;
    }

    let bbox = NormalizedRect::from_center_pixels(
      self.at(0, anchor),
      self.at(1, anchor),
      self.at(2, anchor),
      self.at(3, anchor),
      side,
    );

    if !bbox.is_finite() || !(bbox.width >= MIN_BOX_EXTENT && bbox.height >= MIN_BOX_EXTENT) {
      return None;
    }

    Some(Candidate {
      class_index: max_class,
      confidence: max_score,
      bbox,
    })
  }
}

impl TensorDecoder {
  pub fn new() -> Self {
    Self
  }

  pub fn decode(&self, tensor: &TensorOutput, config: &Configuration) -> Vec<Candidate> {
    let layout = match tensor.layout(config.class_names().len()) {
      Ok(layout) => layout,
      Err(e) => {
        warn!(
          "检测张量格式不符合预期 (形状 {:?}, 步长 {:?}): {}, 跳过本帧",
          tensor.shape(),
          tensor.strides(),
          e
        );
        return Vec::new();
      }
    };

    let strided = Strided {
      data: tensor.data(),
      layout,
    };
    let threshold = config.confidence_threshold();
    let side = config.model_input_side() as f32;
    let cap = config.max_candidates();

    let candidates = match config.cap_policy() {
      CapPolicy::ScanOrder => scan_order(&strided, threshold, side, cap),
      CapPolicy::TopConfidence => top_confidence(&strided, threshold, side, cap),
    };

    debug!(
      "解码 {} 个锚点, 得到 {} 个候选框",
      layout.anchors,
      candidates.len()
    );
    candidates
  }
}

/// 按扫描顺序收集，达到上限后立即停止
fn scan_order(strided: &Strided, threshold: f32, side: f32, cap: usize) -> Vec<Candidate> {
  let mut candidates = Vec::with_capacity(cap.min(strided.layout.anchors));
  for anchor in 0..strided.layout.anchors {
    if let Some(candidate) = strided.candidate(anchor, threshold, side) {
      candidates.push(candidate);
      if candidates.len() >= cap {
        debug!("候选框达到上限 {}, 在锚点 {} 处停止扫描", cap, anchor);
        break;
      }
    }
  }
  candidates
}

/// 扫描全部锚点，只保留置信度最高的 `cap` 个，结果按扫描顺序排列
fn top_confidence(strided: &Strided, threshold: f32, side: f32, cap: usize) -> Vec<Candidate> {
  let mut kept: Vec<(usize, Candidate)> = Vec::with_capacity(cap.min(strided.layout.anchors));
  for anchor in 0..strided.layout.anchors {
    let Some(candidate) = strided.candidate(anchor, threshold, side) else {
      continue;
    };

    if kept.len() < cap {
      kept.push((anchor, candidate));
      continue;
    }

    // 淘汰置信度最低者；同分时淘汰最晚扫描到的
    let weakest = kept
      .iter()
      .enumerate()
      .min_by(|(_, (anchor_a, a)), (_, (anchor_b, b))| {
        a.confidence
          .total_cmp(&b.confidence)
          .then(anchor_b.cmp(anchor_a))
      })
      .map(|(slot, _)| slot);

    if let Some(slot) = weakest
      && candidate.confidence > kept[slot].1.confidence
    {
      kept[slot] = (anchor, candidate);
    }
  }

  kept.sort_by_key(|(anchor, _)| *anchor);
  kept.into_iter().map(|(_, candidate)| candidate).collect()
}
