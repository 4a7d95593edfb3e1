// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/synthetic.rs - 合成检测张量输入
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

use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  Configuration, FromUrl, FromUrlWithScheme,
  config::{YOLO11_ANCHOR_NUM, YOLO11_BOX_CHANNELS, YOLO11_CLASS_NUM, YOLO11_INPUT_SIDE},
  labels::ClassNames,
  tensor::{InferenceOutput, TensorOutput},
};

const DEFAULT_HITS: usize = 20;
const DEFAULT_FRAMES: usize = 1;

#[derive(Error, Debug)]
pub enum SyntheticInputError {
  #[error("URI scheme 不匹配")]
  SchemeMismatch,
  #[error("参数 {name} 的值无效: {value}")]
  InvalidParameter { name: String, value: String },
  #[error("未知参数: {0}")]
  UnknownParameter(String),
}

/// 生成确定性的稠密检测张量，用于基准测试和端到端演示
///
/// `synthetic://?anchors=8400&classes=80&hits=20&frames=1`
///
/// 背景锚点的分数都低于 0.1；每个命中位置放置一个高分框，
/// 并在相邻锚点放置一个稍有偏移、分数更低的重复框，供 NMS 去除。
pub struct SyntheticInput {
  tensor: TensorOutput,
  remaining: usize,
}

impl FromUrlWithScheme for SyntheticInput {
  const SCHEME: &'static str = "synthetic";
}

fn parse_param(name: &str, value: &str, min: usize) -> Result<usize, SyntheticInputError> {
  match value.parse::<usize>() {
    Ok(parsed) if parsed >= min => Ok(parsed),
    _ => Err(SyntheticInputError::InvalidParameter {
      name: name.to_string(),
      value: value.to_string(),
    }),
  }
}

impl FromUrl for SyntheticInput {
  type Error = SyntheticInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme 不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(SyntheticInputError::SchemeMismatch);
    }

    let mut anchors = YOLO11_ANCHOR_NUM;
    let mut classes = YOLO11_CLASS_NUM;
    let mut hits = DEFAULT_HITS;
    let mut frames = DEFAULT_FRAMES;
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "anchors" => anchors = parse_param("anchors", &value, 1)?,
        "classes" => classes = parse_param("classes", &value, 1)?,
        "hits" => hits = parse_param("hits", &value, 0)?,
        "frames" => frames = parse_param("frames", &value, 0)?,
        other => return Err(SyntheticInputError::UnknownParameter(other.to_string())),
      }
    }

    if YOLO11_BOX_CHANNELS
      .checked_add(classes)
      .and_then(|channels| channels.checked_mul(anchors))
      .is_none()
    {
      error!("合成张量尺寸溢出: 锚点 {}, 类别 {}", anchors, classes);
      return Err(SyntheticInputError::InvalidParameter {
        name: "anchors".to_string(),
        value: format!("{} (类别 {}, 张量尺寸溢出)", anchors, classes),
      });
    }

    info!(
      "合成输入: 锚点 {}, 类别 {}, 命中 {}, 帧数 {}",
      anchors, classes, hits, frames
    );
    Ok(Self::new(anchors, classes, hits, frames))
  }
}

impl SyntheticInput {
  pub fn new(anchors: usize, classes: usize, hits: usize, frames: usize) -> Self {
    Self {
      tensor: synthesize(anchors, classes, hits),
      remaining: frames,
    }
  }

  pub fn tensor(&self) -> &TensorOutput {
    &self.tensor
  }

  pub fn classes(&self) -> usize {
    self.tensor.shape()[1] - YOLO11_BOX_CHANNELS
  }

  /// 让配置的类别表与合成张量的类别数一致
  ///
  /// 类别数不一致时每一帧都会在解码阶段被丢弃；此时截断或补齐类别表，
  /// 补齐的类别命名为 `class<索引>`。
  pub fn fit_configuration(&self, config: Configuration) -> Configuration {
    let classes = self.classes();
    let configured = config.class_names();
    if configured.len() == classes {
      return config;
    }

    warn!(
      "合成输入类别数 {} 与配置类别数 {} 不一致, 按合成输入调整类别表",
      classes,
      configured.len()
    );
    let names = ClassNames::new(
      configured
        .iter()
        .map(str::to_string)
        .chain((configured.len()..classes).map(|index| format!("class{}", index)))
        .take(classes)
        .collect::<Vec<_>>(),
    );
    config.with_class_names(names)
  }
}

impl Iterator for SyntheticInput {
  type Item = InferenceOutput;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    self.remaining -= 1;
    Some(InferenceOutput::Tensor(self.tensor.clone()))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

/// 构造 `[1, 4 + classes, anchors]` 的行主序张量
fn synthesize(anchors: usize, classes: usize, hits: usize) -> TensorOutput {
  let channels = YOLO11_BOX_CHANNELS + classes;
  let side = YOLO11_INPUT_SIDE as f32;
  let mut data = vec![0.0f32; channels * anchors];
  let mut set = |channel: usize, anchor: usize, value: f32| data[channel * anchors + anchor] = value;

  for anchor in 0..anchors {
    // 背景框：网格上的中等尺寸框，分数低于默认阈值
    let cx = (anchor % 80) as f32 * 8.0 + 4.0;
    let cy = ((anchor / 80) % 80) as f32 * 8.0 + 4.0;
    set(0, anchor, cx);
    set(1, anchor, cy);
    set(2, anchor, 32.0);
    set(3, anchor, 32.0);
    for class in 0..classes {
      let noise = ((anchor * 31 + class * 17) % 97) as f32 / 1000.0;
      set(YOLO11_BOX_CHANNELS + class, anchor, noise);
    }
  }

  let hits = hits.min(anchors);
  let step = if hits == 0 { 0 } else { anchors / hits };
  for i in 0..hits {
    let anchor = i * step;
    let class = i % classes;
    let score = 0.5 + 0.4 * (i as f32 / hits as f32);
    let cx = side * (0.1 + 0.8 * ((i * 7) % 10) as f32 / 10.0);
    let cy = side * (0.1 + 0.8 * ((i * 3) % 10) as f32 / 10.0);
    let size = side * 0.08;

    set(0, anchor, cx);
    set(1, anchor, cy);
    set(2, anchor, size);
    set(3, anchor, size);
    set(YOLO11_BOX_CHANNELS + class, anchor, score);

    // 相邻锚点上的重复框
    let twin = anchor + 1;
    if step > 1 && twin < anchors {
      set(0, twin, cx + 2.0);
      set(1, twin, cy + 1.0);
      set(2, twin, size);
      set(3, twin, size);
      set(YOLO11_BOX_CHANNELS + class, twin, score - 0.1);
    }
  }

  TensorOutput::contiguous(data, vec![1, channels, anchors])
}
