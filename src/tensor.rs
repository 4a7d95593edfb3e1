// 该文件是 Shanan （山南西风） 项目的一部分。
// src/tensor.rs - 推理输出定义
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
use thiserror::Error;

use crate::{config::YOLO11_BOX_CHANNELS, model::NormalizedRect};

const TENSOR_RANK: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorLayoutError {
  #[error("张量维度应为 3, 实际为 {0}")]
  RankMismatch(usize),
  #[error("步长数量应为 3, 实际为 {0}")]
  StrideRankMismatch(usize),
  #[error("批大小应为 1, 实际为 {0}")]
  BatchMismatch(usize),
  #[error("通道数应为 {expected} (4 + 类别数), 实际为 {actual}")]
  ChannelMismatch { expected: usize, actual: usize },
  #[error("数据长度不足: 需要 {required}, 实际 {actual}")]
  BufferTooShort { required: usize, actual: usize },
  #[error("张量索引溢出")]
  IndexOverflow,
}

/// 经过校验的张量布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorLayout {
  pub classes: usize,
  pub anchors: usize,
  pub channel_stride: usize,
  pub anchor_stride: usize,
}

/// 形状为 `[1, 4 + C, A]` 的原始检测张量
///
/// 元素 `(channel, anchor)` 位于 `channel * strides[1] + anchor * strides[2]`。
/// 步长随数据一起给出，不假设连续存储。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TensorRecord")]
pub struct TensorOutput {
  shape: Vec<usize>,
  strides: Vec<usize>,
  data: Vec<f32>,
}

/// 反序列化时 `strides` 可省略，按行主序补齐
#[derive(Deserialize)]
struct TensorRecord {
  shape: Vec<usize>,
  #[serde(default)]
  strides: Option<Vec<usize>>,
  data: Vec<f32>,
}

impl From<TensorRecord> for TensorOutput {
  fn from(record: TensorRecord) -> Self {
    match record.strides {
      Some(strides) => TensorOutput::new(record.data, record.shape, strides),
      None => TensorOutput::contiguous(record.data, record.shape),
    }
  }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
  let mut strides = vec![1usize; shape.len()];
  for i in (0..shape.len().saturating_sub(1)).rev() {
    strides[i] = strides[i + 1].saturating_mul(shape[i + 1]);
  }
  strides
}

impl TensorOutput {
  pub fn new(data: Vec<f32>, shape: Vec<usize>, strides: Vec<usize>) -> Self {
    Self {
      shape,
      strides,
      data,
    }
  }

  /// 行主序连续存储的张量
  pub fn contiguous(data: Vec<f32>, shape: Vec<usize>) -> Self {
    let strides = row_major_strides(&shape);
    Self::new(data, shape, strides)
  }

  pub fn shape(&self) -> &[usize] {
    &self.shape
  }

  pub fn strides(&self) -> &[usize] {
    &self.strides
  }

  pub fn data(&self) -> &[f32] {
    &self.data
  }

  /// 按给定类别数校验形状、步长与数据长度
  pub fn layout(&self, classes: usize) -> Result<TensorLayout, TensorLayoutError> {
    if self.shape.len() != TENSOR_RANK {
      return Err(TensorLayoutError::RankMismatch(self.shape.len()));
    }
    if self.strides.len() != TENSOR_RANK {
      return Err(TensorLayoutError::StrideRankMismatch(self.strides.len()));
    }

    let (batch, channels, anchors) = (self.shape[0], self.shape[1], self.shape[2]);
    if batch != 1 {
      return Err(TensorLayoutError::BatchMismatch(batch));
    }

    let expected = YOLO11_BOX_CHANNELS + classes;
    if channels != expected {
      return Err(TensorLayoutError::ChannelMismatch {
        expected,
        actual: channels,
      });
    }

    let layout = TensorLayout {
      classes,
      anchors,
      channel_stride: self.strides[1],
      anchor_stride: self.strides[2],
    };

    if anchors > 0 {
      // 最后一个元素 (channels - 1, anchors - 1) 必须落在缓冲区内
      let required = (channels - 1)
        .checked_mul(layout.channel_stride)
        .and_then(|c| {
          (anchors - 1)
            .checked_mul(layout.anchor_stride)
            .and_then(|a| c.checked_add(a))
        })
        .and_then(|last| last.checked_add(1))
        .ok_or(TensorLayoutError::IndexOverflow)?;
      if required > self.data.len() {
        return Err(TensorLayoutError::BufferTooShort {
          required,
          actual: self.data.len(),
        });
      }
    }

    Ok(layout)
  }
}

/// 推理层已解析好的检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
  pub label: String,
  pub confidence: f32,
  pub bbox: NormalizedRect,
}

impl Observation {
  pub fn new(label: impl Into<String>, confidence: f32, bbox: NormalizedRect) -> Self {
    Self {
      label: label.into(),
      confidence,
      bbox,
    }
  }
}

/// 推理步骤可能返回的输出形式
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutput {
  /// 原始检测张量，需要解码
  Tensor(TensorOutput),
  /// 已经带标签和框的观测结果
  Observations(Vec<Observation>),
  /// 无法识别的输出，携带诊断信息
  Unrecognized(String),
}

impl From<TensorOutput> for InferenceOutput {
  fn from(tensor: TensorOutput) -> Self {
    InferenceOutput::Tensor(tensor)
  }
}

impl From<Vec<Observation>> for InferenceOutput {
  fn from(observations: Vec<Observation>) -> Self {
    InferenceOutput::Observations(observations)
  }
}

impl InferenceOutput {
  pub fn kind(&self) -> &'static str {
    match self {
      InferenceOutput::Tensor(_) => "tensor",
      InferenceOutput::Observations(_) => "observations",
      InferenceOutput::Unrecognized(_) => "unrecognized",
    }
  }
}
