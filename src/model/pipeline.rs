// 该文件是 Shanan （山南西风） 项目的一部分。
// src/model/pipeline.rs - 检测后处理流水线
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

use std::convert::Infallible;

use tracing::{debug, warn};

use crate::{
  config::{Configuration, MIN_BOX_EXTENT, SharedConfiguration},
  labels::{ClassNames, LabelTable},
  model::{Candidate, DetectResult, Detection, Model, NonMaxSuppressor, TensorDecoder},
  tensor::{InferenceOutput, Observation},
};

/// 观测结果的标签表
///
/// 类别表中已有的标签沿用其索引，没有的标签追加在表尾，
/// 这样观测结果的标签在抑制前后保持原样。
struct ObservationLabels<'a> {
  known: &'a ClassNames,
  extra: Vec<String>,
}

impl<'a> ObservationLabels<'a> {
  fn new(known: &'a ClassNames) -> Self {
    Self {
      known,
      extra: Vec::new(),
    }
  }

  fn intern(&mut self, label: &str) -> usize {
    if let Some(index) = self.known.index_of(label) {
      return index;
    }
    let offset = match self.extra.iter().position(|name| name == label) {
      Some(offset) => offset,
      None => {
        self.extra.push(label.to_string());
        self.extra.len() - 1
      }
    };
    self.known.len() + offset
  }
}

impl LabelTable for ObservationLabels<'_> {
  fn label_of(&self, class_index: usize) -> &str {
    match class_index.checked_sub(self.known.len()) {
      Some(offset) => self
        .extra
        .get(offset)
        .map(String::as_str)
        .unwrap_or(crate::labels::UNKNOWN_LABEL),
      None => self.known.label_of(class_index),
    }
  }
}

/// 解码、过滤与去重的完整流程
///
/// 无状态，可以在多个线程中同时使用；配置以只读方式逐次传入。
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionPipeline {
  decoder: TensorDecoder,
  suppressor: NonMaxSuppressor,
}

impl DetectionPipeline {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn run(&self, output: &InferenceOutput, config: &Configuration) -> Vec<Detection> {
    match output {
      InferenceOutput::Tensor(tensor) => {
        let candidates = self.decoder.decode(tensor, config);
        self
          .suppressor
          .suppress(candidates, config.iou_threshold(), config.class_names())
      }
      InferenceOutput::Observations(observations) => self.run_observations(observations, config),
      InferenceOutput::Unrecognized(reason) => {
        warn!("无法识别的推理输出: {}, 跳过本帧", reason);
        Vec::new()
      }
    }
  }

  fn run_observations(&self, observations: &[Observation], config: &Configuration) -> Vec<Detection> {
    let threshold = config.confidence_threshold();
    let mut labels = ObservationLabels::new(config.class_names());
    let candidates: Vec<Candidate> = observations
      .iter()
      .filter(|o| o.confidence >= threshold)
      .filter_map(|o| {
        // 逐项限制到 [0, 1]，丢弃含非有限值的框和退化框
        if !o.bbox.is_finite() {
          return None;
        }
        let bbox = o.bbox.clamped();
        if !(bbox.width >= MIN_BOX_EXTENT && bbox.height >= MIN_BOX_EXTENT) {
          return None;
        }
        Some(Candidate {
          class_index: labels.intern(&o.label),
          confidence: o.confidence,
          bbox,
        })
      })
      .collect();

    debug!(
      "观测结果 {} 个, 通过置信度过滤 {} 个",
      observations.len(),
      candidates.len()
    );
    self
      .suppressor
      .suppress(candidates, config.iou_threshold(), &labels)
  }
}

/// 以共享配置驱动的检测器
///
/// 每次推理开始时取一次配置快照，推理过程中的配置更新只对下一次调用可见。
#[derive(Debug, Clone, Default)]
pub struct Detector {
  pipeline: DetectionPipeline,
  config: SharedConfiguration,
}

impl Detector {
  pub fn new(config: SharedConfiguration) -> Self {
    Self {
      pipeline: DetectionPipeline::new(),
      config,
    }
  }

  pub fn config(&self) -> &SharedConfiguration {
    &self.config
  }
}

impl From<Configuration> for Detector {
  fn from(config: Configuration) -> Self {
    Self::new(SharedConfiguration::new(config))
  }
}

impl Model for Detector {
  type Input = InferenceOutput;
  type Output = DetectResult;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let config = self.config.snapshot();
    Ok(self.pipeline.run(input, &config).into())
  }
}
