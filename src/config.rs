// 该文件是 Shanan （山南西风） 项目的一部分。
// src/config.rs - 检测配置
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

use std::{
  fs::File,
  io::BufReader,
  path::{Path, PathBuf},
  str::FromStr,
  sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::labels::{ClassNames, LabelError};

pub const YOLO11_INPUT_SIDE: u32 = 640;
pub const YOLO11_ANCHOR_NUM: usize = 8400;
pub const YOLO11_CLASS_NUM: usize = 80;
pub const YOLO11_BOX_CHANNELS: usize = 4;

/// 归一化后宽或高小于该值的框视为退化框
pub const MIN_BOX_EXTENT: f32 = 0.01;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_MAX_CANDIDATES: usize = 50;

const THRESHOLD_MIN: f32 = 0.001;
const THRESHOLD_MAX: f32 = 0.999;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("类别文件错误: {0}")]
  LabelError(#[from] LabelError),
}

/// 候选框数量达到上限时的取舍策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapPolicy {
  /// 扫描过程中达到上限即停止，保留先扫描到的锚点
  #[default]
  ScanOrder,
  /// 扫描全部锚点，只保留置信度最高的若干个
  TopConfidence,
}

impl FromStr for CapPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "scan-order" => Ok(CapPolicy::ScanOrder),
      "top-confidence" => Ok(CapPolicy::TopConfidence),
      other => Err(format!(
        "未知的候选框上限策略 '{}', 可选值: scan-order, top-confidence",
        other
      )),
    }
  }
}

/// 检测后处理配置
///
/// 每次调用流水线时以只读方式传入，流水线本身不会修改它。
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
  confidence_threshold: f32,
  iou_threshold: f32,
  class_names: ClassNames,
  model_input_side: u32,
  max_candidates: usize,
  cap_policy: CapPolicy,
}

impl Default for Configuration {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      class_names: ClassNames::coco(),
      model_input_side: YOLO11_INPUT_SIDE,
      max_candidates: DEFAULT_MAX_CANDIDATES,
      cap_policy: CapPolicy::ScanOrder,
    }
  }
}

/// 把阈值限制在开区间 (0, 1) 内；NaN 回退到默认值
fn clamp_threshold(name: &str, value: f32, default: f32) -> f32 {
  if value.is_nan() {
    warn!("{} 为 NaN, 使用默认值 {}", name, default);
    return default;
  }
  let clamped = value.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
  if clamped != value {
    warn!("{} 超出范围: {}, 已限制为 {}", name, value, clamped);
  }
  clamped
}

impl Configuration {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.set_confidence_threshold(threshold);
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.set_iou_threshold(threshold);
    self
  }

  pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
    self.class_names = class_names;
    self
  }

  pub fn with_model_input_side(mut self, side: u32) -> Self {
    if side == 0 {
      warn!("模型输入边长不能为 0, 已限制为 1");
    }
    self.model_input_side = side.max(1);
    self
  }

  pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
    if max_candidates == 0 {
      warn!("候选框上限不能为 0, 已限制为 1");
    }
    self.max_candidates = max_candidates.max(1);
    self
  }

  pub fn with_cap_policy(mut self, policy: CapPolicy) -> Self {
    self.cap_policy = policy;
    self
  }

  pub fn set_confidence_threshold(&mut self, threshold: f32) {
    self.confidence_threshold =
      clamp_threshold("置信度阈值", threshold, DEFAULT_CONFIDENCE_THRESHOLD);
  }

  pub fn set_iou_threshold(&mut self, threshold: f32) {
    self.iou_threshold = clamp_threshold("IoU 阈值", threshold, DEFAULT_IOU_THRESHOLD);
  }

  pub fn confidence_threshold(&self) -> f32 {
    self.confidence_threshold
  }

  pub fn iou_threshold(&self) -> f32 {
    self.iou_threshold
  }

  pub fn class_names(&self) -> &ClassNames {
    &self.class_names
  }

  pub fn model_input_side(&self) -> u32 {
    self.model_input_side
  }

  pub fn max_candidates(&self) -> usize {
    self.max_candidates
  }

  pub fn cap_policy(&self) -> CapPolicy {
    self.cap_policy
  }

  /// 从 JSON 配置文件加载，未给出的字段使用默认值
  pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    let file: ConfigFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    file.apply_to(Configuration::default(), base_dir)
  }
}

/// 配置文件内容，所有字段可选
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
  pub confidence_threshold: Option<f32>,
  pub iou_threshold: Option<f32>,
  /// 类别文件路径，相对路径以配置文件所在目录为基准
  pub labels: Option<PathBuf>,
  pub model_input_side: Option<u32>,
  pub max_candidates: Option<usize>,
  pub cap_policy: Option<CapPolicy>,
}

impl ConfigFile {
  pub fn apply_to(
    self,
    mut config: Configuration,
    base_dir: &Path,
  ) -> Result<Configuration, ConfigError> {
    if let Some(threshold) = self.confidence_threshold {
      config.set_confidence_threshold(threshold);
    }
    if let Some(threshold) = self.iou_threshold {
      config.set_iou_threshold(threshold);
    }
    if let Some(labels) = self.labels {
      let labels = if labels.is_relative() {
        base_dir.join(labels)
      } else {
        labels
      };
      config = config.with_class_names(ClassNames::from_file(labels)?);
    }
    if let Some(side) = self.model_input_side {
      config = config.with_model_input_side(side);
    }
    if let Some(max_candidates) = self.max_candidates {
      config = config.with_max_candidates(max_candidates);
    }
    if let Some(policy) = self.cap_policy {
      config = config.with_cap_policy(policy);
    }
    debug!("配置: {:?}", config);
    Ok(config)
  }
}

/// 可在多个线程间共享的配置句柄
///
/// 每次调用通过 [`SharedConfiguration::snapshot`] 取得一致的快照；
/// 更新采用后写者胜出，只对之后的调用可见。
#[derive(Debug, Clone, Default)]
pub struct SharedConfiguration {
  inner: Arc<RwLock<Arc<Configuration>>>,
}

impl From<Configuration> for SharedConfiguration {
  fn from(config: Configuration) -> Self {
    Self::new(config)
  }
}

impl SharedConfiguration {
  pub fn new(config: Configuration) -> Self {
    Self {
      inner: Arc::new(RwLock::new(Arc::new(config))),
    }
  }

  pub fn snapshot(&self) -> Arc<Configuration> {
    let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(&*guard)
  }

  pub fn update<F>(&self, f: F)
  where
    F: FnOnce(&mut Configuration),
  {
    let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    let mut next = (**guard).clone();
    f(&mut next);
    *guard = Arc::new(next);
  }

  pub fn replace(&self, config: Configuration) {
    let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Arc::new(config);
  }
}
