// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

use shanan_detect::{
  CapPolicy, Configuration,
  config::ConfigError,
  labels::ClassNames,
};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
  /// 处理全部帧
  #[default]
  Continuous,
  /// 只处理第一帧
  Oneshot,
}

/// Shanan 检测后处理
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  /// 支持格式:
  /// - json:///path/frames.json
  /// - jsonl:///path/frames.jsonl
  /// - synthetic://?anchors=8400&classes=80&hits=20&frames=1
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出
  /// 支持格式:
  /// - log://
  /// - jsonl:///path/out.jsonl 或 jsonl://- (标准输出)
  /// - folder:///path/records?record=name|id&always
  /// - null://
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,

  /// JSON 配置文件
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 类别文件，每行一个类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// NMS IoU 阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub iou: Option<f32>,

  /// 模型输入边长（像素）
  #[arg(long, value_name = "PIXELS")]
  pub input_side: Option<u32>,

  /// 每帧候选框上限
  #[arg(long, value_name = "COUNT")]
  pub max_candidates: Option<usize>,

  /// 候选框达到上限时的策略: scan-order 或 top-confidence
  #[arg(long, value_name = "POLICY")]
  pub cap_policy: Option<CapPolicy>,

  /// 最大处理帧数
  #[arg(long, value_name = "COUNT")]
  pub frame_number: Option<usize>,

  /// 运行模式
  #[arg(long, value_enum, default_value_t = Mode::Continuous)]
  pub mode: Mode,
}

impl Args {
  /// 默认值 < 配置文件 < 命令行
  pub fn configuration(&self) -> Result<Configuration, ConfigError> {
    let mut config = match &self.config {
      Some(path) => Configuration::from_json_file(path)?,
      None => Configuration::default(),
    };

    if let Some(labels) = &self.labels {
      config = config.with_class_names(ClassNames::from_file(labels)?);
    }
    if let Some(threshold) = self.confidence {
      config = config.with_confidence_threshold(threshold);
    }
    if let Some(threshold) = self.iou {
      config = config.with_iou_threshold(threshold);
    }
    if let Some(side) = self.input_side {
      config = config.with_model_input_side(side);
    }
    if let Some(max_candidates) = self.max_candidates {
      config = config.with_max_candidates(max_candidates);
    }
    if let Some(policy) = self.cap_policy {
      config = config.with_cap_policy(policy);
    }
    Ok(config)
  }
}
