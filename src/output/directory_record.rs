// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
  path::{Path, PathBuf},
  sync::atomic::{AtomicU32, Ordering},
};

use chrono::{DateTime, Datelike, Local};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
  FromUrl, FromUrlWithScheme,
  labels::ClassNames,
  model::DetectResult,
  output::Render,
  path_from_url,
  tensor::InferenceOutput,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每条检测记录的第一列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLabel {
  /// 类别名称
  Name,
  /// 类别索引，不在类别表中的标签记为 -1
  Id,
}

/// 把检测结果按日期目录保存为文本记录
///
/// `folder:///data/records?record=id&always`，文件位于
/// `<目录>/<年>/<月>/<日>/<时-分-秒>-<帧号>.txt`，每行一个检测：
/// `标签, 置信度, x, y, 宽, 高`。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  label: RecordLabel,
  class_names: ClassNames,
  frame_counter: AtomicU32,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        uri.scheme()
      );
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let label = uri
      .query_pairs()
      .find(|(k, _)| k == "record")
      .map(|(_, v)| {
        if v == "id" {
          RecordLabel::Id
        } else {
          RecordLabel::Name
        }
      })
      .unwrap_or(RecordLabel::Name);
    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(Self::new(path_from_url(uri), label, always))
  }
}

impl DirectoryRecordOutput {
  pub fn new<P: Into<PathBuf>>(directory: P, label: RecordLabel, always: bool) -> Self {
    Self {
      directory: directory.into(),
      label,
      class_names: ClassNames::coco(),
      frame_counter: AtomicU32::new(0),
      always,
    }
  }

  /// 记录类别索引时使用的类别表
  pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
    self.class_names = class_names;
    self
  }

  fn frame_id(&self) -> u32 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed) + 1
  }

  fn frame_path(&self, now: DateTime<Local>) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.txt",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn record_lines(&self, result: &DetectResult) -> String {
    let mut records = Vec::with_capacity(result.len());
    for item in result {
      let name = match self.label {
        RecordLabel::Name => item.label().to_string(),
        RecordLabel::Id => self
          .class_names
          .index_of(item.label())
          .map_or_else(|| "-1".to_string(), |id| id.to_string()),
      };
      let bbox = item.bbox();
      records.push(format!(
        "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
        name,
        item.confidence(),
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height
      ));
    }
    records.join("\n")
  }

  fn write_record(&self, path: &Path, result: &DetectResult) -> Result<(), DirectoryRecordOutputError> {
    std::fs::write(path, self.record_lines(result))?;
    debug!("写入检测记录: {}", path.display());
    Ok(())
  }
}

impl Render<InferenceOutput, DetectResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, _frame: &InferenceOutput, result: &DetectResult) -> Result<(), Self::Error> {
    if self.always || !result.is_empty() {
      let path = self.frame_path(Local::now())?;
      self.write_record(&path, result)?;
    }
    Ok(())
  }
}
