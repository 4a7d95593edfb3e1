// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, labels::ClassNames, model::DetectResult, tensor::InferenceOutput,
};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

mod directory_record;
mod jsonl_output;
mod log_output;
mod null_output;

pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError, RecordLabel};
pub use self::jsonl_output::{JsonLinesOutput, JsonLinesOutputError};
pub use self::log_output::{LogOutput, LogOutputSchemeMismatch};
pub use self::null_output::NullOutput;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("日志输出错误: {0}")]
  LogOutputError(#[from] LogOutputSchemeMismatch),
  #[error("JSON Lines 输出错误: {0}")]
  JsonLinesOutputError(#[from] JsonLinesOutputError),
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("不支持的输出 URI 方案: {0}")]
  SchemeMismatch(String),
}

impl From<Infallible> for OutputError {
  fn from(never: Infallible) -> Self {
    match never {}
  }
}

pub enum OutputWrapper {
  Log(LogOutput),
  JsonLines(JsonLinesOutput),
  DirectoryRecord(DirectoryRecordOutput),
  Null(NullOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      LogOutput::SCHEME => Ok(OutputWrapper::Log(LogOutput::from_url(url)?)),
      JsonLinesOutput::SCHEME => Ok(OutputWrapper::JsonLines(JsonLinesOutput::from_url(url)?)),
      DirectoryRecordOutput::SCHEME => Ok(OutputWrapper::DirectoryRecord(
        DirectoryRecordOutput::from_url(url)?,
      )),
      NullOutput::SCHEME => Ok(OutputWrapper::Null(NullOutput::from_url(url)?)),
      other => {
        error!("不支持的输出 URI 方案: {}", other);
        Err(OutputError::SchemeMismatch(other.to_string()))
      }
    }
  }
}

impl OutputWrapper {
  /// 需要类别索引的输出使用给定的类别表，其余输出不受影响
  pub fn with_class_names(self, class_names: ClassNames) -> Self {
    match self {
      OutputWrapper::DirectoryRecord(output) => {
        OutputWrapper::DirectoryRecord(output.with_class_names(class_names))
      }
      other => other,
    }
  }
}

impl Render<InferenceOutput, DetectResult> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &InferenceOutput, result: &DetectResult) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Log(output) => output.render_result(frame, result).map_err(OutputError::from),
      OutputWrapper::JsonLines(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::DirectoryRecord(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      OutputWrapper::Null(output) => output.render_result(frame, result).map_err(OutputError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dispatches_on_scheme() {
    for (uri, expected) in [
      ("log://", "log"),
      ("null://", "null"),
      ("folder:///tmp/records?record=name", "folder"),
    ] {
      let output = OutputWrapper::from_url(&Url::parse(uri).unwrap()).unwrap();
      let kind = match output {
        OutputWrapper::Log(_) => "log",
        OutputWrapper::JsonLines(_) => "jsonl",
        OutputWrapper::DirectoryRecord(_) => "folder",
        OutputWrapper::Null(_) => "null",
      };
      assert_eq!(kind, expected);
    }

    assert!(matches!(
      OutputWrapper::from_url(&Url::parse("rtsp://camera/stream").unwrap()),
      Err(OutputError::SchemeMismatch(_))
    ));
  }
}
