// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 推理输出帧来源
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
use tracing::error;

use crate::{FromUrl, FromUrlWithScheme, tensor::InferenceOutput};

mod json_file;
mod jsonl_file;
pub mod record;
mod synthetic;

pub use self::json_file::{JsonFileInput, JsonFileInputError};
pub use self::jsonl_file::{JsonLinesInput, JsonLinesInputError};
pub use self::synthetic::{SyntheticInput, SyntheticInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("JSON 文件输入错误: {0}")]
  JsonFileInputError(#[from] JsonFileInputError),
  #[error("JSON Lines 文件输入错误: {0}")]
  JsonLinesInputError(#[from] JsonLinesInputError),
  #[error("合成输入错误: {0}")]
  SyntheticInputError(#[from] SyntheticInputError),
  #[error("不支持的输入 URI scheme: {0}")]
  SchemeMismatch(String),
}

/// 按 URI scheme 选择的帧来源
pub enum InputWrapper {
  JsonFile(JsonFileInput),
  JsonLines(JsonLinesInput),
  Synthetic(SyntheticInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      JsonFileInput::SCHEME => Ok(InputWrapper::JsonFile(JsonFileInput::from_url(url)?)),
      <JsonLinesInput>::SCHEME => Ok(InputWrapper::JsonLines(<JsonLinesInput>::from_url(url)?)),
      SyntheticInput::SCHEME => Ok(InputWrapper::Synthetic(SyntheticInput::from_url(url)?)),
      other => {
        error!("不支持的输入 URI scheme: {}", other);
        Err(InputError::SchemeMismatch(other.to_string()))
      }
    }
  }
}

impl Iterator for InputWrapper {
  type Item = InferenceOutput;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::JsonFile(input) => input.next(),
      InputWrapper::JsonLines(input) => input.next(),
      InputWrapper::Synthetic(input) => input.next(),
    }
  }
}
