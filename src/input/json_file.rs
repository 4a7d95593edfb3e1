// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/json_file.rs - JSON 文件输入
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

use std::{fs::File, io::BufReader, vec::IntoIter};

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::record::parse_frame, path_from_url, tensor::InferenceOutput};

#[derive(Error, Debug)]
pub enum JsonFileInputError {
  #[error("URI scheme 不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 从单个 JSON 文件读取帧
///
/// 文件内容可以是一个帧对象，也可以是帧对象数组。
pub struct JsonFileInput {
  frames: IntoIter<Value>,
}

impl FromUrlWithScheme for JsonFileInput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonFileInput {
  type Error = JsonFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme 不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonFileInputError::SchemeMismatch);
    }

    let path = path_from_url(url);
    info!("读取 JSON 帧文件: {}", path.display());
    let document: Value = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
    Ok(Self::from_document(document))
  }
}

impl JsonFileInput {
  pub fn from_document(document: Value) -> Self {
    let frames = match document {
      Value::Array(frames) => frames,
      frame => vec![frame],
    };
    Self {
      frames: frames.into_iter(),
    }
  }
}

impl Iterator for JsonFileInput {
  type Item = InferenceOutput;

  fn next(&mut self) -> Option<Self::Item> {
    self.frames.next().map(parse_frame)
  }
}
