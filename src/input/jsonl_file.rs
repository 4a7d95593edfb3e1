// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/jsonl_file.rs - JSON Lines 文件输入
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
  io::{BufRead, BufReader, Lines},
};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, input::record::parse_frame_str, path_from_url,
  tensor::InferenceOutput,
};

#[derive(Error, Debug)]
pub enum JsonLinesInputError {
  #[error("URI scheme 不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 逐行读取帧，每行一个 JSON 帧对象
///
/// 按需读取，不会把整个文件载入内存。空行被跳过；
/// 读取过程中出现 I/O 错误时记录错误并结束。
pub struct JsonLinesInput<R = BufReader<File>> {
  lines: Lines<R>,
  line_number: usize,
  finished: bool,
}

impl FromUrlWithScheme for JsonLinesInput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesInput {
  type Error = JsonLinesInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme 不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonLinesInputError::SchemeMismatch);
    }

    let path = path_from_url(url);
    info!("读取 JSON Lines 帧文件: {}", path.display());
    Ok(Self::from_reader(BufReader::new(File::open(&path)?)))
  }
}

impl<R: BufRead> JsonLinesInput<R> {
  pub fn from_reader(reader: R) -> Self {
    Self {
      lines: reader.lines(),
      line_number: 0,
      finished: false,
    }
  }
}

impl<R: BufRead> Iterator for JsonLinesInput<R> {
  type Item = InferenceOutput;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }
    loop {
      self.line_number += 1;
      match self.lines.next()? {
        Ok(line) if line.trim().is_empty() => continue,
        Ok(line) => return Some(parse_frame_str(&line)),
        Err(e) => {
          error!("读取第 {} 行失败: {}, 停止读取", self.line_number, e);
          self.finished = true;
          return None;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn skips_blank_lines() {
    let text = "{\"type\":\"observations\",\"observations\":[]}\n\n   \n{\"type\":\"other\"}\n";
    let kinds: Vec<_> = JsonLinesInput::from_reader(Cursor::new(text))
      .map(|frame| frame.kind())
      .collect();
    assert_eq!(kinds, vec!["observations", "unrecognized"]);
  }

  #[test]
  fn broken_line_does_not_end_stream() {
    let text = "not json\n{\"type\":\"observations\",\"observations\":[]}\n";
    let kinds: Vec<_> = JsonLinesInput::from_reader(Cursor::new(text))
      .map(|frame| frame.kind())
      .collect();
    assert_eq!(kinds, vec!["unrecognized", "observations"]);
  }

  #[test]
  fn invalid_utf8_ends_stream() {
    let bytes: &[u8] = b"{\"type\":\"observations\",\"observations\":[]}\n\xff\xfe\n{\"type\":\"x\"}\n";
    let frames: Vec<_> = JsonLinesInput::from_reader(Cursor::new(bytes)).collect();
    assert_eq!(frames.len(), 1);
  }
}
