// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/jsonl_output.rs - JSON Lines 输出
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
  io::{BufWriter, Write},
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectResult, Detection},
  output::Render,
  path_from_url,
  summary::DetectionSummary,
  tensor::InferenceOutput,
};

const STDOUT_TARGET: &str = "-";

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct FrameLine<'a> {
  frame: usize,
  detections: &'a [Detection],
  summary: DetectionSummary,
}

/// 每帧写一行 JSON：`{"frame": n, "detections": [...], "summary": {...}}`
///
/// `jsonl:///path/out.jsonl` 写入文件，`jsonl://-` 写入标准输出。
pub struct JsonLinesOutput {
  writer: Mutex<Box<dyn Write + Send>>,
  frame_counter: AtomicUsize,
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonLinesOutputError::SchemeMismatch);
    }

    if url.host_str() == Some(STDOUT_TARGET) {
      info!("检测结果写入标准输出");
      return Ok(Self::new(std::io::stdout()));
    }

    let path = path_from_url(url);
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    info!("检测结果写入文件: {}", path.display());
    Ok(Self::new(BufWriter::new(File::create(&path)?)))
  }
}

impl JsonLinesOutput {
  pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
    Self {
      writer: Mutex::new(Box::new(writer)),
      frame_counter: AtomicUsize::new(0),
    }
  }
}

impl Render<InferenceOutput, DetectResult> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, _frame: &InferenceOutput, result: &DetectResult) -> Result<(), Self::Error> {
    let line = FrameLine {
      frame: self.frame_counter.fetch_add(1, Ordering::Relaxed),
      detections: &result.items,
      summary: result.summary(),
    };

    let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
    serde_json::to_writer(&mut *writer, &line)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
  }
}
