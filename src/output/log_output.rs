// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/log_output.rs - 日志输出
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
  convert::Infallible,
  sync::atomic::{AtomicUsize, Ordering},
};

use tracing::{error, info};

use crate::{
  FromUrl, FromUrlWithScheme, model::DetectResult, output::Render, tensor::InferenceOutput,
};

#[derive(Debug, thiserror::Error)]
#[error("URI 方案不匹配")]
pub struct LogOutputSchemeMismatch;

/// 把每帧检测结果写入 tracing 日志
#[derive(Debug, Default)]
pub struct LogOutput {
  frame_counter: AtomicUsize,
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputSchemeMismatch;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(LogOutputSchemeMismatch);
    }
    Ok(Self::default())
  }
}

impl Render<InferenceOutput, DetectResult> for LogOutput {
  type Error = Infallible;

  fn render_result(&self, frame: &InferenceOutput, result: &DetectResult) -> Result<(), Self::Error> {
    let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
    for item in result {
      let bbox = item.bbox();
      info!(
        "帧 {}: {} {:.4} [{:.4}, {:.4}, {:.4}, {:.4}]",
        frame_id,
        item.label(),
        item.confidence(),
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height
      );
    }

    let summary = result.summary();
    let counts: Vec<String> = summary
      .label_counts()
      .iter()
      .map(|c| format!("{} x{}", c.label, c.count))
      .collect();
    info!(
      "帧 {} ({}): 共 {} 个检测 [{}]",
      frame_id,
      frame.kind(),
      summary.total(),
      counts.join(", ")
    );
    Ok(())
  }
}
