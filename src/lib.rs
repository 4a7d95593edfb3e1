// 该文件是 Shanan （山南西风） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod config;
pub mod input;
pub mod labels;
pub mod model;
pub mod output;
pub mod summary;
pub mod task;
pub mod tensor;

pub use config::{CapPolicy, Configuration, SharedConfiguration};
pub use model::pipeline::{DetectionPipeline, Detector};
pub use model::{Candidate, DetectResult, Detection, Model, NormalizedRect};
pub use tensor::{InferenceOutput, Observation, TensorOutput};

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 从 URL 中取出文件路径
///
/// `json:///tmp/a.json` 为绝对路径；`json://a.json` 会把主机部分当作相对路径的开头。
pub(crate) fn path_from_url(url: &url::Url) -> PathBuf {
  match url.host_str() {
    Some(host) if !host.is_empty() => PathBuf::from(format!("{}{}", host, url.path())),
    _ => PathBuf::from(url.path()),
  }
}
