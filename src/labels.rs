// 该文件是 Shanan （山南西风） 项目的一部分。
// src/labels.rs - 类别名称表
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

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// 未知类别索引对应的标签
pub const UNKNOWN_LABEL: &str = "unknown";

/// COCO 数据集类别名称
pub const COCO_CLASSES: [&str; 80] = [
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "backpack",
  "umbrella",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "dining table",
  "toilet",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("类别文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("类别文件中没有任何类别: {0}")]
  Empty(String),
}

/// 类别索引到名称的查询
pub trait LabelTable {
  fn label_of(&self, class_index: usize) -> &str;
}

/// 按类别索引排列的类别名称表
///
/// 构造后只读，克隆只增加引用计数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ClassNames {
  names: Arc<[String]>,
}

impl Default for ClassNames {
  fn default() -> Self {
    Self::coco()
  }
}

impl From<Vec<String>> for ClassNames {
  fn from(names: Vec<String>) -> Self {
    Self {
      names: names.into(),
    }
  }
}

impl From<ClassNames> for Vec<String> {
  fn from(names: ClassNames) -> Self {
    names.names.to_vec()
  }
}

impl ClassNames {
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      names: names.into_iter().map(Into::into).collect(),
    }
  }

  pub fn coco() -> Self {
    Self::new(COCO_CLASSES)
  }

  /// 从文本文件加载类别表，每行一个类别，忽略空行和 `#` 开头的注释行
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    info!("加载类别文件: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let names = Self::new(
      content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#')),
    );

    if names.is_empty() {
      return Err(LabelError::Empty(path.display().to_string()));
    }

    debug!("类别数量: {}", names.len());
    Ok(names)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn index_of(&self, label: &str) -> Option<usize> {
    self.names.iter().position(|name| name == label)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.names.iter().map(String::as_str)
  }
}

impl LabelTable for ClassNames {
  fn label_of(&self, class_index: usize) -> &str {
    self
      .names
      .get(class_index)
      .map(String::as_str)
      .unwrap_or(UNKNOWN_LABEL)
  }
}
