// 该文件是 Shanan （山南西风） 项目的一部分。
// tests/common/mod.rs - 测试用张量构造
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

#![allow(dead_code)]

use shanan_detect::TensorOutput;

/// 一个锚点：像素空间中心框与其类别编号、分数，其它类别分数为 0
#[derive(Debug)]
pub struct Anchor {
  pub bbox: [f32; 4],
  pub class: usize,
  pub score: f32,
}

pub fn anchor(bbox: [f32; 4], class: usize, score: f32) -> Anchor {
  Anchor { bbox, class, score }
}

/// 构造 `[1, 4 + classes, total]` 的行主序张量，前几个锚点按给定值填充，其余全为 0
pub fn tensor(classes: usize, total: usize, anchors: &[Anchor]) -> TensorOutput {
  assert!(anchors.len() <= total);
  let channels = 4 + classes;
  let mut data = vec![0.0f32; channels * total];
  for (a, anchor) in anchors.iter().enumerate() {
    for (c, value) in anchor.bbox.iter().enumerate() {
      data[c * total + a] = *value;
    }
    data[(4 + anchor.class) * total + a] = anchor.score;
  }
  TensorOutput::contiguous(data, vec![1, channels, total])
}

/// 参考几何：80 类、8400 个锚点
pub fn coco_tensor(anchors: &[Anchor]) -> TensorOutput {
  tensor(80, 8400, anchors)
}
