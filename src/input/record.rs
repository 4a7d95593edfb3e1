// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input/record.rs - 帧记录解析
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

use serde::Deserialize;
use serde_json::Value;

use crate::tensor::{InferenceOutput, Observation, TensorOutput};

const TYPE_FIELD: &str = "type";
const TYPE_TENSOR: &str = "tensor";
const TYPE_OBSERVATIONS: &str = "observations";

#[derive(Deserialize)]
struct ObservationRecord {
  observations: Vec<Observation>,
}

/// 把一条 JSON 帧记录转换为推理输出
///
/// 类型字段缺失、未知，或者记录内容无法解析时得到 [`InferenceOutput::Unrecognized`]，
/// 由流水线记录警告后跳过该帧。
pub fn parse_frame(value: Value) -> InferenceOutput {
  let kind = match value.get(TYPE_FIELD) {
    Some(Value::String(kind)) => kind.clone(),
    Some(other) => return InferenceOutput::Unrecognized(format!("类型字段不是字符串: {}", other)),
    None => return InferenceOutput::Unrecognized("缺少类型字段".to_string()),
  };

  match kind.as_str() {
    TYPE_TENSOR => match serde_json::from_value::<TensorOutput>(value) {
      Ok(tensor) => InferenceOutput::Tensor(tensor),
      Err(e) => InferenceOutput::Unrecognized(format!("张量记录解析失败: {}", e)),
    },
    TYPE_OBSERVATIONS => match serde_json::from_value::<ObservationRecord>(value) {
      Ok(record) => InferenceOutput::Observations(record.observations),
      Err(e) => InferenceOutput::Unrecognized(format!("观测记录解析失败: {}", e)),
    },
    other => InferenceOutput::Unrecognized(format!("未知的帧类型: {}", other)),
  }
}

/// 解析一行文本，JSON 语法错误同样视为无法识别的帧
pub fn parse_frame_str(text: &str) -> InferenceOutput {
  match serde_json::from_str::<Value>(text) {
    Ok(value) => parse_frame(value),
    Err(e) => InferenceOutput::Unrecognized(format!("JSON 解析失败: {}", e)),
  }
}
