// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 检测后处理主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shanan_detect::{
  Detector, FromUrl,
  input::InputWrapper,
  output::OutputWrapper,
  task::{ContinuousTask, OneShotTask, Task},
};

use crate::args::{Args, Mode};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("输出: {}", args.output);

  let config = args.configuration()?;
  info!(
    "置信度阈值: {}, IoU 阈值: {}, 类别数: {}",
    config.confidence_threshold(),
    config.iou_threshold(),
    config.class_names().len()
  );

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?.with_class_names(config.class_names().clone());
  let detector = Detector::from(config);

  match args.mode {
    Mode::Continuous => ContinuousTask::default()
      .with_frame_number(args.frame_number)
      .run_task(input, detector, output)?,
    Mode::Oneshot => OneShotTask.run_task(input, detector, output)?,
  }

  Ok(())
}
