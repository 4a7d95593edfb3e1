// 该文件是 Shanan （山南西风） 项目的一部分。
// src/bin/benchmark_repeatshot.rs - 后处理耗时基准
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_detect::{
  CapPolicy, Configuration, Detector, FromUrl,
  input::InputWrapper,
  output::NullOutput,
  task::{RepeatShotTask, Task},
};
use tracing::info;

/// 反复对同一帧做后处理，输出平均耗时
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  #[arg(long, value_name = "SOURCE", default_value = "synthetic://?hits=20")]
  pub input: Url,
  /// 重复次数
  #[arg(long, value_name = "COUNT", default_value_t = 1000)]
  pub repeat: usize,
  /// JSON 配置文件
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 候选框达到上限时的策略
  #[arg(long, value_name = "POLICY")]
  pub cap_policy: Option<CapPolicy>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("重复次数: {}", args.repeat);

  let mut config = match &args.config {
    Some(path) => Configuration::from_json_file(path)?,
    None => Configuration::default(),
  };
  if let Some(policy) = args.cap_policy {
    config = config.with_cap_policy(policy);
  }

  let input = InputWrapper::from_url(&args.input)?;
  if let InputWrapper::Synthetic(synthetic) = &input {
    config = synthetic.fit_configuration(config);
  }
  let detector = Detector::from(config);

  RepeatShotTask::default()
    .with_repeat(args.repeat)
    .run_task(input, detector, NullOutput)?;

  Ok(())
}
