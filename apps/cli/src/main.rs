//! # k4arecorder
//!
//! 深度相机录制工具。
//!
//! ```bash
//! # 列出设备
//! k4arecorder --list
//!
//! # 录制 10 秒 720p 彩色 + 宽视场深度 + IMU
//! k4arecorder -l 10 -c 720p -d WFOV_2X2BINNED --imu on output.mkv
//!
//! # 无硬件演练
//! k4arecorder --backend mock -l 2 output.mkv
//! ```
//!
//! Ctrl-C 请求停止录制；停止超过 1 秒仍未退出时，再次 Ctrl-C 强制退出。

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use k4a_record::{StopFlag, StopRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod backend;
mod commands;
mod config;
mod validation;

use backend::{Backend, with_provider};
use commands::RecordArgs;
use config::FileConfig;

/// k4arecorder - 深度相机录制工具
#[derive(Parser, Debug)]
#[command(name = "k4arecorder")]
#[command(about = "Record depth camera color, depth and IMU streams to a Matroska file", long_about = None)]
#[command(override_usage = "k4arecorder [options] output.mkv")]
#[command(version)]
struct Cli {
    /// List the currently connected devices
    #[arg(long)]
    list: bool,

    /// Device backend (default: auto)
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Read option defaults from this TOML file
    /// (default: <config dir>/k4arecorder/config.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    record: RecordArgs,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version 走正常输出
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        },
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

/// 日志输出到 stderr，stdout 只留给录制进度
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let backend = cli.backend.or(file.backend).unwrap_or_default();

    if cli.list {
        return with_provider!(backend, |provider| {
            commands::list::execute(&provider);
            Ok(())
        });
    }

    let options = cli
        .record
        .with_defaults(&file)
        .to_recording_options(cli.output.clone().unwrap_or_default())?;

    if cli.output.is_none() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let stop = install_stop_handler()?;
    with_provider!(backend, |provider| commands::record::execute(
        &provider, &options, &stop
    ))
}

/// 第一次 Ctrl-C 请求停止；停止超时后再次 Ctrl-C 直接以失败状态退出
fn install_stop_handler() -> Result<StopFlag> {
    let stop = StopFlag::new();
    let handler_flag = stop.clone();

    ctrlc::set_handler(move || match handler_flag.request_stop() {
        StopRequest::Graceful => println!("Stopping recording..."),
        StopRequest::Force => {
            println!("Forcing stop.");
            std::process::exit(1);
        },
        StopRequest::Ignored => {},
    })
    .context("Failed to set signal handler")?;

    Ok(stop)
}
