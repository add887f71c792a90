//! # 叶片诊断：命令行入口
//!
//! 本文件仅负责日志初始化与命令分发，业务逻辑详见 `lib.rs` 架构文档。

use leaf_diagnosis::cli;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let code = cli::run_from_args(&args).await;
    std::process::exit(code);
}
