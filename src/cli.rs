//! # 命令行前端
//!
//! 最薄的一层展示：解析参数 → 驱动 `DiagnosisService` → 打印快照。

use std::path::PathBuf;

use crate::analysis::{AnalysisStatus, SubmitReport};
use crate::capture::UnavailableCamera;
use crate::config::AppConfig;
use crate::diagnosis::{ConfidenceBand, DiagnosisReport, DiagnosisTable};
use crate::error::AppError;
use crate::service::{DiagnosisService, DiagnosisView};
use crate::settings;

/// 已解析的命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze {
        image: PathBuf,
        endpoint: Option<String>,
        config: Option<PathBuf>,
        json: bool,
    },
    Table {
        config: Option<PathBuf>,
    },
    Config {
        config: Option<PathBuf>,
    },
    Help,
}

pub fn print_help() {
    println!("leaf-diagnosis - 叶片图片诊断");
    println!();
    println!("用法:");
    println!("  leaf-diagnosis analyze <image> [--endpoint URL] [--config FILE] [--json]");
    println!("  leaf-diagnosis table [--config FILE]");
    println!("  leaf-diagnosis config [--config FILE]");
    println!("  leaf-diagnosis help");
    println!();
    println!("环境变量:");
    println!("  {}  覆盖分类接口地址", settings::ENDPOINT_ENV);
    println!("  RUST_LOG                 日志级别（默认 info）");
}

/// 解析参数，`args[0]` 为程序名。
pub fn parse_args(args: &[String]) -> Result<Command, AppError> {
    let rest = args.get(2..).unwrap_or_default();

    match args.get(1).map(|s| s.as_str()) {
        Some("analyze") => {
            let mut image = None;
            let mut endpoint = None;
            let mut config = None;
            let mut json = false;

            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--endpoint" => endpoint = Some(flag_value(&mut iter, "--endpoint")?),
                    "--config" => config = Some(PathBuf::from(flag_value(&mut iter, "--config")?)),
                    "--json" => json = true,
                    flag if flag.starts_with("--") => {
                        return Err(AppError::Config(format!("未知参数：{}", flag)));
                    }
                    path if image.is_none() => image = Some(PathBuf::from(path)),
                    extra => return Err(AppError::Config(format!("多余的参数：{}", extra))),
                }
            }

            let image = image.ok_or_else(|| AppError::Config("缺少图片路径".to_string()))?;
            Ok(Command::Analyze {
                image,
                endpoint,
                config,
                json,
            })
        }
        Some(name @ ("table" | "config")) => {
            let mut config = None;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--config" => config = Some(PathBuf::from(flag_value(&mut iter, "--config")?)),
                    other => return Err(AppError::Config(format!("未知参数：{}", other))),
                }
            }
            if name == "table" {
                Ok(Command::Table { config })
            } else {
                Ok(Command::Config { config })
            }
        }
        Some("help" | "--help" | "-h") | None => Ok(Command::Help),
        Some(other) => Err(AppError::Config(format!("未知命令：{}", other))),
    }
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<String, AppError> {
    iter.next()
        .cloned()
        .ok_or_else(|| AppError::Config(format!("{} 需要一个值", flag)))
}

/// 执行命令并返回进程退出码。
pub async fn run_from_args(args: &[String]) -> i32 {
    let command = match parse_args(args) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("运行 `leaf-diagnosis help` 查看用法");
            return 2;
        }
    };

    match run(command).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("❌ 执行失败 [{}]: {}", err.code(), err);
            eprintln!("{}", err);
            1
        }
    }
}

pub async fn run(command: Command) -> Result<i32, AppError> {
    match command {
        Command::Help => {
            print_help();
            Ok(0)
        }
        Command::Table { config } => {
            let config = settings::load_settings(config.as_deref())?;
            print!("{}", render_table(&config.load_table()?));
            Ok(0)
        }
        Command::Config { config } => {
            let config = settings::load_settings(config.as_deref())?;
            let text = serde_json::to_string_pretty(&config)
                .map_err(|e| AppError::Config(format!("序列化设置失败: {}", e)))?;
            println!("{}", text);
            Ok(0)
        }
        Command::Analyze {
            image,
            endpoint,
            config,
            json,
        } => {
            let mut app_config: AppConfig = settings::load_settings(config.as_deref())?;
            if let Some(endpoint) = endpoint {
                app_config.analysis.endpoint = endpoint;
            }

            let service = DiagnosisService::with_http(&app_config, UnavailableCamera)?;
            service.select_path(&image)?;
            let report = service.analyze().await;
            log::debug!("📨 提交结果: {:?}", report);

            let view = service.view();
            if json {
                let text = serde_json::to_string_pretty(&view)
                    .map_err(|e| AppError::Config(format!("序列化结果失败: {}", e)))?;
                println!("{}", text);
            } else {
                print!("{}", render_view(&view));
            }

            let succeeded = matches!(report, SubmitReport::Completed(AnalysisStatus::Succeeded));
            Ok(if succeeded { 0 } else { 1 })
        }
    }
}

/// 诊断快照的纯文本形式。
pub fn render_view(view: &DiagnosisView) -> String {
    let mut out = String::new();

    if let Some(selection) = &view.selection {
        out.push_str(&format!(
            "Image: {} ({}, {} bytes)\n",
            selection.file_name, selection.mime_type, selection.size_bytes
        ));
    }

    match (&view.diagnosis, &view.failure) {
        (Some(report), _) => {
            let record = &report.record;
            out.push_str(&format!("{}: {}\n", report.severity_title, report.display_label));
            out.push_str(&format!(
                "Confidence: {}% ({}{})\n",
                record.confidence_percent(),
                band_name(report),
                if report.very_high_confidence {
                    ", very high confidence"
                } else {
                    ""
                }
            ));
            out.push_str(&format!("Description: {}\n", record.description()));
            out.push_str(&format!("Recommended action: {}\n", record.recommended_action()));
        }
        (None, Some(failure)) => {
            out.push_str(&format!("Analysis failed: {}\n", failure.message));
        }
        (None, None) => {
            out.push_str(&format!("Analysis status: {:?}\n", view.analysis));
        }
    }

    out
}

fn band_name(report: &DiagnosisReport) -> &'static str {
    match report.confidence_band {
        ConfidenceBand::Strong => "strong",
        ConfidenceBand::Moderate => "moderate",
        ConfidenceBand::Weak => "weak",
    }
}

/// 诊断表的纯文本形式。
pub fn render_table(table: &DiagnosisTable) -> String {
    let mut out = String::new();
    for label in table.labels() {
        if let Some(entry) = table.entry(label) {
            out.push_str(&format!("[{}] {}\n", entry.severity.as_str(), label));
            out.push_str(&format!("  {}\n", entry.description));
            out.push_str(&format!("  -> {}\n", entry.recommended_action));
        }
    }
    out
}
