use clap::Parser;
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use error::Result;
use log::{debug, warn};
use safety_detect::{batch, cli, client, config, error, export, scanner, session};
use safety_detect_common::{
    parse_detect_response, DetectionHistory, DetectionRecord, FeedbackLog, SystemClock,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let config = Config::load()?;
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    debug!("endpoint: {}", endpoint);

    match cli.command {
        Commands::Detect { input, output, format } => {
            println!("🦺 safety-detect - 検出\n");

            // 1. 画像スキャン
            println!("[1/3] 画像をスキャン中...");
            let images = scanner::scan_input(&input)?;
            if images.is_empty() {
                return Err(error::DetectError::NoImagesFound(input.display().to_string()));
            }
            println!("✔ {}枚の画像\n", images.len());

            // 2. 検出
            println!("[2/3] 検出中... ({})", endpoint);
            let detector = client::DetectClient::new(&endpoint, config.timeout())?;
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let outcome = batch::detect_images(&detector, &images, format, &output_dir).await;
            let records = outcome.records;

            println!("\n[3/3] 出力中...");
            if format.includes(ExportFormat::Excel) && !records.is_empty() {
                let path = export::excel_path(&output_dir);
                export::excel::generate_excel(&records, &path)?;
                println!("✔ Excel出力: {}", path.display());
            }

            if !outcome.failures.is_empty() {
                warn!("{}枚の検出に失敗しました", outcome.failures.len());
            }
            println!("\n✅ 検出完了 ({}/{}枚)", records.len(), images.len());
        }

        Commands::Export { input, output, format } => {
            println!("📄 safety-detect - ダウンロードファイル生成\n");

            let content = std::fs::read_to_string(&input)?;
            let response = parse_detect_response(&content)?;
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));

            for path in export::write_downloads(&response, format, &output_dir, None)? {
                println!("✔ {}", path.display());
            }

            if format.includes(ExportFormat::Excel) {
                let file_name = input
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let record =
                    DetectionRecord::from_response(1, &response, session::now_string(), file_name);
                let path = export::excel_path(&output_dir);
                export::excel::generate_excel(std::slice::from_ref(&record), &path)?;
                println!("✔ {}", path.display());
            }

            println!("\n✅ 生成完了");
        }

        Commands::Session { output } => {
            println!("🦺 safety-detect - 対話セッション ({})", endpoint);

            let detector = client::DetectClient::new(&endpoint, config.timeout())?;
            let history = DetectionHistory::with_clock(SystemClock, config.undo_window());
            let feedback = FeedbackLog::new(config.low_confidence_threshold);
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));

            let mut session = session::Session::new(history, feedback, detector, output_dir);
            session.run().await?;
            println!("\n✅ セッション終了（履歴は保存されません）");
        }

        Commands::Config { set_endpoint, set_undo_window, set_threshold, show } => {
            let mut config = config;
            let changed =
                set_endpoint.is_some() || set_undo_window.is_some() || set_threshold.is_some();

            if let Some(endpoint) = set_endpoint {
                config.endpoint = endpoint;
            }
            if let Some(secs) = set_undo_window {
                config.undo_window_secs = secs;
            }
            if let Some(threshold) = set_threshold {
                config.low_confidence_threshold = threshold;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!("  エンドポイント: {}", config.endpoint);
                println!("  使用中のエンドポイント: {}", endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  Undo可能時間: {}秒", config.undo_window_secs);
                println!("  低信頼度の閾値: {}", config.low_confidence_threshold);
            }
        }
    }

    Ok(())
}
