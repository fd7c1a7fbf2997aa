use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "safety-detect")]
#[command(about = "安全設備検出クライアント（検出・履歴・ダウンロード）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 検出エンドポイント（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像（またはフォルダ内の画像）を検出してダウンロードファイルを保存
    Detect {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/csv/png/excel/all)
        #[arg(short, long, default_value = "all")]
        format: ExportFormat,
    },

    /// 保存済みの検出レスポンスJSONからダウンロードファイルを生成
    Export {
        /// レスポンスJSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (json/csv/png/excel/all)
        #[arg(short, long, default_value = "all")]
        format: ExportFormat,
    },

    /// 対話セッション（検出履歴・Undo・フラグ付け）
    Session {
        /// ダウンロードファイルの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/編集
    Config {
        /// 検出エンドポイントを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// Undo可能な秒数を設定
        #[arg(long)]
        set_undo_window: Option<u64>,

        /// 低信頼度の閾値を設定 (0.0-1.0)
        #[arg(long)]
        set_threshold: Option<f64>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Png,
    Excel,
    #[default]
    All,
}

impl ExportFormat {
    pub fn includes(&self, other: ExportFormat) -> bool {
        *self == ExportFormat::All || *self == other
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "png" | "image" => Ok(ExportFormat::Png),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "all" => Ok(ExportFormat::All),
            _ => Err(format!("Unknown format: {}. Use json, csv, png, excel, or all", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Png => write!(f, "png"),
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_includes() {
        assert!(ExportFormat::All.includes(ExportFormat::Png));
        assert!(ExportFormat::Csv.includes(ExportFormat::Csv));
        assert!(!ExportFormat::Csv.includes(ExportFormat::Json));
    }

    #[test]
    fn test_parse_detect_args() {
        let cli = Cli::parse_from(["safety-detect", "detect", "site.jpg", "-f", "csv", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Detect { input, format, output } => {
                assert_eq!(input, PathBuf::from("site.jpg"));
                assert_eq!(format, ExportFormat::Csv);
                assert!(output.is_none());
            }
            _ => panic!("detectコマンドとして解析されていない"),
        }
    }
}
