//! 対話セッション
//!
//! 検出履歴ストアをセッションの間だけ保持し、メニューから
//! 検出・一覧・削除・全消去・Undo・フラグ付け・書き出しを行う。
//! 削除と全消去はdialoguerの確認を通してからストアへ渡す。

use crate::cli::ExportFormat;
use crate::client::{DetectClient, Upload};
use crate::error::Result;
use crate::export::{self, excel};
use crate::report;
use crate::scanner::{self, ImageInfo};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm as ConfirmPrompt, Input, Select};
use indicatif::ProgressBar;
use log::warn;
use safety_detect_common::{
    Clock, Confirm, DetectionHistory, DetectionRecord, Dispatched, FeedbackLog, HistoryAction,
    RecordId,
};
use std::path::PathBuf;
use std::time::Duration;

pub const FLAGGED_LOG_FILE_NAME: &str = "flagged_detections.csv";

/// dialoguerによる確認
pub struct DialoguerConfirm;

impl Confirm for DialoguerConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        ConfirmPrompt::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// メニュー項目
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Detect,
    List,
    Show,
    Delete,
    Clear,
    Undo,
    Flag,
    ExportFlagged,
    ExportExcel,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 10] = [
        MenuItem::Detect,
        MenuItem::List,
        MenuItem::Show,
        MenuItem::Delete,
        MenuItem::Clear,
        MenuItem::Undo,
        MenuItem::Flag,
        MenuItem::ExportFlagged,
        MenuItem::ExportExcel,
        MenuItem::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Detect => "画像を検出",
            MenuItem::List => "履歴一覧",
            MenuItem::Show => "履歴の詳細",
            MenuItem::Delete => "履歴を削除",
            MenuItem::Clear => "履歴を全消去",
            MenuItem::Undo => "元に戻す (Undo)",
            MenuItem::Flag => "低信頼度の検出にフラグ",
            MenuItem::ExportFlagged => "フラグ付きログをCSV出力",
            MenuItem::ExportExcel => "履歴をExcel出力",
            MenuItem::Quit => "終了",
        }
    }
}

pub struct Session<C: Clock> {
    history: DetectionHistory<C>,
    feedback: FeedbackLog,
    client: DetectClient,
    output_dir: PathBuf,
    theme: ColorfulTheme,
}

impl<C: Clock> Session<C> {
    pub fn new(
        history: DetectionHistory<C>,
        feedback: FeedbackLog,
        client: DetectClient,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            history,
            feedback,
            client,
            output_dir,
            theme: ColorfulTheme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let labels: Vec<&str> = MenuItem::ALL.iter().map(|m| m.label()).collect();

        loop {
            // タイマー相当: 操作のたびに期限を確認
            if self.history.expire_if_due() {
                println!("- Undoの期限が切れました");
            }
            println!("\n{}", self.status_line());

            let choice = Select::with_theme(&self.theme)
                .with_prompt("操作を選択")
                .items(&labels)
                .default(0)
                .interact()?;

            // 選択に時間がかかった場合に備えて再確認
            self.history.expire_if_due();

            match MenuItem::ALL[choice] {
                MenuItem::Detect => self.detect().await?,
                MenuItem::List => self.list(),
                MenuItem::Show => self.show()?,
                MenuItem::Delete => self.delete()?,
                MenuItem::Clear => self.clear()?,
                MenuItem::Undo => self.undo()?,
                MenuItem::Flag => self.flag()?,
                MenuItem::ExportFlagged => self.export_flagged()?,
                MenuItem::ExportExcel => self.export_excel()?,
                MenuItem::Quit => break,
            }
        }

        Ok(())
    }

    fn status_line(&self) -> String {
        let mut line = format!("履歴: {}件", self.history.len());
        if let Some(remaining) = self.history.undo_remaining() {
            line.push_str(&format!(" | History updated. Undo可能 (残り{}秒)", remaining.as_secs() + 1));
        }
        line
    }

    async fn detect(&mut self) -> Result<()> {
        let path: String = Input::with_theme(&self.theme)
            .with_prompt("画像ファイルまたはフォルダ")
            .interact_text()?;

        let images = match scanner::scan_input(std::path::Path::new(path.trim())) {
            Ok(images) if images.is_empty() => {
                println!("画像が見つかりません: {}", path.trim());
                return Ok(());
            }
            Ok(images) => images,
            Err(e) => {
                println!("{}", e);
                return Ok(());
            }
        };

        let save = ConfirmPrompt::with_theme(&self.theme)
            .with_prompt("ダウンロードファイル (PNG/JSON/CSV) を保存しますか?")
            .default(false)
            .interact()?;

        for image in &images {
            match self.detect_one(image).await {
                Ok((record_id, response)) => {
                    if save {
                        let written = export::write_downloads(
                            &response,
                            ExportFormat::All,
                            &self.output_dir,
                            Some(image.stem().as_str()),
                        )?;
                        for path in written {
                            println!("✔ 保存: {}", path.display());
                        }
                    }
                    if let Some(record) = self.history.get(record_id) {
                        println!("{}", report::stats_lines(record));
                    }
                }
                // 失敗時はストアに触れない
                Err(e) => println!("✗ {}: {}", image.file_name, e),
            }
        }

        Ok(())
    }

    async fn detect_one(
        &mut self,
        image: &ImageInfo,
    ) -> Result<(RecordId, safety_detect_common::DetectResponse)> {
        let upload = Upload::read(image)?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("{} を検出中...", image.file_name));
        spinner.enable_steady_tick(Duration::from_millis(100));
        let result = self.client.detect(&upload).await;
        spinner.finish_and_clear();
        let response = result?;

        println!("✔ {}", image.file_name);
        println!("{}", report::detection_table(&response));

        let id = self.history.next_id();
        let record = DetectionRecord::from_response(id, &response, now_string(), &upload.file_name);
        self.history.dispatch(HistoryAction::Add {
            record,
            input_preview: Some(upload.data_url()),
            output_preview: response.output_data_url(),
        })?;

        Ok((id, response))
    }

    fn list(&self) {
        if self.history.is_empty() {
            println!("No detection history yet.");
            return;
        }
        for (i, record) in self.history.records().iter().enumerate() {
            println!("{:>3}. {}", i + 1, report::record_line(record));
        }
    }

    /// 履歴から1件選ぶ（空ならNone）
    fn pick_record(&self, prompt: &str) -> Result<Option<RecordId>> {
        if self.history.is_empty() {
            println!("No detection history yet.");
            return Ok(None);
        }

        let items: Vec<String> = self.history.records().iter().map(report::record_line).collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact_opt()?;

        Ok(choice.map(|i| self.history.records()[i].id))
    }

    fn show(&self) -> Result<()> {
        if let Some(id) = self.pick_record("詳細を表示する履歴")? {
            if let Some(record) = self.history.get(id) {
                println!("{}", report::record_detail(&self.history, record));
            }
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let Some(id) = self.pick_record("削除する履歴")? else {
            return Ok(());
        };
        let outcome = self
            .history
            .dispatch_confirmed(HistoryAction::Delete(id), &DialoguerConfirm)?;
        self.report_destructive(outcome);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let outcome = self
            .history
            .dispatch_confirmed(HistoryAction::Clear, &DialoguerConfirm)?;
        self.report_destructive(outcome);
        Ok(())
    }

    fn report_destructive(&mut self, outcome: Dispatched) {
        match outcome {
            Dispatched::Applied => {
                self.feedback.sync(&self.history);
                println!(
                    "History updated. {}秒以内なら「元に戻す」で取り消せます",
                    self.history.undo_window().as_secs()
                );
            }
            Dispatched::Declined => println!("キャンセルしました"),
            Dispatched::Unchanged => {}
        }
    }

    fn undo(&mut self) -> Result<()> {
        let restored = self.history.undo();
        if restored > 0 {
            self.feedback.sync(&self.history);
            println!("✔ {}件を元に戻しました", restored);
        } else {
            println!("取り消せる操作がありません");
        }
        Ok(())
    }

    fn flag(&mut self) -> Result<()> {
        self.feedback.sync(&self.history);
        if self.feedback.is_empty() {
            println!(
                "信頼度{}未満の検出はありません",
                safety_detect_common::format_percent(self.feedback.threshold())
            );
            return Ok(());
        }

        loop {
            let items: Vec<String> = self
                .feedback
                .items()
                .iter()
                .map(|item| {
                    format!(
                        "[{}] {} {} ({})",
                        if item.flagged { "x" } else { " " },
                        item.label,
                        safety_detect_common::format_percent(item.conf),
                        item.filename
                    )
                })
                .collect();

            let choice = Select::with_theme(&self.theme)
                .with_prompt("フラグを切り替える検出（Escで戻る）")
                .items(&items)
                .default(0)
                .interact_opt()?;

            let Some(index) = choice else {
                break;
            };
            let id = self.feedback.items()[index].id.clone();
            self.feedback.toggle_flag(&id);
        }

        println!("フラグ付き: {}件", self.feedback.flagged().count());
        Ok(())
    }

    fn export_flagged(&mut self) -> Result<()> {
        self.feedback.sync(&self.history);
        if self.feedback.flagged().count() == 0 {
            println!("フラグ付きの検出がありません");
            return Ok(());
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(FLAGGED_LOG_FILE_NAME);
        std::fs::write(&path, self.feedback.flagged_csv())?;
        println!("✔ フラグ付きログ: {}", path.display());
        Ok(())
    }

    fn export_excel(&self) -> Result<()> {
        if self.history.is_empty() {
            warn!("空の履歴をExcel出力します");
        }
        std::fs::create_dir_all(&self.output_dir)?;
        let path = export::excel_path(&self.output_dir);
        excel::generate_excel(self.history.records(), &path)?;
        println!("✔ Excel出力: {}", path.display());
        Ok(())
    }
}

/// 表示用の作成日時
pub fn now_string() -> String {
    chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}
