use crate::error::{DetectError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

impl ImageInfo {
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            file_name,
        }
    }

    /// 拡張子を除いたファイル名（出力ファイル名の接頭辞に使う）
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "detection".to_string())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// 入力パスから検出対象の画像を集める
///
/// ファイルならその1枚、フォルダなら直下の画像をファイル名順で返す。
/// 存在しないパスは、画像の拡張子があればファイルとして扱う。
pub fn scan_input(input: &Path) -> Result<Vec<ImageInfo>> {
    if !input.exists() && is_image_path(input) {
        return Err(DetectError::FileNotFound(input.display().to_string()));
    }

    if input.is_file() {
        if !is_image_path(input) {
            return Err(DetectError::ImageLoad(format!(
                "対応していない拡張子です: {}",
                input.display()
            )));
        }
        return Ok(vec![ImageInfo::from_path(input)]);
    }

    scan_folder(input)
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(DetectError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| ImageInfo::from_path(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
    }

    #[test]
    fn test_scan_input_missing_image_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("site_01.jpg");

        let result = scan_input(&missing);
        assert!(matches!(result, Err(DetectError::FileNotFound(_))));

        let result = scan_input(&temp_dir.path().join("no_such_dir"));
        assert!(matches!(result, Err(DetectError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(DetectError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_with_images() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("c.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("a.PNG")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("b.jpeg")).unwrap().write_all(b"dummy").unwrap();
        File::create(temp_dir.path().join("readme.txt")).unwrap().write_all(b"text").unwrap();
        fs::create_dir(temp_dir.path().join("nested.jpg")).unwrap();

        let result = scan_folder(temp_dir.path()).unwrap();
        let names: Vec<&str> = result.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.PNG", "b.jpeg", "c.jpg"]);
    }

    #[test]
    fn test_scan_input_single_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("site_01.jpg");
        fs::write(&path, b"dummy").unwrap();

        let result = scan_input(&path).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].file_name, "site_01.jpg");
        assert_eq!(result[0].stem(), "site_01");
    }

    #[test]
    fn test_scan_input_rejects_non_image_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("notes.txt");
        fs::write(&path, b"text").unwrap();

        assert!(matches!(scan_input(&path), Err(DetectError::ImageLoad(_))));
    }
}
