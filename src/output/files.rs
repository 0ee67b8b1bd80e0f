//! On-disk persistence below the configured save roots
//!
//! Layout:
//! - `<picture root>/<title>/image_<n>.<ext>`
//! - `<novel root>/<title>.txt`

use crate::config::SavePaths;
use crate::crawler::PageFetcher;
use crate::output::traits::{ContentSink, OutputError, OutputResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Characters that are not allowed in file names on common filesystems
const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest file name produced from a title, in bytes, leaving room for `.txt`
const MAX_FILE_NAME_BYTES: usize = 251;

/// Image extensions kept from the URL; anything else is saved as jpg
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Saves topic content as plain files
#[derive(Debug, Clone)]
pub struct FileSaver {
    paths: SavePaths,
}

impl FileSaver {
    /// Creates the saver and both save roots
    pub async fn create(paths: SavePaths) -> OutputResult<Self> {
        for root in paths.roots() {
            create_dir(&root).await?;
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &SavePaths {
        &self.paths
    }

    /// Directory holding the images of a topic
    pub fn topic_dir(&self, title: &str) -> PathBuf {
        self.paths.picture.join(sanitize_file_name(title))
    }

    /// File holding the text of a topic
    pub fn text_path(&self, title: &str) -> PathBuf {
        self.paths
            .novel
            .join(format!("{}.txt", sanitize_file_name(title)))
    }
}

#[async_trait]
impl ContentSink for FileSaver {
    async fn save_images(&self, title: &str, urls: &[String], fetcher: &dyn PageFetcher) -> usize {
        let dir = self.topic_dir(title);
        if let Err(e) = create_dir(&dir).await {
            warn!("Skipping images of '{}': {}", title, e);
            return 0;
        }

        let mut saved = 0;
        for (index, url) in urls.iter().enumerate() {
            let path = dir.join(format!("image_{}.{}", index + 1, image_extension(url)));

            if fetcher.download(url, &path).await {
                debug!("Saved image {}", path.display());
                saved += 1;
            } else {
                warn!("Failed to save image {}", url);
            }
        }

        saved
    }

    async fn save_text(&self, title: &str, content: &str) -> bool {
        let path = self.text_path(title);

        match tokio::fs::write(&path, content).await {
            Ok(()) => {
                info!("Saved text {}", path.display());
                true
            }
            Err(e) => {
                let error = OutputError::Write {
                    path: path.display().to_string(),
                    source: e,
                };
                warn!("{}", error);
                false
            }
        }
    }
}

async fn create_dir(path: &Path) -> OutputResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| OutputError::Write {
            path: path.display().to_string(),
            source,
        })
}

/// Turns a topic title into a safe file name
///
/// Reserved characters become `_`, control characters are dropped and the
/// result is cut on a character boundary to fit the filesystem name limit.
/// Names that are empty or only dots become `untitled`.
pub fn sanitize_file_name(title: &str) -> String {
    let mut name = String::new();
    for c in title.chars().filter(|c| !c.is_control()) {
        let c = if INVALID_FILE_CHARS.contains(&c) { '_' } else { c };
        if name.len() + c.len_utf8() > MAX_FILE_NAME_BYTES {
            break;
        }
        name.push(c);
    }

    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "untitled".to_string()
    } else {
        name
    }
}

/// File extension for an image URL
pub fn image_extension(url: &str) -> &'static str {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == ext)
        .unwrap_or("jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes the URL as file content; URLs containing "broken" fail
    struct StubFetcher {
        downloads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn get(&self, _url: &str) -> Option<String> {
            None
        }

        async fn download(&self, url: &str, dest: &Path) -> bool {
            self.downloads.lock().unwrap().push(url.to_string());
            if url.contains("broken") {
                return false;
            }
            tokio::fs::write(dest, url).await.is_ok()
        }
    }

    fn save_paths(dir: &TempDir) -> SavePaths {
        SavePaths {
            picture: dir.path().join("picture"),
            novel: dir.path().join("novel"),
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_file_name("line\nbreak\ttab"), "linebreaktab");
        assert_eq!(sanitize_file_name("[06-01] 第一章"), "[06-01] 第一章");
        assert_eq!(sanitize_file_name("\u{7}"), "untitled");
    }

    #[test]
    fn test_sanitize_dot_names() {
        assert_eq!(sanitize_file_name("."), "untitled");
        assert_eq!(sanitize_file_name(".."), "untitled");
        assert_eq!(sanitize_file_name(" ... "), "untitled");
        assert_eq!(sanitize_file_name("v1.0"), "v1.0");
    }

    #[test]
    fn test_sanitize_truncates_to_byte_limit() {
        let long = "字".repeat(300);
        let name = sanitize_file_name(&long);
        assert_eq!(name.chars().count(), 83);
        assert!(name.len() <= MAX_FILE_NAME_BYTES);

        let ascii = sanitize_file_name(&"a".repeat(400));
        assert_eq!(ascii.len(), MAX_FILE_NAME_BYTES);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://cdn.example.net/a/b.PNG"), "png");
        assert_eq!(image_extension("https://cdn.example.net/a/b.jpeg?size=large"), "jpeg");
        assert_eq!(image_extension("https://cdn.example.net/a/b.webp"), "jpg");
        assert_eq!(image_extension("https://cdn.example.net/image"), "jpg");
    }

    #[tokio::test]
    async fn test_create_makes_roots() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::create(save_paths(&dir)).await.unwrap();

        assert!(saver.paths().picture.is_dir());
        assert!(saver.paths().novel.is_dir());
    }

    #[tokio::test]
    async fn test_save_text() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::create(save_paths(&dir)).await.unwrap();

        assert!(saver.save_text("Chapter: 1/2", "第一行\n第二行").await);

        let path = dir.path().join("novel").join("Chapter_ 1_2.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "第一行\n第二行");

        // Existing files are overwritten
        assert!(saver.save_text("Chapter: 1/2", "new").await);
        assert_eq!(
            std::fs::read_to_string(saver.text_path("Chapter: 1/2")).unwrap(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_save_text_long_cjk_title() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::create(save_paths(&dir)).await.unwrap();
        let title = "第".repeat(100);

        assert!(saver.save_text(&title, "body").await);
        assert_eq!(
            std::fs::read_to_string(saver.text_path(&title)).unwrap(),
            "body"
        );
    }

    #[tokio::test]
    async fn test_dot_titles_stay_inside_picture_root() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::create(save_paths(&dir)).await.unwrap();
        let fetcher = StubFetcher {
            downloads: Mutex::new(Vec::new()),
        };
        let urls = vec!["https://cdn.example.net/a.png".to_string()];

        for title in [".", ".."] {
            assert_eq!(saver.save_images(title, &urls, &fetcher).await, 1);
        }

        assert!(!dir.path().join("image_1.png").exists());
        assert!(!dir.path().join("picture").join("image_1.png").exists());
        assert!(dir
            .path()
            .join("picture")
            .join("untitled")
            .join("image_1.png")
            .is_file());
    }

    #[tokio::test]
    async fn test_save_images_counts_successes() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::create(save_paths(&dir)).await.unwrap();
        let fetcher = StubFetcher {
            downloads: Mutex::new(Vec::new()),
        };

        let urls = vec![
            "https://cdn.example.net/1.png".to_string(),
            "https://cdn.example.net/broken.gif".to_string(),
            "https://cdn.example.net/3".to_string(),
        ];

        let saved = saver.save_images("Gallery", &urls, &fetcher).await;
        assert_eq!(saved, 2);
        assert_eq!(fetcher.downloads.lock().unwrap().len(), 3);

        let topic_dir = dir.path().join("picture").join("Gallery");
        assert!(topic_dir.join("image_1.png").is_file());
        assert!(!topic_dir.join("image_2.gif").exists());
        assert!(topic_dir.join("image_3.jpg").is_file());
    }
}
