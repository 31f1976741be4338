use crate::job::{Corpus, FetchFailure};

pub type ViewerId = u64;

/// Highlighting mode for a file, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Php,
    JavaScript,
    Css,
    Sass,
    Sql,
    Markdown,
    Html,
    Plain,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::Php => "php",
            Language::JavaScript => "javascript",
            Language::Css => "css",
            Language::Sass => "sass",
            Language::Sql => "sql",
            Language::Markdown => "markdown",
            Language::Html => "html",
            Language::Plain => "plain",
        }
    }
}

/// Maps a file name to a language. Total: unknown or missing extensions
/// fall back to [`Language::Plain`].
pub fn infer_language(path: &str) -> Language {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return Language::Plain,
    };
    match extension.as_str() {
        "php" => Language::Php,
        "js" => Language::JavaScript,
        "css" => Language::Css,
        "sass" | "scss" => Language::Sass,
        "sql" => Language::Sql,
        "md" => Language::Markdown,
        "htm" | "html" => Language::Html,
        _ => Language::Plain,
    }
}

/// Identifies one file on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub corpus: Corpus,
    pub slug: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Loading,
    Loaded(String),
    Failed(FetchFailure),
}

/// Read-only view of one file, positioned at a matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileViewer {
    pub id: ViewerId,
    pub key: FileKey,
    pub line: u32,
    pub language: Language,
    pub content: FileContent,
}

impl FileViewer {
    pub fn open(id: ViewerId, key: FileKey, line: u32) -> Self {
        let language = infer_language(&key.path);
        Self {
            id,
            key,
            line,
            language,
            content: FileContent::Loading,
        }
    }

    /// Accepts the first response only; the buffer is never refreshed.
    pub fn content_loaded(&mut self, result: Result<String, FetchFailure>) -> bool {
        if self.content != FileContent::Loading {
            return false;
        }
        self.content = match result {
            Ok(text) => FileContent::Loaded(text),
            Err(failure) => FileContent::Failed(failure),
        };
        true
    }

    /// Number of lines in the loaded file.
    pub fn line_count(&self) -> Option<usize> {
        match &self.content {
            FileContent::Loaded(text) => Some(text.lines().count()),
            _ => None,
        }
    }

    /// True once the content is loaded and ends before the target line.
    pub fn target_past_end(&self) -> bool {
        self.line_count()
            .is_some_and(|count| self.line.max(1) as usize > count)
    }

    /// Lines around the target line, each with its 1-based number. Returns
    /// nothing until the content has loaded. A target past the end of the
    /// file shows the last lines instead.
    pub fn window(&self, radius: usize) -> Vec<(u32, &str)> {
        let FileContent::Loaded(text) = &self.content else {
            return Vec::new();
        };
        let span = radius * 2 + 1;
        let count = text.lines().count();
        let target = (self.line.max(1) - 1) as usize;
        let start = if target >= count {
            count.saturating_sub(span)
        } else {
            target.saturating_sub(radius)
        };
        text.lines()
            .enumerate()
            .skip(start)
            .take(span)
            .map(|(idx, line)| (idx as u32 + 1, line))
            .collect()
    }
}
