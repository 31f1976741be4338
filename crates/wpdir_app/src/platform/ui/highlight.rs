use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::as_24_bit_terminal_escaped;
use wpdir_core::Language;
use wpdir_logging::wpdir_debug;

const THEME: &str = "base16-ocean.dark";
const RESET: &str = "\x1b[0m";

/// Terminal syntax highlighting for file viewer windows.
pub(crate) struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub(crate) fn load() -> Option<Self> {
        let syntaxes = SyntaxSet::load_defaults_nonewlines();
        let themes = ThemeSet::load_defaults();
        let theme = themes
            .themes
            .get(THEME)
            .or_else(|| themes.themes.values().next())
            .cloned()?;
        Some(Self { syntaxes, theme })
    }

    /// Viewer windows start mid-file, so PHP uses the bare source grammar
    /// instead of the one that waits for an opening `<?php` tag.
    fn syntax_for(&self, language: Language) -> &SyntaxReference {
        let by_name = match language {
            Language::Php => self.syntaxes.find_syntax_by_name("PHP Source"),
            _ => None,
        };
        let extensions: &[&str] = match language {
            Language::Php => &["php"],
            Language::JavaScript => &["js"],
            Language::Css => &["css"],
            Language::Sass => &["scss", "sass", "css"],
            Language::Sql => &["sql"],
            Language::Markdown => &["md"],
            Language::Html => &["html"],
            Language::Plain => &[],
        };
        by_name
            .or_else(|| {
                extensions
                    .iter()
                    .find_map(|ext| self.syntaxes.find_syntax_by_extension(ext))
            })
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    #[cfg(test)]
    fn syntax_name(&self, language: Language) -> &str {
        &self.syntax_for(language).name
    }

    /// Highlights consecutive lines; a line that fails to highlight is
    /// returned unchanged.
    pub(crate) fn highlight(&self, language: Language, lines: &[&str]) -> Vec<String> {
        let mut highlighter = HighlightLines::new(self.syntax_for(language), &self.theme);
        lines
            .iter()
            .map(|line| match highlighter.highlight_line(line, &self.syntaxes) {
                Ok(ranges) => format!("{}{RESET}", as_24_bit_terminal_escaped(&ranges, false)),
                Err(err) => {
                    wpdir_debug!("highlighting failed: {err}");
                    (*line).to_string()
                }
            })
            .collect()
    }
}
