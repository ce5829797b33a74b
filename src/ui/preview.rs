//! Markdown preview rendered to HTML with pulldown-cmark

use pulldown_cmark::{html, Options, Parser};

/// Markdown preview pane
pub struct PreviewPane;

impl PreviewPane {
    /// Render the buffer as HTML
    pub fn render(markdown: &str, strip_frontmatter: bool) -> String {
        let source = if strip_frontmatter {
            Self::content_without_frontmatter(markdown)
        } else {
            markdown
        };

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(source, options);
        let mut output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }

    /// Get content without YAML front matter.
    ///
    /// Front matter opens with a `---` line whose next line is either the
    /// closing `---` or a `key: value` entry, and ends at the next `---` line.
    pub fn content_without_frontmatter(content: &str) -> &str {
        let Some(body) = content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))
        else {
            return content;
        };

        let first = body.lines().next().unwrap_or_default().trim_end();
        if first != "---" && (first.trim().is_empty() || !first.contains(':')) {
            return content;
        }

        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            offset += line.len();
            if line.trim_end() == "---" {
                return body[offset..].trim_start();
            }
        }

        content
    }
}
