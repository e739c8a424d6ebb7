use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::i18n::Translator;
use crate::utils::{
    fs as ufs,
    logger::{LogLevel, Logger},
};
use comrak::{Options, markdown_to_html};
use std::fs;
use std::path::{Path, PathBuf};

pub const DOC_DIR: &str = "doc";
pub const README_SOURCE: &str = "readme.md";
pub const README_PAGE: &str = "readme.html";
pub const STYLESHEET: &str = "style.css";

const TITLE_MARKER_OPEN: &str = "[[!meta title=\"";
const TITLE_MARKER_CLOSE: &str = "\"]]";

/// Pages written by [`generate_docs`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocsReport {
    pub pages: Vec<PathBuf>,
    /// Set when no page was produced because `style.css` is missing.
    pub stylesheet_missing: bool,
}

/// Pulls the first `[[!meta title="…"]]` marker out of a readme, replacing
/// it with a level-1 heading.
pub fn extract_title(markdown: &str) -> (Option<String>, String) {
    let Some(start) = markdown.find(TITLE_MARKER_OPEN) else {
        return (None, markdown.to_string());
    };
    let value_start = start + TITLE_MARKER_OPEN.len();
    let Some(len) = markdown[value_start..].find(TITLE_MARKER_CLOSE) else {
        return (None, markdown.to_string());
    };
    let title = markdown[value_start..value_start + len].to_string();
    let rest = &markdown[value_start + len + TITLE_MARKER_CLOSE.len()..];
    let body = format!("{}# {}{}", &markdown[..start], title, rest);
    (Some(title), body)
}

fn apply_extension(options: &mut Options, name: &str) -> Result<()> {
    let short = name.strip_prefix("markdown.extensions.").unwrap_or(name);
    match short {
        "tables" => options.extension.table = true,
        "strikethrough" => options.extension.strikethrough = true,
        "autolink" => options.extension.autolink = true,
        "tasklist" => options.extension.tasklist = true,
        "footnotes" => options.extension.footnotes = true,
        "superscript" => options.extension.superscript = true,
        "description_lists" | "def_list" => options.extension.description_lists = true,
        "header_ids" | "toc" => options.extension.header_ids = Some(String::new()),
        "smarty" => options.parse.smart = true,
        "extra" => {
            options.extension.table = true;
            options.extension.footnotes = true;
            options.extension.description_lists = true;
        }
        // CommonMark already covers these.
        "fenced_code" | "sane_lists" | "nl2br" | "attr_list" | "abbr" => {}
        _ => return Err(BuildError::UnknownMarkdownExtension(name.to_string())),
    }
    Ok(())
}

/// Converts markdown to an HTML fragment with the given extensions.
pub fn markdown_fragment(markdown: &str, extensions: &[String]) -> Result<String> {
    let mut options = Options::default();
    options.render.unsafe_ = true;
    for ext in extensions {
        apply_extension(&mut options, ext)?;
    }
    Ok(markdown_to_html(markdown, &options))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders one standalone help page.
///
/// ### Parameters
/// - `markdown`: The readme source
/// - `lang_dir`: Locale directory name (`pt_BR` becomes `lang="pt-BR"`)
/// - `fallback_title`: Title used when the readme has no meta marker
/// - `extensions`: Markdown extensions to enable
///
pub fn render_page(
    markdown: &str,
    lang_dir: &str,
    fallback_title: &str,
    extensions: &[String],
) -> Result<String> {
    let (title, body) = extract_title(markdown);
    let title = title.unwrap_or_else(|| fallback_title.to_string());
    let html = markdown_fragment(&body, extensions)?;

    Ok([
        "<!DOCTYPE html>".to_string(),
        format!("<html lang=\"{}\">", lang_dir.replace('_', "-")),
        "<head>".to_string(),
        "<meta charset=\"UTF-8\">".to_string(),
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">".to_string(),
        format!(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"../{}\" media=\"screen\">",
            STYLESHEET
        ),
        format!("<title>{}</title>", escape_html(&title)),
        "</head>\n<body>".to_string(),
        html,
        "</body>\n</html>".to_string(),
    ]
    .join("\n"))
}

/// Renders `addon/doc/<lang>/readme.md` to `readme.html` for every locale.
///
/// The project's `readme.md` is first copied in as the base language readme
/// and `style.css` is copied to `addon/doc/`. Without a stylesheet no page is
/// produced; locales without a readme are skipped.
///
/// ### Parameters
/// - `project_root`: The add-on project directory
/// - `addon_dir`: The staged tree
/// - `config`: The resolved build configuration
///
pub fn generate_docs(
    project_root: &Path,
    addon_dir: &Path,
    config: &BuildConfig,
) -> Result<DocsReport> {
    let logger = Logger::new();
    let extensions = &config.build.markdown_extensions;
    for ext in extensions {
        apply_extension(&mut Options::default(), ext)?;
    }

    let doc_root = addon_dir.join(DOC_DIR);
    let root_readme = project_root.join(README_SOURCE);
    if root_readme.is_file() {
        ufs::copy_file(
            &root_readme,
            &doc_root
                .join(&config.build.base_language)
                .join(README_SOURCE),
        )?;
    }

    let stylesheet = project_root.join(STYLESHEET);
    if !stylesheet.is_file() {
        logger.log_message(
            LogLevel::Warning,
            &format!(
                "{} not found in {}; skipping help pages",
                STYLESHEET,
                project_root.display()
            ),
        );
        return Ok(DocsReport {
            pages: Vec::new(),
            stylesheet_missing: true,
        });
    }
    ufs::copy_file(&stylesheet, &doc_root.join(STYLESHEET))?;

    let mut pages = Vec::new();
    for lang_dir in doc_locale_dirs(&doc_root)? {
        let Some(lang) = lang_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let source = lang_dir.join(README_SOURCE);
        if !source.is_file() {
            logger.log_message(
                LogLevel::Warning,
                &format!("No {} for locale {}; skipping", README_SOURCE, lang),
            );
            continue;
        }

        let markdown = fs::read_to_string(&source)
            .map_err(|e| BuildError::io(format!("Failed to read {}", source.display()), e))?;
        let translator = Translator::for_language(addon_dir, lang);
        let fallback_title = format!(
            "{} {}",
            translator.gettext(&config.addon.summary),
            config.addon.version
        );
        let page = render_page(&markdown, lang, &fallback_title, extensions)?;

        let out = lang_dir.join(README_PAGE);
        ufs::write_text(&out, &page)?;
        pages.push(out);
    }

    Ok(DocsReport {
        pages,
        stylesheet_missing: false,
    })
}

/// Locale directories under `addon/doc/`, sorted.
pub fn doc_locale_dirs(doc_root: &Path) -> Result<Vec<PathBuf>> {
    if !doc_root.is_dir() {
        return Ok(Vec::new());
    }
    let read_dir = fs::read_dir(doc_root)
        .map_err(|e| BuildError::io(format!("Failed to read {}", doc_root.display()), e))?;
    let mut dirs: Vec<PathBuf> = read_dir
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
