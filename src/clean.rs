use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{error, info};

use crate::config::Settings;

static MAIN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("main").unwrap());

const DROPPED_TAGS: &[&str] = &["code", "script"];
const DROPPED_IDS: &[&str] = &["directory"];
// Contents are not entity-decoded by a parser, so they are written verbatim.
const RAW_TEXT_TAGS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "style", "xmp",
];
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Keep only `<main>`, minus code, scripts and the member directory, pretty-printed.
pub fn clean_up(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let main = document.select(&MAIN).next()?;
    let mut out = String::with_capacity(html.len() / 2);
    write_element(&mut out, main, 0);
    Some(out)
}

fn is_dropped(el: &ElementRef) -> bool {
    let value = el.value();
    DROPPED_TAGS.contains(&value.name()) || value.id().is_some_and(|id| DROPPED_IDS.contains(&id))
}

fn write_element(out: &mut String, el: ElementRef, depth: usize) {
    if is_dropped(&el) {
        return;
    }
    let name = el.value().name();

    indent(out, depth);
    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape(value, true));
        out.push('"');
    }
    if VOID_TAGS.contains(&name) {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    let raw_text = RAW_TEXT_TAGS.contains(&name);
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    indent(out, depth + 1);
                    if raw_text {
                        out.push_str(text);
                    } else {
                        out.push_str(&escape(text, false));
                    }
                    out.push('\n');
                }
            }
            Node::Comment(comment) => {
                indent(out, depth + 1);
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->\n");
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(out, child, depth + 1);
                }
            }
            _ => {}
        }
    }

    indent(out, depth);
    out.push_str("</");
    out.push_str(name);
    out.push_str(">\n");
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat(' ').take(depth));
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct CleanStats {
    pub total: usize,
    pub cleaned: usize,
    pub failed: usize,
}

/// Clean every `*.html` in `profiles_dir` into `clean_dir`, same file names.
pub fn clean_all(settings: &Settings) -> Result<CleanStats> {
    std::fs::create_dir_all(&settings.clean_dir)
        .with_context(|| format!("Failed to create {}", settings.clean_dir.display()))?;

    let mut files: Vec<_> = std::fs::read_dir(&settings.profiles_dir)
        .with_context(|| format!("Failed to list {}", settings.profiles_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    files.sort();

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut stats = CleanStats {
        total: files.len(),
        ..Default::default()
    };
    for path in &files {
        match clean_file(path, &settings.clean_dir) {
            Ok(()) => stats.cleaned += 1,
            Err(e) => {
                error!("Failed to clean {}: {:#}", path.display(), e);
                stats.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(stats)
}

fn clean_file(path: &Path, out_dir: &Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let cleaned = clean_up(&content).context("no <main> element")?;
    let file_name = path.file_name().context("path has no file name")?;
    std::fs::write(out_dir.join(file_name), cleaned)?;
    info!("Cleaned up {}.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(html: &str) -> Vec<String> {
        let doc = Html::parse_document(html);
        let main = doc.select(&MAIN).next().unwrap();
        main.text()
            .flat_map(|t| t.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn drops_code_scripts_and_directory() {
        let raw = std::fs::read_to_string("tests/fixtures/profile_raw.html").unwrap();
        let cleaned = clean_up(&raw).unwrap();
        assert!(!cleaned.contains("<script"));
        assert!(!cleaned.contains("<code"));
        assert!(!cleaned.contains("id=\"directory\""));
        assert!(!cleaned.contains("trackPageView"));
        assert!(!cleaned.contains("People Also Viewed"));
        assert!(!cleaned.contains("Site navigation"));
        assert!(cleaned.starts_with("<main"));
    }

    #[test]
    fn keeps_remaining_text() {
        let raw = r#"<html><body><main><h1 id="name">  Jane   Doe </h1>
            <script>var x = 1;</script><p>Builds &amp; ships <b>things</b></p>
            <code>{"a":1}</code><div id="directory"><p>Someone Else</p></div></main></body></html>"#;
        let cleaned = clean_up(raw).unwrap();
        assert_eq!(words(&cleaned), vec!["Jane", "Doe", "Builds", "&", "ships", "things"]);
        assert!(cleaned.contains("Builds &amp; ships"));
    }

    #[test]
    fn pretty_prints_one_node_per_line() {
        let cleaned = clean_up("<main><p class=\"a\">hi<br>there</p></main>").unwrap();
        assert_eq!(
            cleaned,
            "<main>\n <p class=\"a\">\n  hi\n  <br/>\n  there\n </p>\n</main>\n"
        );
    }

    #[test]
    fn raw_text_is_written_verbatim() {
        let cleaned = clean_up("<main><style>a > b {}</style><p>x &lt; y</p></main>").unwrap();
        assert!(cleaned.contains("  a > b {}\n"));
        assert!(cleaned.contains("  x &lt; y\n"));

        let doc = Html::parse_document(&cleaned);
        let style = doc.select(&Selector::parse("style").unwrap()).next().unwrap();
        assert_eq!(style.text().collect::<String>().trim(), "a > b {}");
        assert_eq!(words(&cleaned), vec!["a", ">", "b", "{}", "x", "<", "y"]);
    }

    #[test]
    fn comments_are_kept() {
        let cleaned = clean_up("<main><!-- card --><p>hi</p></main>").unwrap();
        assert_eq!(
            cleaned,
            "<main>\n <!-- card -->\n <p>\n  hi\n </p>\n</main>\n"
        );
    }

    #[test]
    fn missing_main_is_none() {
        assert!(clean_up("<html><body><p>nothing</p></body></html>").is_none());
    }

    #[test]
    fn clean_all_mirrors_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            profiles_dir: dir.path().join("profiles"),
            clean_dir: dir.path().join("clean"),
            ..Settings::default()
        };
        std::fs::create_dir_all(&settings.profiles_dir).unwrap();
        std::fs::write(
            settings.profiles_dir.join("Jane Doe.html"),
            "<main><p>Jane</p><script>x()</script></main>",
        )
        .unwrap();
        std::fs::write(settings.profiles_dir.join("broken.html"), "<p>no main</p>").unwrap();
        std::fs::write(settings.profiles_dir.join("notes.txt"), "ignored").unwrap();

        let stats = clean_all(&settings).unwrap();
        assert_eq!((stats.total, stats.cleaned, stats.failed), (2, 1, 1));
        let out = std::fs::read_to_string(settings.clean_dir.join("Jane Doe.html")).unwrap();
        assert!(out.contains("Jane") && !out.contains("x()"));
    }
}
