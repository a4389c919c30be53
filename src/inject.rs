//! Batch insertion of the honeypot field into static HTML pages.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static FORM_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<form\b[^>]*>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Injected(usize),
    AlreadyProtected,
    NoForms,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

pub fn is_valid_field_name(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Off-screen container holding the honeypot input.
pub fn honeypot_markup(field: &str) -> String {
    format!(
        concat!(
            r#"<div aria-hidden="true" style="position:absolute;left:-10000px;top:auto;width:1px;height:1px;overflow:hidden;">"#,
            r#"<label>Leave this field empty <input type="text" name="{field}" tabindex="-1" autocomplete="off" value=""></label>"#,
            "</div>"
        ),
        field = field
    )
}

fn already_protected(html: &str, field: &str) -> bool {
    let pattern = format!(r#"(?i)name\s*=\s*["']?{}(?:["'\s/>]|$)"#, regex::escape(field));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(html))
}

/// Insert the honeypot right after every `<form>` opening tag.
pub fn inject_html(html: &str, field: &str) -> (String, FileOutcome) {
    if already_protected(html, field) {
        return (html.to_string(), FileOutcome::AlreadyProtected);
    }

    let forms = FORM_OPEN_RE.find_iter(html).count();
    if forms == 0 {
        return (html.to_string(), FileOutcome::NoForms);
    }

    let markup = honeypot_markup(field);
    let injected = FORM_OPEN_RE
        .replace_all(html, |caps: &regex::Captures| format!("{}{markup}", &caps[0]))
        .into_owned();
    (injected, FileOutcome::Injected(forms))
}

/// All `.html`/`.htm` files under `dir`, sorted.
pub fn collect_html_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            // Symlinks are not followed
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

pub fn inject_dir(dir: &Path, field: &str, dry_run: bool) -> Result<Vec<FileReport>, String> {
    if !is_valid_field_name(field) {
        return Err(format!("Invalid honeypot field name: {field}"));
    }

    let files = collect_html_files(dir)
        .map_err(|e| format!("Failed to scan {}: {e}", dir.display()))?;

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let html = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;

        let (updated, outcome) = inject_html(&html, field);
        if matches!(outcome, FileOutcome::Injected(_)) && !dry_run {
            std::fs::write(&path, updated)
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        }

        tracing::debug!("{}: {outcome:?}", path.display());
        reports.push(FileReport { path, outcome });
    }

    Ok(reports)
}
