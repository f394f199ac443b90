//! Daily `index.html`: one row per date folder, one column per HTML route.

use std::path::{Path, PathBuf};

use crate::error::PersistError;

use super::html::escape_html;
use super::write_atomic;

pub const INDEX_FILE: &str = "index.html";

/// One column of the index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub label: String,
    /// Artifact names end with `{suffix_stem}.html`, e.g. `_gex_history`.
    pub suffix_stem: String,
}

impl IndexColumn {
    /// Link text for an artifact file name, or `None` if it belongs elsewhere.
    fn link_text(&self, file_name: &str) -> Option<String> {
        let lower = file_name.to_lowercase();
        let ending = format!("{}.html", self.suffix_stem.to_lowercase());
        if !lower.ends_with(&ending) || lower.len() == ending.len() {
            return None;
        }
        let cut = file_name.len().checked_sub(ending.len())?;
        file_name.get(..cut).map(str::to_uppercase)
    }
}

/// Sub-directories of `root` whose name starts with four digits, oldest first.
pub fn date_folders(root: &Path) -> Result<Vec<String>, PersistError> {
    let io_err = |source: std::io::Error| PersistError::Io {
        path: root.to_path_buf(),
        source,
    };
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(root).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.len() >= 4 && name.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
            folders.push(name);
        }
    }
    folders.sort();
    Ok(folders)
}

fn artifacts(folder: &Path) -> Result<Vec<String>, PersistError> {
    let io_err = |source: std::io::Error| PersistError::Io {
        path: folder.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Render the index page for every date folder under `root`, newest first.
pub fn build_index(root: &Path, columns: &[IndexColumn]) -> Result<String, PersistError> {
    let folders = date_folders(root)?;

    let mut page = String::from(HEAD);
    page.push_str("<table>\n<thead>\n<tr><th>Date</th>");
    for column in columns {
        page.push_str(&format!("<th>{}</th>", escape_html(&column.label)));
    }
    page.push_str("</tr>\n</thead>\n<tbody>\n");

    for folder in folders.iter().rev() {
        let files = artifacts(&root.join(folder))?;
        page.push_str(&format!(
            "<tr>\n<td class=\"date-header\">{}</td>\n",
            escape_html(folder)
        ));
        for column in columns {
            page.push_str("<td><ul class=\"file-list\">");
            for file in &files {
                if let Some(text) = column.link_text(file) {
                    page.push_str(&format!(
                        "<li><a href=\"{}/{}\">{}</a></li>",
                        escape_html(folder),
                        escape_html(file),
                        escape_html(&text)
                    ));
                }
            }
            page.push_str("</ul></td>\n");
        }
        page.push_str("</tr>\n");
    }

    page.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    Ok(page)
}

/// Rebuild `root/index.html` atomically.
pub fn write_index(root: &Path, columns: &[IndexColumn]) -> Result<PathBuf, PersistError> {
    let page = build_index(root, columns)?;
    let path = root.join(INDEX_FILE);
    write_atomic(&path, page.as_bytes())?;
    Ok(path)
}

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>GEX Dashboard - Index</title>
<style>
body { background-color: black; color: white; font-family: Arial; margin: 20px; }
h1 { color: cyan; text-align: center; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th { background-color: #333; color: white; padding: 10px; text-align: left; }
td { padding: 8px; border-bottom: 1px solid #444; vertical-align: top; }
tr:hover { background-color: #222; }
a { color: cyan; text-decoration: none; }
a:hover { text-decoration: underline; }
.file-list { list-style-type: none; padding-left: 5px; margin: 0; }
.file-list li { margin-bottom: 5px; }
.date-header { color: orange; font-weight: bold; }
</style>
</head>
<body>
<h1>GEX Dashboards by Day</h1>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn column(label: &str, stem: &str) -> IndexColumn {
        IndexColumn {
            label: label.to_string(),
            suffix_stem: stem.to_string(),
        }
    }

    #[test]
    fn link_text_strips_suffix_and_uppercases() {
        let c = column("GEX History", "_gex_history");
        assert_eq!(c.link_text("spy_gex_history.html").as_deref(), Some("SPY"));
        assert_eq!(c.link_text("spy_gex_history.csv"), None);
        assert_eq!(c.link_text("_gex_history.html"), None);
    }
}
