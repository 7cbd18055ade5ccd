use serde::Serialize;

use crate::attributed::escape_html;
use crate::error::Result;
use crate::render::minimap::Region;
use crate::theme::Theme;
use crate::view::DiffView;

/// Data embedded next to the table for scripts in the hosting page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageData<'a> {
    filename: &'a str,
    row_count: usize,
    regions: &'a [Region],
}

/// Render the whole view as a standalone HTML document.
pub fn render_page(view: &DiffView, theme: &Theme) -> Result<String> {
    let css = theme.css()?;
    let filename = escape_html(view.filename());
    let patch = view.patch();
    let path = patch
        .display_path()
        .map(|p| escape_html(&p.display().to_string()))
        .unwrap_or_else(|| filename.clone());

    let mut body = String::new();
    for hunk in view.hunks() {
        body.push_str(&format!(
            "<tr class=\"hunk-header\" data-diff-idx=\"{}\"><td colspan=\"4\">{}</td></tr>\n",
            hunk.header_diff_idx,
            escape_html(&hunk.header)
        ));
        for row in &hunk.rows {
            body.push_str(&row.to_html());
            body.push('\n');
        }
    }

    let row_count = view.row_count();
    let data = serde_json::to_string(&PageData {
        filename: view.filename(),
        row_count,
        regions: view.minimap().regions(),
    })?
    // Keep the payload from closing its own script element
    .replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{filename}</title>
<style>
{css}</style>
</head>
<body>
<header class="file-header"><span class="status">{status}</span><span class="path">{path}</span></header>
<div class="layout">
<table class="split-diff">
<colgroup><col class="gutter"><col><col class="gutter"><col></colgroup>
<tbody>
{body}</tbody>
</table>
{minimap}
</div>
<script type="application/json" id="splitdiff-data">{data}</script>
</body>
</html>
"#,
        status = patch.status.as_char(),
        minimap = view.minimap().to_html(row_count),
    ))
}
