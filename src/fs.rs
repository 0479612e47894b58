//! Directory listing rendering. Presentation glue over the metadata
//! collector; kept deliberately plain.

use crate::meta::ResolvedEntry;
use crate::utils::{html_escape, percent_encode};

/// Renders an ordered set of directory entries as a minimal HTML page.
pub fn generate_directory_listing(entries: &[ResolvedEntry], request_path: &str) -> String {
    let display_path = if request_path.is_empty() {
        "/"
    } else {
        request_path
    };

    let mut rows = String::new();
    if display_path != "/" {
        rows.push_str("<tr><td><a href=\"../\">..</a></td><td>-</td><td>-</td></tr>\n");
    }

    for entry in entries {
        let link = if entry.is_directory {
            format!("{}/", percent_encode(&entry.name))
        } else {
            percent_encode(&entry.name)
        };
        let display_name = if entry.is_directory {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        rows.push_str(&format!(
            "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>\n",
            link,
            html_escape(&display_name),
            entry.size_formatted,
            entry.modified_formatted,
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Index of {path}</title>
</head>
<body>
<h1>Index of {path}</h1>
<table>
<thead><tr><th>Name</th><th>Size</th><th>Last Modified</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
<p>{count} entries</p>
</body>
</html>
"#,
        path = html_escape(display_path),
        rows = rows,
        count = entries.len(),
    )
}
