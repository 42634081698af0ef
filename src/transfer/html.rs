use crate::models::MindNode;
use std::fmt::Write;

const SHARED_STYLE: &str = r#"
body { font-family: system-ui, -apple-system, "Segoe UI", sans-serif; margin: 2rem; color: #1f2937; }
h1 { font-size: 1.5rem; margin-bottom: 0.25rem; }
.meta { color: #6b7280; font-size: 0.8rem; margin-bottom: 1.5rem; }
ul.tree { list-style: none; padding-left: 1.25rem; border-left: 1px solid #e5e7eb; }
ul.tree.root { border-left: none; padding-left: 0; }
.node { margin: 0.5rem 0; padding: 0.5rem 0.75rem; border: 1px solid #e5e7eb; border-radius: 0.5rem; }
.title { font-weight: 600; }
.body { white-space: pre-wrap; margin: 0.25rem 0 0; font-family: inherit; color: #374151; }
"#;

const COPY_STYLE: &str = r#"
.copy { float: right; font-size: 0.75rem; border: 1px solid #d1d5db; background: #fff; border-radius: 0.25rem; cursor: pointer; }
.copy.done { background: #dcfce7; }
"#;

const COPY_SCRIPT: &str = r#"
function copyNode(btn) {
  var text = btn.parentElement.getAttribute('data-content') || '';
  var done = function () {
    btn.classList.add('done');
    btn.textContent = 'Copied';
    setTimeout(function () { btn.classList.remove('done'); btn.textContent = 'Copy'; }, 1500);
  };
  if (navigator.clipboard && navigator.clipboard.writeText) {
    navigator.clipboard.writeText(text).then(done);
  } else {
    var area = document.createElement('textarea');
    area.value = text;
    document.body.appendChild(area);
    area.select();
    document.execCommand('copy');
    document.body.removeChild(area);
    done();
  }
}
"#;

const PRINT_STYLE: &str = r#"
@page { margin: 1.5cm; }
@media print { body { margin: 0; } .node { break-inside: avoid; } }
"#;

const PRINT_SCRIPT: &str = r#"
window.addEventListener('load', function () { window.focus(); window.print(); });
"#;

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn write_nodes(out: &mut String, nodes: &[MindNode], with_copy: bool, root: bool) {
    if nodes.is_empty() {
        return;
    }
    let class = if root { "tree root" } else { "tree" };
    let _ = write!(out, "<ul class=\"{class}\">");
    for node in nodes {
        let _ = write!(
            out,
            "<li><div class=\"node\" data-content=\"{}\">",
            escape_html(&node.content)
        );
        if with_copy {
            out.push_str(
                "<button class=\"copy\" type=\"button\" onclick=\"copyNode(this)\">Copy</button>",
            );
        }
        let _ = write!(out, "<div class=\"title\">{}</div>", escape_html(&node.title));
        let body = node.body();
        if !body.trim().is_empty() {
            let _ = write!(out, "<pre class=\"body\">{}</pre>", escape_html(body));
        }
        out.push_str("</div>");
        // Collapsed nodes are exported in full.
        write_nodes(out, &node.children, with_copy, false);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn document(title: &str, exported_at: &str, trees: &[MindNode], print: bool) -> String {
    let mut out = String::new();
    let title = escape_html(title);
    let count: usize = trees.iter().map(MindNode::node_count).sum();

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"tr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{SHARED_STYLE}{}</style>\n</head>\n<body>\n",
        if print { PRINT_STYLE } else { COPY_STYLE }
    );
    let _ = write!(
        out,
        "<h1>{title}</h1>\n<div class=\"meta\">{count} notes · {}</div>\n",
        escape_html(exported_at)
    );
    write_nodes(&mut out, trees, !print, true);
    let _ = write!(
        out,
        "\n<script>{}</script>\n</body>\n</html>\n",
        if print { PRINT_SCRIPT } else { COPY_SCRIPT }
    );
    out
}

/// Standalone page with one copy button per note.
pub(crate) fn render_html(title: &str, exported_at: &str, trees: &[MindNode]) -> String {
    document(title, exported_at, trees, false)
}

/// Page that opens the print dialog as soon as it loads.
pub(crate) fn render_print_html(title: &str, exported_at: &str, trees: &[MindNode]) -> String {
    document(title, exported_at, trees, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, content: &str, children: Vec<MindNode>) -> MindNode {
        MindNode {
            id: id.to_string(),
            title: crate::tree::first_line(content).to_string(),
            content: content.to_string(),
            children,
            is_expanded: false,
        }
    }

    fn trees() -> Vec<MindNode> {
        vec![node(
            "a",
            "Root <b>\nbody & more",
            vec![node("b", "Child", vec![node("c", "Leaf", vec![])])],
        )]
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_html_nests_collapsed_children() {
        let html = render_html("Work", "2024-05-01", &trees());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div class=\"title\">Root &lt;b&gt;</div>"));
        assert!(html.contains("<pre class=\"body\">body &amp; more</pre>"));
        assert!(html.contains(">Leaf</div>"));
        assert_eq!(html.matches("<ul class=\"tree").count(), 3);
        assert!(html.contains("3 notes"));
    }

    #[test]
    fn test_render_html_has_copy_script() {
        let html = render_html("Work", "", &trees());
        assert_eq!(html.matches("onclick=\"copyNode(this)\"").count(), 3);
        assert!(html.contains("navigator.clipboard"));
        assert!(!html.contains("window.print()"));
        assert!(html.contains("data-content=\"Root &lt;b&gt;\nbody &amp; more\""));
    }

    #[test]
    fn test_render_print_html_calls_print() {
        let html = render_print_html("Work", "", &trees());
        assert!(html.contains("window.print()"));
        assert!(!html.contains("copyNode"));
    }

    #[test]
    fn test_empty_forest() {
        let html = render_html("Empty", "", &[]);
        assert!(!html.contains("<ul"));
        assert!(html.contains("0 notes"));
    }
}
