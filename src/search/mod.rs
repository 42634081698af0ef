use crate::models::NodeRow;
use crate::tree::first_line;

const SNIPPET_RADIUS: usize = 40;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SearchHit {
    pub node_id: String,
    pub garden_id: String,
    pub title: String,
    pub snippet: String,
}

/// `İ` lowercases to `i` followed by this mark; dropping it lets
/// "istanbul" find "İstanbul".
const COMBINING_DOT_ABOVE: char = '\u{307}';

/// Lowercased `text` and, for every char of it, the index of the original
/// char it came from.
fn fold(text: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        for lc in c.to_lowercase().filter(|lc| *lc != COMBINING_DOT_ABOVE) {
            folded.push(lc);
            origin.push(i);
        }
    }
    (folded, origin)
}

/// Case-insensitive substring search over note content.
///
/// A blank query matches nothing.
pub(crate) fn search_nodes(rows: &[NodeRow], query: &str) -> Vec<SearchHit> {
    let (needle, _) = fold(query.trim());
    if needle.is_empty() {
        return vec![];
    }

    rows.iter()
        .filter_map(|row| {
            let (hay, origin) = fold(&row.content);
            let at = hay.find(&needle)?;
            let first = hay[..at].chars().count();
            let last = first + needle.chars().count() - 1;
            Some(SearchHit {
                node_id: row.id.clone(),
                garden_id: row.garden_id.clone(),
                title: first_line(&row.content).to_string(),
                snippet: snippet(&row.content, origin[first], origin[last] + 1),
            })
        })
        .collect()
}

/// Text around the original chars `start..end`.
fn snippet(original: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = original.chars().collect();
    let from = start.saturating_sub(SNIPPET_RADIUS).min(chars.len());
    let to = (end + SNIPPET_RADIUS).min(chars.len());

    let mut out: String = chars[from..to]
        .iter()
        .map(|c| if *c == '\n' { ' ' } else { *c })
        .collect();
    if from > 0 {
        out.insert(0, '…');
    }
    if to < chars.len() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, content: &str) -> NodeRow {
        NodeRow {
            id: id.to_string(),
            garden_id: "g".to_string(),
            parent_id: None,
            content: content.to_string(),
            position_x: 0.0,
            position_y: 0.0,
            created_at: String::new(),
            updated_at: None,
            is_expanded: None,
        }
    }

    #[test]
    fn test_blank_query_is_noop() {
        let rows = vec![row("a", "anything")];
        assert!(search_nodes(&rows, "   ").is_empty());
        assert!(search_nodes(&rows, "").is_empty());
    }

    #[test]
    fn test_case_insensitive_match() {
        let rows = vec![row("a", "Shopping\nBuy MILK"), row("b", "Other")];
        let hits = search_nodes(&rows, "milk");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, "a");
        assert_eq!(hits[0].title, "Shopping");
        assert_eq!(hits[0].snippet, "Shopping Buy MILK");
    }

    #[test]
    fn test_snippet_is_trimmed_around_match() {
        let long = format!("{}needle{}", "x".repeat(100), "y".repeat(100));
        let hits = search_nodes(&[row("a", &long)], "NEEDLE");
        let s = &hits[0].snippet;
        assert!(s.starts_with('…'));
        assert!(s.ends_with('…'));
        assert!(s.contains("needle"));
        assert_eq!(s.chars().count(), 40 + 6 + 40 + 2);
    }

    #[test]
    fn test_non_ascii_content() {
        let rows = vec![row("a", "Çiçek bahçesi notları")];
        let hits = search_nodes(&rows, "BAHÇE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "Çiçek bahçesi notları");
    }

    #[test]
    fn test_turkish_dotted_capital_matches_plain_i() {
        let rows = vec![row("a", "İstanbul gezisi")];
        let hits = search_nodes(&rows, "istanbul");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "İstanbul gezisi");

        assert_eq!(search_nodes(&rows, "İSTANBUL").len(), 1);
    }

    #[test]
    fn test_snippet_window_not_shifted_by_dotted_capitals() {
        let content = format!("{}needle{}", "İ".repeat(50), "y".repeat(100));
        let hits = search_nodes(&[row("a", &content)], "needle");
        let s = &hits[0].snippet;
        assert_eq!(s, &format!("…{}needle{}…", "İ".repeat(40), "y".repeat(40)));
    }
}
