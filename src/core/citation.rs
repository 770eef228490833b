//! Binds inline `[n]` markers in answer text to the sources that carry index `n`.
//!
//! Works on partial text while a reply is still streaming: a marker only
//! becomes a citation once its closing bracket has arrived and a source with
//! that index exists. Anything else stays literal.

use std::sync::LazyLock;

use regex::Regex;

use crate::rag::Source;

static CITATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\]").expect("Invalid citation regex pattern"));

/// A run of answer text, either literal or a bound citation marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment<'a> {
    Text(&'a str),
    Citation { marker: &'a str, source: &'a Source },
}

/// Split `content` into literal text and citations, in order.
///
/// Adjacent literal runs are merged, so unmatched markers never split text.
pub fn segments<'a>(content: &'a str, sources: &'a [Source]) -> Vec<Fragment<'a>> {
    let mut fragments = Vec::new();
    let mut literal_start = 0;

    for caps in CITATION_MARKER.captures_iter(content) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(source) = lookup(digits.as_str(), sources) else {
            continue;
        };

        if whole.start() > literal_start {
            fragments.push(Fragment::Text(&content[literal_start..whole.start()]));
        }
        fragments.push(Fragment::Citation {
            marker: whole.as_str(),
            source,
        });
        literal_start = whole.end();
    }

    if literal_start < content.len() {
        fragments.push(Fragment::Text(&content[literal_start..]));
    }
    fragments
}

/// Distinct source indices actually cited in `content`, in first-seen order.
pub fn cited_indices(content: &str, sources: &[Source]) -> Vec<usize> {
    let mut seen = Vec::new();
    for fragment in segments(content, sources) {
        if let Fragment::Citation { source, .. } = fragment
            && !seen.contains(&source.index)
        {
            seen.push(source.index);
        }
    }
    seen
}

fn lookup<'a>(digits: &str, sources: &'a [Source]) -> Option<&'a Source> {
    let index: usize = digits.parse().ok()?;
    sources.iter().find(|s| s.index == index)
}
