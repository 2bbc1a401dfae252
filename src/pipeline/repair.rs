//! Repair passes over an assembled transcript.
//!
//! Page breaks and line wrapping leave artifacts that only become visible
//! once the content is a flat list: parentheticals embedded in (or split
//! across) dialogue entries, `(MORE)`/`(CONT'D)` page-break markers, and
//! short dialogue lines glued to their character name. The passes run in
//! a fixed order, each assuming the previous one's output:
//!
//! 1. [`extract_parentheticals`]
//! 2. [`combine_more`]
//! 3. [`split_short_dialogue`]
//!
//! All three walk the content with an explicit cursor that only advances
//! when the current entry is settled, so a repair can be re-examined
//! (e.g. a dialogue entry merged across a page break may still start with
//! another parenthetical).

use crate::error::ConvertError;
use crate::transcript::{ContentEntry, Role, Transcript};
use regex::Regex;
use tracing::warn;

/// Split a leading balanced parenthetical off a dialogue text.
///
/// Returns `(parenthetical, rest)`:
/// - text does not start with `(`: `(None, Some(text))`;
/// - balanced prefix: `(Some(prefix), Some(rest))`, rest trimmed and
///   possibly empty;
/// - the parenthesis never balances: `(Some(text), None)` — the remainder
///   lives in the next entry.
fn parse_parenthetical(text: &str) -> (Option<&str>, Option<&str>) {
    if !text.starts_with('(') {
        return (None, Some(text));
    }
    let mut depth = 0i32;
    let mut split = None;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            split = Some(i + c.len_utf8());
            break;
        }
    }

    match split {
        Some(end) => (Some(&text[..end]), Some(text[end..].trim())),
        None => (Some(text), None),
    }
}

/// Pull performance notes out of dialogue entries.
///
/// A dialogue entry starting with `(` is split into a parenthetical entry
/// and the remaining dialogue. An unbalanced parenthetical continues in
/// the next entry (a page break fell inside it), so the two dialogue
/// entries are merged and the merged text re-examined.
pub fn extract_parentheticals(transcript: &mut Transcript) -> Result<(), ConvertError> {
    let content = &mut transcript.content;
    let mut i = 0;
    while i < content.len() {
        if content[i].role != Role::Dialogue {
            i += 1;
            continue;
        }
        match parse_parenthetical(&content[i].text) {
            (Some(_), None) => {
                // Continues in the next dialogue entry.
                if i + 1 >= content.len() || content[i + 1].role != Role::Dialogue {
                    return Err(ConvertError::UnbalancedParenthetical {
                        text: content[i].text.clone(),
                    });
                }
                let next_text = content.remove(i + 1).text;
                content[i].text = format!("{} {}", content[i].text, next_text);
                // Re-examine the merged entry without advancing.
            }
            (Some(parenthetical), Some(rest)) => {
                let parenthetical = parenthetical.to_string();
                let rest = rest.to_string();
                content[i] = ContentEntry::new(Role::Parenthetical, parenthetical);
                if !rest.is_empty() {
                    content.insert(i + 1, ContentEntry::new(Role::Dialogue, rest));
                }
                i += 1;
            }
            (None, _) => i += 1,
        }
    }
    Ok(())
}

/// Collapse `(MORE)` / `(CONT'D)` page-break marker pairs.
///
/// A direction entry containing `(MORE)` and the entry after it (which
/// should contain `(CONT'D)`, possibly with a curly apostrophe) are both
/// removed, rejoining the dialogue the page break split. A `(MORE)` whose
/// successor lacks the marker is kept, with a warning.
pub fn combine_more(transcript: &mut Transcript) -> Result<(), ConvertError> {
    let content = &mut transcript.content;
    let mut i = 0;
    while i < content.len() {
        if content[i].role == Role::Direction && content[i].text.contains("(MORE)") {
            if i + 1 >= content.len() {
                return Err(ConvertError::DanglingContinuation {
                    text: content[i].text.clone(),
                });
            }
            let contd = content[i + 1].text.replace('\u{2019}', "'");
            if contd.contains("(CONT'D)") {
                content.drain(i..i + 2);
                // Re-examine the entry now at position i.
                continue;
            }
            warn!("(CONT'D) not found after (MORE). Instead found {:?}", content[i + 1].text);
        }
        i += 1;
    }
    Ok(())
}

/// Split character names off short dialogue lines.
///
/// A character saying a short, often one-word line can end up as a single
/// direction entry ("CLEMENTINE Yes."). Any direction starting with a
/// known character name (optionally with a `(CONT'D)` suffix) followed by
/// text containing a lowercase letter is split back into character and
/// dialogue entries. The lowercase requirement keeps all-caps stage
/// directions that happen to start with a name ("CLEMENTINE WALKS
/// AROUND") intact.
pub fn split_short_dialogue(transcript: &mut Transcript) {
    let mut characters: Vec<String> = transcript
        .content
        .iter()
        .filter(|e| e.role == Role::Character)
        .map(|e| e.text.clone())
        .collect();
    characters.sort();
    characters.dedup();
    // Longest first, so "TED BOT" wins over "TED" when both are known.
    characters.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let patterns: Vec<Regex> = characters
        .iter()
        .filter_map(|name| {
            Regex::new(&format!(
                r"^({}(?: \(CONT['’]D\))?) (.*[a-z].*)",
                regex::escape(name)
            ))
            .ok()
        })
        .collect();

    let content = &mut transcript.content;
    let mut i = 0;
    while i < content.len() {
        if content[i].role == Role::Direction {
            if let Some(caps) = patterns.iter().find_map(|re| re.captures(&content[i].text)) {
                let name = caps[1].to_string();
                let line = caps[2].to_string();
                content[i] = ContentEntry::new(Role::Character, name);
                content.insert(i + 1, ContentEntry::new(Role::Dialogue, line));
                i += 1;
            }
        }
        i += 1;
    }
}
