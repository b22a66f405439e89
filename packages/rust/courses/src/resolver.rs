//! Course code resolution from document display names.
//!
//! The resolved code is the sole grouping key for study-plan generation
//! and calendar-title prefixing; the same name must always yield the same
//! code, with no dependence on I/O or ambient state.

use std::sync::LazyLock;

use regex::Regex;

/// Grouping key used when a document name yields no course code.
pub const GENERAL_COURSE: &str = "General";

/// Longest fallback token accepted as a course code.
const MAX_FALLBACK_LEN: usize = 15;

/// Resolve a document display name to a canonical course code.
///
/// Tries, in order:
/// 1. Strip a trailing `.pdf` extension (case-insensitive).
/// 2. Match "2–4 letters, optional whitespace/hyphen, 3–4 digits, optional
///    trailing letter" anywhere in the name (`EECS3101`, `eecs 3101`,
///    `CS-101`, `MATH201A`), normalized to upper case with exactly one
///    space between the letter and digit runs.
/// 3. Fall back to the first token split on `_`/`-`/whitespace, if it is
///    at most [`MAX_FALLBACK_LEN`] characters.
///
/// Returns `None` when resolution fails; callers substitute
/// [`GENERAL_COURSE`].
pub fn resolve(document_name: &str) -> Option<String> {
    static COURSE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b([A-Za-z]{2,4})[\s-]?([0-9]{3,4})([A-Za-z])?\b").expect("valid regex")
    });

    let name = strip_pdf_extension(document_name);

    if let Some(caps) = COURSE_RE.captures(name) {
        let letters = caps[1].to_ascii_uppercase();
        let digits = &caps[2];
        let suffix = caps
            .get(3)
            .map(|m| m.as_str().to_ascii_uppercase())
            .unwrap_or_default();
        return Some(format!("{letters} {digits}{suffix}"));
    }

    let token = name
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .find(|t| !t.is_empty())?;

    if token.len() <= MAX_FALLBACK_LEN {
        Some(token.to_string())
    } else {
        None
    }
}

/// Resolve a document name, falling back to [`GENERAL_COURSE`].
pub fn resolve_or_general(document_name: &str) -> String {
    resolve(document_name).unwrap_or_else(|| GENERAL_COURSE.to_string())
}

/// Strip one trailing `.pdf` extension, case-insensitive.
fn strip_pdf_extension(name: &str) -> &str {
    let trimmed = name.trim();
    let len = trimmed.len();
    if len >= 4
        && trimmed.is_char_boundary(len - 4)
        && trimmed[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        &trimmed[..len - 4]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_code_is_normalized() {
        assert_eq!(resolve("EECS3101.pdf").as_deref(), Some("EECS 3101"));
        assert_eq!(resolve("eecs3101").as_deref(), Some("EECS 3101"));
    }

    #[test]
    fn spaced_and_hyphenated_codes() {
        assert_eq!(resolve("eecs 3101.PDF").as_deref(), Some("EECS 3101"));
        assert_eq!(resolve("CS-101").as_deref(), Some("CS 101"));
    }

    #[test]
    fn trailing_section_letter_is_kept() {
        assert_eq!(resolve("math201a.pdf").as_deref(), Some("MATH 201A"));
    }

    #[test]
    fn code_found_inside_longer_name() {
        assert_eq!(resolve("CS101-syllabus.pdf").as_deref(), Some("CS 101"));
        assert_eq!(resolve("MATH201_outline.pdf").as_deref(), Some("MATH 201"));
        assert_eq!(resolve("Midterm guide PHYS1010.pdf").as_deref(), Some("PHYS 1010"));
    }

    #[test]
    fn fallback_uses_first_token() {
        assert_eq!(resolve("randomfile.pdf").as_deref(), Some("randomfile"));
        assert_eq!(resolve("biology_notes.pdf").as_deref(), Some("biology"));
    }

    #[test]
    fn oversized_fallback_token_fails() {
        assert_eq!(resolve("averyverylongfilename.pdf"), None);
        assert_eq!(resolve_or_general("averyverylongfilename.pdf"), GENERAL_COURSE);
    }

    #[test]
    fn empty_name_fails() {
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("___"), None);
        assert_eq!(resolve_or_general(""), GENERAL_COURSE);
    }

    #[test]
    fn resolution_is_deterministic() {
        assert_eq!(resolve("EECS3101.pdf"), resolve("eecs 3101.PDF"));
    }

    #[test]
    fn extension_stripped_only_at_end() {
        assert_eq!(resolve("CS101.pdf.bak").as_deref(), Some("CS 101"));
        assert_eq!(resolve("notes.PDF").as_deref(), Some("notes"));
    }
}
