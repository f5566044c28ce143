//! Identifier derivation for generated definitions, fields and functions.

use std::sync::LazyLock;

use regex::Regex;

use crate::spec::HttpMethod;

/// Namespace of definitions whose name has no namespace segment.
pub const MAIN_NAMESPACE: &str = "main";

#[allow(clippy::expect_used)]
static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("invalid path parameter regex"));

#[allow(clippy::expect_used)]
static CAMEL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+[a-z0-9]*").expect("invalid camel word regex"));

/// PascalCase: every run of letters/digits starts with an upper-case letter,
/// everything else is dropped.
pub fn to_pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize = true;
    for c in s.chars() {
        if !c.is_alphanumeric() {
            capitalize = true;
            continue;
        }
        if capitalize {
            out.extend(c.to_uppercase());
            capitalize = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Collapse immediately repeated camel-case words: `GetUserUser` -> `GetUser`.
pub fn dedup_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_end = 0;
    let mut previous: Option<&str> = None;
    for word in CAMEL_WORD.find_iter(name) {
        let gap = &name[last_end..word.start()];
        if !gap.is_empty() {
            out.push_str(gap);
            previous = None;
        }
        if previous != Some(word.as_str()) {
            out.push_str(word.as_str());
        }
        previous = Some(word.as_str());
        last_end = word.end();
    }
    out.push_str(&name[last_end..]);
    out
}

/// A PascalCase identifier for generated definition names.
pub fn sanitize_name(name: &str) -> String {
    leading_digit_guard(dedup_words(&to_pascal_case(name)))
}

/// `name` unchanged when it is already an identifier, else its PascalCase form.
pub fn identifier(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        leading_digit_guard(to_pascal_case(name))
    }
}

/// Field names keep their case; anything outside `[A-Za-z0-9_]` becomes `_`.
pub fn sanitize_field_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        return "field".to_string();
    }
    leading_digit_guard(cleaned)
}

/// Namespace segments and file stems: `-`, `.` and spaces become `_`.
pub fn sanitize_namespace(name: &str) -> String {
    name.replace(['-', '.', ' '], "_")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn leading_digit_guard(name: String) -> String {
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

/// Split `ns.Type` at the last dot; names without a dot live in `main`.
pub fn split_definition_name(full: &str) -> (String, &str) {
    match full.rsplit_once('.') {
        Some((ns, short)) => (sanitize_namespace(ns), short),
        None => (MAIN_NAMESPACE.to_string(), full),
    }
}

/// `/users/{id}` -> `/users/:id`.
pub fn format_path_for_annotation(path: &str) -> String {
    PATH_PARAM.replace_all(path, ":$1").into_owned()
}

/// `GET /users/{id}` -> `GetUsersById`.
pub fn function_name(method: HttpMethod, path: &str) -> String {
    let words = format_path_for_annotation(&path.replace('/', " ")).replace(':', " by ");
    sanitize_name(&format!(
        "{}{}",
        to_pascal_case(method.as_str()),
        to_pascal_case(&words)
    ))
}

/// `For<Segment>` from the last path segment that is not a parameter.
pub fn path_suffix(path: &str) -> Option<String> {
    path.split('/')
        .rev()
        .find(|seg| !seg.is_empty() && !seg.starts_with('{'))
        .map(|seg| format!("For{}", to_pascal_case(seg)))
        .filter(|suffix| suffix.len() > "For".len())
}

/// Element name for an array field: `tags` -> `tag`, `data` -> `dataItem`.
pub fn array_item_name(field: &str) -> String {
    match field.strip_suffix('s') {
        Some(singular) if !singular.is_empty() => singular.to_string(),
        _ => format!("{field}Item"),
    }
}

/// Enum member name as an identifier: invalid characters become `_`.
pub fn enum_member_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    leading_digit_guard(cleaned)
}
