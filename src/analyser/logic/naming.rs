use crate::config::ColumnRoleConfig;

/// Trims header names and gives blank ones a positional name (`column_3`).
///
/// Duplicates are left alone; structural validation reports them.
pub fn normalise_headers(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let trimmed = name.trim().trim_start_matches('\u{feff}').trim();
            if trimmed.is_empty() {
                format!("column_{}", index + 1)
            } else {
                trimmed.to_owned()
            }
        })
        .collect()
}

/// Finds the header serving a column role.
///
/// Resolution order: the explicit name (exact, then case-insensitive), then the
/// first header equal to a hint, then the first header containing a hint at
/// the start of a word. Words split on non-alphanumerics and on lower-to-upper
/// case changes, so `id` finds `EmployeeID` and `staff_id` but not `Residence`.
/// An explicit name that matches nothing does not fall back to hints.
pub fn resolve_column<'a>(headers: &'a [String], role: &ColumnRoleConfig) -> Option<&'a str> {
    if let Some(wanted) = role.column.as_deref() {
        let wanted = wanted.trim();
        return headers
            .iter()
            .find(|h| h.as_str() == wanted)
            .or_else(|| headers.iter().find(|h| h.eq_ignore_ascii_case(wanted)))
            .map(String::as_str);
    }

    let hints: Vec<String> = role
        .hints
        .iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    if hints.is_empty() {
        return None;
    }

    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let exact = lowered
        .iter()
        .position(|h| hints.iter().any(|hint| h == hint));
    let partial = || {
        headers
            .iter()
            .position(|h| hints.iter().any(|hint| contains_at_word_start(h, hint)))
    };

    exact
        .or_else(partial)
        .and_then(|index| headers.get(index))
        .map(String::as_str)
}

// `hint` must already be lowercase.
fn contains_at_word_start(header: &str, hint: &str) -> bool {
    let mut previous: Option<char> = None;
    for (index, c) in header.char_indices() {
        let starts_word = match previous {
            None => true,
            Some(p) => {
                (!p.is_alphanumeric() && c.is_alphanumeric())
                    || (p.is_lowercase() && c.is_uppercase())
                    || (p.is_alphabetic() && c.is_numeric())
            }
        };
        if starts_word
            && header
                .get(index..)
                .is_some_and(|rest| rest.to_lowercase().starts_with(hint))
        {
            return true;
        }
        previous = Some(c);
    }
    false
}
