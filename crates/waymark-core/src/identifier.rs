//! Canonical identifier formatting.
//!
//! Views declare free-text labels ("Save Changes", "Email & Password");
//! automation needs stable snake_case keys. `format_identifier` is the one
//! place that mapping happens, so the same label always produces the same
//! identifier no matter which view declares it.
//!
//! Output is guaranteed to pass the registry's identifier validation: only
//! ASCII lowercase letters, digits, and underscores ever appear.

/// Build a canonical identifier from its parts.
///
/// Segments are joined with `_` in the order `prefix, category, variant,
/// label`; absent or empty segments are skipped. Each segment is normalized:
/// lowercased, `&` replaced by `and`, non-alphanumeric runs collapsed to a
/// single underscore, leading/trailing underscores trimmed.
///
/// ```
/// use waymark_core::identifier::format_identifier;
///
/// let id = format_identifier("button", Some("primary"), "Save Changes", None);
/// assert_eq!(id, "button_primary_save_changes");
/// ```
#[must_use]
pub fn format_identifier(
    category: &str,
    variant: Option<&str>,
    label: &str,
    prefix: Option<&str>,
) -> String {
    let segments = [
        prefix.map(normalize_fragment),
        Some(normalize_fragment(category)),
        variant.map(normalize_fragment),
        Some(normalize_fragment(label)),
    ];

    segments
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalize one free-text fragment to identifier form.
#[must_use]
pub fn normalize_fragment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if ch == '&' {
            push_separated(&mut out, "and");
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

fn push_separated(out: &mut String, token: &str) {
    if !out.is_empty() && !out.ends_with('_') {
        out.push('_');
    }
    out.push_str(token);
    out.push('_');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_category_variant_label() {
        assert_eq!(
            format_identifier("button", Some("primary"), "Save Changes", None),
            "button_primary_save_changes"
        );
    }

    #[test]
    fn prefix_leads_the_identifier() {
        assert_eq!(
            format_identifier("textfield", None, "Email", Some("login")),
            "login_textfield_email"
        );
    }

    #[test]
    fn ampersand_becomes_and() {
        assert_eq!(normalize_fragment("Save & Exit"), "save_and_exit");
        assert_eq!(normalize_fragment("Save&Exit"), "save_and_exit");
    }

    #[test]
    fn punctuation_runs_collapse_to_single_underscore() {
        assert_eq!(normalize_fragment("Hello,   world!!"), "hello_world");
        assert_eq!(normalize_fragment("a - b -- c"), "a_b_c");
    }

    #[test]
    fn leading_and_trailing_separators_are_trimmed() {
        assert_eq!(normalize_fragment("  (Save)  "), "save");
        assert_eq!(normalize_fragment("***"), "");
    }

    #[test]
    fn non_ascii_is_treated_as_separator() {
        assert_eq!(normalize_fragment("café menu"), "caf_menu");
    }

    #[test]
    fn empty_segments_are_skipped() {
        assert_eq!(format_identifier("button", Some("  "), "OK", None), "button_ok");
        assert_eq!(format_identifier("", None, "OK", None), "ok");
    }

    #[test]
    fn digits_survive_normalization() {
        assert_eq!(
            format_identifier("cell", None, "Row 42", None),
            "cell_row_42"
        );
    }

    #[test]
    fn output_always_passes_identifier_validation() {
        let policy = crate::validate::ValidationPolicy::default();
        for label in ["Save & Exit", "  weird -- label !!", "Émile's page", "42"] {
            let id = format_identifier("button", Some("primary"), label, Some("home"));
            policy.validate_identifier(&id).unwrap();
        }
    }
}
