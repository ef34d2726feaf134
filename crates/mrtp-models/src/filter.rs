//! Column filters

use bitflags::bitflags;
use mrtp_core::Value;

bitflags! {
    /// Filter kinds a column accepts. Empty means the column cannot be filtered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FilterFlags: u8 {
        /// Free-text substring match
        const BASIC = 1;
        /// The null sentinel selects rows where the column is NULL
        const EXPLICIT_NULL = 1 << 1;
    }
}

/// Whether `text` is the null sentinel (case-insensitive prefix match)
pub fn is_null_filter(text: &str, sentinel: &str) -> bool {
    !sentinel.is_empty()
        && text
            .get(..sentinel.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(sentinel))
}

/// SQL predicate for one column filter, with the values it binds.
///
/// `exprs` are the SQL expressions the filter matches against; the row passes
/// when any of them matches.
pub(crate) fn filter_predicate(
    exprs: &[&str],
    text: &str,
    match_null: bool,
    params: &mut Vec<Value>,
) -> String {
    let terms: Vec<String> = if match_null {
        exprs.iter().map(|e| format!("{} IS NULL", e)).collect()
    } else {
        let pattern = format!("%{}%", text);
        exprs
            .iter()
            .map(|e| {
                params.push(Value::String(pattern.clone()));
                format!("{} LIKE ?", e)
            })
            .collect()
    };

    if terms.len() == 1 {
        terms.into_iter().next().unwrap_or_default()
    } else {
        format!("({})", terms.join(" OR "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_sentinel_is_a_case_insensitive_prefix() {
        assert!(is_null_filter("#NULL", "#NULL"));
        assert!(is_null_filter("#null", "#NULL"));
        assert!(is_null_filter("#Nullx", "#NULL"));
        assert!(!is_null_filter("#NUL", "#NULL"));
        assert!(!is_null_filter("x#NULL", "#NULL"));
        assert!(!is_null_filter("anything", ""));
    }

    #[test]
    fn multi_expression_filter_binds_once_per_expression() {
        let mut params = Vec::new();
        let sql = filter_predicate(&["name", "short_name"], "Mil", false, &mut params);
        assert_eq!(sql, "(name LIKE ? OR short_name LIKE ?)");
        assert_eq!(
            params,
            vec![Value::String("%Mil%".into()), Value::String("%Mil%".into())]
        );
    }

    #[test]
    fn null_filter_binds_nothing() {
        let mut params = Vec::new();
        let sql = filter_predicate(&["phone_number"], "#NULL", true, &mut params);
        assert_eq!(sql, "phone_number IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn flags_combine() {
        let flags = FilterFlags::BASIC | FilterFlags::EXPLICIT_NULL;
        assert!(flags.contains(FilterFlags::EXPLICIT_NULL));
        assert!(!FilterFlags::BASIC.contains(FilterFlags::EXPLICIT_NULL));
        assert!(FilterFlags::empty().is_empty());
    }
}
