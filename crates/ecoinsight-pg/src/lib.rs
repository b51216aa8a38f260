pub mod climate;
pub mod docs;
pub mod esg;
pub mod schema;
pub mod series;
pub mod users;

pub use docs::DocStore;
pub use series::SeriesStore;

/// Escape LIKE wildcards so a user-supplied substring matches literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("Lon_don"), "%Lon\\_don%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("plain"), "%plain%");
    }
}
