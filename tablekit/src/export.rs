//! Bulk selection scope and CSV export naming.

/// File name used when no context is supplied.
pub const DEFAULT_EXPORT_NAME: &str = "export.csv";

/// Rows an export should cover: the selection when anything is
/// selected, otherwise exactly the rows passing the current filter.
pub fn export_rows<T>(selected: Vec<T>, filtered: Vec<T>) -> Vec<T> {
    if selected.is_empty() { filtered } else { selected }
}

/// `{context}.csv`, or the generic default without a context.
pub fn export_file_name(context: Option<&str>) -> String {
    match context {
        Some(context) => format!("{context}.csv"),
        None => DEFAULT_EXPORT_NAME.to_string(),
    }
}
