use iine_core::DiffResult;

pub const DEFAULT_MAX_TITLE_LENGTH: usize = 20;
pub const TRUNCATION_MARKER: &str = "...";

/// Title cut to `max_length` characters, with a marker when anything was cut.
pub fn truncate_title(title: &str, max_length: usize) -> String {
    match title.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}{}", &title[..cut], TRUNCATION_MARKER),
        None => title.to_string(),
    }
}

/// Renders the notification sentence: likers first, then the quoted title.
pub fn format_message(diff: &DiffResult, max_title_length: usize) -> String {
    let names = diff.new_likers.join(", ");
    let title = truncate_title(&diff.title, max_title_length);
    format!("\n{}が「{}」にいいねしました。", names, title)
}

pub fn format_default(diff: &DiffResult) -> String {
    format_message(diff, DEFAULT_MAX_TITLE_LENGTH)
}
