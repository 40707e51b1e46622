pub mod input;

/// Split comma separated tags, trimming whitespace and dropping empties.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

/// `part / whole` as a rounded percentage in `0..=100`. Zero when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let pct = (part as f64 / whole as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Smallest id counter that is at least `stored` and above every id in use.
pub fn next_free_id(stored: u32, ids: impl IntoIterator<Item = u32>) -> u32 {
    let above_max = ids
        .into_iter()
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(1);
    stored.max(above_max).max(1)
}

/// Hand out `*next` and advance the counter. `None` once the id space is
/// used up; the last value is never issued so it cannot collide with a
/// restored item that already holds it.
pub fn issue_id(next: &mut u32) -> Option<u32> {
    let id = *next;
    *next = id.checked_add(1)?;
    Some(id)
}

/// Counter value encoded in ids shaped like `widget-12`.
pub fn widget_number(id: &str) -> Option<u64> {
    id.strip_prefix("widget-")?.parse().ok()
}
