//! Archive naming for exported selections.
//!
//! Every exported file gets a `NNN_` sequence prefix followed by its original
//! name with characters that are unsafe in file names replaced by `_`:
//!
//! - `sunset.jpg` (1st) → `001_sunset.jpg`
//! - `a:b.png` (2nd) → `002_a_b.png`
//! - `a?b.png` (3rd) → `003_a_b.png` (same safe stem as above, distinct entry)
//!
//! The prefix is the file's position in the selection, which is what keeps
//! entries collision-free even when two names sanitize to the same text.

use chrono::{DateTime, Utc};

/// Characters replaced by `_` in archive entry names.
pub const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace every unsafe character with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Entry name for the file at zero-based `index` in the selection.
///
/// Names without an extension keep their full (sanitized) text after the prefix.
pub fn safe_entry_name(original: &str, index: usize) -> String {
    let safe = sanitize(original);
    let seq = index + 1;
    match safe.rsplit_once('.') {
        Some((stem, ext)) => format!("{seq:03}_{stem}.{ext}"),
        None => format!("{seq:03}_{safe}"),
    }
}

/// Archive file name stamped with the export time in compact UTC form.
pub fn archive_file_name(at: DateTime<Utc>) -> String {
    format!("exported_images_{}.zip", at.format("%Y%m%dT%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_name_gets_sequence_prefix() {
        assert_eq!(safe_entry_name("sunset.jpg", 0), "001_sunset.jpg");
        assert_eq!(safe_entry_name("dawn.png", 41), "042_dawn.png");
    }

    #[test]
    fn sequence_grows_past_three_digits() {
        assert_eq!(safe_entry_name("x.gif", 999), "1000_x.gif");
    }

    #[test]
    fn unsafe_characters_replaced() {
        assert_eq!(
            safe_entry_name(r#"a<b>c:d"e/f\g|h?i*j.webp"#, 0),
            "001_a_b_c_d_e_f_g_h_i_j.webp"
        );
    }

    #[test]
    fn colliding_safe_names_stay_distinct() {
        let a = safe_entry_name("a:b.png", 0);
        let b = safe_entry_name("a?b.png", 1);
        assert_eq!(a, "001_a_b.png");
        assert_eq!(b, "002_a_b.png");
        assert_ne!(a, b);
    }

    #[test]
    fn only_last_dot_splits_extension() {
        assert_eq!(safe_entry_name("my.holiday.jpeg", 2), "003_my.holiday.jpeg");
    }

    #[test]
    fn name_without_extension() {
        assert_eq!(safe_entry_name("README", 0), "001_README");
    }

    #[test]
    fn unicode_names_survive() {
        assert_eq!(safe_entry_name("日落.jpg", 0), "001_日落.jpg");
    }

    #[test]
    fn archive_name_uses_compact_utc() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(archive_file_name(at), "exported_images_20260309T070501.zip");
    }
}
