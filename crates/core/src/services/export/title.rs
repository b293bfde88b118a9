//! Human titles and line wrapping for paginated exports.

/// Turn an identifier such as `donations_report-2025.pdf` into title lines.
///
/// The extension is dropped, `_`, `-`, `.` and whitespace separate words and
/// each word is capitalised. Lines never exceed `width` characters and only
/// break between words; a single word longer than `width` is split with a
/// trailing hyphen.
#[must_use]
pub fn format_title(raw: &str, width: usize) -> Vec<String> {
    let stem = strip_extension(raw.trim());
    let words: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        return vec!["Export".to_string()];
    }

    wrap_words(words.iter().map(String::as_str), width)
}

/// Greedy word wrap of free text, used for body lines.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let lines = wrap_words(text.split_whitespace(), width);
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

fn wrap_words<'a>(words: impl Iterator<Item = &'a str>, width: usize) -> Vec<String> {
    let width = width.max(2);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in words {
        let word_len = word.chars().count();

        if word_len > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let (pieces, tail) = hyphenate(word, width);
            lines.extend(pieces);
            current_len = tail.chars().count();
            current = tail;
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Full hyphenated lines of an over-long word, plus the remainder.
fn hyphenate(word: &str, width: usize) -> (Vec<String>, String) {
    let chars: Vec<char> = word.chars().collect();
    let chunk = width - 1;
    let mut pieces = Vec::new();
    let mut start = 0;

    while chars.len() - start > width {
        let mut piece: String = chars[start..start + chunk].iter().collect();
        piece.push('-');
        pieces.push(piece);
        start += chunk;
    }

    (pieces, chars[start..].iter().collect())
}

fn strip_extension(raw: &str) -> &str {
    match raw.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=4).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => raw,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_identifier() {
        assert_eq!(
            format_title("donations_report-2025.pdf", 48),
            vec!["Donations Report 2025"]
        );
    }

    #[test]
    fn test_long_identifier_wraps_at_word_boundaries() {
        let raw = "annual_impact_report_on_water_sanitation_and_hygiene_projects_in_cabo_delgado_provinces_25";
        assert_eq!(raw.len(), 90);

        let lines = format_title(raw, 40);
        let words: Vec<String> = raw.split('_').map(capitalize).collect();

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 40, "line too long: {line}");
            for word in line.split(' ') {
                assert!(words.iter().any(|w| w == word), "broken word: {word}");
            }
        }
        assert_eq!(lines.join(" "), words.join(" "));
    }

    #[test]
    fn test_wrapping_is_deterministic() {
        let raw = "beneficiaries-by-province-and-vulnerability-level-cabo-delgado";
        assert_eq!(format_title(raw, 24), format_title(raw, 24));
    }

    #[test]
    fn test_oversized_word_is_hyphenated() {
        let lines = format_title("abcdefghijklmnopqrstuvwxyz", 10);

        assert_eq!(lines, vec!["Abcdefghi-", "jklmnopqr-", "stuvwxyz"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_empty_identifier_has_default_title() {
        assert_eq!(format_title("__.pdf", 40), vec!["Export"]);
    }

    #[test]
    fn test_extension_only_stripped_when_short() {
        assert_eq!(format_title("v1.beta_release", 40), vec!["V1 Beta Release"]);
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        assert_eq!(wrap_text("", 20), vec![String::new()]);
        assert_eq!(wrap_text("uma duas tres", 8), vec!["uma duas", "tres"]);
    }
}
