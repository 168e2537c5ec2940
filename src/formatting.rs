/// Normalizes a raw multi-line template body.
///
/// The first line is dropped unconditionally (it is the empty line that
/// follows the opening delimiter of a multi-line literal). The indentation of
/// the new first line, counted in characters up to its first non-whitespace
/// character, is then stripped from every remaining line. The result is
/// trimmed at the end and terminated by exactly one newline.
///
/// Indentation is assumed to be uniform: a line indented less than the first
/// one loses leading content, and a line shorter than the prefix becomes
/// empty. When the first line has no non-whitespace character nothing is
/// stripped.
///
/// # Arguments
///
/// * `raw` - The body as returned by a template's `content`.
///
/// # Returns
///
/// The left-aligned body ending in a single `\n`.
pub fn format(raw: &str) -> String {
    let mut lines = raw.split('\n').skip(1).peekable();
    let indent = lines.peek().map_or(0, |first| leading_whitespace(first));

    let mut formatted = lines
        .map(|line| strip_chars(line, indent))
        .collect::<Vec<_>>()
        .join("\n");

    formatted.truncate(formatted.trim_end().len());
    formatted.push('\n');
    formatted
}

fn leading_whitespace(line: &str) -> usize {
    if line.chars().all(char::is_whitespace) {
        return 0;
    }
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn strip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((at, _)) => &line[at..],
        None => "",
    }
}
