//! Markdown code-fence stripping.

const FENCE: &str = "```";

/// Strip a surrounding markdown code fence from model output.
///
/// Removes an opening fence together with its info string (```` ```c ````,
/// ```` ```cpp ````, ...) and a closing fence, then trims. Text without
/// fences is only trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let mut code = text.trim();

    if let Some(rest) = code.strip_prefix(FENCE) {
        code = match rest.split_once('\n') {
            Some((info, body)) if is_info_string(info) => body,
            // Code on the same line as the fence, or an unterminated fence
            // with nothing but a language tag.
            Some(_) => rest,
            None if is_info_string(rest) => "",
            None => rest,
        };
    }

    if let Some(rest) = code.trim_end().strip_suffix(FENCE) {
        code = rest;
    }

    code.trim().to_string()
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '#' | '.'))
}
