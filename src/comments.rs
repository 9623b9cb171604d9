/// Remove `// ...`, `# ...` and `/* ... */` comments from a script.
///
/// Line comments are removed together with their terminating newline. Block
/// comments may span lines and end at the first `*/`; an unterminated `/*` is
/// left in place. Removal is purely textual, so comment markers inside quoted
/// words are stripped as well.
pub fn strip_comments(script: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(script.len());
    let mut pos = 0;

    while pos < script.len() {
        let rest = &script[pos..];
        if rest.starts_with(b"//") || rest[0] == b'#' {
            pos += line_comment_len(rest);
        } else if rest.starts_with(b"/*") {
            match find(&rest[2..], b"*/") {
                Some(end) => pos += 2 + end + 2,
                None => {
                    out.extend_from_slice(rest);
                    break;
                }
            }
        } else {
            out.push(rest[0]);
            pos += 1;
        }
    }

    out
}

/// Length of a line comment including its newline, or to end of input.
fn line_comment_len(rest: &[u8]) -> usize {
    match rest.iter().position(|&b| b == b'\n') {
        Some(newline) => newline + 1,
        None => rest.len(),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
