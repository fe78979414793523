// CSV tokenizer — single-pass, quote-aware.
//
// Permissive by default: an unterminated quote consumes to end-of-input
// instead of erroring. `tokenize_strict` rejects that case.

use sheetgate_core::error::GateError;

/// Tokenize delimited text into rows of fields.
///
/// Recognizes `,` as the field separator, `\n` as the row separator
/// (after normalizing `\r\n` and `\r`), and `"` as the quote character.
/// Inside quotes a doubled quote is a literal quote and separators and
/// newlines are field content. The final field and row are emitted even
/// without a trailing newline.
pub fn tokenize(input: &str) -> Vec<Vec<String>> {
    scan(input).0
}

/// Like `tokenize`, but an unterminated quoted field is an error.
pub fn tokenize_strict(input: &str) -> Result<Vec<Vec<String>>, GateError> {
    let (rows, unterminated) = scan(input);
    if unterminated {
        return Err(GateError::malformed_input("unterminated quoted field"));
    }
    Ok(rows)
}

fn scan(input: &str) -> (Vec<Vec<String>>, bool) {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    (rows, in_quotes)
}
