use crate::error::AppError;

pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

/// Rejects bodies over the length limit (counted in characters) and
/// censors the rest.
pub fn validate_chirp(body: &str) -> Result<String, AppError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(AppError::ValidationError("Chirp is too long".into()));
    }
    Ok(clean_body(body))
}

/// Replaces each whitespace-delimited word equal (ignoring case) to a
/// profane word with `****`. Whitespace is copied through unchanged.
pub fn clean_body(body: &str) -> String {
    let mut cleaned = String::with_capacity(body.len());
    let mut word_start = None;

    for (idx, ch) in body.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(&mut cleaned, &body[start..idx]);
            }
            cleaned.push(ch);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        push_word(&mut cleaned, &body[start..]);
    }

    cleaned
}

fn push_word(out: &mut String, word: &str) {
    if PROFANE_WORDS.iter().any(|bad| word.eq_ignore_ascii_case(bad)) {
        out.push_str(CENSORED);
    } else {
        out.push_str(word);
    }
}
