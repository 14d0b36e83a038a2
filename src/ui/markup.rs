//! Transcript markup.
//!
//! Primary turn text is inserted into the transcript as markup, so angle
//! brackets are escaped on the way in and the transcript view turns entities
//! back into literal characters when drawing. Metadata never goes through
//! here: it is plain text from start to finish.

/// Escape `<` and `>` to their entity forms.
pub fn escape_markup(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Render markup for display: entities become the characters they stand
/// for, everything else is shown verbatim.
pub fn render_markup(markup: &str) -> String {
    markup.replace("&lt;", "<").replace("&gt;", ">")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tags_are_escaped() {
        assert_eq!(
            escape_markup("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn ampersands_are_left_alone() {
        assert_eq!(escape_markup("salt & pepper"), "salt & pepper");
    }

    #[test]
    fn rendering_shows_literal_brackets() {
        let markup = escape_markup("a <b> c");
        assert_eq!(render_markup(&markup), "a <b> c");
    }
}
