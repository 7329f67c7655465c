//! The instruction template sent to the model.

/// System message for every request.
pub const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

const BEFORE_SOURCE: &str = "\
Write unit test cases for the module below, one case per line, starting with its first function. \
Each case is a single call written as the function's name followed by its arguments, \
for example `add(1, 2)` for a function called add. \
Use only literal arguments (numbers, strings, lists, tuples, dicts, True, False, None) and math.<name>. \
Cover every branch, boundary values and inputs that should make the code fail.\n\n```\n";

const AFTER_SOURCE: &str = "\n```\n\n\
Respond with the cases only: no numbering, no expected results, no comments and no surrounding prose.";

/// The user message for `source`.
pub fn render(source: &str) -> String {
    let mut prompt = String::with_capacity(BEFORE_SOURCE.len() + source.len() + AFTER_SOURCE.len());
    prompt.push_str(BEFORE_SOURCE);
    prompt.push_str(source.trim_end());
    prompt.push_str(AFTER_SOURCE);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embeds_source_in_a_fence() {
        let prompt = render("def add(a, b):\n    return a + b\n");
        assert!(prompt.contains("```\ndef add(a, b):\n    return a + b\n```"), "{prompt}");
        assert!(prompt.starts_with("Write unit test cases"));
        assert!(prompt.ends_with("no surrounding prose."));
    }
}
