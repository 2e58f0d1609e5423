use lazy_static::lazy_static;
use regex::Regex;

use super::prompt::INSTRUCTION_ECHO_MARKER;

lazy_static! {
    static ref FENCE_OPEN: Regex = Regex::new(r"(?i)```json").unwrap();
    static ref FENCE: Regex = Regex::new(r"```").unwrap();
    static ref LINE_BREAKS: Regex = Regex::new(r"[\r\n]+").unwrap();
    static ref ECHO_MARKER: Regex =
        Regex::new(&format!("(?i){}", regex::escape(INSTRUCTION_ECHO_MARKER))).unwrap();
}

/// Isolates the JSON candidate from a raw model reply.
///
/// Purely textual and infallible: always returns some string, possibly
/// empty, possibly still invalid JSON. The parse stage decides whether
/// it is usable. Idempotent on already-clean input.
pub fn extract_json_candidate(raw: &str) -> String {
    // Code fences first, openers before bare closers.
    let text = FENCE_OPEN.replace_all(raw, "");
    let text = FENCE.replace_all(&text, "");

    // Some replies restate the instruction block instead of answering
    // it. Cut from the echoed heading onward.
    let text = match ECHO_MARKER.find(&text) {
        Some(m) => &text[..m.start()],
        None => &text[..],
    };

    let text = LINE_BREAKS.replace_all(text, " ");

    // Keep only the outermost brace span.
    let text = match text.find('{') {
        Some(first) => &text[first..],
        None => &text[..],
    };
    let text = match text.rfind('}') {
        Some(last) => &text[..=last],
        None => text,
    };

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"{"foods": [{"name": "apple"}], "total_calories": 52}"#;

    #[test]
    fn clean_reply_passes_through() {
        assert_eq!(extract_json_candidate(CLEAN), CLEAN);
    }

    #[test]
    fn strips_json_code_fences() {
        let wrapped = format!("```json\n{CLEAN}\n```");
        assert_eq!(extract_json_candidate(&wrapped), CLEAN);
    }

    #[test]
    fn strips_fences_case_insensitively() {
        let wrapped = format!("```JSON\n{CLEAN}\n```");
        assert_eq!(extract_json_candidate(&wrapped), CLEAN);
    }

    #[test]
    fn drops_prose_before_and_after() {
        let chatty = format!("Here is the analysis you asked for:\n{CLEAN}\nHope that helps!");
        assert_eq!(extract_json_candidate(&chatty), CLEAN);
    }

    #[test]
    fn truncates_echoed_instruction_block() {
        let echoed = format!("{CLEAN}\nJSON STRUCTURE (copy exactly): {{ ... }}");
        assert_eq!(extract_json_candidate(&echoed), CLEAN);
    }

    #[test]
    fn collapses_line_breaks_inside_object() {
        let multiline = "{\"foods\":\r\n[],\n\"meal_type\":\n\"lunch\"}";
        assert_eq!(
            extract_json_candidate(multiline),
            "{\"foods\": [], \"meal_type\": \"lunch\"}"
        );
    }

    #[test]
    fn cleaning_is_idempotent() {
        let wrapped = format!("Sure!\n```json\n{CLEAN}\n```");
        let once = extract_json_candidate(&wrapped);
        let twice = extract_json_candidate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn never_fails_on_garbage() {
        assert_eq!(extract_json_candidate(""), "");
        assert_eq!(extract_json_candidate("no braces here"), "no braces here");
        assert_eq!(extract_json_candidate("}{"), "{");
    }
}
