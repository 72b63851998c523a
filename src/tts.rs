use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[\s\S]*?```").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"#{1,6}\s").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-*+]\s").unwrap());
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Flatten markdown into plain prose suitable for a speech-synthesis sink.
/// Code fences are summarized rather than read character by character.
pub fn strip_markdown(text: &str) -> String {
    let text = FENCED_CODE.replace_all(text, "code block omitted");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = BULLET.replace_all(&text, "");
    let text = PARAGRAPH_BREAK.replace_all(&text, ". ");
    text.replace('\n', " ").trim().to_string()
}

/// Rendering side of speech output. Implementations wrap a platform voice;
/// callers hand over plain text already stripped of markdown.
pub trait SpeechSink {
    fn speak(&self, text: &str);
    fn stop(&self);
}
