use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Discourse particles penalized in fluency scoring, in detection order.
const FILLER_WORDS: [&str; 13] = [
    "um", "uh", "er", "ah", "like", "you know", "basically", "actually", "literally", "so",
    "well", "right", "okay",
];

static FILLER_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FILLER_WORDS
        .iter()
        .map(|word| (*word, Regex::new(&format!(r"(?i)\b{}\b", word)).unwrap()))
        .collect()
});

/// Surface-pattern grammar checks applied in a fixed order. Whole-word,
/// case-insensitive.
static GRAMMAR_PATTERNS: Lazy<Vec<GrammarPattern>> = Lazy::new(|| {
    let table: [(&str, &str); 16] = [
        (r"\bhe don't\b", "he doesn't"),
        (r"\bshe don't\b", "she doesn't"),
        (r"\bit don't\b", "it doesn't"),
        (r"\bthey was\b", "they were"),
        (r"\bwe was\b", "we were"),
        (r"\byou was\b", "you were"),
        (r"\bi is\b", "I am"),
        (r"\bmore better\b", "better"),
        (r"\bmore worse\b", "worse"),
        (r"\bcould of\b", "could have"),
        (r"\bwould of\b", "would have"),
        (r"\bshould of\b", "should have"),
        (r"\bmust of\b", "must have"),
        (r"\baint\b", "isn't/aren't"),
        (r"\bgonna\b", "going to"),
        (r"\bwanna\b", "want to"),
    ];
    table
        .into_iter()
        .map(|(pattern, suggestion)| GrammarPattern {
            regex: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            suggestion,
            kind: IssueKind::Grammar,
        })
        .collect()
});

/// Standalone lowercase "i". The continuation list keeps common "i <verb>"
/// phrases from flooding the report; those are caught well enough by context.
static LOWERCASE_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bi\b").unwrap());
static LOWERCASE_I_CONTINUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s+(am|have|will|would|could|should|was|were|do|don't|think|know|feel|want|need|like|love|hate|see|hear)\b",
    )
    .unwrap()
});

/// Textual pause proxy: repeated periods, stacked commas, ellipses, or long
/// whitespace runs. No timing signal is available from text alone.
static PAUSE_INDICATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.]{2,}|,\s*,|\.{3}|\s{3,}").unwrap());

struct GrammarPattern {
    regex: Regex,
    suggestion: &'static str,
    kind: IssueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Grammar,
    Spelling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerWordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub original: String,
    pub suggestion: String,
    pub kind: IssueKind,
}

/// Full report for one finalized recording. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAnalysis {
    pub transcript: String,
    pub fluency_score: u8,
    pub grammar_score: u8,
    pub overall_score: u8,
    pub speaking_duration: f64,
    pub words_per_minute: u32,
    pub filler_words: Vec<FillerWordCount>,
    pub grammar_issues: Vec<GrammarIssue>,
    pub pause_count: usize,
    pub suggestions: Vec<String>,
}

/// Count filler-word occurrences, most frequent first. Ties keep the
/// detection order of the vocabulary table (stable sort).
pub fn count_filler_words(text: &str) -> Vec<FillerWordCount> {
    let mut found: Vec<FillerWordCount> = FILLER_PATTERNS
        .iter()
        .filter_map(|(word, regex)| {
            let count = regex.find_iter(text).count();
            (count > 0).then(|| FillerWordCount {
                word: (*word).to_string(),
                count,
            })
        })
        .collect();
    found.sort_by(|a, b| b.count.cmp(&a.count));
    found
}

/// Scan for grammar slips. At most one issue is recorded per distinct matched
/// substring, compared case-insensitively across all patterns.
pub fn find_grammar_issues(text: &str) -> Vec<GrammarIssue> {
    fn push_unique(
        issues: &mut Vec<GrammarIssue>,
        original: &str,
        suggestion: &str,
        kind: IssueKind,
    ) {
        if !issues
            .iter()
            .any(|i| i.original.eq_ignore_ascii_case(original))
        {
            issues.push(GrammarIssue {
                original: original.to_string(),
                suggestion: suggestion.to_string(),
                kind,
            });
        }
    }

    let mut issues: Vec<GrammarIssue> = Vec::new();

    for m in LOWERCASE_I.find_iter(text) {
        if !LOWERCASE_I_CONTINUATION.is_match(&text[m.end()..]) {
            push_unique(&mut issues, m.as_str(), "I", IssueKind::Grammar);
        }
    }

    for pattern in GRAMMAR_PATTERNS.iter() {
        for m in pattern.regex.find_iter(text) {
            push_unique(&mut issues, m.as_str(), pattern.suggestion, pattern.kind);
        }
    }

    issues
}

pub fn count_pauses(transcript: &str) -> usize {
    PAUSE_INDICATORS.find_iter(transcript).count()
}

/// Fluency score on a 0-100 scale. Starts at 100 and deducts for filler
/// density (max 30), abnormal pace (max 15), and pause density (max 20).
pub fn fluency_score(
    filler_words: &[FillerWordCount],
    words_per_minute: u32,
    pause_count: usize,
    total_words: usize,
) -> u8 {
    if total_words == 0 {
        return 0;
    }

    let mut score = 100.0_f64;

    let total_fillers: usize = filler_words.iter().map(|f| f.count).sum();
    let filler_ratio = total_fillers as f64 / total_words as f64;
    score -= (filler_ratio * 150.0).min(30.0);

    if words_per_minute < 100 {
        score -= ((100 - words_per_minute) as f64 / 5.0).min(15.0);
    } else if words_per_minute > 180 {
        score -= ((words_per_minute - 180) as f64 / 10.0).min(15.0);
    }

    let pause_ratio = pause_count as f64 / (total_words as f64 / 50.0).max(1.0);
    score -= (pause_ratio * 10.0).min(20.0);

    score.round().max(0.0) as u8
}

pub fn grammar_score(grammar_issues: &[GrammarIssue], total_words: usize) -> u8 {
    if total_words == 0 {
        return 0;
    }

    let issue_ratio = grammar_issues.len() as f64 / total_words as f64;
    let score = 100.0 - (issue_ratio * 500.0).min(50.0);
    score.round().max(0.0) as u8
}

/// Deterministic coaching lines: top filler, first grammar slip, pace advice,
/// and one closing line chosen by fluency band.
pub fn build_suggestions(
    filler_words: &[FillerWordCount],
    grammar_issues: &[GrammarIssue],
    words_per_minute: u32,
    fluency: u8,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(top) = filler_words.first() {
        let plural = if top.count > 1 { "s" } else { "" };
        suggestions.push(format!(
            "Try to reduce using \"{}\" - you used it {} time{}.",
            top.word, top.count, plural
        ));
    }

    if let Some(issue) = grammar_issues.first() {
        suggestions.push(format!(
            "Watch out for grammar: \"{}\" should be \"{}\".",
            issue.original, issue.suggestion
        ));
    }

    if words_per_minute < 100 {
        suggestions.push("Try speaking a bit faster to maintain listener engagement.".to_string());
    } else if words_per_minute > 180 {
        suggestions.push("Slow down slightly - you're speaking quite fast!".to_string());
    }

    if fluency >= 80 {
        suggestions.push("Great fluency! Keep practicing to maintain this level.".to_string());
    } else if fluency >= 60 {
        suggestions.push("Good progress! Focus on reducing pauses and filler words.".to_string());
    } else {
        suggestions.push("Practice reading aloud daily to improve your flow.".to_string());
    }

    suggestions
}

/// Analyze a finalized transcript. Pure and deterministic; degenerate inputs
/// (empty transcript, zero duration) yield zeroed scores rather than errors.
pub fn analyze(transcript: &str, duration_seconds: f64) -> SpeechAnalysis {
    let total_words = transcript.split_whitespace().count();
    let words_per_minute = if duration_seconds > 0.0 {
        (total_words as f64 / duration_seconds * 60.0).round() as u32
    } else {
        0
    };

    let filler_words = count_filler_words(transcript);
    let grammar_issues = find_grammar_issues(transcript);
    let pause_count = count_pauses(transcript);

    let fluency = fluency_score(&filler_words, words_per_minute, pause_count, total_words);
    let grammar = grammar_score(&grammar_issues, total_words);
    let overall = (fluency as f64 * 0.6 + grammar as f64 * 0.4).round() as u8;

    let suggestions = build_suggestions(&filler_words, &grammar_issues, words_per_minute, fluency);

    SpeechAnalysis {
        transcript: transcript.to_string(),
        fluency_score: fluency,
        grammar_score: grammar,
        overall_score: overall,
        speaking_duration: duration_seconds,
        words_per_minute,
        filler_words,
        grammar_issues,
        pause_count,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transcript_scores_zero() {
        let analysis = analyze("", 0.0);
        assert_eq!(analysis.fluency_score, 0);
        assert_eq!(analysis.grammar_score, 0);
        assert_eq!(analysis.words_per_minute, 0);
        assert!(analysis.filler_words.is_empty());
        assert!(analysis.grammar_issues.is_empty());
    }

    #[test]
    fn whitespace_only_transcript_scores_zero() {
        let analysis = analyze("   \n\t  ", 12.0);
        assert_eq!(analysis.fluency_score, 0);
        assert_eq!(analysis.grammar_score, 0);
        assert_eq!(analysis.words_per_minute, 0);
    }

    #[test]
    fn filler_deduction_is_capped() {
        // 3 fillers over 7 words: ratio * 150 = 64.3, capped at 30.
        // At 7 wpm the pace deduction also saturates at 15.
        let fillers = count_filler_words("um um um this is a test");
        assert_eq!(fillers.iter().map(|f| f.count).sum::<usize>(), 3);
        assert_eq!(fluency_score(&fillers, 7, 0, 7), 55);
    }

    #[test]
    fn repeated_grammar_match_reported_once() {
        let issues = find_grammar_issues("we could of won because they could of lost");
        let could_of: Vec<_> = issues
            .iter()
            .filter(|i| i.original.eq_ignore_ascii_case("could of"))
            .collect();
        assert_eq!(could_of.len(), 1);
        assert_eq!(could_of[0].suggestion, "could have");
    }

    #[test]
    fn filler_words_sorted_by_count_descending() {
        let fillers = count_filler_words("like like like like like um um");
        assert_eq!(fillers.len(), 2);
        assert_eq!(fillers[0].word, "like");
        assert_eq!(fillers[0].count, 5);
        assert_eq!(fillers[1].word, "um");
        assert_eq!(fillers[1].count, 2);
    }

    #[test]
    fn filler_ties_keep_vocabulary_order() {
        let fillers = count_filler_words("um uh um uh");
        assert_eq!(fillers[0].word, "um");
        assert_eq!(fillers[1].word, "uh");
    }

    #[test]
    fn multi_word_filler_matches() {
        let fillers = count_filler_words("you know it was hard you know");
        assert!(fillers
            .iter()
            .any(|f| f.word == "you know" && f.count == 2));
    }

    #[test]
    fn lowercase_i_flagged_unless_continuation() {
        let issues = find_grammar_issues("i went home");
        assert!(issues.iter().any(|i| i.original == "i" && i.suggestion == "I"));

        let issues = find_grammar_issues("i think we won");
        assert!(!issues.iter().any(|i| i.original == "i"));
    }

    #[test]
    fn pause_indicators_counted() {
        assert_eq!(count_pauses("well.. that is,, hard... yes"), 3);
        assert_eq!(count_pauses("no pauses here"), 0);
    }

    #[test]
    fn grammar_score_scales_with_issue_density() {
        let issues = find_grammar_issues("they was gonna win");
        assert_eq!(issues.len(), 2);
        // 2 issues over 4 words: ratio * 500 = 250, capped at 50.
        assert_eq!(grammar_score(&issues, 4), 50);
    }

    #[test]
    fn suggestions_cover_fillers_grammar_pace_and_band() {
        let analysis = analyze("um um um i gonna do it now for sure", 60.0);
        assert!(analysis.suggestions[0].contains("\"um\""));
        assert!(analysis.suggestions[0].contains("3 times"));
        assert!(analysis
            .suggestions
            .iter()
            .any(|s| s.contains("Watch out for grammar")));
        assert!(analysis
            .suggestions
            .iter()
            .any(|s| s.contains("speaking a bit faster")));
        // Exactly one closing line.
        let closings = analysis
            .suggestions
            .iter()
            .filter(|s| {
                s.contains("Great fluency")
                    || s.contains("Good progress")
                    || s.contains("Practice reading aloud")
            })
            .count();
        assert_eq!(closings, 1);
    }

    #[test]
    fn overall_score_blends_fluency_and_grammar() {
        let analysis = analyze(
            "yesterday the team shipped the release and everyone celebrated together afterwards",
            4.0,
        );
        let expected = (analysis.fluency_score as f64 * 0.6
            + analysis.grammar_score as f64 * 0.4)
            .round() as u8;
        assert_eq!(analysis.overall_score, expected);
    }

    #[test]
    fn single_filler_suggestion_is_singular() {
        let analysis = analyze("um the quarterly report is finished and reviewed", 4.0);
        assert!(analysis.suggestions[0].contains("1 time."));
    }
}
