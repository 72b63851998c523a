use chrono::{Duration, Utc};
use fluentmate::progress::{self, JsonFileStore, PracticeRecord, ProgressStore};
use fluentmate::speech_analysis::analyze;
use fluentmate::tts::strip_markdown;
use fluentmate::InterviewCategory;

/// End-to-end offline flow: record a practice answer, score it, persist it,
/// and report on the accumulated history.
#[test]
fn analyze_save_and_report() {
    let transcript = "um so basically i was gonna say that the project went well \
and we shipped it on time with the whole team";
    let analysis = analyze(transcript, 30.0);

    assert!(analysis.fluency_score < 100);
    assert!(analysis.grammar_score < 100);
    assert!(!analysis.filler_words.is_empty());
    assert!(!analysis.grammar_issues.is_empty());
    assert!(!analysis.suggestions.is_empty());
    assert_eq!(analysis.speaking_duration, 30.0);

    let path = std::env::temp_dir().join(format!("fluentmate-flow-{}.json", uuid::Uuid::new_v4()));
    let store = JsonFileStore::new(&path);

    let now = Utc::now();
    store
        .save(PracticeRecord::from_analysis(&analysis, now - Duration::days(1)))
        .unwrap();
    store
        .save(PracticeRecord::from_analysis(&analysis, now))
        .unwrap();

    let records = store.list().unwrap();
    assert_eq!(records.len(), 2);

    let stats = progress::user_stats(&records, now.date_naive());
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.best_score, analysis.overall_score);

    let week = progress::daily_progress(&records, 7, now.date_naive());
    assert_eq!(week.len(), 7);
    assert_eq!(week[6].session_count, 1);
    assert_eq!(week[5].session_count, 1);

    let id = records[0].id;
    assert!(store.delete(id).unwrap());
    assert_eq!(store.list().unwrap().len(), 1);

    std::fs::remove_file(&path).ok();
}

#[test]
fn scorer_is_deterministic() {
    let transcript = "well i think the answer is that we could of done more";
    assert_eq!(analyze(transcript, 12.0), analyze(transcript, 12.0));
}

#[test]
fn assistant_markdown_is_speakable() {
    let reply = "**Good answer!** Here's a follow-up:\n\n\
```python\nprint('hi')\n```\n\
Explain the [time complexity](https://en.wikipedia.org/wiki/Big_O_notation).";
    let spoken = strip_markdown(reply);

    assert!(spoken.starts_with("Good answer!"));
    assert!(spoken.contains("code block omitted"));
    assert!(spoken.contains("time complexity"));
    assert!(!spoken.contains("**"));
    assert!(!spoken.contains("```"));
    assert!(!spoken.contains("https://"));
}

#[test]
fn categories_from_user_input_are_validated() {
    assert!("system-design".parse::<InterviewCategory>().is_ok());
    assert!("SYSTEM-DESIGN".parse::<InterviewCategory>().is_ok());
    assert!("poetry".parse::<InterviewCategory>().is_err());
}
