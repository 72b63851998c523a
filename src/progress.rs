use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::speech_analysis::SpeechAnalysis;

/// One finalized practice session, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub transcript: String,
    pub fluency_score: u8,
    pub grammar_score: u8,
    pub overall_score: u8,
    pub words_per_minute: u32,
}

impl PracticeRecord {
    pub fn from_analysis(analysis: &SpeechAnalysis, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at,
            duration_seconds: analysis.speaking_duration,
            transcript: analysis.transcript.clone(),
            fluency_score: analysis.fluency_score,
            grammar_score: analysis.grammar_score,
            overall_score: analysis.overall_score,
            words_per_minute: analysis.words_per_minute,
        }
    }

    fn day(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Persistence boundary for practice history.
pub trait ProgressStore {
    fn save(&self, record: PracticeRecord) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<PracticeRecord>, StoreError>;
    /// Returns whether a record with that id existed.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Record list kept as one JSON document on disk. A missing or corrupt file
/// reads as an empty history rather than an error.
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Vec<PracticeRecord> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("practice history at {:?} is unreadable, starting empty: {}", self.path, err);
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    fn write_all(&self, records: &[PracticeRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(records)?)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn save(&self, record: PracticeRecord) -> Result<(), StoreError> {
        let _lock = self.guard.lock();
        let mut records = self.read_all();
        records.push(record);
        self.write_all(&records)
    }

    fn list(&self) -> Result<Vec<PracticeRecord>, StoreError> {
        let _lock = self.guard.lock();
        Ok(self.read_all())
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let _lock = self.guard.lock();
        let mut records = self.read_all();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.write_all(&records)?;
        Ok(true)
    }
}

/// Aggregates for a single calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub session_count: usize,
    pub average_fluency: u8,
    pub average_grammar: u8,
    pub total_speaking_minutes: u32,
    pub average_wpm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_sessions: usize,
    pub total_speaking_minutes: u32,
    pub average_fluency: u8,
    pub average_grammar: u8,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub best_score: u8,
}

/// Most recent sessions first.
pub fn recent(records: &[PracticeRecord], count: usize) -> Vec<PracticeRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    sorted.truncate(count);
    sorted
}

/// Per-day aggregates for the `days` calendar days ending at `as_of`,
/// oldest first. Days without sessions produce zeroed rows so charts get a
/// continuous axis.
pub fn daily_progress(records: &[PracticeRecord], days: u32, as_of: NaiveDate) -> Vec<DailyProgress> {
    let mut progress = Vec::with_capacity(days as usize);

    for offset in (0..days as i64).rev() {
        let date = as_of - Duration::days(offset);
        let day_records: Vec<&PracticeRecord> =
            records.iter().filter(|r| r.day() == date).collect();

        if day_records.is_empty() {
            progress.push(DailyProgress {
                date,
                session_count: 0,
                average_fluency: 0,
                average_grammar: 0,
                total_speaking_minutes: 0,
                average_wpm: 0,
            });
            continue;
        }

        let count = day_records.len();
        progress.push(DailyProgress {
            date,
            session_count: count,
            average_fluency: average(day_records.iter().map(|r| r.fluency_score as f64), count),
            average_grammar: average(day_records.iter().map(|r| r.grammar_score as f64), count),
            total_speaking_minutes: (day_records
                .iter()
                .map(|r| r.duration_seconds)
                .sum::<f64>()
                / 60.0)
                .round() as u32,
            average_wpm: (day_records
                .iter()
                .map(|r| r.words_per_minute as f64)
                .sum::<f64>()
                / count as f64)
                .round() as u32,
        });
    }

    progress
}

/// Lifetime totals plus practice streaks. The current streak counts back
/// from `as_of` and still holds when the latest practice day was yesterday.
pub fn user_stats(records: &[PracticeRecord], as_of: NaiveDate) -> UserStats {
    if records.is_empty() {
        return UserStats {
            total_sessions: 0,
            total_speaking_minutes: 0,
            average_fluency: 0,
            average_grammar: 0,
            current_streak: 0,
            longest_streak: 0,
            best_score: 0,
        };
    }

    let count = records.len();
    let total_speaking_minutes =
        (records.iter().map(|r| r.duration_seconds).sum::<f64>() / 60.0).round() as u32;
    let average_fluency = average(records.iter().map(|r| r.fluency_score as f64), count);
    let average_grammar = average(records.iter().map(|r| r.grammar_score as f64), count);
    let best_score = records.iter().map(|r| r.overall_score).max().unwrap_or(0);

    let mut days: Vec<NaiveDate> = records.iter().map(PracticeRecord::day).collect();
    days.sort_unstable();
    days.dedup();
    days.reverse();

    let mut current_streak = 0;
    if days[0] == as_of || days[0] == as_of - Duration::days(1) {
        current_streak = 1;
        for pair in days.windows(2) {
            if (pair[0] - pair[1]).num_days() == 1 {
                current_streak += 1;
            } else {
                break;
            }
        }
    }

    let mut longest_streak = 1;
    let mut run = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
        } else {
            longest_streak = longest_streak.max(run);
            run = 1;
        }
    }
    longest_streak = longest_streak.max(run);

    UserStats {
        total_sessions: count,
        total_speaking_minutes,
        average_fluency,
        average_grammar,
        current_streak,
        longest_streak,
        best_score,
    }
}

fn average(values: impl Iterator<Item = f64>, count: usize) -> u8 {
    (values.sum::<f64>() / count as f64).round() as u8
}
