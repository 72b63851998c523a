//! FluentMate: heuristic speech scoring and an AI-driven mock interview
//! session backed by a streaming chat endpoint.

pub mod chat;
pub mod config;
pub mod interview;
pub mod progress;
pub mod speech_analysis;
pub mod sse;
pub mod transcript;
pub mod tts;

pub use chat::{ChatClient, ChatError, ChatMessage, InterviewCategory, InterviewSession, Role};
pub use config::ChatConfig;
pub use interview::InterviewCoach;
pub use progress::{JsonFileStore, PracticeRecord, ProgressStore};
pub use speech_analysis::{analyze, SpeechAnalysis};
pub use transcript::TranscriptRecorder;
