use log::info;

use crate::chat::{ChatError, ChatMessage, InterviewCategory, InterviewSession, Role};
use crate::transcript::MIN_TRANSCRIPT_CHARS;
use crate::tts::{strip_markdown, SpeechSink};

/// Orchestrates one mock interview: validates input at the boundary, decides
/// when a verdict may be requested, and optionally voices the interviewer's
/// turns through a speech sink. All conversation state lives in the wrapped
/// [`InterviewSession`].
pub struct InterviewCoach {
    session: InterviewSession,
    sink: Option<Box<dyn SpeechSink + Send + Sync>>,
}

impl InterviewCoach {
    pub fn new(session: InterviewSession) -> Self {
        Self {
            session,
            sink: None,
        }
    }

    pub fn with_sink(session: InterviewSession, sink: Box<dyn SpeechSink + Send + Sync>) -> Self {
        Self {
            session,
            sink: Some(sink),
        }
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    /// Start an interview from a category name coming from the outside
    /// world. Unknown categories fail fast instead of defaulting.
    pub async fn begin_named(&self, category: &str) -> Result<(), ChatError> {
        self.begin(category.parse()?).await
    }

    pub async fn begin(&self, category: InterviewCategory) -> Result<(), ChatError> {
        info!("starting {} interview", category.display_name());
        self.session.start_interview(category).await?;
        self.speak_last_assistant();
        Ok(())
    }

    /// Submit the candidate's answer. Rejects blank or too-short input
    /// before any network call is made.
    pub async fn respond(&self, answer: &str) -> Result<(), ChatError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ChatError::EmptyAnswer);
        }
        if answer.len() < MIN_TRANSCRIPT_CHARS {
            return Err(ChatError::AnswerTooShort);
        }
        if self.session.is_loading() {
            return Err(ChatError::Busy);
        }

        self.session.send_answer(answer).await?;
        self.speak_last_assistant();
        Ok(())
    }

    /// A verdict may be requested once at least one question has been
    /// answered and nothing is streaming.
    pub fn can_finish(&self) -> bool {
        !self.session.is_loading() && has_completed_exchange(&self.session.messages())
    }

    /// Request the final verdict. Returns `Ok(None)` when the request was
    /// cancelled underneath us - cancellation is not an error.
    pub async fn finish(&self) -> Result<Option<String>, ChatError> {
        if !self.can_finish() {
            return Err(ChatError::NotReady);
        }
        match self.session.end_interview().await {
            Ok(verdict) => {
                if let Some(sink) = &self.sink {
                    sink.speak(&strip_markdown(&verdict));
                }
                Ok(Some(verdict))
            }
            Err(err) if err.is_cancelled() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Abandon the current interview: cancels any in-flight stream, clears
    /// the conversation, and silences the voice.
    pub fn restart(&self) {
        self.session.reset();
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }

    fn speak_last_assistant(&self) {
        let Some(sink) = &self.sink else { return };
        if let Some(message) = self
            .session
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
        {
            let spoken = strip_markdown(&message.content);
            if !spoken.is_empty() {
                sink.speak(&spoken);
            }
        }
    }
}

/// True once the history contains a user turn directly followed by an
/// assistant turn.
fn has_completed_exchange(messages: &[ChatMessage]) -> bool {
    messages
        .windows(2)
        .any(|pair| pair[0].role == Role::User && pair[1].role == Role::Assistant)
}
