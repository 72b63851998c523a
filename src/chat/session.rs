use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use log::{info, warn};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::sse::SseDecoder;

use super::client::ChatClient;
use super::error::ChatError;
use super::{ChatMessage, InterviewCategory, Role};

/// Terminal instruction sent with the accumulated history when the user ends
/// the interview. It travels in the request payload only and is never shown
/// in the visible conversation.
const VERDICT_REQUEST: &str = "The interview is now over. As the interviewer, give your final \
verdict on the candidate: overall assessment, key strengths, areas to improve, and a hiring \
recommendation. Do not ask any further questions.";

/// Where the streamed content of one request ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamTarget {
    /// First assistant turn of a fresh interview; history starts empty.
    Opening,
    /// Reply to the answer the user just sent; merges into the trailing
    /// assistant message.
    Reply,
    /// Terminal evaluation; kept out of the message history entirely.
    Verdict,
}

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<ChatMessage>,
    verdict: Option<String>,
}

/// Owns one interview conversation: the ordered message history, the loading
/// flag guarding the single in-flight request, the in-flight request's
/// cancellation flag, and a snapshot channel observers subscribe to.
///
/// Clones share the same underlying session, so a UI can hold one handle for
/// rendering and another for reset.
#[derive(Clone)]
pub struct InterviewSession {
    client: ChatClient,
    category: Arc<Mutex<InterviewCategory>>,
    state: Arc<Mutex<SessionState>>,
    loading: Arc<AtomicBool>,
    cancel: Arc<Mutex<Option<Arc<AtomicBool>>>>,
    snapshots: Arc<watch::Sender<Vec<ChatMessage>>>,
}

impl InterviewSession {
    pub fn new(client: ChatClient) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            client,
            category: Arc::new(Mutex::new(InterviewCategory::Mixed)),
            state: Arc::new(Mutex::new(SessionState::default())),
            loading: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(None)),
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().messages.clone()
    }

    pub fn verdict(&self) -> Option<String> {
        self.state.lock().verdict.clone()
    }

    pub fn category(&self) -> InterviewCategory {
        *self.category.lock()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Observe the conversation. Receivers get an immutable snapshot of the
    /// full message list after every merge.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.snapshots.subscribe()
    }

    /// Begin a fresh interview in the given category: any in-flight stream is
    /// cancelled, the history is cleared, and the interviewer's opening turn
    /// is streamed in. Cancellation mid-stream is not an error.
    pub async fn start_interview(&self, category: InterviewCategory) -> Result<(), ChatError> {
        self.cancel_in_flight();
        {
            let mut state = self.state.lock();
            state.messages.clear();
            state.verdict = None;
        }
        *self.category.lock() = category;
        self.loading.store(true, Ordering::SeqCst);
        self.emit_snapshot();

        let cancel = self.arm_cancel();
        let result = self
            .request_and_stream(Vec::new(), category, StreamTarget::Opening, cancel.clone())
            .await;
        self.finish_request(&cancel);

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Submit the user's answer and stream the interviewer's reply. Blank
    /// answers and calls made while a request is in flight are no-ops. The
    /// user turn is appended synchronously so observers see it before the
    /// network round-trip begins.
    pub async fn send_answer(&self, answer: &str) -> Result<(), ChatError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(());
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("answer ignored: a request is already in flight");
            return Ok(());
        }

        let category = self.category();
        let history = {
            let mut state = self.state.lock();
            state.messages.push(ChatMessage::user(answer));
            state.messages.clone()
        };
        self.emit_snapshot();

        let cancel = self.arm_cancel();
        let result = self
            .request_and_stream(history, category, StreamTarget::Reply, cancel.clone())
            .await;
        self.finish_request(&cancel);

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Request the terminal verdict for the conversation so far. The verdict
    /// instruction and the streamed evaluation both stay out of the visible
    /// history; the result is stored on the session and returned.
    ///
    /// Callers should treat [`ChatError::Cancelled`] as normal termination.
    pub async fn end_interview(&self) -> Result<String, ChatError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChatError::Busy);
        }

        let category = self.category();
        let mut history = self.state.lock().messages.clone();
        history.push(ChatMessage::user(VERDICT_REQUEST));

        let cancel = self.arm_cancel();
        let result = self
            .request_and_stream(history, category, StreamTarget::Verdict, cancel.clone())
            .await;
        self.finish_request(&cancel);

        let verdict = result?.trim().to_string();
        self.state.lock().verdict = Some(verdict.clone());
        info!("interview verdict received: {} chars", verdict.len());
        Ok(verdict)
    }

    /// Cancel any in-flight stream and clear the conversation. The read loop
    /// observes the flag at its next chunk and exits without touching the
    /// history again, so partial assistant content is discarded.
    pub fn reset(&self) {
        self.cancel_in_flight();
        {
            let mut state = self.state.lock();
            state.messages.clear();
            state.verdict = None;
        }
        self.loading.store(false, Ordering::SeqCst);
        self.emit_snapshot();
    }

    fn cancel_in_flight(&self) {
        if let Some(flag) = self.cancel.lock().take() {
            info!("cancelling in-flight interview request");
            flag.store(true, Ordering::SeqCst);
        }
    }

    fn arm_cancel(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        *self.cancel.lock() = Some(flag.clone());
        flag
    }

    /// Restore the idle state after a request, unless this request was
    /// cancelled - then reset (or the superseding start) already owns the
    /// loading flag and the cancel slot.
    fn finish_request(&self, cancel: &Arc<AtomicBool>) {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        self.loading.store(false, Ordering::SeqCst);
        let mut slot = self.cancel.lock();
        if slot.as_ref().map_or(false, |current| Arc::ptr_eq(current, cancel)) {
            *slot = None;
        }
    }

    async fn request_and_stream(
        &self,
        history: Vec<ChatMessage>,
        category: InterviewCategory,
        target: StreamTarget,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, ChatError> {
        let response = self.client.stream_chat(&history, category).await?;
        if cancel.load(Ordering::SeqCst) {
            return Err(ChatError::Cancelled);
        }
        self.consume_stream(response.bytes_stream(), target, cancel)
            .await
    }

    /// Drive one event stream to completion, merging each fragment into the
    /// conversation. The cancel flag is checked at every chunk boundary; once
    /// raised, the loop exits without mutating session state again.
    async fn consume_stream<S, B, E>(
        &self,
        mut stream: S,
        target: StreamTarget,
        cancel: Arc<AtomicBool>,
    ) -> Result<String, ChatError>
    where
        S: Stream<Item = Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Into<ChatError>,
    {
        let mut decoder = SseDecoder::new();
        let mut content = String::new();

        while let Some(chunk) = stream.next().await {
            if cancel.load(Ordering::SeqCst) {
                info!("stream cancelled, discarding partial assistant content");
                return Err(ChatError::Cancelled);
            }
            let bytes = chunk.map_err(Into::into)?;
            for token in decoder.feed(bytes.as_ref()) {
                content.push_str(&token);
                self.apply_content(target, &content);
            }
            if decoder.is_done() {
                break;
            }
        }

        if cancel.load(Ordering::SeqCst) {
            return Err(ChatError::Cancelled);
        }
        if let Some(tail) = decoder.finish() {
            content.push_str(&tail);
            self.apply_content(target, &content);
        }

        Ok(content)
    }

    /// Merge the accumulated assistant content into the message list.
    ///
    /// For replies, the trailing message is only overwritten when it is an
    /// assistant turn directly preceded by a user turn; anything else gets a
    /// fresh message appended. The stricter guard keeps late tokens from
    /// landing in a stale assistant turn left over from an earlier exchange.
    fn apply_content(&self, target: StreamTarget, content: &str) {
        match target {
            StreamTarget::Verdict => return,
            StreamTarget::Opening => {
                let mut state = self.state.lock();
                match state.messages.last_mut() {
                    Some(last) if last.role == Role::Assistant => {
                        last.content = content.to_string();
                    }
                    _ => state.messages.push(ChatMessage::assistant(content)),
                }
            }
            StreamTarget::Reply => {
                let mut state = self.state.lock();
                let len = state.messages.len();
                let merge = len >= 2
                    && state.messages[len - 1].role == Role::Assistant
                    && state.messages[len - 2].role == Role::User;
                if merge {
                    state.messages[len - 1].content = content.to_string();
                } else {
                    state.messages.push(ChatMessage::assistant(content));
                }
            }
        }
        self.emit_snapshot();
    }

    fn emit_snapshot(&self) {
        let messages = self.state.lock().messages.clone();
        self.snapshots.send_replace(messages);
    }
}
