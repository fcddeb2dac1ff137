//! One conversation: its transcript, its pending files, and the bookkeeping
//! around a send.
//!
//! A send is split in two so the front end can run the network call on a
//! background task: [`ChatSession::prepare`] mutates the transcript and returns
//! a [`Dispatch`], and [`ChatSession::complete`] folds the outcome back in.

use std::path::PathBuf;

use crate::attachments::{Attachments, PendingFile};
use crate::client::{ClientError, LlmClient, LlmReply, LlmRequest};
use crate::intent::{classify, Intent};
use crate::state::{ChatMessage, Transcript};

pub const DEFAULT_FILE_PROMPT: &str = "Describe this file.";
pub const LOADING_PLACEHOLDER: &str = "Loading...";
pub const PROCESSING_PLACEHOLDER: &str = "Processing file...";
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// A request ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Json(LlmRequest),
    Files {
        prompt: String,
        files: Vec<PendingFile>,
    },
}

impl Dispatch {
    pub async fn run(self, client: &LlmClient) -> Completion {
        match self {
            Dispatch::Json(request) => Completion::Json(client.send(&request).await),
            Dispatch::Files { prompt, files } => {
                Completion::Files(client.send_files(&prompt, &files).await)
            }
        }
    }
}

/// Outcome of a [`Dispatch`], tagged by the path it took.
#[derive(Debug)]
pub enum Completion {
    Json(Result<LlmReply, ClientError>),
    Files(Result<LlmReply, ClientError>),
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Transcript,
    attachments: Attachments,
    // Files that went out with the request still running
    in_flight_files: Vec<PendingFile>,
    max_pages: u32,
    one_shot: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl ChatSession {
    pub fn new(max_pages: u32) -> Self {
        Self {
            transcript: Transcript::new(),
            attachments: Attachments::new(),
            in_flight_files: Vec::new(),
            max_pages,
            one_shot: false,
        }
    }

    /// Route unclassified text to `generate` (no history) instead of `chat`.
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn files(&self) -> &[PendingFile] {
        self.attachments.files()
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        let file = PendingFile::new(path);
        tracing::debug!(name = %file.name, "file attached");
        self.attachments.add(file);
    }

    pub fn remove_file(&mut self, index: usize) -> Option<PendingFile> {
        self.attachments.remove(index)
    }

    /// Whether the send control should be enabled for this input.
    pub fn can_send(input: &str) -> bool {
        !input.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Record the user's turn and build the request for it.
    ///
    /// Returns `None` (and leaves the transcript alone) when there is nothing
    /// to send: no attached files and blank input.
    pub fn prepare(&mut self, input: &str) -> Option<Dispatch> {
        let text = input.trim();

        if !self.attachments.is_empty() {
            let prompt = if text.is_empty() {
                DEFAULT_FILE_PROMPT.to_string()
            } else {
                text.to_string()
            };
            self.transcript.push(ChatMessage::user(format!(
                "{} ({})",
                prompt,
                self.attachments.names()
            )));
            self.transcript
                .push(ChatMessage::assistant(PROCESSING_PLACEHOLDER));
            let files = self.attachments.files().to_vec();
            self.in_flight_files = files.clone();
            return Some(Dispatch::Files { prompt, files });
        }

        if text.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::user(text));

        let request = match classify(text) {
            Intent::ScrapeSite { url, question } => LlmRequest::ScrapeSite {
                url,
                question,
                max_pages: self.max_pages,
            },
            Intent::Search { query } => LlmRequest::Search { query },
            Intent::Chat { prompt } if self.one_shot => LlmRequest::Generate { prompt },
            Intent::Chat { prompt } => LlmRequest::Chat {
                prompt,
                history: self.transcript.messages().to_vec(),
            },
        };

        self.transcript
            .push(ChatMessage::assistant(LOADING_PLACEHOLDER));
        Some(Dispatch::Json(request))
    }

    /// Mark the in-flight turn as failed when no [`Completion`] will arrive.
    pub fn abort(&mut self, reason: &str) {
        self.in_flight_files.clear();
        self.transcript
            .set_last_content(format!("Request failed: {}", reason));
    }

    /// Replace the placeholder with the outcome.
    ///
    /// Returns an alert message when the failure should also interrupt the
    /// user.
    pub fn complete(&mut self, completion: Completion) -> Option<String> {
        match completion {
            Completion::Json(Ok(reply)) => {
                self.transcript.set_last_content(reply.into_message());
                None
            }
            Completion::Json(Err(err)) => {
                tracing::warn!(error = %err, "request failed");
                self.transcript
                    .set_last_content(LlmReply::default().into_message());
                Some(err.to_string())
            }
            Completion::Files(result) => {
                let content = match result {
                    Ok(reply) => reply.into_message(),
                    Err(err) => {
                        tracing::warn!(error = %err, "file request failed");
                        format!("Request failed: {}", err)
                    }
                };
                self.transcript.set_last_content(content);
                let sent = std::mem::take(&mut self.in_flight_files);
                self.attachments.discard(&sent);
                None
            }
        }
    }
}
