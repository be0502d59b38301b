use serde::{Deserialize, Serialize};

use crate::api::GenerateRequest;

/// Model used for generation until the user picks another one.
pub const DEFAULT_MODEL: &str = "llama2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// One entry of the conversation log. Append-only: once pushed, a message is
/// never edited, and insertion order is both the display order and the order
/// replayed to the backend as `message_history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Message {
            role: Role::Bot,
            text: text.into(),
        }
    }
}

/// A generation request handed to the API layer, tagged with the epoch it was
/// issued under so a completion that outlives a reset can be told apart from
/// a current one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub request: GenerateRequest,
    pub epoch: u64,
}

/// Everything that parameterizes an outgoing request, owned as one value.
/// Fields are private: all mutation goes through the operations below, which
/// is what keeps the single-writer discipline honest.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    messages: Vec<Message>,
    document: Option<String>,
    model: String,
    web_search: bool,
    in_flight: bool,
    epoch: u64,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            messages: Vec::new(),
            document: None,
            model: DEFAULT_MODEL.to_string(),
            web_search: false,
            in_flight: false,
            epoch: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn web_search(&self) -> bool {
        self.web_search
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Accepted as-is; catalog membership is not checked anywhere.
    pub fn set_model(&mut self, model: String) {
        self.model = model;
    }

    pub fn set_web_search(&mut self, enabled: bool) {
        self.web_search = enabled;
    }

    /// Records a successfully processed upload. When several files were
    /// uploaded together the handles arrive in response order, so the last
    /// one becomes the active document.
    pub fn document_processed(&mut self, handle: String) {
        self.document = Some(handle);
    }

    /// Starts a generation round-trip. Returns `None` without touching any
    /// state when the text is whitespace-only or another request is already
    /// in flight; otherwise snapshots the history as it stood before this
    /// call, appends the user message, and raises the in-flight flag.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        if self.in_flight || text.trim().is_empty() {
            return None;
        }

        let request = GenerateRequest {
            prompt: text.to_string(),
            filename: self.document.clone().unwrap_or_default(),
            web_search_enabled: self.web_search,
            message_history: self.messages.clone(),
            file_uploaded: self.document.is_some(),
            model: self.model.clone(),
        };

        self.messages.push(Message::user(text));
        self.in_flight = true;

        Some(PendingSend {
            request,
            epoch: self.epoch,
        })
    }

    /// Applies the outcome of a round-trip started by [`begin_send`]. A
    /// failure is absorbed into the log as a bot message rather than raised
    /// through a separate channel. Returns `false` when `epoch` is stale
    /// (a reset happened in between), in which case nothing is mutated.
    ///
    /// [`begin_send`]: Session::begin_send
    pub fn finish_send(&mut self, epoch: u64, outcome: Result<String, String>) -> bool {
        if epoch != self.epoch {
            return false;
        }

        let reply = match outcome {
            Ok(text) => Message::bot(text),
            Err(detail) => Message::bot(format!("Error: {detail}")),
        };
        self.messages.push(reply);
        self.in_flight = false;
        true
    }

    /// Clears the log and the document handle, keeps the model selection and
    /// the web-search flag. Bumping the epoch invalidates any reply that is
    /// still on the wire; clearing in-flight unlocks the input immediately
    /// instead of waiting for that reply to be discarded.
    pub fn apply_reset(&mut self) {
        self.messages.clear();
        self.document = None;
        self.in_flight = false;
        self.epoch += 1;
    }
}
