use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::session::Session;

/// Everything the components share, provided once via context. The session
/// itself is a single owned value behind one signal; components never write
/// it directly, they call the operations below.
#[derive(Clone, Copy)]
pub struct AppState {
    pub session: RwSignal<Session>,
    /// Model names offered by the backend; empty until fetched, and empty
    /// for good if the fetch fails.
    pub models: RwSignal<Vec<String>>,
    /// Banner error shown above the input, currently only fed by failed
    /// context resets. Generation failures land in the chat log instead.
    pub error: RwSignal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            session: RwSignal::new(Session::new()),
            models: RwSignal::new(Vec::new()),
            error: RwSignal::new(None),
        }
    }

    /// One-shot catalog fetch at startup. On failure the select stays empty
    /// and the rest of the page keeps working.
    pub fn load_models(self) {
        spawn_local(async move {
            match api::list_models().await {
                Ok(models) => {
                    log!("[INFO] [models] Loaded {} models.", models.len());
                    self.models.set(models);
                }
                Err(e) => {
                    log!("[ERROR] [models] Failed to fetch model list: {e}");
                }
            }
        });
    }

    pub fn set_model(self, model: String) {
        self.session.update(|s| s.set_model(model));
    }

    pub fn set_web_search(self, enabled: bool) {
        self.session.update(|s| s.set_web_search(enabled));
    }

    pub fn document_processed(self, handle: String) {
        log!("[INFO] [session] Document ready: {handle}");
        self.session.update(|s| s.document_processed(handle));
    }

    /// Appends the user message optimistically and runs one generation
    /// round-trip. Does nothing for whitespace-only input or while another
    /// request is in flight; a failed round-trip becomes an `Error: ...`
    /// bot message in the log.
    pub fn send_message(self, text: String) {
        let mut pending = None;
        self.session.update(|s| pending = s.begin_send(&text));
        let Some(pending) = pending else {
            return;
        };
        self.error.set(None);

        spawn_local(async move {
            let outcome = api::generate_response(&pending.request)
                .await
                .map_err(|e| e.to_string());

            let mut applied = false;
            self.session
                .update(|s| applied = s.finish_send(pending.epoch, outcome));
            if !applied {
                log!("[INFO] [session] Discarding a reply that arrived after a reset.");
            }
        });
    }

    /// Clears the backend's vector store and chat memory, then the local
    /// log and document handle. Local state stays untouched when the
    /// backend call fails.
    pub fn reset_session(self) {
        spawn_local(async move {
            match api::clear_context().await {
                Ok(()) => {
                    log!("[INFO] [session] Backend context cleared.");
                    self.error.set(None);
                    self.session.update(|s| s.apply_reset());
                }
                Err(e) => {
                    log!("[ERROR] [session] Failed to clear context: {e}");
                    self.error.set(Some(format!("Error clearing context: {e}")));
                }
            }
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}
