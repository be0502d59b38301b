use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use crate::api;
use crate::state::AppState;

/// Hint for the picker dialog; the backend decides what it can actually
/// ingest.
const ACCEPTED_EXTENSIONS: &str = ".pdf,.pptx,.png,.jpg,.jpeg";

#[derive(Debug, Clone, PartialEq)]
enum UploadStatus {
    Idle,
    Uploading,
    Done,
    Failed(String),
}

/// Fail-fast checks before any network call. The returned message goes into
/// the status line verbatim.
fn validate_upload(file_count: usize, model: &str) -> Result<(), &'static str> {
    if file_count == 0 {
        return Err("No files selected!");
    }
    if model.is_empty() {
        return Err("No model selected!");
    }
    Ok(())
}

/// Invokes `on_processed` once per returned handle, in response order. The
/// session keeps the last one as its active document.
fn dispatch_processed<F: FnMut(String)>(filenames: Vec<String>, mut on_processed: F) {
    for filename in filenames {
        on_processed(filename);
    }
}

/// True when the session's model has no catalog entry, in which case the
/// select shows an empty placeholder instead of defaulting to the first
/// entry it renders.
fn model_unlisted(models: &[String], current: &str) -> bool {
    !models.iter().any(|model| model == current)
}

#[component]
pub fn FileUploader() -> impl IntoView {
    let state = use_context::<AppState>().expect("AppState context not found");

    // File handles are only read on click, nothing renders from them.
    let selected_files = StoredValue::new_local(Vec::<web_sys::File>::new());
    let status = RwSignal::new(UploadStatus::Idle);

    let selected_model = Memo::new(move |_| state.session.with(|s| s.model().to_string()));

    let handle_file_select = move |ev: web_sys::Event| {
        let input = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok());
        let Some(input) = input else {
            return;
        };
        let mut files = Vec::new();
        if let Some(file_list) = input.files() {
            for i in 0..file_list.length() {
                if let Some(file) = file_list.get(i) {
                    files.push(file);
                }
            }
        }
        // A new pick replaces the previous staging entirely.
        selected_files.set_value(files);
    };

    let handle_upload = move |_| {
        if status.get_untracked() == UploadStatus::Uploading {
            return;
        }
        let files = selected_files.get_value();
        let model = selected_model.get_untracked();
        if let Err(message) = validate_upload(files.len(), &model) {
            status.set(UploadStatus::Failed(message.to_string()));
            return;
        }

        status.set(UploadStatus::Uploading);
        spawn_local(async move {
            match api::process_files(&files, &model).await {
                Ok(filenames) => {
                    log!("[INFO] [upload] Processed {} files.", filenames.len());
                    dispatch_processed(filenames, |filename| {
                        state.document_processed(filename)
                    });
                    status.set(UploadStatus::Done);
                }
                Err(e) => {
                    log!("[ERROR] [upload] Error uploading files: {e}");
                    status.set(UploadStatus::Failed(format!("Error uploading files: {e}")));
                }
            }
        });
    };

    view! {
        <upload-bar>
            <input
                type="file"
                multiple=true
                accept=ACCEPTED_EXTENSIONS
                on:change=handle_file_select
            />
            <label for="model-select">"Model:"</label>
            <select
                id="model-select"
                on:change:target=move |ev| state.set_model(ev.target().value())
            >
                {move || {
                    let current = selected_model.get();
                    let models = state.models.get();
                    let placeholder = model_unlisted(&models, &current).then(|| {
                        view! { <option selected=true disabled=true value=""></option> }
                    });
                    let entries = models
                        .into_iter()
                        .map(|model| {
                            view! {
                                <option selected=model == current value=model.clone()>
                                    {model.clone()}
                                </option>
                            }
                        })
                        .collect::<Vec<_>>();
                    (placeholder, entries)
                }}
            </select>
            <button
                data-role="primary"
                on:click=handle_upload
                disabled=move || status.get() == UploadStatus::Uploading
            >
                "Upload & Process"
            </button>
            {move || {
                match status.get() {
                    UploadStatus::Idle => ().into_any(),
                    UploadStatus::Uploading => {
                        view! {
                            <upload-status>
                                <span class="spinner"></span>
                                "processing files"
                            </upload-status>
                        }
                            .into_any()
                    }
                    UploadStatus::Done => {
                        view! {
                            <upload-status data-kind="ok">"Files processed successfully!"</upload-status>
                        }
                            .into_any()
                    }
                    UploadStatus::Failed(message) => {
                        view! { <upload-status data-kind="error">{message}</upload-status> }
                            .into_any()
                    }
                }
            }}
        </upload-bar>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_is_refused_without_files_or_a_model() {
        assert_eq!(validate_upload(0, "llama2"), Err("No files selected!"));
        assert_eq!(validate_upload(3, ""), Err("No model selected!"));
        // With both missing, the file check wins.
        assert_eq!(validate_upload(0, ""), Err("No files selected!"));
    }

    #[test]
    fn upload_proceeds_with_files_and_a_model() {
        assert_eq!(validate_upload(1, "llama2"), Ok(()));
    }

    #[test]
    fn processed_handles_are_dispatched_in_response_order() {
        let mut seen = Vec::new();
        dispatch_processed(
            vec![
                "report.pdf".to_string(),
                "slides.pptx".to_string(),
                "scan.png".to_string(),
            ],
            |handle| seen.push(handle),
        );
        assert_eq!(seen, vec!["report.pdf", "slides.pptx", "scan.png"]);
    }

    #[test]
    fn empty_response_dispatches_no_callbacks() {
        let mut calls = 0;
        dispatch_processed(Vec::new(), |_| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn out_of_catalog_model_gets_the_empty_placeholder() {
        let models = vec!["mistral".to_string(), "phi3".to_string()];
        assert!(model_unlisted(&models, "llama2"));
        assert!(!model_unlisted(&models, "mistral"));
        assert!(model_unlisted(&[], "llama2"));
    }
}
