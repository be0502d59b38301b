use anyhow::{anyhow, Result};
use gloo_net::http::Request;
use serde::Deserialize;
use wasm_bindgen::JsValue;
use web_sys::FormData;

use crate::session::Message;

/// The backend is assumed to run next to the dev server; there is no
/// configurable origin.
const API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Deserialize)]
struct ModelList {
    models: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProcessedFiles {
    filenames: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
}

/// The full parameter set of one generation call. Everything the backend
/// needs is spelled out per request; the server keeps no conversation state
/// of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Handle of the active document, or empty when none was uploaded yet.
    pub filename: String,
    pub web_search_enabled: bool,
    /// The log as it stood before the prompt above was appended.
    pub message_history: Vec<Message>,
    pub file_uploaded: bool,
    pub model: String,
}

impl GenerateRequest {
    /// Multipart field names and values, in submission order. The names are
    /// a wire contract with the backend and must not be renamed.
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let history = serde_json::to_string(&self.message_history)?;
        Ok(vec![
            ("prompt", self.prompt.clone()),
            ("filename", self.filename.clone()),
            ("web_search_enabled", self.web_search_enabled.to_string()),
            ("message_history", history),
            ("file_uploaded", self.file_uploaded.to_string()),
            ("model", self.model.clone()),
        ])
    }

    fn to_form_data(&self) -> Result<FormData> {
        let form = FormData::new().map_err(js_error)?;
        for (name, value) in self.form_fields()? {
            form.append_with_str(name, &value).map_err(js_error)?;
        }
        Ok(form)
    }
}

/// Fetches the names of the models the backend can generate with.
pub async fn list_models() -> Result<Vec<String>> {
    let response = Request::get(&format!("{API_BASE}/list-models"))
        .send()
        .await
        .map_err(|e| anyhow!("request failed: {e}"))?;
    if !response.ok() {
        return Err(read_failure(response).await);
    }
    let list: ModelList = response
        .json()
        .await
        .map_err(|e| anyhow!("unexpected response body: {e}"))?;
    Ok(list.models)
}

/// Uploads the selected files for ingestion and returns the handles the
/// backend assigned, in response order.
pub async fn process_files(files: &[web_sys::File], model: &str) -> Result<Vec<String>> {
    let form = FormData::new().map_err(js_error)?;
    for file in files {
        // One `files` entry per file; the browser fills in name and type.
        form.append_with_blob("files", file).map_err(js_error)?;
    }
    form.append_with_str("model", model).map_err(js_error)?;

    let response = Request::post(&format!("{API_BASE}/process-files"))
        .body(form)
        .map_err(|e| anyhow!("request failed: {e}"))?
        .send()
        .await
        .map_err(|e| anyhow!("request failed: {e}"))?;
    if !response.ok() {
        return Err(read_failure(response).await);
    }
    let processed: ProcessedFiles = response
        .json()
        .await
        .map_err(|e| anyhow!("unexpected response body: {e}"))?;
    Ok(processed.filenames)
}

/// Runs one generation round-trip and returns the reply text.
pub async fn generate_response(request: &GenerateRequest) -> Result<String> {
    let form = request.to_form_data()?;
    let response = Request::post(&format!("{API_BASE}/generate-response"))
        .body(form)
        .map_err(|e| anyhow!("request failed: {e}"))?
        .send()
        .await
        .map_err(|e| anyhow!("request failed: {e}"))?;
    if !response.ok() {
        return Err(read_failure(response).await);
    }
    let reply: GenerateReply = response
        .json()
        .await
        .map_err(|e| anyhow!("unexpected response body: {e}"))?;
    Ok(reply.response)
}

/// Asks the backend to drop its vector store and chat memory.
pub async fn clear_context() -> Result<()> {
    let response = Request::post(&format!("{API_BASE}/clear-context"))
        .send()
        .await
        .map_err(|e| anyhow!("request failed: {e}"))?;
    if !response.ok() {
        return Err(read_failure(response).await);
    }
    Ok(())
}

async fn read_failure(response: gloo_net::http::Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    anyhow!(describe_failure(status, &body))
}

/// Turns a non-2xx response into a message fit for the chat log. The backend
/// wraps its errors as `{"detail": "..."}`; anything else is reported with
/// the status code.
fn describe_failure(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.detail;
    }
    if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

fn js_error(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Message;

    fn request() -> GenerateRequest {
        GenerateRequest {
            prompt: "What does section 2 say?".to_string(),
            filename: "report.pdf".to_string(),
            web_search_enabled: false,
            message_history: vec![Message::user("Hello"), Message::bot("Hi there")],
            file_uploaded: true,
            model: "llama2".to_string(),
        }
    }

    #[test]
    fn form_fields_use_the_exact_backend_names() {
        let fields = request().form_fields().expect("serializes");
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "prompt",
                "filename",
                "web_search_enabled",
                "message_history",
                "file_uploaded",
                "model",
            ]
        );
    }

    #[test]
    fn booleans_are_encoded_as_lowercase_words() {
        let mut req = request();
        req.web_search_enabled = true;
        req.file_uploaded = false;
        let fields = req.form_fields().expect("serializes");
        assert_eq!(fields[2], ("web_search_enabled", "true".to_string()));
        assert_eq!(fields[4], ("file_uploaded", "false".to_string()));
    }

    #[test]
    fn message_history_is_a_json_array_of_role_text_objects() {
        let fields = request().form_fields().expect("serializes");
        assert_eq!(
            fields[3].1,
            r#"[{"role":"user","text":"Hello"},{"role":"bot","text":"Hi there"}]"#
        );
    }

    #[test]
    fn empty_history_and_missing_document_serialize_cleanly() {
        let req = GenerateRequest {
            prompt: "hi".to_string(),
            filename: String::new(),
            web_search_enabled: false,
            message_history: Vec::new(),
            file_uploaded: false,
            model: "llama2".to_string(),
        };
        let fields = req.form_fields().expect("serializes");
        assert_eq!(fields[1], ("filename", String::new()));
        assert_eq!(fields[3], ("message_history", "[]".to_string()));
        assert_eq!(fields[4], ("file_uploaded", "false".to_string()));
    }

    #[test]
    fn describe_failure_unwraps_backend_detail() {
        let message = describe_failure(500, r#"{"detail": "Error generating response: boom"}"#);
        assert_eq!(message, "Error generating response: boom");
    }

    #[test]
    fn describe_failure_falls_back_to_status_and_body() {
        assert_eq!(describe_failure(502, ""), "HTTP 502");
        assert_eq!(describe_failure(502, "  \n"), "HTTP 502");
        assert_eq!(
            describe_failure(404, "not found"),
            "HTTP 404: not found"
        );
        // A detail that is not a string is reported verbatim rather than lost.
        assert_eq!(
            describe_failure(422, r#"{"detail": [{"loc": ["files"]}]}"#),
            r#"HTTP 422: {"detail": [{"loc": ["files"]}]}"#
        );
    }

    #[test]
    fn model_list_parses_from_backend_shape() {
        let list: ModelList =
            serde_json::from_str(r#"{"models": ["llama2", "mistral"]}"#).expect("parses");
        assert_eq!(list.models, vec!["llama2", "mistral"]);

        let empty: ModelList = serde_json::from_str(r#"{"models": []}"#).expect("parses");
        assert!(empty.models.is_empty());
    }

    #[test]
    fn processed_files_parse_ignores_the_status_message() {
        let processed: ProcessedFiles = serde_json::from_str(
            r#"{"message": "Files processed successfully", "filenames": ["a.pdf", "b.pptx"]}"#,
        )
        .expect("parses");
        assert_eq!(processed.filenames, vec!["a.pdf", "b.pptx"]);
    }

    #[test]
    fn generate_reply_parses_the_response_field() {
        let reply: GenerateReply =
            serde_json::from_str(r#"{"response": "**bold** answer"}"#).expect("parses");
        assert_eq!(reply.response, "**bold** answer");
    }
}
