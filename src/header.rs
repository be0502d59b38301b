use leptos::prelude::*;

use crate::state::AppState;

#[component]
pub fn Header() -> impl IntoView {
    let state = use_context::<AppState>().expect("AppState context not found");

    view! {
        <header>
            <div>
                <h1>"RAG OLLAMA: Advanced RAG with Ollama + Chromadb"</h1>
                <p data-role="subtitle">
                    "1) Upload a doc (PDF/PPTX/Image). 2) Pick a generation model. 3) Chat with context from vector embeddings."
                </p>
            </div>
            <button
                data-role="secondary"
                style:margin-left="auto"
                on:click=move |_| state.reset_session()
            >
                "Clear Context"
            </button>
        </header>
    }
}
