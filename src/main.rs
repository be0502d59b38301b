mod api;
mod chat;
mod dom_utils;
mod header;
mod session;
mod state;
mod uploader;
mod utils;

use leptos::prelude::*;

use crate::chat::ChatInterface;
use crate::header::Header;
use crate::state::AppState;
use crate::uploader::FileUploader;

fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

#[component]
fn App() -> impl IntoView {
    let state = AppState::new();
    provide_context(state);

    // Fetched once per page load; the session only lives as long as the tab.
    state.load_models();

    let web_search = Memo::new(move |_| state.session.with(|s| s.web_search()));

    view! {
        <Header />
        <label data-role="web-search-toggle">
            <input
                type="checkbox"
                prop:checked=web_search
                on:change:target=move |ev| state.set_web_search(ev.target().checked())
            />
            " Enable Web Search"
        </label>
        <FileUploader />
        <ChatInterface />
    }
}
