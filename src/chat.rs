use leptos::{html, prelude::*};

use crate::dom_utils;
use crate::session::Message;
use crate::state::AppState;

#[component]
pub fn ChatInterface() -> impl IntoView {
    let state = use_context::<AppState>().expect("AppState context not found");

    let messages = Memo::new(move |_| state.session.with(|s| s.messages().to_vec()));
    let in_flight = Memo::new(move |_| state.session.with(|s| s.in_flight()));

    let ref_history: NodeRef<html::Custom<&str>> = NodeRef::new();

    let submit = Callback::new(move |text: String| {
        state.send_message(text);
        if let Some(ref_history) = ref_history.get() {
            ref_history.set_scroll_top(ref_history.scroll_height());
        }
    });

    view! {
        <chat-interface>
            <chat-history node_ref=ref_history>
                {move || {
                    messages
                        .get()
                        .into_iter()
                        .map(|message| {
                            view! { <ChatMessage message=message /> }
                        })
                        .collect_view()
                }}
                {move || {
                    in_flight
                        .get()
                        .then(|| {
                            view! {
                                <chat-pending>
                                    <span class="spinner"></span>
                                    "generating"
                                </chat-pending>
                            }
                        })
                }}
                {move || {
                    state
                        .error
                        .get()
                        .map(|error| {
                            view! {
                                <error-box>
                                    <div style="font-weight: bold">"error"</div>
                                    {error}
                                </error-box>
                            }
                        })
                }}
            </chat-history>
            <ChatControls submit=submit in_flight=in_flight />
        </chat-interface>
    }
}

#[component]
fn ChatControls(
    #[prop(into)] submit: Callback<String>,
    #[prop(into)] in_flight: Signal<bool>,
) -> impl IntoView {
    let (input, set_input) = signal(String::new());
    let ref_input: NodeRef<html::Input> = NodeRef::new();

    // Refocus whenever the field is re-enabled after a round-trip.
    Effect::new(move |_| {
        if !in_flight.get() {
            if let Some(ref_input) = ref_input.get() {
                let _ = ref_input.focus();
            }
        }
    });

    view! {
        <chat-controls>
            <form on:submit=move |ev| {
                ev.prevent_default();
                if in_flight.get() {
                    return;
                }
                let text = input.get();
                if text.trim().is_empty() {
                    return;
                }
                set_input.set(String::new());
                submit.run(text);
            }>
                <div style="display:flex; padding-left: 4px; padding-right: 4px; padding-bottom: 4px; gap: 4px;">
                    <input
                        type="text"
                        prop:value=input
                        on:input:target=move |ev| set_input.set(ev.target().value())
                        placeholder="Ask about your document..."
                        node_ref=ref_input
                        disabled=in_flight
                    />
                    <button
                        type="submit"
                        data-role="primary"
                        style="flex-shrink:0"
                        disabled=move || input.with(|i| i.trim().is_empty()) || in_flight.get()
                    >
                        "Send"
                    </button>
                </div>
            </form>
        </chat-controls>
    }
}

#[component]
fn Markdown(#[prop(into)] markdown_text: String) -> impl IntoView {
    let markdown_options = markdown::Options {
        parse: markdown::ParseOptions {
            constructs: markdown::Constructs {
                math_flow: true,
                math_text: true,
                ..markdown::Constructs::gfm()
            },
            ..markdown::ParseOptions::default()
        },
        compile: markdown::CompileOptions {
            allow_dangerous_html: true,
            allow_dangerous_protocol: true,
            ..markdown::CompileOptions::default()
        },
    };

    let content_div_ref = NodeRef::<html::Div>::new();

    Effect::new(move |_| {
        if let Some(div_element) = content_div_ref.get() {
            let html_output = markdown::to_html_with_options(&markdown_text, &markdown_options)
                .unwrap_or_else(|_| markdown_text.clone());

            dom_utils::render_message_html(&div_element, &html_output);
        }
    });

    view! { <div node_ref=content_div_ref></div> }
}

#[component]
fn ChatMessage(message: Message) -> impl IntoView {
    let role = message.role.as_str();
    view! {
        <chat-message data-role=role>
            <chat-message-role>{role}</chat-message-role>
            <chat-message-content>
                <Markdown markdown_text=message.text />
            </chat-message-content>
        </chat-message>
    }
}
