use gloo_timers::callback::Timeout;
use leptos::logging::log;
use leptos::prelude::{document, window};
use leptos::task::spawn_local;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlButtonElement, HtmlElement, HtmlPreElement};

use crate::utils::highlight_code_blocks;

pub const COPY_LABEL: &str = "copy";
pub const COPIED_LABEL: &str = "copied";
pub const ERROR_LABEL: &str = "failed";
pub const FEEDBACK_DURATION_MS: u32 = 1500;

/// Sets the inner HTML of a target element, then enhances every `<pre>` block
/// in the new content: a `data-lang` attribute lifted from the highlighter
/// class, a copy button, and a pass through the page's syntax highlighter.
pub fn render_message_html(target_element: &HtmlElement, html_content: &str) {
    target_element.set_inner_html(html_content);

    match target_element.query_selector_all("pre") {
        Ok(pre_elements) => {
            for i in 0..pre_elements.length() {
                let Some(node) = pre_elements.item(i) else {
                    continue;
                };
                let Ok(pre_el) = node.dyn_into::<HtmlPreElement>() else {
                    continue;
                };
                tag_language(&pre_el);
                attach_copy_button(&pre_el);
            }
        }
        Err(e) => {
            log!("[ERROR] [dom_utils] Failed to querySelectorAll for pre elements: {:?}", e);
        }
    }

    highlight_code_blocks(target_element);
}

/// Markdown renders fenced blocks as `<pre><code class="language-x">`; lift
/// the language onto the `<pre>` so CSS can label the block.
fn tag_language(pre_el: &HtmlPreElement) {
    let Ok(Some(code_el)) = pre_el.query_selector("code") else {
        return;
    };
    let class_name = code_el.class_name();
    let Some(lang) = class_name
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
    else {
        return;
    };
    if !lang.is_empty() {
        let _ = pre_el.set_attribute("data-lang", lang);
    }
}

fn attach_copy_button(pre_el: &HtmlPreElement) {
    // Avoid duplicates when the same block is rendered again.
    if pre_el
        .query_selector(".copy-button")
        .ok()
        .flatten()
        .is_some()
    {
        return;
    }

    let Ok(button_el) = document().create_element("button") else {
        log!("[ERROR] [dom_utils] Failed to create copy button element.");
        return;
    };
    let Ok(button_el) = button_el.dyn_into::<HtmlButtonElement>() else {
        return;
    };
    button_el.set_class_name("copy-button");
    button_el.set_text_content(Some(COPY_LABEL));
    let _ = button_el.set_attribute("data-size", "compact");

    let pre_el_clone = pre_el.clone();
    let button_for_handler = button_el.clone();
    let click_handler = Closure::wrap(Box::new(move |_event: web_sys::MouseEvent| {
        let text_to_copy = pre_el_clone
            .query_selector("code")
            .ok()
            .flatten()
            .and_then(|code_node| code_node.text_content())
            .unwrap_or_default();
        if text_to_copy.is_empty() {
            return;
        }

        // The clipboard object is undefined outside secure contexts.
        let Some(clipboard) =
            Some(window().navigator().clipboard()).filter(|c| !c.is_undefined())
        else {
            log!("[ERROR] [dom_utils] Clipboard API not available or not in secure context.");
            show_feedback(&button_for_handler, ERROR_LABEL);
            return;
        };

        let promise = clipboard.write_text(&text_to_copy);
        let button_for_feedback = button_for_handler.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => show_feedback(&button_for_feedback, COPIED_LABEL),
                Err(e) => {
                    log!("[ERROR] [dom_utils] Error copying code block to clipboard: {:?}", e);
                    show_feedback(&button_for_feedback, ERROR_LABEL);
                }
            }
        });
    }) as Box<dyn FnMut(_)>);

    if button_el
        .add_event_listener_with_callback("click", click_handler.as_ref().unchecked_ref())
        .is_ok()
    {
        click_handler.forget(); // Leak the closure to keep it alive
        if pre_el.append_child(&button_el).is_err() {
            log!("[ERROR] [dom_utils] Failed to append copy button to <pre> element.");
        }
    } else {
        log!("[ERROR] [dom_utils] Failed to add click listener to copy button.");
    }
}

fn show_feedback(button_el: &HtmlButtonElement, label: &str) {
    button_el.set_text_content(Some(label));
    let button_el = button_el.clone();
    Timeout::new(FEEDBACK_DURATION_MS, move || {
        button_el.set_text_content(Some(COPY_LABEL));
    })
    .forget();
}
