use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = r#"
export function highlight_code_blocks(root) {
  // The highlighter is loaded from the page, not bundled; skip if missing.
  if (typeof hljs === 'undefined') return;
  root.querySelectorAll('pre code').forEach((block) => {
    hljs.highlightElement(block);
  });
}
"#)]
extern "C" {
    /// Runs the page's syntax highlighter over every fenced code block under
    /// `root`. A no-op when the highlighter script did not load.
    pub fn highlight_code_blocks(root: &web_sys::HtmlElement);
}
