//! Host page integration (wasm only): the canvas mount, the VR button, the
//! loading overlay and the optional compatibility script.

use futures::channel::oneshot;
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use web_sys::{Document, Element, HtmlElement};
use winit::{platform::web::WindowExtWebSys, window::Window};

use crate::resources::AssetError;

const OVERLAY_STYLE: &str = "position:absolute;top:50%;left:50%;transform:translate(-50%,-50%);\
color:#fff;font-family:sans-serif;pointer-events:none;";
const BUTTON_STYLE: &str = "position:absolute;bottom:20px;left:50%;transform:translateX(-50%);\
padding:12px 6px;border:1px solid #fff;border-radius:4px;background:rgba(0,0,0,0.1);\
color:#fff;font:normal 13px sans-serif;";

fn document() -> anyhow::Result<Document> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| anyhow::anyhow!("no document to mount into"))
}

fn js_error(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}

/// Whether the browser exposes `navigator.xr`.
pub fn xr_supported() -> bool {
    web_sys::window()
        .map(|window| window.navigator())
        .and_then(|navigator| js_sys::Reflect::has(&navigator, &JsValue::from_str("xr")).ok())
        .unwrap_or(false)
}

/// The DOM elements the landscape adds to the page.
#[derive(Debug)]
pub struct WebMount {
    canvas: Option<Element>,
    button: Option<Element>,
    overlay: Option<HtmlElement>,
}

impl WebMount {
    /// Move the window's canvas into the mount node and add the button and overlay.
    pub fn attach(window: &Window, mount_id: &str) -> anyhow::Result<Self> {
        let document = document()?;
        let parent: Element = match document.get_element_by_id(mount_id) {
            Some(node) => node,
            None => {
                log::warn!("No element with id {}, mounting into <body>", mount_id);
                document
                    .body()
                    .map(Into::into)
                    .ok_or_else(|| anyhow::anyhow!("document has no body"))?
            }
        };

        let canvas: Option<Element> = window.canvas().map(Into::into);
        if let Some(canvas) = &canvas {
            parent.append_child(canvas).map_err(js_error)?;
        }

        let button = document.create_element("button").map_err(js_error)?;
        button.set_text_content(Some(if xr_supported() {
            "ENTER VR"
        } else {
            "VR NOT SUPPORTED"
        }));
        button.set_attribute("style", BUTTON_STYLE).map_err(js_error)?;
        parent.append_child(&button).map_err(js_error)?;

        let overlay: HtmlElement = document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| anyhow::anyhow!("div is not an HtmlElement"))?;
        overlay.set_attribute("style", OVERLAY_STYLE).map_err(js_error)?;
        parent.append_child(&overlay).map_err(js_error)?;

        Ok(Self {
            canvas,
            button: Some(button),
            overlay: Some(overlay),
        })
    }

    /// Show `text` in the overlay, or hide it with `None`.
    pub fn set_overlay(&self, text: Option<&str>) {
        if let Some(overlay) = &self.overlay {
            overlay.set_text_content(text);
            let display = if text.is_some() { "block" } else { "none" };
            if let Err(e) = overlay.style().set_property("display", display) {
                log::warn!("Cannot update the loading overlay: {:?}", e);
            }
        }
    }

    /// Remove every element this mount added. Safe to call more than once.
    pub fn detach(&mut self) {
        for element in [self.canvas.take(), self.button.take()].into_iter().flatten() {
            element.remove();
        }
        if let Some(overlay) = self.overlay.take() {
            overlay.remove();
        }
    }
}

/// Append a `<script>` to the document and wait for it to load or fail.
pub async fn inject_script(url: &str) -> Result<(), AssetError> {
    let failed = || AssetError::Script(url.to_string());
    let document = document().map_err(|_| failed())?;
    let script: web_sys::HtmlScriptElement = document
        .create_element("script")
        .ok()
        .and_then(|element| element.dyn_into().ok())
        .ok_or_else(failed)?;
    script.set_src(url);
    script.set_async(true);

    let (sender, receiver) = oneshot::channel::<bool>();
    let sender = std::rc::Rc::new(std::cell::RefCell::new(Some(sender)));
    let on_load = {
        let sender = sender.clone();
        Closure::once(move || {
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(true);
            }
        })
    };
    let on_error = Closure::once(move || {
        if let Some(sender) = sender.borrow_mut().take() {
            let _ = sender.send(false);
        }
    });
    script.set_onload(Some(on_load.as_ref().unchecked_ref()));
    script.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    let head: Element = match document.head() {
        Some(head) => head.into(),
        None => document.body().map(Into::into).ok_or_else(failed)?,
    };
    head.append_child(&script).map_err(|_| failed())?;

    // the closures must stay alive until one of them has fired
    let loaded = receiver.await.unwrap_or(false);
    script.set_onload(None);
    script.set_onerror(None);
    drop((on_load, on_error));

    if loaded {
        log::info!("Loaded script {}", url);
        Ok(())
    } else {
        Err(failed())
    }
}
