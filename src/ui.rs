//! DOM feedback: message banner, lock button, score readout, taunt overlay
//!
//! Elements are looked up by id on every update; a missing element is simply
//! skipped so the game still runs on a bare page.

use web_sys::{Document, Element, HtmlElement};
use wasm_bindgen::JsCast;

use crate::sim::GameEvent;

pub const MESSAGE_ID: &str = "message";
pub const LOCK_BUTTON_ID: &str = "basket-lock";
const SCORE_ID: &str = "score";
const TAUNT_ID: &str = "taunt";
const UNSUPPORTED_ID: &str = "unsupported";

pub struct Ui {
    document: Document,
}

impl Ui {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_display(element: &Element, display: &str) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property("display", display);
        }
    }

    /// Route one session event to the DOM
    pub fn apply(&self, event: &GameEvent) {
        match event {
            GameEvent::ShowMessage { text, .. } => self.show_message(text),
            GameEvent::HideMessage => self.hide_message(),
            GameEvent::LockChanged(locked) => self.set_locked(*locked),
            GameEvent::ScoreChanged { total, .. } => self.set_score(*total),
            GameEvent::TauntStarted(stage) => self.set_taunt_level(*stage),
            GameEvent::TauntEnded => self.set_taunt_level(0),
            GameEvent::PlaySound(_) | GameEvent::Missed { .. } => {}
        }
    }

    pub fn show_message(&self, text: &str) {
        if let Some(el) = self.element(MESSAGE_ID) {
            el.set_inner_html(text);
            Self::set_display(&el, "block");
        }
    }

    pub fn hide_message(&self) {
        if let Some(el) = self.element(MESSAGE_ID) {
            el.set_inner_html("");
            Self::set_display(&el, "none");
        }
    }

    /// Swap the lock button's icon and label from its data attributes
    pub fn set_locked(&self, locked: bool) {
        let Some(button) = self.element(LOCK_BUTTON_ID) else {
            return;
        };
        let attribute = if locked { "data-inactive" } else { "data-active" };
        for selector in [".button i", ".button--label"] {
            if let Some(el) = button.query_selector(selector).ok().flatten() {
                if let Some(value) = el.get_attribute(attribute) {
                    el.set_inner_html(&value);
                }
            }
        }
    }

    pub fn set_score(&self, total: u32) {
        if let Some(el) = self.element(SCORE_ID) {
            el.set_text_content(Some(&total.to_string()));
        }
    }

    /// 0 clears the overlay
    pub fn set_taunt_level(&self, stage: u32) {
        if let Some(el) = self.element(TAUNT_ID) {
            let _ = el.set_attribute("data-level", &stage.to_string());
            Self::set_display(&el, if stage > 0 { "block" } else { "none" });
        }
    }

    /// Terminal notice when the device cannot do AR
    pub fn show_unsupported(&self, text: &str) {
        match self.element(UNSUPPORTED_ID) {
            Some(el) => {
                el.set_text_content(Some(text));
                Self::set_display(&el, "block");
            }
            None => self.show_message(text),
        }
    }
}
