//! Card and atom hosts.
//!
//! Cards and atoms are opaque embeds: the post model stores only a name
//! and a payload, and a host registered under that name produces the DOM
//! contents. The render pass wraps whatever a host returns, so hosts
//! never touch the render tree or the element index.

use std::collections::HashMap;
use std::fmt;

use inkpad_dom::{DomDocument, DomError, DomNodeId};
use serde_json::Value;
use tracing::warn;

/// Renders a named card's contents. The returned node is appended to the
/// card's wrapper element, which the render tree owns.
pub trait CardHost {
    fn render(&self, dom: &mut DomDocument, payload: &Value) -> Result<DomNodeId, DomError>;
}

/// Renders a named atom's contents from its display text and payload.
pub trait AtomHost {
    fn render(
        &self,
        dom: &mut DomDocument,
        text: &str,
        payload: &Value,
    ) -> Result<DomNodeId, DomError>;
}

/// Per-editor registry of card and atom hosts, looked up by name.
///
/// Unknown names render a placeholder instead of failing: a document can
/// always be displayed, even when an embed's host is not installed.
#[derive(Default)]
pub struct HostRegistry {
    cards: HashMap<String, Box<dyn CardHost>>,
    atoms: HashMap<String, Box<dyn AtomHost>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_card(&mut self, name: impl Into<String>, host: impl CardHost + 'static) {
        self.cards.insert(name.into(), Box::new(host));
    }

    pub fn register_atom(&mut self, name: impl Into<String>, host: impl AtomHost + 'static) {
        self.atoms.insert(name.into(), Box::new(host));
    }

    pub fn has_card(&self, name: &str) -> bool {
        self.cards.contains_key(name)
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atoms.contains_key(name)
    }

    pub fn render_card(
        &self,
        dom: &mut DomDocument,
        name: &str,
        payload: &Value,
    ) -> Result<DomNodeId, DomError> {
        match self.cards.get(name) {
            Some(host) => host.render(dom, payload),
            None => {
                warn!(card = name, "no card host registered, rendering placeholder");
                let el = dom.create_element("div");
                dom.set_attribute(el, "data-missing-card", name)?;
                Ok(el)
            }
        }
    }

    pub fn render_atom(
        &self,
        dom: &mut DomDocument,
        name: &str,
        text: &str,
        payload: &Value,
    ) -> Result<DomNodeId, DomError> {
        match self.atoms.get(name) {
            Some(host) => host.render(dom, text, payload),
            None => {
                warn!(atom = name, "no atom host registered, rendering placeholder");
                let el = dom.create_element("span");
                dom.set_attribute(el, "data-missing-atom", name)?;
                let content = dom.create_text(text);
                dom.append_child(el, content)?;
                Ok(el)
            }
        }
    }
}

impl fmt::Debug for HostRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRegistry")
            .field("cards", &self.cards.keys().collect::<Vec<_>>())
            .field("atoms", &self.atoms.keys().collect::<Vec<_>>())
            .finish()
    }
}
