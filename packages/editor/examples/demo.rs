//! Build a small document, edit it, and print the markup after each
//! render pass.
//!
//! ```sh
//! RUST_LOG=inkpad_render=debug cargo run -p inkpad-editor --example demo
//! ```

use inkpad_dom::{DomDocument, DomError, DomNodeId};
use inkpad_editor::{
    CardHost, Editor, EditorError, HostRegistry, InlineSnapshot, Markup, Mutation, SectionSnapshot,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

struct DividerCard;

impl CardHost for DividerCard {
    fn render(&self, dom: &mut DomDocument, _payload: &Value) -> Result<DomNodeId, DomError> {
        Ok(dom.create_element("hr"))
    }
}

fn main() -> Result<(), EditorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut hosts = HostRegistry::new();
    hosts.register_card("divider", DividerCard);
    let mut editor = Editor::with_hosts(hosts);

    editor.apply(Mutation::InsertSection {
        index: 0,
        section: SectionSnapshot::Markup {
            uid: None,
            tag: "h1".into(),
            children: vec![InlineSnapshot::Marker {
                uid: None,
                text: "Hello, inkpad".into(),
                markups: vec![],
            }],
        },
    })?;
    editor.apply(Mutation::InsertSection {
        index: 1,
        section: SectionSnapshot::Markup {
            uid: None,
            tag: "p".into(),
            children: vec![InlineSnapshot::Marker {
                uid: None,
                text: "A structured document, rendered incrementally.".into(),
                markups: vec![],
            }],
        },
    })?;
    editor.apply(Mutation::InsertCard {
        index: 2,
        card: SectionSnapshot::Card {
            uid: None,
            name: "divider".into(),
            payload: json!({}),
        },
    })?;
    editor.rerender()?;
    println!("initial:\n  {}\n", editor.html());

    // Emphasize one word; only the touched subtree re-renders.
    let marker = {
        let post = editor.post();
        let section = post.children(post.root()).nth(1).unwrap();
        post.uid(post.children(section).next().unwrap())
    };
    editor.apply(Mutation::SetMarkerMarkups {
        uid: marker,
        markups: vec![Markup::new("em")],
    })?;
    let stats = editor.rerender()?;
    println!(
        "after emphasis ({} nodes re-rendered):\n  {}\n",
        stats.rendered,
        editor.html()
    );

    editor.undo()?;
    editor.rerender()?;
    println!("after undo:\n  {}", editor.html());

    Ok(())
}
