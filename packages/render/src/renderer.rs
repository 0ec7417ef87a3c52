//! The render pass: reconcile dirty render nodes with the post model.
//!
//! The pass walks top-down from the root. A clean node's subtree is
//! skipped outright, which is valid because dirtiness propagates to the
//! root at marking time. For each dirty node the pass regenerates or
//! patches its DOM per post kind, syncs its child render list against the
//! post node's children (evicting removed children, creating render nodes
//! for unseen post children), normalizes DOM order, and finally cleans
//! the node.
//!
//! A pass runs to completion before the next edit is processed; there is
//! no cancellation, and an error mid-pass leaves the tree partially
//! cleaned.

use inkpad_common::ListStore;
use inkpad_dom::{DomDocument, DomNodeId};
use inkpad_post::{Markup, Post, PostKind, PostNodeId};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::hosts::HostRegistry;
use crate::node::{RenderNodeId, RenderSlots};
use crate::tree::{RenderError, RenderTree};

/// Content of the cursor placeholder text nodes around an atom (a
/// zero-width non-joiner, so the caret has somewhere to land without
/// visible output).
pub const CURSOR_TEXT: &str = "\u{200c}";

/// Counters for one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Dirty nodes whose DOM was regenerated or patched.
    pub rendered: usize,
    /// Render nodes created for post nodes seen for the first time.
    pub created: usize,
    /// Child subtrees evicted (scheduled removals and vanished post nodes).
    pub evicted: usize,
}

/// Drives reconciliation for one (tree, dom, post) triple.
pub struct Renderer<'h> {
    hosts: &'h HostRegistry,
}

impl<'h> Renderer<'h> {
    pub fn new(hosts: &'h HostRegistry) -> Self {
        Self { hosts }
    }

    /// Run one reconciliation pass over the dirty subtree.
    #[instrument(skip_all)]
    pub fn render(
        &self,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
        post: &Post,
    ) -> Result<RenderStats, RenderError> {
        let mut stats = RenderStats::default();
        self.render_node(tree.root(), tree, dom, post, &mut stats)?;
        info!(
            rendered = stats.rendered,
            created = stats.created,
            evicted = stats.evicted,
            "render pass complete"
        );
        Ok(stats)
    }

    fn render_node(
        &self,
        id: RenderNodeId,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
        post: &Post,
        stats: &mut RenderStats,
    ) -> Result<(), RenderError> {
        // A clean node cannot have a dirty descendant.
        if !tree.is_dirty(id) {
            return Ok(());
        }
        let uid = tree.post_uid(id).ok_or(RenderError::MissingPostNode)?;
        let post_node = post.resolve(uid).ok_or(RenderError::MissingPostNode)?;
        debug!(post = %uid, kind = post.kind(post_node).name(), "rendering dirty node");

        match post.kind(post_node) {
            PostKind::Root => {
                self.render_children(id, post_node, tree, dom, post, stats)?;
            }
            PostKind::MarkupSection { tag } => {
                self.render_section(id, tag, tree, dom)?;
                self.render_children(id, post_node, tree, dom, post, stats)?;
            }
            PostKind::Marker { text, markups } => {
                self.render_marker(id, text, markups, tree, dom)?;
            }
            PostKind::Card { name, payload } => {
                self.render_card(id, name, payload, tree, dom)?;
            }
            PostKind::Atom {
                name,
                text,
                payload,
            } => {
                self.render_atom(id, name, text, payload, tree, dom)?;
            }
        }

        tree.mark_clean(id);
        stats.rendered += 1;
        Ok(())
    }

    /// Sync `id`'s child render list against its post node's children,
    /// render each child, and normalize DOM order.
    fn render_children(
        &self,
        id: RenderNodeId,
        post_node: PostNodeId,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
        post: &Post,
        stats: &mut RenderStats,
    ) -> Result<(), RenderError> {
        // Evict children scheduled for removal or whose post node is gone.
        let children: Vec<RenderNodeId> = tree.children(id).collect();
        for child in children {
            let gone = tree.is_removed(child)
                || match tree.post_uid(child).and_then(|uid| post.resolve(uid)) {
                    Some(pid) => post.parent(pid) != Some(post_node),
                    None => true,
                };
            if gone {
                self.evict(id, child, tree, dom, stats)?;
            }
        }

        // The survivors form an ordered subsequence of the post child
        // list; walk both with a cursor, creating render nodes (born
        // dirty) for unseen post children.
        let post_children: Vec<PostNodeId> = post.children(post_node).collect();
        let mut cursor = tree.first_child(id);
        for post_child in post_children {
            let uid = post.uid(post_child);
            if let Some(existing) = cursor {
                if tree.post_uid(existing) == Some(uid) {
                    cursor = tree.next_sibling(existing);
                    continue;
                }
            }
            let node = tree.create_node(uid, slots_for(post.kind(post_child)));
            tree.list_insert_before(id, node, cursor)?;
            debug!(post = %uid, "created render node");
            stats.created += 1;
        }

        // Render each child, then re-append its attached DOM so the
        // parent's child order matches list order.
        let parent_el = tree.element(id).ok_or(RenderError::NotRendered)?;
        let ordered: Vec<RenderNodeId> = tree.children(id).collect();
        for child in ordered {
            self.render_node(child, tree, dom, post, stats)?;
            if let Some(dom_child) = attached_dom(tree, child) {
                dom.append_child(parent_el, dom_child)?;
            }
        }
        Ok(())
    }

    /// Remove a child's DOM subtree, then splice it out of the child
    /// list; the list's free hook destroys the node and its descendants.
    fn evict(
        &self,
        parent: RenderNodeId,
        child: RenderNodeId,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
        stats: &mut RenderStats,
    ) -> Result<(), RenderError> {
        if let Some(dom_node) = attached_dom(tree, child) {
            if dom.node(dom_node).is_some() {
                dom.remove_subtree(dom_node);
            }
        }
        debug!(post = ?tree.post_uid(child), "evicting render node");
        tree.list_remove(parent, child)?;
        stats.evicted += 1;
        Ok(())
    }

    fn render_section(
        &self,
        id: RenderNodeId,
        tag: &str,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
    ) -> Result<(), RenderError> {
        match tree.element(id) {
            Some(el) if dom.node(el).is_none() => {
                // Torn out of the DOM behind our back; drop the stale
                // binding and render fresh.
                warn!(element = ?el, "section element vanished externally, re-rendering");
                let fresh = dom.create_element(tag);
                tree.set_element(id, Some(fresh));
            }
            Some(el) if dom.tag(el) == Some(tag) => {}
            Some(el) => {
                // Tag changed: replace the element in place, keeping the
                // rendered children.
                let replacement = dom.create_element(tag);
                while let Some(child) = dom.first_child(el) {
                    dom.append_child(replacement, child)?;
                }
                dom.remove_subtree(el);
                tree.set_element(id, Some(replacement));
            }
            None => {
                let el = dom.create_element(tag);
                tree.set_element(id, Some(el));
            }
        }
        Ok(())
    }

    fn render_marker(
        &self,
        id: RenderNodeId,
        text: &str,
        markups: &[Markup],
        tree: &mut RenderTree,
        dom: &mut DomDocument,
    ) -> Result<(), RenderError> {
        let old_wrapper = match tree.slots(id) {
            RenderSlots::Marker { markup_element } => *markup_element,
            _ => None,
        };

        let text_node = match tree.element(id) {
            Some(el) if dom.node(el).is_some() => {
                dom.set_text(el, text)?;
                el
            }
            _ => {
                let el = dom.create_text(text);
                tree.set_element(id, Some(el));
                el
            }
        };

        // Rebuild the wrapper chain from scratch; the text node is pulled
        // out first so it survives the teardown.
        if let Some(wrapper) = old_wrapper {
            if dom.node(wrapper).is_some() {
                dom.detach(text_node);
                dom.remove_subtree(wrapper);
            }
        }
        let mut outermost = None;
        let mut current = text_node;
        for markup in markups.iter().rev() {
            let el = dom.create_element(&markup.tag);
            for (name, value) in &markup.attributes {
                dom.set_attribute(el, name, value)?;
            }
            dom.append_child(el, current)?;
            current = el;
            outermost = Some(el);
        }
        tree.set_slots(
            id,
            RenderSlots::Marker {
                markup_element: outermost,
            },
        );
        Ok(())
    }

    fn render_card(
        &self,
        id: RenderNodeId,
        name: &str,
        payload: &Value,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
    ) -> Result<(), RenderError> {
        if let Some(el) = tree.element(id) {
            if dom.node(el).is_some() {
                // Cards manage their own DOM; nothing to patch.
                return Ok(());
            }
            warn!(card = name, "card element vanished externally, re-rendering");
        }
        let wrapper = dom.create_element("div");
        dom.set_attribute(wrapper, "data-card", name)?;
        let card_element = self.hosts.render_card(dom, name, payload)?;
        dom.append_child(wrapper, card_element)?;
        tree.set_element(id, Some(wrapper));
        tree.set_slots(
            id,
            RenderSlots::Card {
                card_element: Some(card_element),
            },
        );
        Ok(())
    }

    fn render_atom(
        &self,
        id: RenderNodeId,
        name: &str,
        text: &str,
        payload: &Value,
        tree: &mut RenderTree,
        dom: &mut DomDocument,
    ) -> Result<(), RenderError> {
        if let Some(el) = tree.element(id) {
            if dom.node(el).is_some() {
                dom.remove_subtree(el);
            }
        }
        let wrapper = dom.create_element("span");
        dom.set_attribute(wrapper, "data-atom", name)?;
        let head_text = dom.create_text(CURSOR_TEXT);
        let atom_element = self.hosts.render_atom(dom, name, text, payload)?;
        let tail_text = dom.create_text(CURSOR_TEXT);
        dom.append_child(wrapper, head_text)?;
        dom.append_child(wrapper, atom_element)?;
        dom.append_child(wrapper, tail_text)?;
        tree.set_element(id, Some(wrapper));
        tree.set_slots(
            id,
            RenderSlots::Atom {
                head_text: Some(head_text),
                tail_text: Some(tail_text),
                atom_element: Some(atom_element),
            },
        );
        Ok(())
    }
}

fn slots_for(kind: &PostKind) -> RenderSlots {
    match kind {
        PostKind::Root | PostKind::MarkupSection { .. } => RenderSlots::Section,
        PostKind::Marker { .. } => RenderSlots::Marker {
            markup_element: None,
        },
        PostKind::Atom { .. } => RenderSlots::Atom {
            head_text: None,
            tail_text: None,
            atom_element: None,
        },
        PostKind::Card { .. } => RenderSlots::Card { card_element: None },
    }
}

/// The DOM node a child contributes to its parent element: the outermost
/// markup wrapper for wrapped markers, the node's element otherwise.
fn attached_dom(tree: &RenderTree, id: RenderNodeId) -> Option<DomNodeId> {
    match tree.slots(id) {
        RenderSlots::Marker {
            markup_element: Some(wrapper),
        } => Some(*wrapper),
        _ => tree.element(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpad_dom::DomError;
    use inkpad_post::anchor;
    use serde_json::json;

    struct DividerCard;

    impl crate::hosts::CardHost for DividerCard {
        fn render(&self, dom: &mut DomDocument, _payload: &Value) -> Result<DomNodeId, DomError> {
            Ok(dom.create_element("hr"))
        }
    }

    struct MentionAtom;

    impl crate::hosts::AtomHost for MentionAtom {
        fn render(
            &self,
            dom: &mut DomDocument,
            text: &str,
            _payload: &Value,
        ) -> Result<DomNodeId, DomError> {
            let el = dom.create_element("b");
            let content = dom.create_text(text);
            dom.append_child(el, content)?;
            Ok(el)
        }
    }

    fn setup(post: &Post) -> (RenderTree, DomDocument) {
        let dom = DomDocument::new();
        let tree = RenderTree::new(post.uid(post.root()), dom.root());
        (tree, dom)
    }

    fn render(
        tree: &mut RenderTree,
        dom: &mut DomDocument,
        post: &Post,
        hosts: &HostRegistry,
    ) -> RenderStats {
        Renderer::new(hosts).render(tree, dom, post).unwrap()
    }

    #[test]
    fn test_initial_render_builds_dom() {
        let mut post = Post::new();
        let heading = post.create_markup_section("h1");
        post.append_child(post.root(), heading).unwrap();
        let title = post.create_marker("Title", vec![]);
        post.append_child(heading, title).unwrap();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let body = post.create_marker("Body", vec![]);
        post.append_child(para, body).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        let stats = render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<h1>Title</h1><p>Body</p>");
        // Root, two sections, two markers.
        assert_eq!(stats.rendered, 5);
        assert_eq!(stats.created, 4);
    }

    #[test]
    fn test_marker_markups_nest_outermost_first() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let marker = post.create_marker(
            "link",
            vec![anchor("https://example.com"), Markup::new("strong")],
        );
        post.append_child(para, marker).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(
            dom.inner_string(dom.root()),
            "<p><a href=\"https://example.com\"><strong>link</strong></a></p>"
        );
    }

    #[test]
    fn test_clean_pass_is_noop() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let before = dom.inner_string(dom.root());

        let stats = render(&mut tree, &mut dom, &post, &hosts);
        assert_eq!(stats, RenderStats::default());
        assert_eq!(dom.inner_string(dom.root()), before);
    }

    #[test]
    fn test_marker_text_update_patches_in_place() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let marker = post.create_marker("before", vec![]);
        post.append_child(para, marker).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let marker_node = tree.node_for_post(post.uid(marker)).unwrap();
        let text_el = tree.element(marker_node).unwrap();

        post.set_marker_text(marker, "after").unwrap();
        tree.mark_dirty(marker_node);
        let stats = render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<p>after</p>");
        // Marker, its section, the root; nothing new created.
        assert_eq!(stats.rendered, 3);
        assert_eq!(stats.created, 0);
        // The text node was patched, not replaced.
        assert_eq!(tree.element(marker_node), Some(text_el));
    }

    #[test]
    fn test_section_tag_change_replaces_element_keeps_children() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let marker = post.create_marker("text", vec![]);
        post.append_child(para, marker).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let section_node = tree.node_for_post(post.uid(para)).unwrap();
        let old_el = tree.element(section_node).unwrap();
        let marker_node = tree.node_for_post(post.uid(marker)).unwrap();
        let text_el = tree.element(marker_node).unwrap();

        post.set_section_tag(para, "h2").unwrap();
        tree.mark_dirty(section_node);
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<h2>text</h2>");
        let new_el = tree.element(section_node).unwrap();
        assert_ne!(new_el, old_el);
        assert_eq!(tree.node_for_dom(old_el), None);
        assert_eq!(tree.node_for_dom(new_el), Some(section_node));
        // The marker's text node moved into the replacement untouched.
        assert_eq!(tree.element(marker_node), Some(text_el));
    }

    #[test]
    fn test_scheduled_removal_evicts_dom_and_nodes() {
        let mut post = Post::new();
        let first = post.create_markup_section("p");
        let second = post.create_markup_section("p");
        post.append_child(post.root(), first).unwrap();
        post.append_child(post.root(), second).unwrap();
        let keep = post.create_marker("keep", vec![]);
        let drop = post.create_marker("drop", vec![]);
        post.append_child(first, keep).unwrap();
        post.append_child(second, drop).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let second_node = tree.node_for_post(post.uid(second)).unwrap();
        let second_el = tree.element(second_node).unwrap();
        let drop_uid = post.uid(drop);

        post.remove(second).unwrap();
        tree.schedule_removal(second_node);
        let stats = render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<p>keep</p>");
        assert_eq!(stats.evicted, 1);
        assert_eq!(tree.node(second_node), None);
        assert_eq!(tree.node_for_dom(second_el), None);
        // The marker inside went down with its section.
        assert_eq!(tree.node_for_post(drop_uid), None);
    }

    #[test]
    fn test_vanished_post_child_is_evicted_without_scheduling() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let marker = post.create_marker("bye", vec![]);
        post.append_child(para, marker).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let section_node = tree.node_for_post(post.uid(para)).unwrap();

        post.remove(marker).unwrap();
        tree.mark_dirty(section_node);
        let stats = render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<p></p>");
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn test_insertion_between_existing_sections() {
        let mut post = Post::new();
        let first = post.create_markup_section("p");
        let last = post.create_markup_section("p");
        post.append_child(post.root(), first).unwrap();
        post.append_child(post.root(), last).unwrap();
        let a = post.create_marker("a", vec![]);
        let c = post.create_marker("c", vec![]);
        post.append_child(first, a).unwrap();
        post.append_child(last, c).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);

        let middle = post.create_markup_section("h3");
        post.insert_child_before(post.root(), middle, Some(last))
            .unwrap();
        let b = post.create_marker("b", vec![]);
        post.append_child(middle, b).unwrap();
        tree.mark_dirty(tree.root());
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(
            dom.inner_string(dom.root()),
            "<p>a</p><h3>b</h3><p>c</p>"
        );
    }

    #[test]
    fn test_card_rendered_by_host_once() {
        let mut post = Post::new();
        let card = post.create_card("divider", json!({}));
        post.append_child(post.root(), card).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let mut hosts = HostRegistry::new();
        hosts.register_card("divider", DividerCard);
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(
            dom.inner_string(dom.root()),
            "<div data-card=\"divider\"><hr></hr></div>"
        );

        // A second pass over the dirty card leaves its DOM alone.
        let card_node = tree.node_for_post(post.uid(card)).unwrap();
        let wrapper = tree.element(card_node).unwrap();
        tree.mark_dirty(card_node);
        render(&mut tree, &mut dom, &post, &hosts);
        assert_eq!(tree.element(card_node), Some(wrapper));
    }

    #[test]
    fn test_unknown_card_renders_placeholder() {
        let mut post = Post::new();
        let card = post.create_card("gallery", json!({ "ids": [1, 2] }));
        post.append_child(post.root(), card).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(
            dom.inner_string(dom.root()),
            "<div data-card=\"gallery\"><div data-missing-card=\"gallery\"></div></div>"
        );
    }

    #[test]
    fn test_atom_wrapped_in_cursor_texts() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let atom = post.create_atom("mention", "@sam", json!({ "user": 42 }));
        post.append_child(para, atom).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let mut hosts = HostRegistry::new();
        hosts.register_atom("mention", MentionAtom);
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(
            dom.inner_string(dom.root()),
            format!(
                "<p><span data-atom=\"mention\">{c}<b>@sam</b>{c}</span></p>",
                c = CURSOR_TEXT
            )
        );

        let atom_node = tree.node_for_post(post.uid(atom)).unwrap();
        match tree.slots(atom_node) {
            RenderSlots::Atom {
                head_text,
                tail_text,
                atom_element,
            } => {
                assert_eq!(dom.text(head_text.unwrap()), Some(CURSOR_TEXT));
                assert_eq!(dom.text(tail_text.unwrap()), Some(CURSOR_TEXT));
                assert_eq!(dom.tag(atom_element.unwrap()), Some("b"));
            }
            other => panic!("unexpected slots: {:?}", other),
        }
    }

    #[test]
    fn test_atom_text_update_rebuilds_wrapper() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let atom = post.create_atom("mention", "@sam", json!({}));
        post.append_child(para, atom).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        let atom_node = tree.node_for_post(post.uid(atom)).unwrap();
        let old_wrapper = tree.element(atom_node).unwrap();

        post.set_atom_text(atom, "@pat").unwrap();
        tree.mark_dirty(atom_node);
        render(&mut tree, &mut dom, &post, &hosts);

        let new_wrapper = tree.element(atom_node).unwrap();
        assert_ne!(new_wrapper, old_wrapper);
        assert_eq!(tree.node_for_dom(old_wrapper), None);
        assert!(dom
            .inner_string(dom.root())
            .contains("@pat"));
    }

    #[test]
    fn test_markup_change_rebuilds_wrappers_keeps_text_node() {
        let mut post = Post::new();
        let para = post.create_markup_section("p");
        post.append_child(post.root(), para).unwrap();
        let marker = post.create_marker("hot", vec![Markup::new("em")]);
        post.append_child(para, marker).unwrap();

        let (mut tree, mut dom) = setup(&post);
        let hosts = HostRegistry::new();
        render(&mut tree, &mut dom, &post, &hosts);
        assert_eq!(dom.inner_string(dom.root()), "<p><em>hot</em></p>");
        let marker_node = tree.node_for_post(post.uid(marker)).unwrap();
        let text_el = tree.element(marker_node).unwrap();

        post.set_marker_markups(marker, vec![]).unwrap();
        tree.mark_dirty(marker_node);
        render(&mut tree, &mut dom, &post, &hosts);

        assert_eq!(dom.inner_string(dom.root()), "<p>hot</p>");
        assert_eq!(tree.element(marker_node), Some(text_el));
    }
}
