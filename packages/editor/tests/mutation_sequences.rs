//! Mutation sequence tests: post, render tree and DOM stay consistent
//! across chains of edits, undo and redo.

use anyhow::Result;
use inkpad_editor::{Editor, InlineSnapshot, Markup, Mutation, MutationError, SectionSnapshot};
use inkpad_post::PostUid;

fn paragraph(index: usize, text: &str) -> Mutation {
    Mutation::InsertSection {
        index,
        section: SectionSnapshot::Markup {
            uid: None,
            tag: "p".into(),
            children: vec![InlineSnapshot::Marker {
                uid: None,
                text: text.into(),
                markups: vec![],
            }],
        },
    }
}

fn first_section_uid(editor: &Editor) -> PostUid {
    let post = editor.post();
    post.uid(post.children(post.root()).next().unwrap())
}

fn first_marker_uid(editor: &Editor) -> PostUid {
    let post = editor.post();
    let section = post.children(post.root()).next().unwrap();
    post.uid(post.children(section).next().unwrap())
}

#[test]
fn test_insert_sequence_keeps_document_order() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "b"))?;
    editor.apply(paragraph(0, "a"))?;
    editor.apply(paragraph(2, "c"))?;
    editor.rerender()?;

    assert_eq!(editor.html(), "<p>a</p><p>b</p><p>c</p>");
    Ok(())
}

#[test]
fn test_rerender_after_each_edit_matches_rerender_once() -> Result<()> {
    let mut stepwise = Editor::new();
    stepwise.apply(paragraph(0, "one"))?;
    stepwise.rerender()?;
    stepwise.apply(paragraph(1, "two"))?;
    stepwise.rerender()?;
    let marker = first_marker_uid(&stepwise);
    stepwise.apply(Mutation::UpdateMarkerText {
        uid: marker,
        text: "ONE".into(),
    })?;
    stepwise.rerender()?;

    let mut batched = Editor::new();
    batched.apply(paragraph(0, "one"))?;
    batched.apply(paragraph(1, "two"))?;
    let marker = first_marker_uid(&batched);
    batched.apply(Mutation::UpdateMarkerText {
        uid: marker,
        text: "ONE".into(),
    })?;
    batched.rerender()?;

    assert_eq!(stepwise.html(), batched.html());
    assert_eq!(stepwise.html(), "<p>ONE</p><p>two</p>");
    Ok(())
}

#[test]
fn test_undo_walks_back_through_states() -> Result<()> {
    let mut editor = Editor::new();
    let mut states = vec![editor.html()];

    editor.apply(paragraph(0, "first"))?;
    editor.rerender()?;
    states.push(editor.html());

    editor.apply(paragraph(1, "second"))?;
    editor.rerender()?;
    states.push(editor.html());

    let marker = first_marker_uid(&editor);
    editor.apply(Mutation::UpdateMarkerText {
        uid: marker,
        text: "edited".into(),
    })?;
    editor.rerender()?;
    states.push(editor.html());

    // Walk back through every recorded state.
    for expected in states.iter().rev().skip(1) {
        assert!(editor.undo()?);
        editor.rerender()?;
        assert_eq!(&editor.html(), expected);
    }
    assert!(!editor.can_undo());

    // And forward again.
    for expected in states.iter().skip(1) {
        assert!(editor.redo()?);
        editor.rerender()?;
        assert_eq!(&editor.html(), expected);
    }
    assert!(!editor.can_redo());
    Ok(())
}

#[test]
fn test_undo_restores_removed_section_with_uids() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "keep me"))?;
    editor.rerender()?;
    let section = first_section_uid(&editor);
    let marker = first_marker_uid(&editor);

    editor.apply(Mutation::RemoveSection { uid: section })?;
    editor.rerender()?;
    assert_eq!(editor.html(), "");
    assert_eq!(editor.post().resolve(section), None);

    editor.undo()?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>keep me</p>");
    // The restored nodes answer to their old uids.
    assert!(editor.post().resolve(section).is_some());
    assert!(editor.post().resolve(marker).is_some());

    // Later mutations addressing the restored uid still work.
    editor.apply(Mutation::SetSectionTag {
        uid: section,
        tag: "blockquote".into(),
    })?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<blockquote>keep me</blockquote>");
    Ok(())
}

#[test]
fn test_batch_undone_as_one_step() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "title"))?;
    editor.rerender()?;
    let section = first_section_uid(&editor);
    let marker = first_marker_uid(&editor);

    editor.begin_batch();
    editor.set_batch_description("Promote to heading");
    editor.apply(Mutation::SetSectionTag {
        uid: section,
        tag: "h1".into(),
    })?;
    editor.apply(Mutation::SetMarkerMarkups {
        uid: marker,
        markups: vec![Markup::new("strong")],
    })?;
    editor.end_batch();
    editor.rerender()?;
    assert_eq!(editor.html(), "<h1><strong>title</strong></h1>");

    // One undo reverts both mutations.
    editor.undo()?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>title</p>");
    Ok(())
}

#[test]
fn test_new_edit_clears_redo() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "a"))?;
    editor.undo()?;
    assert!(editor.can_redo());

    editor.apply(paragraph(0, "b"))?;
    assert!(!editor.can_redo());
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>b</p>");
    Ok(())
}

#[test]
fn test_remove_and_reinsert_marker_round_trip() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "ab"))?;
    let section = first_section_uid(&editor);
    editor.apply(Mutation::InsertMarker {
        section,
        index: 1,
        marker: InlineSnapshot::Marker {
            uid: None,
            text: "cd".into(),
            markups: vec![],
        },
    })?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>abcd</p>");

    let post = editor.post();
    let section_id = post.resolve(section).unwrap();
    let second = post.uid(post.children(section_id).nth(1).unwrap());

    editor.apply(Mutation::RemoveMarker { uid: second })?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>ab</p>");

    editor.undo()?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>abcd</p>");
    Ok(())
}

#[test]
fn test_failed_mutation_leaves_editor_consistent() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "solid"))?;
    editor.rerender()?;
    let before = editor.html();
    let version = editor.version();

    let err = editor
        .apply(Mutation::InsertMarker {
            section: PostUid(404),
            index: 0,
            marker: InlineSnapshot::Marker {
                uid: None,
                text: "ghost".into(),
                markups: vec![],
            },
        })
        .unwrap_err();
    assert!(matches!(
        err,
        inkpad_editor::EditorError::Mutation(MutationError::NodeNotFound(PostUid(404)))
    ));

    editor.rerender()?;
    assert_eq!(editor.html(), before);
    assert_eq!(editor.version(), version);
    assert!(!editor.can_redo());
    Ok(())
}

#[test]
fn test_interleaved_inserts_and_removals() -> Result<()> {
    let mut editor = Editor::new();
    editor.apply(paragraph(0, "a"))?;
    editor.apply(paragraph(1, "b"))?;
    editor.rerender()?;

    let post = editor.post();
    let b = post.uid(post.children(post.root()).nth(1).unwrap());

    editor.apply(Mutation::RemoveSection { uid: b })?;
    editor.apply(paragraph(1, "c"))?;
    editor.apply(paragraph(1, "d"))?;
    editor.rerender()?;
    assert_eq!(editor.html(), "<p>a</p><p>d</p><p>c</p>");

    // The evicted section's render node left both indexes.
    assert_eq!(editor.tree().node_for_post(b), None);
    Ok(())
}
