//! Structural properties checked over a set of fixtures

use scribe_editor::{Command, Editor, EditorBuilder, Position, Selection, SetSelectionOptions};

const FIXTURES: &[&str] = &[
    "<p>ab</p>",
    "<div>plain</div><div><p>nested</p></div>",
    "<div class=\"oe_unremovable\"><p>kept</p></div>",
    "<ul><li>one</li><li><p>two</p></li></ul>",
    "<div data-oe-protected=\"true\"><div>secret</div></div>",
    "<section><div></div></section>",
    "<p class=\"o_image\"></p><h1>title</h1>",
    "<div contenteditable=\"false\"><div>locked</div></div>",
];

fn editors() -> impl Iterator<Item = Editor> {
    FIXTURES
        .iter()
        .map(|fixture| EditorBuilder::new().content(*fixture).build().unwrap())
}

fn all_nodes(editor: &Editor) -> Vec<scribe_editor::NodeId> {
    let root = editor.editable();
    std::iter::once(root)
        .chain(editor.dom().descendants(root))
        .collect()
}

#[test]
fn test_unremovable_implies_unsplittable() {
    for editor in editors() {
        for node in all_nodes(&editor) {
            if editor.is_unremovable(node) {
                assert!(editor.is_unsplittable(node), "{}", editor.content());
            }
        }
    }
}

#[test]
fn test_shallow_rejection_implies_full_rejection() {
    for editor in editors() {
        for node in all_nodes(&editor) {
            if !editor.shallow_is_candidate_for_base_container(node) {
                assert!(!editor.is_candidate_for_base_container(node));
            }
            if editor.is_candidate_for_base_container(node) {
                assert!(editor.is_candidate_allow_unsplittable(node));
            }
        }
    }
}

#[test]
fn test_normalization_is_idempotent() {
    for mut editor in editors() {
        let root = editor.editable();
        let markup = editor.markup_with_selection();
        let version = editor.dom().version();
        editor.normalize(root).unwrap();
        assert_eq!(editor.markup_with_selection(), markup);
        assert_eq!(editor.dom().version(), version);
    }
}

#[test]
fn test_protected_and_nested_divs_are_not_marked() {
    let editor = EditorBuilder::new()
        .content(FIXTURES[4])
        .build()
        .unwrap();
    assert_eq!(
        editor.markup_with_selection(),
        "<div data-oe-protected=\"true\"><div>secret</div></div>"
    );
}

#[test]
fn test_split_then_merge_restores_block() {
    let mut editor = EditorBuilder::new().content("<p>ab[]cd</p>").build().unwrap();
    editor.execute(&Command::SplitBlock).unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>ab</p><p>[]cd</p>");

    let root = editor.editable();
    let first = editor.dom().first_child(root).unwrap();
    let left = editor.dom().last_leaf(first);
    let right = editor.selection().unwrap().anchor;
    editor.set_selection(
        Selection::new(Position::new(left, editor.dom().text_len(left)), right),
        SetSelectionOptions::default(),
    );
    editor.execute(&Command::DeleteSelection).unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>ab[]cd</p>");
}

#[test]
fn test_insert_then_delete_restores_text() {
    let mut editor = EditorBuilder::new().content("<p>a[]b</p>").build().unwrap();
    editor
        .execute(&Command::InsertText {
            text: "XY".to_string(),
        })
        .unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>aXY[]b</p>");

    let text = editor.selection().unwrap().anchor.node;
    editor.set_selection(
        Selection::new(Position::new(text, 1), Position::new(text, 3)),
        SetSelectionOptions::default(),
    );
    editor.execute(&Command::DeleteSelection).unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>a[]b</p>");
}

#[test]
fn test_insert_text_splices_at_every_offset() {
    let original: Vec<char> = "héllo wörld 😀".chars().collect();
    for offset in 0..=original.len() {
        let left: String = original[..offset].iter().collect();
        let right: String = original[offset..].iter().collect();
        let mut editor = EditorBuilder::new()
            .content(format!("<p>{left}[]{right}</p>"))
            .build()
            .unwrap();
        editor
            .execute(&Command::InsertText {
                text: "ñ✓".to_string(),
            })
            .unwrap();

        let p = editor.dom().first_child(editor.editable()).unwrap();
        assert_eq!(editor.dom().child_count(p), 1, "offset {offset}");
        assert_eq!(editor.dom().text_content(p), format!("{left}ñ✓{right}"));
        assert_eq!(
            editor.markup_with_selection(),
            format!("<p>{left}ñ✓[]{right}</p>")
        );
    }
}

#[test]
fn test_undo_restores_every_step() {
    let mut editor = EditorBuilder::new().content("<p>a[]b</p>").build().unwrap();
    let initial = editor.markup_with_selection();
    let commands = [
        Command::SplitBlock,
        Command::InsertText {
            text: "x".to_string(),
        },
        Command::InsertLineBreak,
        Command::InsertMarkup {
            markup: "<h2>t</h2>".to_string(),
        },
    ];
    let mut states = vec![initial];
    for command in &commands {
        editor.execute(command).unwrap();
        states.push(editor.markup_with_selection());
    }
    states.pop();
    while let Some(expected) = states.pop() {
        editor.execute(&Command::Undo).unwrap();
        assert_eq!(editor.markup_with_selection(), expected);
    }
    assert!(!editor.history().can_undo());
}

#[test]
fn test_split_element_keeps_text_content() {
    for markup in ["<p>abc</p>", "<p><b>a</b>b<i>c</i></p>", "<p>é<br>ü</p>"] {
        let editor = EditorBuilder::new().content(markup).build().unwrap();
        let p = editor.dom().first_child(editor.editable()).unwrap();
        let text = editor.dom().text_content(p);
        let count = editor.dom().child_count(p);
        for offset in 0..=count {
            let mut editor = EditorBuilder::new().content(markup).build().unwrap();
            let p = editor.dom().first_child(editor.editable()).unwrap();
            let (before, after) = editor.split_element(p, offset).unwrap();
            let joined = editor.dom().text_content(before) + &editor.dom().text_content(after);
            assert_eq!(joined, text);
            assert_eq!(editor.dom().child_count(before), offset);
        }
    }
}
