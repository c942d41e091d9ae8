//! End-to-end editing scenarios, driven through `Editor::execute`

use scribe_editor::{
    Command, Contribution, EditorBuilder, EditorConfig, EditorError, Plugin, ResourceBuilder,
    ResourceKey,
};

/// Marks `class="unsplittable"` elements as unsplittable
struct UnsplittableClass;

impl Plugin for UnsplittableClass {
    fn id(&self) -> &'static str {
        "unsplittableClass"
    }

    fn resources(&self, resources: &mut ResourceBuilder) {
        resources.add(
            ResourceKey::UnsplittableNodePredicates,
            Contribution::predicate(|editor, node| editor.dom().has_class(node, "unsplittable")),
        );
    }
}

fn run(content: &str, commands: &[Command]) -> String {
    let mut editor = EditorBuilder::new().content(content).build().unwrap();
    for command in commands {
        editor.execute(command).unwrap();
    }
    editor.markup_with_selection()
}

#[test]
fn test_split_plain_div() {
    let mut editor = EditorBuilder::new()
        .content("<div>ab[]cd</div>")
        .build()
        .unwrap();
    editor.execute(&Command::SplitBlock).unwrap();

    assert_eq!(
        editor.markup_with_selection(),
        "<div class=\"o-paragraph\">ab</div><div class=\"o-paragraph\">[]cd</div>"
    );
    assert_eq!(editor.content(), "<div>ab</div><div>cd</div>");
}

#[test]
fn test_split_unsplittable_inserts_line_break() {
    let mut editor = EditorBuilder::new()
        .plugin(UnsplittableClass)
        .content("<div class=\"unsplittable\">[]ab</div>")
        .build()
        .unwrap();
    let root = editor.editable();
    let before = editor.dom().descendants(root).len();

    editor.execute(&Command::SplitBlock).unwrap();

    assert_eq!(
        editor.markup_with_selection(),
        "<div class=\"unsplittable\"><br>[]ab</div>"
    );
    assert_eq!(editor.dom().descendants(root).len(), before + 1);
    assert_eq!(editor.dom().child_count(root), 1);
}

#[test]
fn test_insert_paragraph_into_paragraph() {
    let result = run(
        "<p>a[]b</p>",
        &[Command::InsertMarkup {
            markup: "<p>X</p>".to_string(),
        }],
    );
    assert_eq!(result, "<p>aX[]b</p>");
}

#[test]
fn test_normalize_plain_div_is_fixed_point() {
    let mut editor = EditorBuilder::new()
        .content("<div>plain text</div>")
        .build()
        .unwrap();
    assert_eq!(
        editor.markup_with_selection(),
        "<div class=\"o-paragraph\">plain text</div>"
    );

    let version = editor.dom().version();
    let root = editor.editable();
    editor.normalize(root).unwrap();
    assert_eq!(editor.dom().version(), version);
    assert_eq!(editor.content(), "<div>plain text</div>");
}

#[test]
fn test_split_at_paragraph_end_fills_new_block() {
    assert_eq!(
        run("<p>ab[]</p>", &[Command::SplitBlock]),
        "<p>ab</p><p>[]<br></p>"
    );
}

#[test]
fn test_split_inside_inline_format() {
    assert_eq!(
        run("<p><b>a[]b</b></p>", &[Command::SplitBlock]),
        "<p><b>a</b></p><p><b>[]b</b></p>"
    );
}

#[test]
fn test_split_non_collapsed_deletes_first() {
    assert_eq!(
        run("<p>a[bc]d</p>", &[Command::SplitBlock]),
        "<p>a</p><p>[]d</p>"
    );
}

#[test]
fn test_line_break_in_unsplittable_block_via_split() {
    let mut editor = EditorBuilder::new()
        .plugin(UnsplittableClass)
        .content("<p class=\"unsplittable\">ab[]</p>")
        .build()
        .unwrap();
    editor.execute(&Command::SplitBlock).unwrap();
    assert_eq!(
        editor.markup_with_selection(),
        "<p class=\"unsplittable\">ab<br>[]</p>"
    );
}

#[test]
fn test_insert_heading_splits_paragraph() {
    let result = run(
        "<p>a[]b</p>",
        &[Command::InsertMarkup {
            markup: "<h1>X</h1>".to_string(),
        }],
    );
    assert_eq!(result, "<p>a</p><h1>X[]</h1><p>b</p>");
}

#[test]
fn test_insert_several_paragraphs() {
    let result = run(
        "<p>a[]b</p>",
        &[Command::InsertMarkup {
            markup: "<p>X</p><p>Y</p>".to_string(),
        }],
    );
    assert_eq!(result, "<p>aX</p><p>Y[]b</p>");
}

fn insert_markup(content: &str, markup: &str) -> String {
    run(
        content,
        &[Command::InsertMarkup {
            markup: markup.to_string(),
        }],
    )
}

#[test]
fn test_insert_list_into_unbreakable_paragraph_flattens_it() {
    assert_eq!(
        insert_markup(
            "<p class=\"oe_unbreakable\">a[]b</p>",
            "<ul><li>X</li><li>Y</li></ul>"
        ),
        "<p class=\"oe_unbreakable\">aX<br>Y[]b</p>"
    );
}

#[test]
fn test_insert_unbreakable_block_moves_out_of_unbreakable_paragraph() {
    assert_eq!(
        insert_markup(
            "<p class=\"oe_unbreakable\">a[]b</p>",
            "<div class=\"oe_unbreakable\"><p>U</p></div>"
        ),
        "<p class=\"oe_unbreakable\">ab</p><div class=\"oe_unbreakable\"><p>U[]</p></div>"
    );
}

#[test]
fn test_line_break_after_unbreakable_block_is_kept() {
    assert_eq!(
        insert_markup(
            "<ul><li>ab[]</li></ul>",
            "<div class=\"oe_unbreakable\"><p>U</p></div><br>"
        ),
        "<ul><li>ab<div class=\"oe_unbreakable\"><p>U</p></div><br>[]</li></ul>"
    );
    // the same trailing break after inline content only ends the line
    assert_eq!(
        insert_markup("<ul><li>ab[]</li></ul>", "<b>c</b><br>"),
        "<ul><li>ab<b>c</b>[]</li></ul>"
    );
}

#[test]
fn test_trailing_line_break_at_root_gets_its_own_paragraph() {
    assert_eq!(
        insert_markup("<p>ab[]</p>", "<div class=\"oe_unbreakable\"><p>U</p></div><br>"),
        "<p>ab</p><div class=\"oe_unbreakable\"><p>U</p></div><p><br>[]</p>"
    );
}

#[test]
fn test_insert_block_wraps_inline_siblings_of_edition_boundary() {
    assert_eq!(
        insert_markup("<div contenteditable=\"true\">a[]b</div>", "<h1>X</h1>"),
        "<div contenteditable=\"true\"><p>a</p><h1>X[]</h1><p>b</p></div>"
    );
    assert_eq!(
        insert_markup("a[]b", "<h1>X</h1>"),
        "<p>a</p><h1>X[]</h1><p>b</p>"
    );
}

#[test]
fn test_insert_replaces_selection() {
    let result = run(
        "<p>a[bc]d</p>",
        &[Command::InsertText {
            text: "X".to_string(),
        }],
    );
    assert_eq!(result, "<p>aX[]d</p>");
}

#[test]
fn test_insert_text_with_div_base_container() {
    let config = EditorConfig {
        base_container: "DIV".to_string(),
        ..EditorConfig::default()
    };
    let mut editor = EditorBuilder::new().config(config).content("[]").build().unwrap();
    editor
        .execute(&Command::InsertText {
            text: "X".to_string(),
        })
        .unwrap();
    assert_eq!(
        editor.markup_with_selection(),
        "<div class=\"o-paragraph\">X[]</div>"
    );
    assert_eq!(editor.content(), "<div>X</div>");
}

#[test]
fn test_inline_allowed_at_root() {
    let config = EditorConfig {
        allow_inline_at_root: true,
        ..EditorConfig::default()
    };
    let mut editor = EditorBuilder::new().config(config).content("[]").build().unwrap();
    editor
        .execute(&Command::InsertText {
            text: "X".to_string(),
        })
        .unwrap();
    assert_eq!(editor.markup_with_selection(), "X[]");
}

#[test]
fn test_undo_redo_through_execute() {
    let mut editor = EditorBuilder::new().content("<p>ab[]</p>").build().unwrap();
    editor
        .execute(&Command::InsertText {
            text: "c".to_string(),
        })
        .unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>abc[]</p>");
    assert_eq!(editor.history().undo_description(), Some("insert_text"));

    editor.execute(&Command::Undo).unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>ab[]</p>");
    assert!(editor.history().can_redo());

    editor.execute(&Command::Redo).unwrap();
    assert_eq!(editor.markup_with_selection(), "<p>abc[]</p>");
}

#[test]
fn test_commands_from_json() {
    let commands: Vec<Command> = serde_json::from_str(
        r#"[
            { "type": "InsertText", "text": "X" },
            { "type": "SplitBlock" },
            { "type": "InsertLineBreak" }
        ]"#,
    )
    .unwrap();
    assert_eq!(run("<p>a[]</p>", &commands), "<p>aX</p><p><br>[]<br></p>");
}

#[test]
fn test_command_without_selection_fails() {
    let mut editor = EditorBuilder::new().content("<p>ab</p>").build().unwrap();
    let result = editor.execute(&Command::SplitBlock);
    assert!(matches!(result, Err(EditorError::NoSelection)));
    assert_eq!(editor.content(), "<p>ab</p>");
    assert!(!editor.history().can_undo());
}
