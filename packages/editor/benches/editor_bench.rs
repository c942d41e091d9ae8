use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scribe_editor::{Command, EditorBuilder};

fn long_document(paragraphs: usize) -> String {
    let mut markup = String::new();
    for i in 0..paragraphs {
        markup.push_str(&format!("<p>paragraph <b>number</b> {}</p>", i));
    }
    markup.push_str("<p>the caret[] is here</p>");
    markup
}

fn split_block(c: &mut Criterion) {
    let content = long_document(200);

    c.bench_function("split_block", |b| {
        b.iter(|| {
            let mut editor = EditorBuilder::new().content(content.as_str()).build().unwrap();
            editor.execute(black_box(&Command::SplitBlock)).unwrap();
            editor
        })
    });
}

fn insert_markup(c: &mut Criterion) {
    let content = long_document(200);
    let command = Command::InsertMarkup {
        markup: "<p>first</p><h2>middle</h2><ul><li>item</li></ul><p>last</p>".to_string(),
    };

    c.bench_function("insert_markup", |b| {
        b.iter(|| {
            let mut editor = EditorBuilder::new().content(content.as_str()).build().unwrap();
            editor.execute(black_box(&command)).unwrap();
            editor
        })
    });
}

fn normalize_divs(c: &mut Criterion) {
    let content: String = (0..200)
        .map(|i| format!("<div>block {}</div><div><p>nested {}</p></div>", i, i))
        .collect();

    c.bench_function("normalize_divs", |b| {
        b.iter(|| EditorBuilder::new().content(black_box(content.as_str())).build().unwrap())
    });
}

criterion_group!(benches, split_block, insert_markup, normalize_divs);
criterion_main!(benches);
