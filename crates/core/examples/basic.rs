//! End-to-end demo: edit a small source file, print the result, and print its Source Map v3.

use restrand::{Editor, SourceMapOptions, StackedEditor};

fn main() {
    let mut editor = Editor::new("var x = 1");
    editor.append_left(0, "// Comment\n").unwrap();
    editor.overwrite(4, 5, "answer").unwrap();
    editor.append_right(9, ";").unwrap();

    println!("--- edited output ---");
    println!("{}", editor.to_string());

    let options = SourceMapOptions {
        source: Some("input.js".to_string()),
        include_content: true,
        ..Default::default()
    };
    let map = editor.generate_map(&options);
    println!("--- source map ---");
    println!("{}", serde_json::to_string_pretty(&map).unwrap());

    println!("--- stacked editor: commit then rollback ---");
    let mut stack = StackedEditor::new("world");
    stack.append_left(0, "Hello ").unwrap();
    println!("{}", stack.to_string());

    stack.commit();
    stack.overwrite(6, 11, "Zig").unwrap();
    println!("{}", stack.to_string());

    stack.rollback().unwrap();
    println!("{}", stack.to_string());
}
