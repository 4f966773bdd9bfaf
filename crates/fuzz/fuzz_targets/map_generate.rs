#![no_main]

use libfuzzer_sys::fuzz_target;
use restrand::{Editor, SourceMapOptions};

fn next_op(data: &mut &[u8]) -> Option<(u8, usize, usize, u8)> {
    let (&tag, rest) = data.split_first()?;
    *data = rest;
    let (&a, rest) = data.split_first()?;
    *data = rest;
    let (&b, rest) = data.split_first()?;
    *data = rest;
    let (&byte, rest) = data.split_first()?;
    *data = rest;
    Some((tag, a as usize, b as usize, byte))
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // Keep the source printable ASCII so `sourcemap`'s line/column arithmetic has no surprises
    // from multi-byte UTF-8 to reckon with; the byte-exactness of the editor itself is covered by
    // `editor_invariants`.
    let (&src_len, mut rest) = data.split_first().unwrap();
    let src_len = (src_len as usize) % (rest.len() + 1);
    let source: String = rest[..src_len]
        .iter()
        .map(|&b| if b == b'\n' { '\n' } else { (b % 95 + 32) as char })
        .collect();
    rest = &rest[src_len..];

    let mut editor = Editor::new(&source);
    while let Some((tag, a, b, byte)) = next_op(&mut rest) {
        let content: String = std::iter::once((byte % 95 + 32) as char).collect();
        match tag % 3 {
            0 => {
                let _ = editor.append_left(a, &content);
            }
            1 => {
                let _ = editor.append_right(a, &content);
            }
            _ => {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                let _ = editor.overwrite(start, end, &content);
            }
        }
    }

    let options = SourceMapOptions {
        source: Some("fuzz.js".to_string()),
        include_content: true,
        ..Default::default()
    };
    let map = editor.generate_map(&options);

    // `mappings` must have exactly one fewer semicolon than lines in the output.
    let newline_count = editor.to_string().matches('\n').count();
    assert_eq!(map.mappings.matches(';').count(), newline_count);

    // The produced map must be a well-formed Source Map v3 document that an independent reader
    // can parse without complaint.
    let json = serde_json::to_string(&map).unwrap();
    let parsed = sourcemap::SourceMap::from_slice(json.as_bytes())
        .expect("generated map must be valid Source Map v3");
    let _ = parsed.get_token_count();
});
