#![no_main]

use libfuzzer_sys::fuzz_target;
use restrand::Editor;

/// One scripted operation, decoded from a byte of fuzzer input.
enum Op {
    AppendLeft(usize, u8),
    AppendRight(usize, u8),
    Overwrite(usize, usize, u8),
}

fn next_op(data: &mut &[u8]) -> Option<Op> {
    let (&tag, rest) = data.split_first()?;
    *data = rest;
    let (&a, rest) = data.split_first()?;
    *data = rest;
    match tag % 3 {
        0 => Some(Op::AppendLeft(a as usize, tag)),
        1 => Some(Op::AppendRight(a as usize, tag)),
        _ => {
            let (&b, rest) = data.split_first()?;
            *data = rest;
            Some(Op::Overwrite(a as usize, b as usize, tag))
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let (&src_len, mut rest) = data.split_first().unwrap();
    let src_len = (src_len as usize) % (rest.len() + 1);
    let source = &rest[..src_len];
    rest = &rest[src_len..];

    let mut editor = Editor::new_bytes(source);
    let before = editor.to_bytes();
    assert_eq!(before.len(), source.len());

    while let Some(op) = next_op(&mut rest) {
        match op {
            Op::AppendLeft(index, byte) => {
                let content = (byte as char).to_string();
                let _ = editor.append_left(index, content);
            }
            Op::AppendRight(index, byte) => {
                let content = (byte as char).to_string();
                let _ = editor.append_right(index, content);
            }
            Op::Overwrite(start, end, byte) => {
                let content = (byte as char).to_string();
                let (start, end) = if start <= end { (start, end) } else { (end, start) };
                let _ = editor.overwrite(start, end, content);
            }
        }
        editor.assert_invariants();
        assert_eq!(editor.output_len(), editor.to_bytes().len());
    }
});
