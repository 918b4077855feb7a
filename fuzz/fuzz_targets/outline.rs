#![no_main]

use koala_syntax::{outline, LineIndex};
use libfuzzer_sys::fuzz_target;

const MAX_SOURCE_BYTES: usize = 8192;

fuzz_target!(|data: &[u8]| {
    let capped = &data[..data.len().min(MAX_SOURCE_BYTES)];
    let source = String::from_utf8_lossy(capped);
    let Ok(spans) = outline(&source) else {
        return;
    };

    let lines = LineIndex::new(&source);
    for span in spans {
        assert!(span.start_line <= span.end_line);
        assert!(span.range.contains_range(span.body));
        assert!(usize::from(span.range.end()) <= source.len());
        assert_eq!(lines.line_of(span.range.start()), span.start_line);
        assert!(span.control_keyword_kinds() <= 5);
    }
});
