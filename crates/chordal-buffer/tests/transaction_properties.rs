//! Property tests for mutation transactions.

use chordal_buffer::{AttributeRun, Attributes, TextBuffer, TextRange, TextSlice, TextStorage};
use proptest::prelude::*;

fn styled_text() -> impl Strategy<Value = TextSlice> {
    ("[a-zé]{0,12}", 0usize..12, 0usize..6).prop_map(|(text, start, len)| {
        let total = text.chars().count();
        let start = start.min(total);
        let len = len.min(total - start);
        let mut attrs = Attributes::new();
        attrs.insert("color".to_string(), "red".to_string());
        TextSlice::with_runs(text, vec![AttributeRun::new(start, len, attrs)])
            .expect("run lies inside text")
    })
}

fn clamp(range: (usize, usize), len: usize) -> TextRange {
    let start = range.0 % (len + 1);
    TextRange::new(start, range.1.min(len - start))
}

proptest! {
    #[test]
    fn dropped_transaction_restores_everything(
        start in styled_text(),
        edits in prop::collection::vec(((0usize..16, 0usize..4), styled_text()), 1..8),
    ) {
        let mut buffer = TextBuffer::from_slice(start.clone());
        let revision = buffer.revision();
        let selections = buffer.selections();

        {
            let mut tx = buffer.transaction();
            for (range, slice) in &edits {
                let range = clamp(*range, tx.buffer().len_chars());
                tx.replace(range, slice).expect("range is clamped");
            }
        }

        prop_assert_eq!(buffer.contents(), start);
        prop_assert_eq!(buffer.revision(), revision);
        prop_assert_eq!(buffer.selections(), selections);
    }

    #[test]
    fn writing_back_what_was_read_changes_nothing(
        start in styled_text(),
        range in (0usize..16, 0usize..8),
    ) {
        let mut buffer = TextBuffer::from_slice(start.clone());
        let range = clamp(range, buffer.len_chars());

        let read = buffer.read(range).expect("range is clamped");
        buffer.replace(range, &read).expect("range is clamped");

        prop_assert_eq!(buffer.contents(), start);
    }
}
