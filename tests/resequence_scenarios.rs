// End-to-end footnote renumbering over realistic documents.

use footseq::host::{BufferHost, Cursor, recheck};
use footseq::{Resequenced, resequence};
use insta::assert_snapshot;

fn rewritten(input: &str) -> String {
    match resequence(input).unwrap() {
        Resequenced::Changed { text, .. } => text,
        Resequenced::Unchanged => panic!("expected a rewrite for {input:?}"),
    }
}

#[test]
fn test_article_with_named_notes() {
    let input = "\
# Field notes

The river rose overnight[^flood] and the bridge[^bridge] closed.
Locals said the flood[^flood] was the worst in a decade[^decade].

## Sources

[^decade]: County records, 2014-2024.
[^flood]: Observed from the east bank.
[^bridge]: Closed by the highway authority.
[^unused]: Draft note, never cited.
";

    assert_snapshot!(rewritten(input), @r"
    # Field notes

    The river rose overnight[^1] and the bridge[^2] closed.
    Locals said the flood[^1] was the worst in a decade[^3].

    ## Sources

    [^3]: County records, 2014-2024.
    [^1]: Observed from the east bank.
    [^2]: Closed by the highway authority.
    [^unused]: Draft note, never cited.
    ");
}

#[test]
fn test_note_inserted_in_the_middle() {
    // Writer added a new note between 1 and 2 and labelled it 3.
    let input = "\
Alpha[^1], gamma[^3], beta[^2].

[^1]: alpha
[^2]: beta
[^3]: gamma
";

    assert_snapshot!(rewritten(input), @r"
    Alpha[^1], gamma[^2], beta[^3].

    [^1]: alpha
    [^3]: beta
    [^2]: gamma
    ");
}

#[test]
fn test_definitions_in_list_items_keep_indentation() {
    let input = "\
- item with a note[^n]

    [^n]:   nested body
";

    assert_snapshot!(rewritten(input), @r"
    - item with a note[^1]

        [^1]: nested body
    ");
}

#[test]
fn test_document_without_footnotes_is_untouched() {
    let input = "# Title\n\nA [link](https://example.com) and [brackets].\n";
    assert_eq!(resequence(input).unwrap(), Resequenced::Unchanged);
}

#[test]
fn test_already_canonical_document_is_untouched() {
    let input = "One[^1] two[^2] one[^1].\n\n[^1]: first\n[^2]: second\n";
    assert_eq!(resequence(input).unwrap(), Resequenced::Unchanged);
}

#[test]
fn test_host_round_trip_restores_cursor() {
    let mut host = BufferHost::new("Intro[^why].\n\nMore text here.\n\n[^why]: Because.")
        .with_cursor(Cursor::new(2, 9));

    assert!(recheck(&mut host).unwrap());
    assert_snapshot!(host.text.as_str(), @r"
    Intro[^1].

    More text here.

    [^1]: Because.
    ");
    assert_eq!(host.cursor, Cursor::new(2, 9));

    assert!(!recheck(&mut host).unwrap());
}
