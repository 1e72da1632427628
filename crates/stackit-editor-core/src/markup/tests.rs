use super::*;

fn roundtrip(markup: &str) -> String {
    Tree::parse(markup).serialize()
}

#[test]
fn test_parse_serialize_stable() {
    let cases = [
        "<p>Hello <b>world</b></p><ul><li>a</li></ul>",
        "<img src=\"x.png\" alt=\"A\">",
        "a<br>b",
        "<div style=\"text-align: center;\">centered</div>",
        "",
    ];
    for case in cases {
        assert_eq!(roundtrip(case), case);
    }
}

#[test]
fn test_parse_tolerant_input() {
    assert_eq!(roundtrip("a &amp; b &lt;c&gt;"), "a &amp; b &lt;c&gt;");
    assert_eq!(roundtrip("<a href=foo>x</a>"), "<a href=\"foo\">x</a>");
    assert_eq!(roundtrip("a</b>c"), "ac");
    assert_eq!(roundtrip("<p>open"), "<p>open</p>");
    assert_eq!(roundtrip("1 < 2"), "1 &lt; 2");
    assert_eq!(roundtrip("<!-- gone -->kept"), "kept");
    assert_eq!(roundtrip("<IMG SRC='y.png'/>"), "<img src=\"y.png\">");
    assert_eq!(roundtrip("&unknown; &#65;"), "&amp;unknown; A");
}

#[test]
fn test_node_ids_do_not_cross_epochs() {
    let a = Tree::parse("<p>x</p>");
    let id = a.children(a.root())[0];
    let b = Tree::parse("<p>x</p>");
    assert!(a.contains(id));
    assert!(!b.contains(id));
    assert_ne!(a.epoch(), b.epoch());
}

#[test]
fn test_paths() {
    let tree = Tree::parse("<p>a</p><p>b<b>c</b></p>");
    let p2 = tree.children(tree.root())[1];
    let bold = tree.children(p2)[1];
    let text = tree.children(bold)[0];
    assert_eq!(tree.path_of(text), Some(vec![1, 1, 0]));
    assert_eq!(tree.node_at_path(&[1, 1, 0]), Some(text));
    assert_eq!(tree.node_at_path(&[4]), None);
}

#[test]
fn test_caret_map_blocks() {
    let tree = Tree::parse("<p>ab</p><p>c</p>");
    let map = tree.caret_map();
    assert_eq!(map.len(), 4);
    assert_eq!(tree.plain_text(), "ab\nc");
    assert_eq!(map.separators_in(0, 4).len(), 1);

    let p1 = tree.children(tree.root())[0];
    let ab = tree.children(p1)[0];
    // Left bias: offset 2 is the end of the first line.
    assert_eq!(map.point_at(2), Some(Point::new(ab, 2)));
    assert_eq!(map.offset_of(&tree, Point::new(ab, 1)), Some(1));
    // Past the end clamps.
    let p2 = tree.children(tree.root())[1];
    let c = tree.children(p2)[0];
    assert_eq!(map.point_at(99), Some(Point::new(c, 1)));
}

#[test]
fn test_caret_map_empty() {
    let tree = Tree::parse("");
    let map = tree.caret_map();
    assert!(map.is_empty());
    assert_eq!(map.point_at(0), Some(Point::new(tree.root(), 0)));

    let tree = Tree::parse("<p></p>");
    let p = tree.children(tree.root())[0];
    assert_eq!(tree.caret_map().point_at(0), Some(Point::new(p, 0)));
}

#[test]
fn test_caret_map_void() {
    let tree = Tree::parse("a<img src=\"x\">b");
    let map = tree.caret_map();
    assert_eq!(map.len(), 3);
    assert_eq!(
        map.offset_of(&tree, Point::new(tree.root(), 2)),
        Some(2)
    );
    assert_eq!(tree.plain_text(), "a\u{fffc}b");
}

#[test]
fn test_offset_of_dead_point() {
    let mut tree = Tree::parse("<p>ab</p>");
    let p = tree.children(tree.root())[0];
    let text = tree.children(p)[0];
    tree.remove(p);
    assert_eq!(tree.caret_map().offset_of(&tree, Point::new(text, 0)), None);
}

#[test]
fn test_toggle_bold_roundtrip() {
    let mut tree = Tree::parse("hello world");
    assert!(tree.toggle_mark(0, 5, Mark::Bold));
    assert_eq!(tree.serialize(), "<b>hello</b> world");
    assert!(tree.toggle_mark(0, 5, Mark::Bold));
    assert_eq!(tree.serialize(), "hello world");
}

#[test]
fn test_toggle_partial_unbold() {
    let mut tree = Tree::parse("<b>hello</b>");
    assert!(tree.toggle_mark(1, 3, Mark::Bold));
    assert_eq!(tree.serialize(), "<b>h</b>el<b>lo</b>");
}

#[test]
fn test_toggle_mixed_marks_all() {
    let mut tree = Tree::parse("<b>ab</b>cd");
    assert!(tree.toggle_mark(0, 4, Mark::Bold));
    assert_eq!(tree.serialize(), "<b>abcd</b>");
}

#[test]
fn test_toggle_recognizes_aliases() {
    let mut tree = Tree::parse("<em>x</em>");
    assert!(tree.toggle_mark(0, 1, Mark::Italic));
    assert_eq!(tree.serialize(), "x");

    let tree = Tree::parse("<del>x</del>");
    assert!(tree.is_marked_at(1, Mark::Strikethrough));
}

#[test]
fn test_toggle_empty_range() {
    let mut tree = Tree::parse("abc");
    assert!(!tree.toggle_mark(1, 1, Mark::Bold));
    assert_eq!(tree.serialize(), "abc");
}

#[test]
fn test_delete_within_text() {
    let mut tree = Tree::parse("abc");
    assert!(tree.delete_range(1, 2));
    assert_eq!(tree.serialize(), "ac");
}

#[test]
fn test_delete_void() {
    let mut tree = Tree::parse("a<img src=\"x\">b");
    tree.delete_range(1, 2);
    assert_eq!(tree.serialize(), "ab");
}

#[test]
fn test_delete_across_blocks() {
    let mut tree = Tree::parse("<p>abc</p><p>def</p>");
    tree.delete_range(1, 5);
    assert_eq!(tree.serialize(), "<p>aef</p>");
}

#[test]
fn test_delete_over_empty_block() {
    let mut tree = Tree::parse("<p>a</p><p></p><p>b</p>");
    tree.delete_range(1, 3);
    assert_eq!(tree.serialize(), "<p>ab</p>");
}

#[test]
fn test_insert_text_plain() {
    let mut tree = Tree::parse("<p>ab</p>");
    assert_eq!(tree.insert_text(1, "X", &[], &[]), 2);
    assert_eq!(tree.serialize(), "<p>aXb</p>");

    let mut tree = Tree::parse("");
    assert_eq!(tree.insert_text(0, "hi", &[], &[]), 2);
    assert_eq!(tree.serialize(), "hi");
}

#[test]
fn test_insert_text_pending_marks() {
    let mut tree = Tree::parse("ab");
    assert_eq!(tree.insert_text(2, "c", &[Mark::Bold], &[]), 3);
    assert_eq!(tree.serialize(), "ab<b>c</b>");

    let mut tree = Tree::parse("<b>ab</b>");
    assert_eq!(tree.insert_text(2, "c", &[], &[Mark::Bold]), 3);
    assert_eq!(tree.serialize(), "<b>ab</b>c");
}

#[test]
fn test_insert_fragment() {
    let mut tree = Tree::parse("ab");
    assert_eq!(tree.insert_fragment(1, "<img src=\"e.png\">"), Some(2));
    assert_eq!(tree.insert_fragment(0, ""), None);
    assert_eq!(tree.serialize(), "a<img src=\"e.png\">b");
}

#[test]
fn test_split_block() {
    let mut tree = Tree::parse("<p>abcd</p>");
    assert_eq!(tree.split_block(2), 3);
    assert_eq!(tree.serialize(), "<p>ab</p><p>cd</p>");

    let mut tree = Tree::parse("abcd");
    assert_eq!(tree.split_block(4), 5);
    assert_eq!(tree.serialize(), "<div>abcd</div><div></div>");
}

#[test]
fn test_list_toggle() {
    let mut tree = Tree::parse("<p>one</p><p>two</p>");
    assert!(tree.toggle_list(0, 7, ListKind::Unordered));
    assert_eq!(tree.serialize(), "<ul><li>one</li><li>two</li></ul>");

    assert!(tree.toggle_list(0, 7, ListKind::Unordered));
    assert_eq!(tree.serialize(), "<div>one</div><div>two</div>");
}

#[test]
fn test_list_switch_kind() {
    let mut tree = Tree::parse("<ul><li>a</li></ul>");
    tree.toggle_list(0, 1, ListKind::Ordered);
    assert_eq!(tree.serialize(), "<ol><li>a</li></ol>");
}

#[test]
fn test_list_root_run() {
    let mut tree = Tree::parse("abc");
    tree.toggle_list(1, 1, ListKind::Ordered);
    assert_eq!(tree.serialize(), "<ol><li>abc</li></ol>");
}

#[test]
fn test_list_root_run_with_voids() {
    for kind in [ListKind::Ordered, ListKind::Unordered] {
        let mut tree = Tree::parse("ab<br>cd");
        let text = tree.plain_text();
        assert!(tree.toggle_list(0, 5, kind));
        assert_eq!(
            tree.serialize(),
            format!("<{0}><li>ab<br>cd</li></{0}>", kind.tag())
        );
        assert_eq!(tree.plain_text(), text);
    }

    let mut tree = Tree::parse("see<img src=\"x.png\">below");
    assert!(tree.toggle_list(0, 9, ListKind::Unordered));
    assert_eq!(
        tree.serialize(),
        "<ul><li>see<img src=\"x.png\">below</li></ul>"
    );
}

#[test]
fn test_align() {
    let mut tree = Tree::parse("<p>a</p>");
    tree.align(0, 0, Alignment::Center);
    assert_eq!(tree.serialize(), "<p style=\"text-align: center;\">a</p>");
    tree.align(0, 0, Alignment::Left);
    assert_eq!(tree.serialize(), "<p>a</p>");

    let mut tree = Tree::parse("<p style=\"color: red\">a</p>");
    tree.align(0, 1, Alignment::Right);
    assert_eq!(
        tree.serialize(),
        "<p style=\"color: red; text-align: right;\">a</p>"
    );
}

#[test]
fn test_align_root_run() {
    let mut tree = Tree::parse("abc");
    tree.align(1, 1, Alignment::Left);
    assert_eq!(tree.serialize(), "abc");
    tree.align(1, 1, Alignment::Center);
    assert_eq!(
        tree.serialize(),
        "<div style=\"text-align: center;\">abc</div>"
    );
}

#[test]
fn test_align_root_run_with_voids() {
    let mut tree = Tree::parse("ab<br>cd");
    tree.align(0, 5, Alignment::Center);
    assert_eq!(
        tree.serialize(),
        "<div style=\"text-align: center;\">ab<br>cd</div>"
    );

    let mut tree = Tree::parse("see<img src=\"x.png\">below");
    let text = tree.plain_text();
    tree.align(0, 9, Alignment::Center);
    assert_eq!(
        tree.serialize(),
        "<div style=\"text-align: center;\">see<img src=\"x.png\">below</div>"
    );
    assert_eq!(tree.plain_text(), text);
}

#[test]
fn test_visible_content() {
    assert!(!Tree::parse("").has_visible_content());
    assert!(!Tree::parse("<p><br></p>").has_visible_content());
    assert!(!Tree::parse("<p> </p>").has_visible_content());
    assert!(Tree::parse("<img src=\"x\">").has_visible_content());
    assert!(Tree::parse("<div>a</div>").has_visible_content());
}
