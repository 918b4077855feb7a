use expect_test::{expect, Expect};
use koala_syntax::{outline, outline_with, CommentStyle, ParseError};

fn check(source: &str, expected: Expect) {
    let mut out = String::new();
    for span in outline(source).unwrap() {
        out.push_str(&format!(
            "{} {}..={} lines={} keywords={}\n",
            span.name.as_deref().unwrap_or("<anonymous>"),
            span.start_line,
            span.end_line,
            span.line_span(),
            span.control_keyword_kinds()
        ));
    }
    expected.assert_eq(&out);
}

#[test]
fn kotlin_class_with_members() {
    check(
        r#"package demo

class Inventory(private val items: MutableList<String>) {
    val size: Int get() = items.size

    fun add(item: String) {
        items.add(item)
    }

    fun prune(limit: Int) {
        var index = 0
        while (index < items.size) {
            if (items[index].length > limit) {
                items.removeAt(index)
            } else {
                index++
            }
        }
    }

    companion object {
        fun empty() = Inventory(mutableListOf())
    }
}

fun main() {
    val inv = Inventory.empty()
    inv.add("{not a block}")
}
"#,
        expect![[r#"
            add 5..=7 lines=3 keywords=0
            prune 9..=18 lines=10 keywords=3
            main 25..=28 lines=4 keywords=0
        "#]],
    );
}

#[test]
fn java_class_with_methods_and_anonymous_class() {
    check(
        r#"public class Worker {
    private final Runnable task = new Runnable() {
        public void run() { }
    };

    /* a { brace in a comment */
    public Worker() {
    }

    public int score(int[] values) throws IllegalStateException {
        int total = 0;
        for (int v : values) {
            try {
                total += v;
            } catch (ArithmeticException e) {
                throw new IllegalStateException(e);
            }
        }
        return total;
    }

    abstract void skip();
}
"#,
        expect![[r#"
            run 2..=2 lines=1 keywords=0
            Worker 6..=7 lines=2 keywords=0
            score 9..=19 lines=11 keywords=2
        "#]],
    );
}

#[test]
fn rust_impl_blocks() {
    check(
        r#"impl Parser {
    pub fn parse(&mut self) -> Result<(), Error> {
        for token in self.tokens() {
            if token.is_error() {
                return Err(Error::Bad);
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token>;
}
"#,
        expect![[r#"
            parse 1..=8 lines=8 keywords=2
        "#]],
    );
}

#[test]
fn malformed_files_report_the_failing_line() {
    let err = outline("fun broken() {\n    if (x) {\n}\n").unwrap_err();
    assert_eq!(err, ParseError::UnclosedBlock { line: 0 });
    assert_eq!(err.to_string(), "block opened at line 1 is never closed");
}

#[test]
fn java_comment_with_an_inner_opener() {
    check(
        r#"class A {
  /* see /* legacy */
  void run() {
    if (ready) { go(); } else { wait(); }
  }
}
"#,
        expect![[r#"
            run 2..=4 lines=3 keywords=2
        "#]],
    );
}

#[test]
fn kotlin_nested_comments_hide_their_contents() {
    let source = "/* outer /* inner */ fun hidden() { } */\nfun shown() {\n}\n";
    let spans = outline_with(source, CommentStyle::Nested).unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].name.as_deref(), Some("shown"));
}
