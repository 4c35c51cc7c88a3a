//! Splits message text into prose and fenced code segments.
//!
//! The splitter is pure and cheap, so renderers call it on the revealed
//! prefix after every tick instead of running separate reveal timers for
//! nested code blocks. A fence opened but not yet closed (the usual state
//! mid-stream) produces an open code segment covering the rest of the text,
//! minus any backticks of a closing fence that has only partly arrived.

const FENCE: &str = "```";

/// One piece of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code {
        /// Fence info string, or `"text"` when missing or not a plain word.
        language: &'a str,
        body: &'a str,
        /// `false` while the closing fence has not appeared.
        closed: bool,
    },
}

impl Segment<'_> {
    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }
}

/// Splits `text` into segments in order. Empty prose between fences is skipped.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        if open > 0 {
            out.push(Segment::Text(&rest[..open]));
        }
        let after_fence = &rest[open + FENCE.len()..];

        let Some(newline) = after_fence.find('\n') else {
            // Info string still arriving.
            out.push(Segment::Code {
                language: fence_language(after_fence),
                body: "",
                closed: false,
            });
            return out;
        };

        let language = fence_language(&after_fence[..newline]);
        let body_start = &after_fence[newline + 1..];
        match body_start.find(FENCE) {
            Some(close) => {
                out.push(Segment::Code {
                    language,
                    body: trim_one_newline(&body_start[..close]),
                    closed: true,
                });
                rest = &body_start[close + FENCE.len()..];
            }
            None => {
                out.push(Segment::Code {
                    language,
                    body: strip_partial_fence(body_start),
                    closed: false,
                });
                return out;
            }
        }
    }

    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

fn fence_language(info: &str) -> &str {
    let info = info.trim();
    let is_word = !info.is_empty()
        && info
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_word {
        info
    } else {
        "text"
    }
}

/// Drops a run of one or two backticks that starts the last line of an open
/// body. A full run of three would already have closed the fence.
fn strip_partial_fence(body: &str) -> &str {
    let trimmed = body.trim_end_matches('`');
    if trimmed.len() < body.len() && (trimmed.is_empty() || trimmed.ends_with('\n')) {
        trimmed
    } else {
        body
    }
}

fn trim_one_newline(body: &str) -> &str {
    body.strip_suffix('\n')
        .map(|b| b.strip_suffix('\r').unwrap_or(b))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(segments("hello"), vec![Segment::Text("hello")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn closed_fence_splits_text_code_text() {
        let text = "Intro\n```rust\nfn main() {}\n```\nOutro";
        assert_eq!(
            segments(text),
            vec![
                Segment::Text("Intro\n"),
                Segment::Code {
                    language: "rust",
                    body: "fn main() {}",
                    closed: true
                },
                Segment::Text("\nOutro"),
            ]
        );
    }

    #[test]
    fn open_fence_mid_stream_is_an_open_code_block() {
        let text = "Look:\n```ts\nconst a = 1\nconst";
        let segs = segments(text);
        assert_eq!(segs.len(), 2);
        assert_eq!(
            segs[1],
            Segment::Code {
                language: "ts",
                body: "const a = 1\nconst",
                closed: false
            }
        );
    }

    #[test]
    fn partial_closing_fence_stays_out_of_the_body() {
        for partial in ["`", "``"] {
            let text = format!("```ts\nlet a = 1\n{partial}");
            assert_eq!(
                segments(&text),
                vec![Segment::Code {
                    language: "ts",
                    body: "let a = 1\n",
                    closed: false
                }]
            );
        }
        let segs = segments("```sh\n``");
        assert!(matches!(segs[0], Segment::Code { body: "", closed: false, .. }));
    }

    #[test]
    fn backticks_inside_a_code_line_are_kept() {
        let segs = segments("```js\nconst s = `x`");
        assert!(matches!(
            segs[0],
            Segment::Code {
                body: "const s = `x`",
                closed: false,
                ..
            }
        ));
    }

    #[test]
    fn fence_without_info_line_yet() {
        let segs = segments("x ```typ");
        assert_eq!(segs[0], Segment::Text("x "));
        assert_eq!(
            segs[1],
            Segment::Code {
                language: "typ",
                body: "",
                closed: false
            }
        );
    }

    #[test]
    fn missing_or_odd_language_falls_back_to_text() {
        let segs = segments("```\nplain\n```");
        assert!(matches!(segs[0], Segment::Code { language: "text", .. }));
        let segs = segments("```c++\nint x;\n```");
        assert!(matches!(segs[0], Segment::Code { language: "text", .. }));
    }

    #[test]
    fn every_prefix_segments_without_panicking() {
        let text = "a ✅\n```rust\nlet é = 1;\n```\nb";
        for (idx, _) in text.char_indices() {
            let _ = segments(&text[..idx]);
        }
    }
}
