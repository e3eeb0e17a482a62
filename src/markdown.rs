//! Splits Markdown chapters into prose and code.
//!
//! Code embedded in a chapter is fingerprinted with the code pipeline, so it
//! is lifted out of the prose before the chapter text is hashed.

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

/// A code block lifted out of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    /// First word of the fence info string, `None` for indented blocks and
    /// bare fences.
    pub language: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitChapter {
    /// Chapter text with every code block removed.
    pub prose: String,
    pub code_blocks: Vec<FencedBlock>,
}

/// Content id of the `index`-th (zero based) code block of a chapter.
pub fn code_block_id(chapter_id: &str, index: usize) -> String {
    format!("{chapter_id}#code-{}", index + 1)
}

pub fn split_chapter(markdown: &str) -> SplitChapter {
    let mut out = SplitChapter::default();
    let mut current: Option<FencedBlock> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => fence_language(&info),
                    CodeBlockKind::Indented => None,
                };
                current = Some(FencedBlock {
                    language,
                    code: String::new(),
                });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current.take() {
                    out.code_blocks.push(block);
                }
                out.prose.push('\n');
            }
            Event::Text(text) => match current.as_mut() {
                Some(block) => block.code.push_str(&text),
                None => out.prose.push_str(&text),
            },
            Event::Code(text) => out.prose.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.prose.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => {
                out.prose.push('\n')
            }
            _ => {}
        }
    }

    out
}

/// `rust,ignore` and `{.python}` style info strings reduce to the bare tag.
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',')
        .map(|word| word.trim_matches(|c: char| c == '{' || c == '}' || c == '.'))
        .find(|word| !word.is_empty())
        .map(str::to_string)
}
