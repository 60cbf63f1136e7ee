//! Markdown structure of source text, for filters that edit the source
//! before it is converted.
//!
//! Offsets come from pulldown-cmark, so container blocks (lists, block
//! quotes) and indented code are seen exactly as the converter sees them.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};

use crate::convert::MarkdownConverter;

/// A fenced code block found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FencedBlock {
    /// Byte range of the whole block, fences included.
    pub(crate) range: Range<usize>,
    /// First word of the info string.
    pub(crate) language: Option<String>,
    /// Block content with container prefixes removed.
    pub(crate) code: String,
}

fn parser(text: &str) -> Parser<'_> {
    Parser::new_ext(text, MarkdownConverter::default().options())
}

/// Fenced code blocks of `text` in document order.
pub(crate) fn fenced_blocks(text: &str) -> Vec<FencedBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<FencedBlock> = None;

    for (event, range) in parser(text).into_offset_iter() {
        match (&mut open, event) {
            (None, Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))) => {
                open = Some(FencedBlock {
                    range,
                    language: info.split_whitespace().next().map(ToOwned::to_owned),
                    code: String::new(),
                });
            }
            (Some(block), Event::Text(chunk)) => block.code.push_str(&chunk),
            (Some(_), Event::End(TagEnd::CodeBlock)) => {
                if let Some(block) = open.take() {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Byte ranges of every code block and code span of `text`.
pub(crate) fn code_ranges(text: &str) -> Vec<Range<usize>> {
    parser(text)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// Whether `offset` falls inside one of `ranges`.
pub(crate) fn in_ranges(ranges: &[Range<usize>], offset: usize) -> bool {
    ranges.iter().any(|range| range.contains(&offset))
}
