//! Placeholder tokens and the per-filter stash behind them.
//!
//! During the forward pass a filter swaps each piece of syntax it owns for a
//! token of the form `=wm:{kind}:{id}=` and keeps the original in a
//! [`Stash`]. During the reverse pass the same stash finds its tokens again
//! and substitutes the final content in a single scan over the text.
//!
//! The token contains no Markdown- or HTML-significant characters, so it
//! passes through the markup converter unchanged. Because `kind` is part of
//! the token, stashes of different filters never claim each other's tokens.

use std::collections::HashMap;
use std::fmt;

const OPEN: &str = "=wm:";
const CLOSE: char = '=';

/// Identity of an extracted item: filter kind plus item id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    kind: String,
    id: String,
}

impl Placeholder {
    /// Create a placeholder.
    ///
    /// `kind` and `id` should consist of ASCII alphanumerics, `-` and `_`;
    /// other characters are replaced with `_`.
    #[must_use]
    pub fn new(kind: &str, id: &str) -> Self {
        Self {
            kind: sanitize_segment(kind),
            id: sanitize_segment(id),
        }
    }

    /// Filter kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Item id within the kind.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Token text inserted into the document.
    #[must_use]
    pub fn token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OPEN}{}:{}{CLOSE}", self.kind, self.id)
    }
}

fn is_segment_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii() && is_segment_byte(c as u8) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// How a token sits in the converted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Token stands inside running text.
    Inline,
    /// The converter puts `open` and `close` around the token.
    Wrapped {
        open: &'static str,
        close: &'static str,
    },
}

/// Items extracted by one filter, keyed by placeholder id.
///
/// # Example
///
/// ```
/// use wm_render::Stash;
///
/// let mut stash = Stash::inline("kbd");
/// let token = stash.insert("Ctrl+C".to_owned());
/// let text = format!("Press {token} to copy.");
///
/// let html = stash
///     .restore(text, |_id, key| Ok::<_, ()>(format!("<kbd>{key}</kbd>")))
///     .unwrap();
/// assert_eq!(html, "Press <kbd>Ctrl+C</kbd> to copy.");
/// ```
#[derive(Debug)]
pub struct Stash<T> {
    kind: String,
    layout: Layout,
    order: Vec<String>,
    items: HashMap<String, T>,
}

impl<T> Stash<T> {
    /// Stash for tokens placed inside running text.
    #[must_use]
    pub fn inline(kind: &str) -> Self {
        Self::with_layout(kind, Layout::Inline)
    }

    /// Stash for tokens placed on their own line.
    ///
    /// On restore, a `<p>` wrapper the converter put around a lone token is
    /// replaced together with the token.
    #[must_use]
    pub fn block(kind: &str) -> Self {
        Self::wrapped(kind, "<p>", "</p>")
    }

    /// Stash for tokens the converter wraps in `open` and `close`.
    ///
    /// On restore the wrapper is replaced together with the token; a token
    /// found without it is replaced on its own.
    #[must_use]
    pub fn wrapped(kind: &str, open: &'static str, close: &'static str) -> Self {
        Self::with_layout(kind, Layout::Wrapped { open, close })
    }

    fn with_layout(kind: &str, layout: Layout) -> Self {
        Self {
            kind: sanitize_segment(kind),
            layout,
            order: Vec::new(),
            items: HashMap::new(),
        }
    }

    /// Filter kind of this stash.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Stash `item` under the next sequential id and return its token.
    pub fn insert(&mut self, item: T) -> String {
        let id = self.order.len().to_string();
        self.insert_with_id(&id, item)
    }

    /// Stash `item` under `id` (e.g. a content digest) and return its token.
    ///
    /// Inserting an id twice keeps the first item; both occurrences of the
    /// token are restored from it.
    pub fn insert_with_id(&mut self, id: &str, item: T) -> String {
        let placeholder = Placeholder::new(&self.kind, id);
        if !self.items.contains_key(placeholder.id()) {
            self.order.push(placeholder.id().to_owned());
            self.items.insert(placeholder.id().to_owned(), item);
        }
        placeholder.token()
    }

    /// Number of stashed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was stashed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replace every token of this stash in `text` with rendered content.
    ///
    /// `render` is called once per stashed item, in insertion order, with the
    /// item id and the item. Tokens of other kinds and unknown ids are left
    /// untouched. Items whose token no longer appears in `text` are dropped.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `render`.
    pub fn restore<E, F>(&mut self, text: String, mut render: F) -> Result<String, E>
    where
        F: FnMut(&str, T) -> Result<String, E>,
    {
        if self.items.is_empty() {
            return Ok(text);
        }

        let mut rendered = HashMap::with_capacity(self.items.len());
        for id in self.order.drain(..) {
            if let Some(item) = self.items.remove(&id) {
                let html = render(&id, item)?;
                rendered.insert(id, html);
            }
        }

        let prefix = format!("{OPEN}{}:", self.kind);
        let mut output = String::with_capacity(text.len());
        let mut rest = text.as_str();
        let mut restored = 0usize;

        while let Some(start) = rest.find(&prefix) {
            let after_prefix = &rest[start + prefix.len()..];
            let id_len = after_prefix.bytes().take_while(|&b| is_segment_byte(b)).count();
            let id = &after_prefix[..id_len];
            let closed = after_prefix[id_len..].starts_with(CLOSE);

            let Some(html) = rendered.get(id).filter(|_| closed && id_len > 0) else {
                // Not one of ours; copy the prefix and keep scanning.
                output.push_str(&rest[..start + prefix.len()]);
                rest = after_prefix;
                continue;
            };

            let token_end = start + prefix.len() + id_len + CLOSE.len_utf8();
            let (head, tail) = (&rest[..start], &rest[token_end..]);
            match self.layout {
                Layout::Wrapped { open, close } if head.ends_with(open) && tail.starts_with(close) => {
                    output.push_str(&head[..head.len() - open.len()]);
                    output.push_str(html);
                    rest = &tail[close.len()..];
                }
                _ => {
                    output.push_str(head);
                    output.push_str(html);
                    rest = tail;
                }
            }
            restored += 1;
        }
        output.push_str(rest);

        if restored < rendered.len() {
            tracing::debug!(
                kind = %self.kind,
                missing = rendered.len() - restored,
                "placeholders removed before restore"
            );
        }

        Ok(output)
    }
}
