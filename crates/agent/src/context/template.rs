//! Prompt templates with a context slot and a question slot.

use contextchat_config::{CONTEXT_MARKER, QUESTION_MARKER};
use contextchat_core::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// A parsed prompt template.
///
/// Rendering walks pre-split segments, so text inside the substituted
/// context (or question) is never re-scanned for markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template containing `{context}` and `{question}` exactly once each.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        for marker in [CONTEXT_MARKER, QUESTION_MARKER] {
            match source.matches(marker).count() {
                0 => return Err(TemplateError::MissingMarker(marker)),
                1 => {}
                n => return Err(TemplateError::RepeatedMarker(marker, n)),
            }
        }

        let mut segments = Vec::with_capacity(5);
        let mut rest = source;
        while !rest.is_empty() {
            let next = [
                (rest.find(CONTEXT_MARKER), CONTEXT_MARKER, Segment::Context),
                (rest.find(QUESTION_MARKER), QUESTION_MARKER, Segment::Question),
            ]
            .into_iter()
            .filter_map(|(pos, marker, seg)| pos.map(|p| (p, marker, seg)))
            .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, marker, seg)) => {
                    if pos > 0 {
                        segments.push(Segment::Literal(rest[..pos].to_string()));
                    }
                    segments.push(seg);
                    rest = &rest[pos + marker.len()..];
                }
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        Ok(Self { segments })
    }

    /// Substitute the context block and the question.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.literal_len() + context.len() + question.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Context => out.push_str(context),
                Segment::Question => out.push_str(question),
            }
        }
        out
    }

    /// The template with both slots empty.
    pub fn skeleton(&self) -> String {
        self.render("", "")
    }

    fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                _ => 0,
            })
            .sum()
    }
}

/// Template parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template is missing the {0} insertion point")]
    MissingMarker(&'static str),

    #[error("template contains {0} {1} times; exactly one is required")]
    RepeatedMarker(&'static str, usize),
}

impl From<TemplateError> for Error {
    fn from(e: TemplateError) -> Self {
        Error::Template {
            message: e.to_string(),
        }
    }
}
