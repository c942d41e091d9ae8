use crate::error::{DomError, DomResult};
use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// Tokens between tags
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum ContentToken<'src> {
    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", open_name)]
    TagOpen(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", close_name)]
    TagClose(&'src str),

    #[token("[")]
    SelectionStart,

    #[token("]")]
    SelectionEnd,

    #[regex(r"[^<\[\]]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside an opening tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum TagToken<'src> {
    #[regex(r"[a-zA-Z_:][a-zA-Z0-9_:.-]*", |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, quoted_value)]
    Value(&'src str),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,
}

fn open_name<'s>(lex: &mut Lexer<'s, ContentToken<'s>>) -> &'s str {
    &lex.slice()[1..]
}

fn close_name<'s>(lex: &mut Lexer<'s, ContentToken<'s>>) -> &'s str {
    let slice = lex.slice();
    slice[2..slice.len() - 1].trim_end()
}

fn quoted_value<'s>(lex: &mut Lexer<'s, TagToken<'s>>) -> &'s str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

/// Flattened markup token, attributes still entity-encoded
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupToken<'src> {
    Open {
        name: &'src str,
        attributes: Vec<(&'src str, &'src str)>,
        self_closing: bool,
    },
    Close(&'src str),
    SelectionStart,
    SelectionEnd,
    Text(&'src str),
}

impl fmt::Display for MarkupToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupToken::Open { name, .. } => write!(f, "<{}>", name),
            MarkupToken::Close(name) => write!(f, "</{}>", name),
            MarkupToken::SelectionStart => write!(f, "["),
            MarkupToken::SelectionEnd => write!(f, "]"),
            MarkupToken::Text(text) => write!(f, "text {:?}", text),
        }
    }
}

/// Tokenize fixture markup. The content lexer hands over to the tag lexer
/// after every `<name` and takes back control at `>` or `/>`.
pub fn tokenize(source: &str) -> DomResult<Vec<(MarkupToken<'_>, Range<usize>)>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    while let Some(result) = content.next() {
        let span = content.span();
        let token =
            result.map_err(|_| DomError::markup(span.start, "unexpected character"))?;
        match token {
            ContentToken::TagOpen(name) => {
                let mut tag = content.morph::<TagToken>();
                let (attributes, self_closing) = read_attributes(&mut tag)?;
                let end = tag.span().end;
                tokens.push((
                    MarkupToken::Open {
                        name,
                        attributes,
                        self_closing,
                    },
                    span.start..end,
                ));
                content = tag.morph();
            }
            ContentToken::TagClose(name) => tokens.push((MarkupToken::Close(name), span)),
            ContentToken::SelectionStart => tokens.push((MarkupToken::SelectionStart, span)),
            ContentToken::SelectionEnd => tokens.push((MarkupToken::SelectionEnd, span)),
            ContentToken::Text(text) => tokens.push((MarkupToken::Text(text), span)),
        }
    }
    Ok(tokens)
}

type Attributes<'s> = Vec<(&'s str, &'s str)>;

fn read_attributes<'s>(lex: &mut Lexer<'s, TagToken<'s>>) -> DomResult<(Attributes<'s>, bool)> {
    let mut attributes = Vec::new();
    let mut pending: Option<&'s str> = None;
    loop {
        let Some(result) = lex.next() else {
            return Err(DomError::markup(lex.span().end, "unterminated tag"));
        };
        let token =
            result.map_err(|_| DomError::markup(lex.span().start, "unexpected character in tag"))?;
        match token {
            TagToken::Name(name) => {
                if let Some(previous) = pending.replace(name) {
                    attributes.push((previous, ""));
                }
            }
            TagToken::Equals => {
                let name = pending
                    .take()
                    .ok_or_else(|| DomError::markup(lex.span().start, "'=' without attribute name"))?;
                match lex.next() {
                    Some(Ok(TagToken::Value(value))) => attributes.push((name, value)),
                    _ => {
                        return Err(DomError::markup(
                            lex.span().start,
                            "expected a quoted attribute value",
                        ))
                    }
                }
            }
            TagToken::Value(_) => {
                return Err(DomError::markup(lex.span().start, "value without attribute name"));
            }
            TagToken::End | TagToken::SelfClose => {
                if let Some(previous) = pending.take() {
                    attributes.push((previous, ""));
                }
                return Ok((attributes, token == TagToken::SelfClose));
            }
        }
    }
}
