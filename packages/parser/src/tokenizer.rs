use logos::Logos;
use std::ops::Range;

/// Tokens recognized between tags: character data and tag delimiters.
///
/// Comments, processing instructions, and doctype declarations carry no
/// editor-visible structure and are skipped outright.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"<!--([^-]|-[^-])*-->")]
#[logos(skip r"<\?([^?]|\?[^>])*\?>")]
#[logos(skip r"<!DOCTYPE[^>]*>")]
enum ContentToken<'src> {
    #[token("</")]
    CloseTagStart,

    #[token("<")]
    TagStart,

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens recognized inside a tag, between `<` and `>`
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum MarkupToken<'src> {
    #[token("/>")]
    SelfCloseEnd,

    #[token(">")]
    TagEnd,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| lex.slice())]
    #[regex(r"'[^']*'", |lex| lex.slice())]
    String(&'src str),

    // Tag and attribute names, including namespaced ones like xlink:href
    #[regex(r"[A-Za-z_][A-Za-z0-9_:.-]*", |lex| lex.slice())]
    Ident(&'src str),
}

/// Unified token stream fed to the parser
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    TagStart,
    CloseTagStart,
    TagEnd,
    SelfCloseEnd,
    Equals,
    Ident(&'src str),
    /// Quoted attribute value, quotes included in the slice
    String(&'src str),
    /// Raw character data between tags
    Text(&'src str),
}

/// Tokenizes markup into `(token, byte range)` pairs.
///
/// The lexer runs in two contexts: character data outside tags and
/// name/value tokens inside them, switching on tag delimiters. On an
/// unrecognizable byte the offset of that byte is returned instead.
pub fn tokenize(source: &str) -> Result<Vec<(Token<'_>, Range<usize>)>, usize> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    loop {
        let Some(result) = content.next() else {
            return Ok(tokens);
        };
        let span = content.span();

        let opener = match result {
            Ok(ContentToken::Text(text)) => {
                tokens.push((Token::Text(text), span));
                continue;
            }
            Ok(ContentToken::TagStart) => Token::TagStart,
            Ok(ContentToken::CloseTagStart) => Token::CloseTagStart,
            Err(()) => return Err(span.start),
        };
        tokens.push((opener, span));

        // Inside a tag until `>` or `/>`
        let mut markup = content.morph::<MarkupToken>();
        loop {
            let Some(result) = markup.next() else {
                // Unterminated tag; the parser reports the missing close
                return Ok(tokens);
            };
            let span = markup.span();
            match result {
                Ok(MarkupToken::TagEnd) => {
                    tokens.push((Token::TagEnd, span));
                    break;
                }
                Ok(MarkupToken::SelfCloseEnd) => {
                    tokens.push((Token::SelfCloseEnd, span));
                    break;
                }
                Ok(MarkupToken::Equals) => tokens.push((Token::Equals, span)),
                Ok(MarkupToken::Ident(name)) => tokens.push((Token::Ident(name), span)),
                Ok(MarkupToken::String(value)) => tokens.push((Token::String(value), span)),
                Err(()) => return Err(span.start),
            }
        }
        content = markup.morph();
    }
}

/// Replaces the five predefined entities with their characters.
/// Unknown entity references are kept verbatim.
pub(crate) fn unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let replaced = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match replaced {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_self_closing_tag() {
        let tokens = tokenize(r#"<rect x="1"/>"#).unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::TagStart,
                Token::Ident("rect"),
                Token::Ident("x"),
                Token::Equals,
                Token::String("\"1\""),
                Token::SelfCloseEnd,
            ]
        );
    }

    #[test]
    fn test_tokenize_nested_with_text() {
        let tokens = tokenize("<text>hi &amp; bye</text>").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::TagStart,
                Token::Ident("text"),
                Token::TagEnd,
                Token::Text("hi &amp; bye"),
                Token::CloseTagStart,
                Token::Ident("text"),
                Token::TagEnd,
            ]
        );
    }

    #[test]
    fn test_comments_and_prolog_are_skipped() {
        let source = "<?xml version=\"1.0\"?><!DOCTYPE svg><!-- note --><svg></svg>";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].0, Token::TagStart);
        assert_eq!(tokens[1].0, Token::Ident("svg"));
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_single_quoted_attribute() {
        let tokens = tokenize("<rect fill='red'/>").unwrap();
        assert!(tokens
            .iter()
            .any(|(t, _)| matches!(t, Token::String("'red'"))));
    }

    #[test]
    fn test_lexer_error_reports_offset() {
        // `<` is not valid inside a tag
        let err = tokenize("<rect <x/>").unwrap_err();
        assert_eq!(err, 6);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &lt;b&gt; &amp;c"), "a <b> &c");
        assert_eq!(unescape("no entities"), "no entities");
        assert_eq!(unescape("&unknown; stays"), "&unknown; stays");
    }
}
