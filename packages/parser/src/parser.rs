use crate::ast::{Document, ElementNode, HierarchyNode};
use crate::error::{ParseError, ParseResult};
use crate::identity::IdentityAssigner;
use crate::tokenizer::{tokenize, unescape, Token};
use std::ops::Range;

/// Everything a caller learns from one parse attempt.
///
/// On failure `document` and `hierarchy` are absent and the caller's
/// previously accepted document must be left alone; a failed outcome is
/// never applied.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub success: bool,
    pub document: Option<Document>,
    pub hierarchy: Option<HierarchyNode>,
    pub errors: Vec<crate::error::ParseDiagnostic>,
}

/// Parses markup into an identity-stamped working tree plus its
/// display hierarchy.
pub fn parse(source: &str) -> ParseOutcome {
    let attempt = Parser::new(source).and_then(|mut parser| {
        let mut root = parser.parse_root()?;
        IdentityAssigner::new().assign_document(&mut root);
        let hierarchy = HierarchyNode::from_element(&root);
        Ok((Document::new(root, source), hierarchy))
    });

    match attempt {
        Ok((document, hierarchy)) => ParseOutcome {
            success: true,
            document: Some(document),
            hierarchy: Some(hierarchy),
            errors: Vec::new(),
        },
        Err(error) => ParseOutcome {
            success: false,
            document: None,
            hierarchy: None,
            errors: vec![error.to_diagnostic(source)],
        },
    }
}

/// Recursive-descent parser over the unified token stream
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
    end: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let tokens = tokenize(source).map_err(ParseError::lexer_error)?;
        Ok(Self {
            tokens,
            pos: 0,
            end: source.len(),
        })
    }

    /// Parses exactly one root element, allowing only whitespace around it
    pub fn parse_root(&mut self) -> ParseResult<ElementNode> {
        self.skip_blank_text();

        if self.is_at_end() {
            return Err(ParseError::unexpected_eof(self.end));
        }
        if !matches!(self.peek(), Some(Token::TagStart)) {
            return Err(ParseError::invalid_syntax(
                self.current_pos(),
                "expected a single root element",
            ));
        }

        let root = self.parse_element()?;

        self.skip_blank_text();
        if let Some(token) = self.peek() {
            let message = match token {
                Token::TagStart => "multiple root elements",
                Token::CloseTagStart => "closing tag without a matching open tag",
                _ => "content after the root element",
            };
            return Err(ParseError::invalid_syntax(self.current_pos(), message));
        }

        Ok(root)
    }

    fn parse_element(&mut self) -> ParseResult<ElementNode> {
        self.expect(Token::TagStart, "'<'")?;
        let name = self.expect_ident("a tag name")?;
        let mut node = ElementNode::new(name);

        // Attributes until the tag closes one way or the other
        loop {
            match self.peek() {
                Some(Token::Ident(_)) => {
                    let attr_name = self.expect_ident("an attribute name")?;
                    self.expect(Token::Equals, "'='")?;
                    let value = self.expect_string()?;
                    node.attributes.set(attr_name, value);
                }
                Some(Token::SelfCloseEnd) => {
                    self.advance();
                    return Ok(node);
                }
                Some(Token::TagEnd) => {
                    self.advance();
                    break;
                }
                Some(other) => {
                    return Err(ParseError::unexpected_token(
                        self.current_pos(),
                        "an attribute, '>' or '/>'",
                        format!("{:?}", other),
                    ));
                }
                None => return Err(ParseError::unexpected_eof(self.end)),
            }
        }

        // Children and character data until the matching close tag
        let mut text = String::new();
        loop {
            match self.peek() {
                Some(Token::Text(raw)) => {
                    text.push_str(&unescape(raw));
                    self.advance();
                }
                Some(Token::TagStart) => {
                    node.children.push(self.parse_element()?);
                }
                Some(Token::CloseTagStart) => {
                    let close_pos = self.current_pos();
                    self.advance();
                    let close_name = self.expect_ident("a tag name")?;
                    if close_name != node.tag_name {
                        return Err(ParseError::mismatched_tag(
                            close_pos,
                            &node.tag_name,
                            close_name,
                        ));
                    }
                    self.expect(Token::TagEnd, "'>'")?;
                    break;
                }
                Some(other) => {
                    return Err(ParseError::unexpected_token(
                        self.current_pos(),
                        "child content or a closing tag",
                        format!("{:?}", other),
                    ));
                }
                None => return Err(ParseError::unexpected_eof(self.end)),
            }
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            node.text = Some(trimmed.to_string());
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, range)| range.start)
            .unwrap_or(self.end)
    }

    fn skip_blank_text(&mut self) {
        while let Some(Token::Text(raw)) = self.peek() {
            if !raw.trim().is_empty() {
                return;
            }
            self.advance();
        }
    }

    fn expect(&mut self, expected: Token<'src>, label: &str) -> ParseResult<()> {
        match self.peek() {
            Some(token) if *token == expected => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(ParseError::unexpected_token(
                self.current_pos(),
                label,
                format!("{:?}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.end)),
        }
    }

    fn expect_ident(&mut self, label: &str) -> ParseResult<&'src str> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = *name;
                self.advance();
                Ok(name)
            }
            Some(token) => Err(ParseError::unexpected_token(
                self.current_pos(),
                label,
                format!("{:?}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.end)),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::String(quoted)) => {
                let inner = &quoted[1..quoted.len() - 1];
                let value = unescape(inner);
                self.advance();
                Ok(value)
            }
            Some(token) => Err(ParseError::unexpected_token(
                self.current_pos(),
                "a quoted attribute value",
                format!("{:?}", token),
            )),
            None => Err(ParseError::unexpected_eof(self.end)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ElementKind;

    #[test]
    fn test_parse_single_rect() {
        let outcome = parse(r#"<svg><rect id="a" x="1" y="2" width="3" height="4"/></svg>"#);
        assert!(outcome.success);
        assert!(outcome.errors.is_empty());

        let doc = outcome.document.unwrap();
        assert_eq!(doc.root.tag_name, "svg");
        assert_eq!(doc.root.children.len(), 1);

        let rect = &doc.root.children[0];
        assert_eq!(rect.kind, ElementKind::Rect);
        assert_eq!(rect.original_id.as_deref(), Some("a"));
        assert_eq!(rect.internal_id, "rect-1");
        assert_eq!(rect.attributes.get("x"), Some("1"));

        let names: Vec<_> = rect.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "x", "y", "width", "height"]);
    }

    #[test]
    fn test_hierarchy_mirrors_tree() {
        let outcome = parse("<svg><g><rect/></g><circle/></svg>");
        let tree = outcome.hierarchy.unwrap();
        assert_eq!(tree.tag, "svg");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[0].tag, "rect");
        assert_eq!(tree.children[1].id, "circle-1");
    }

    #[test]
    fn test_mismatched_tag_fails_with_line() {
        let outcome = parse("<svg>\n<rect>\n</svg>");
        assert!(!outcome.success);
        assert!(outcome.document.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 3);
        assert!(outcome.errors[0].message.contains("</rect>"));
    }

    #[test]
    fn test_unclosed_tag_fails() {
        let outcome = parse("<svg><rect/>");
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn test_multiple_roots_fail() {
        let outcome = parse("<svg/><svg/>");
        assert!(!outcome.success);
        assert!(outcome.errors[0].message.contains("multiple root"));
    }

    #[test]
    fn test_fresh_parses_get_distinct_tokens() {
        let source = "<svg><rect/></svg>";
        let first = parse(source).document.unwrap();
        let second = parse(source).document.unwrap();

        // Structurally identical, token-distinct
        assert_eq!(first.root.children[0].tag_name, second.root.children[0].tag_name);
        assert_ne!(first.root.token, second.root.token);
        assert_ne!(first.root.children[0].token, second.root.children[0].token);
    }

    #[test]
    fn test_text_content_is_unescaped_and_trimmed() {
        let outcome = parse("<svg><text x=\"1\">  Tom &amp; Jerry  </text></svg>");
        let doc = outcome.document.unwrap();
        assert_eq!(doc.root.children[0].text.as_deref(), Some("Tom & Jerry"));
    }

    #[test]
    fn test_raw_mirror_is_kept() {
        let source = "<svg><rect/></svg>";
        let doc = parse(source).document.unwrap();
        assert_eq!(doc.raw, source);
        assert_eq!(doc.generation, 0);
    }
}
