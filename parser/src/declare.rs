use ast::{Declaration, ScalarType, Span, TypeSpec};

use crate::{
    program::Parser,
    token::{Operator, TokenKind, TypeName},
    ParseError, ParseErrorKind,
};

/// Where a scalar default value may appear.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Defaults {
    /// Rest of the declaring line.
    Line,
    /// Up to the next `,` or `)` of a struct member list.
    Group,
    /// Nested type specs carry no default.
    None,
}

impl Parser {
    /// `<kind> <name> <kind-tail>`, the body of `DECLARE_VARIABLE`.
    pub(crate) fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let declaration = self.parse_named_declaration(Defaults::Line)?;
        self.expect_line_end()?;
        Ok(declaration)
    }

    fn parse_named_declaration(&mut self, defaults: Defaults) -> Result<Declaration, ParseError> {
        let type_name = self.expect_type_name()?;
        let name = self.cursor.expect_identifier("variable name")?;
        let (ty, default) = self.parse_type_tail(type_name, defaults)?;
        Ok(Declaration { name, ty, default })
    }

    /// Anonymous `<kind> <kind-tail>` used for array elements, map values
    /// and generic wrappers.
    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let type_name = self.expect_type_name()?;
        let (ty, _) = self.parse_type_tail(type_name, Defaults::None)?;
        Ok(ty)
    }

    fn parse_type_tail(
        &mut self,
        type_name: TypeName,
        defaults: Defaults,
    ) -> Result<(TypeSpec, Option<ast::Expression>), ParseError> {
        Ok(match type_name {
            TypeName::Scalar(scalar) => (TypeSpec::Scalar(scalar), self.parse_default(defaults)?),
            TypeName::Ref(kind) => (TypeSpec::Reference(Some(kind)), None),
            TypeName::Reference => {
                let kind = match self.cursor.peek().kind {
                    TokenKind::Type(TypeName::Ref(kind)) if self.cursor.on_same_line() => {
                        self.cursor.advance();
                        Some(kind)
                    }
                    _ => None,
                };
                (TypeSpec::Reference(kind), None)
            }
            TypeName::FileDescriptor => (TypeSpec::File, None),
            TypeName::Array => (TypeSpec::Array(Box::new(self.parse_type_spec()?)), None),
            TypeName::Map => (TypeSpec::Map(Box::new(self.parse_type_spec()?)), None),
            TypeName::Generic => (TypeSpec::Generic(Box::new(self.parse_type_spec()?)), None),
            TypeName::Struct => (TypeSpec::Struct(self.parse_members()?), None),
        })
    }

    fn parse_default(&mut self, defaults: Defaults) -> Result<Option<ast::Expression>, ParseError> {
        let present = match defaults {
            Defaults::Line => self.cursor.on_same_line(),
            Defaults::Group => {
                !self.cursor.check_operator(Operator::Comma)
                    && !self.cursor.check_operator(Operator::RParen)
            }
            Defaults::None => false,
        };
        if present {
            Ok(Some(self.parse_expression()?))
        } else {
            Ok(None)
        }
    }

    /// `( <declaration> {, <declaration>} )`. Each member goes through the
    /// same declaration routine as a top-level variable.
    fn parse_members(&mut self) -> Result<Vec<Declaration>, ParseError> {
        self.cursor.expect_operator(Operator::LParen, "'(' opening the member list")?;
        let mut members: Vec<Declaration> = Vec::new();
        loop {
            let member = self.parse_named_declaration(Defaults::Group)?;
            if members.iter().any(|m| m.name.1 == member.name.1) {
                return Err(ParseError::new(
                    ParseErrorKind::Unexpected {
                        expected: "a new member name".to_string(),
                        found: format!("duplicate member '{}'", member.name.1),
                    },
                    member.name.0,
                ));
            }
            members.push(member);
            if !self.cursor.eat_operator(Operator::Comma) {
                break;
            }
        }
        self.cursor.expect_operator(Operator::RParen, "')' or ','")?;
        Ok(members)
    }

    pub(crate) fn expect_type_name(&mut self) -> Result<TypeName, ParseError> {
        let token = self.cursor.peek().clone();
        match token.kind {
            TokenKind::Type(type_name) => {
                self.cursor.advance();
                Ok(type_name)
            }
            TokenKind::Identifier | TokenKind::Option(_) => Err(ParseError::new(
                ParseErrorKind::UnknownType(token.text),
                token.span,
            )),
            _ => Err(self.cursor.unexpected("type name")),
        }
    }

    /// A scalar type word restricted to `allowed`.
    pub(crate) fn expect_scalar_type(
        &mut self,
        allowed: &[ScalarType],
    ) -> Result<(Span, ScalarType), ParseError> {
        let span = self.cursor.peek().span;
        let found = self.cursor.peek().text.clone();
        match self.expect_type_name()? {
            TypeName::Scalar(scalar) if allowed.contains(&scalar) => Ok((span, scalar)),
            _ => Err(ParseError::new(
                ParseErrorKind::TypeNotAllowed {
                    found,
                    allowed: allowed
                        .iter()
                        .map(|t| t.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                },
                span,
            )),
        }
    }
}
