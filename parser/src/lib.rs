use ast::{Expression, Program};
use tracing::debug;

mod command;
mod cursor;
mod declare;
mod error;
mod expr;
mod lexer;
mod program;
mod table;
mod token;

pub use error::*;
pub use lexer::{scan_fragment, Lexer};
pub use token::*;

/// Result of a recovering parse: every command that could be read, plus the
/// errors of those that could not.
#[derive(Debug, PartialEq)]
pub struct Parsed {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Lex errors abort the parse. Parse errors only drop the offending command.
pub fn parse(source: &str) -> Result<Parsed, LexError> {
    let tokens = tokenize(source)?;
    let mut parser = program::Parser::new(tokens);
    let program = parser.parse_program();
    debug!(
        commands = program.asm.len(),
        errors = parser.errors.len(),
        "parsed script"
    );
    Ok(Parsed {
        program,
        errors: parser.errors,
    })
}

pub fn parse_program(source: &str) -> Result<Program, ParserError> {
    let Parsed { program, errors } = parse(source)?;
    if !errors.is_empty() {
        return Err(ParserError::Source(errors));
    }
    Ok(program)
}

/// Parses `source` as a single expression.
pub fn parse_expression(source: &str) -> Result<Expression, ParserError> {
    let tokens = tokenize(source)?;
    let mut parser = program::Parser::new(tokens);
    let expr = parser
        .parse_expression()
        .map_err(|e| ParserError::Source(vec![e]))?;
    if !parser.cursor.at_eof() {
        let error = parser.cursor.unexpected("end of expression");
        return Err(ParserError::Source(vec![error]));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use ast::{
        Accessor, CommandKind, Declaration, OptionKind, OptionValue, RefKind, ScalarType,
        SelectMode, TypeSpec,
    };
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;

    fn expr(source: &str) -> String {
        parse_expression(source).unwrap().to_string()
    }

    fn commands(source: &str) -> Vec<CommandKind> {
        parse_program(source)
            .unwrap()
            .asm
            .into_iter()
            .map(|c| c.kind)
            .collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        parse(source)
            .unwrap()
            .errors
            .iter()
            .map(|e| format!("{}: {e}", e.span))
            .collect()
    }

    #[test]
    fn precedence_levels() {
        assert_snapshot!(expr("2 + 3 * 4"), @"(+ 2 (* 3 4))");
        assert_snapshot!(expr("(2 + 3) * 4"), @"(* (+ 2 3) 4)");
        assert_snapshot!(expr("1 < 2 AND 3 > 2"), @"(AND (< 1 2) (> 3 2))");
        assert_snapshot!(expr("a OR b && c"), @"(AND (OR a b) c)");
        assert_snapshot!(expr("-x * 2 % 3"), @"(% (* (neg x) 2) 3)");
        assert_snapshot!(expr("10 - 4 - 3"), @"(- (- 10 4) 3)");
    }

    #[test]
    fn relational_chain_folds_left() {
        assert_snapshot!(expr("a < b < c"), @"(< (< a b) c)");
        assert_snapshot!(expr("a <> b != c"), @"(<> (<> a b) c)");
    }

    #[test]
    fn hyphenated_words_split_into_subtraction() {
        assert_snapshot!(expr("WIDTH-OFFSET"), @"(- WIDTH OFFSET)");
        assert_snapshot!(expr("part-a-b"), @"(- (- part a) b)");
        assert_snapshot!(expr("base-2"), @"(- base 2)");
        assert_snapshot!(expr("bolt-m8.prt"), @"bolt-m8.prt");
    }

    #[test]
    fn builtin_calls_and_constants() {
        assert_snapshot!(expr("sin(30) + max(1, 2, 3)"), @"(+ (sin 30) (max 1 2 3))");
        assert_snapshot!(expr(r#"strcmp(name, "M8") == 0"#), @r#"(== (strcmp name "M8") 0)"#);
        assert_snapshot!(expr("PLANE"), @"'PLANE");
        assert_snapshot!(expr("TRUE OR .5 > 2."), @"(OR TRUE (> .5 2.))");
    }

    #[test]
    fn postfix_chains() {
        assert_snapshot!(expr("a[i + 1].m:k"), @"(: (. ([] a (+ i 1)) m) k)");
    }

    #[test]
    fn unknown_function_and_wrong_arity() {
        let err = parse_expression("foo(1)").unwrap_err();
        assert_eq!(
            err,
            ParserError::Source(vec![ParseError::new(
                ParseErrorKind::UnknownFunction("foo".into()),
                ast::Span::new(0, 3, 1, 1),
            )])
        );
        let err = parse_expression("sqrt(1, 2)").unwrap_err();
        assert!(matches!(
            &err,
            ParserError::Source(errors) if matches!(
                &errors[0].kind,
                ParseErrorKind::WrongArgumentCount { found: 2, .. }
            )
        ));
    }

    #[test]
    fn declaration_default_stays_on_its_line() {
        let kinds = commands("DECLARE_VARIABLE INTEGER x\ny = 2\nDECLARE_VARIABLE DOUBLE z 1.5");
        assert_eq!(kinds.len(), 3);
        let CommandKind::DeclareVariable(x) = &kinds[0] else {
            panic!("expected a declaration, got {:?}", kinds[0]);
        };
        assert_eq!(x.default, None);
        let CommandKind::DeclareVariable(z) = &kinds[2] else {
            panic!("expected a declaration, got {:?}", kinds[2]);
        };
        assert_eq!(z.default.as_ref().map(|e| e.to_string()), Some("1.5".into()));
    }

    #[test]
    fn nested_type_specs() {
        let kinds = commands(
            "DECLARE_VARIABLE STRUCT bolt (STRING name \"M8\", ARRAY sizes DOUBLE, REFERENCE axis AXIS)\n\
             DECLARE_VARIABLE MAP table ARRAY INTEGER\n\
             DECLARE_VARIABLE CURVE edge",
        );
        let CommandKind::DeclareVariable(Declaration { ty, .. }) = &kinds[0] else {
            panic!("expected a declaration");
        };
        let TypeSpec::Struct(members) = ty else {
            panic!("expected a struct, got {ty:?}");
        };
        let names: Vec<_> = members.iter().map(|m| m.name.1.as_str()).collect();
        assert_eq!(names, vec!["name", "sizes", "axis"]);
        assert_eq!(
            members[1].ty,
            TypeSpec::Array(Box::new(TypeSpec::Scalar(ScalarType::Double)))
        );
        assert_eq!(members[2].ty, TypeSpec::Reference(Some(RefKind::Axis)));

        let CommandKind::DeclareVariable(map) = &kinds[1] else {
            panic!("expected a declaration");
        };
        assert_eq!(
            map.ty,
            TypeSpec::Map(Box::new(TypeSpec::Array(Box::new(TypeSpec::Scalar(
                ScalarType::Integer
            )))))
        );
        let CommandKind::DeclareVariable(edge) = &kinds[2] else {
            panic!("expected a declaration");
        };
        assert_eq!(edge.ty, TypeSpec::Reference(Some(RefKind::Curve)));
    }

    #[test]
    fn assignment_targets() {
        let kinds = commands("a[2] = 1\ns.m = 2\nm:\"k\" = 3");
        let paths: Vec<_> = kinds
            .iter()
            .map(|k| match k {
                CommandKind::Assignment(a) => (a.target.root.1.clone(), a.target.path.clone()),
                other => panic!("expected an assignment, got {other:?}"),
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                ("a".to_string(), vec![Accessor::Index(ast::Expression::integer(2))]),
                ("s".to_string(), vec![Accessor::Member("m".into())]),
                (
                    "m".to_string(),
                    vec![Accessor::Key(ast::Expression::StringLiteral("k".into()))]
                ),
            ]
        );
    }

    #[test]
    fn widget_options() {
        let kinds = commands(
            "USER_INPUT_PARAM DOUBLE len MIN_VALUE 0 MAX_VALUE lim * 2 DECIMAL_PLACES 3 REQUIRED ON_PICTURE 10 20",
        );
        let CommandKind::UserInputParam(widget) = &kinds[0] else {
            panic!("expected an input widget");
        };
        assert_eq!(widget.ty, ScalarType::Double);
        assert_eq!(widget.name.1, "len");
        assert_eq!(widget.options.integer(OptionKind::DecimalPlaces), Some(3));
        assert!(widget.options.has(OptionKind::Required));
        assert_eq!(
            widget
                .options
                .expression(OptionKind::MaxValue)
                .map(|e| e.to_string()),
            Some("(* lim 2)".into())
        );
        assert!(matches!(
            widget.options.get(OptionKind::OnPicture).map(|o| &o.value),
            Some(OptionValue::Point(..))
        ));
    }

    #[test]
    fn selection_and_radio_commands() {
        let kinds = commands(
            "USER_SELECT_MULTIPLE_OPTIONAL SURFACE QUILT faces MAX_SEL 4\n\
             RADIOBUTTON_PARAM STRING mode \"fast\" \"fine\" DISPLAY_ORDER 2",
        );
        let CommandKind::UserSelect(select) = &kinds[0] else {
            panic!("expected a selection");
        };
        assert_eq!(select.mode, SelectMode::MultipleOptional);
        assert_eq!(select.kinds, vec![RefKind::Surface, RefKind::Quilt]);
        assert_eq!(select.options.integer(OptionKind::MaxSel), Some(4));
        let CommandKind::RadiobuttonParam(radio) = &kinds[1] else {
            panic!("expected a radio button");
        };
        assert_eq!(radio.choices.len(), 2);
        assert_eq!(radio.options.integer(OptionKind::DisplayOrder), Some(2));
    }

    #[test]
    fn if_chain_and_node_ids() {
        let program = parse_program(
            "IF a > 1\n  SHOW_PARAM INTEGER a\nELSE_IF a == 0\n  x = 1\nELSE\n  x = 2\nEND_IF\nPRINT x",
        )
        .unwrap();
        let CommandKind::If(chain) = &program.asm[0].kind else {
            panic!("expected IF");
        };
        assert_eq!(chain.branches.len(), 2);
        assert_eq!(chain.else_body.as_ref().map(Vec::len), Some(1));
        let ids: Vec<u32> = [
            program.asm[0].id,
            chain.branches[0].body[0].id,
            chain.branches[1].body[0].id,
            chain.else_body.as_ref().unwrap()[0].id,
            program.asm[1].id,
        ]
        .iter()
        .map(|id| id.0)
        .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sections_are_collected() {
        let program = parse_program(
            "DECLARE_VARIABLE INTEGER n 1\n\
             BEGIN_GUI_DESCR\nCHECKBOX_PARAM BOOL flag\nEND_GUI_DESCR\n\
             BEGIN_ASM_DESCR\nPRINT n\nEND_ASM_DESCR\n\
             BEGIN_TAB_DESCR\nEND_TAB_DESCR",
        )
        .unwrap();
        assert_eq!(program.asm.len(), 2);
        assert_eq!(program.gui.map(|b| b.commands.len()), Some(1));
        assert_eq!(program.tab.map(|b| b.commands.len()), Some(0));
    }

    #[test]
    fn duplicate_gui_section() {
        assert_eq!(
            error_messages("BEGIN_GUI_DESCR\nEND_GUI_DESCR\nBEGIN_GUI_DESCR\nEND_GUI_DESCR"),
            vec!["3:1: section BEGIN_GUI_DESCR may appear only once"]
        );
    }

    #[test]
    fn table_rows_are_checked_against_the_header() {
        let parsed = parse(
            "BEGIN_TABLE sizes \"Sizes\" TABLE_HEIGHT 4\n\
             name\tlen\tok\n\
             STRING\tINTEGER\tBOOL\n\
             \"a\"\t10\tTRUE\tEXTRA\n\
             \"b\"\t20\n\
             END_TABLE",
        )
        .unwrap();
        let messages: Vec<_> = parsed.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec!["table row has 4 columns but the header declares 3"]
        );
        let CommandKind::Table(table) = &parsed.program.asm[0].kind else {
            panic!("expected a table");
        };
        assert_eq!(table.name.1, "sizes");
        assert_eq!(table.options.integer(OptionKind::TableHeight), Some(4));
        let columns: Vec<_> = table.columns.iter().map(|c| (c.name.as_str(), c.ty)).collect();
        assert_eq!(
            columns,
            vec![
                ("name", ScalarType::String),
                ("len", ScalarType::Integer),
                ("ok", ScalarType::Bool),
            ]
        );
        assert_eq!(table.rows.len(), 1);
        let cells: Vec<_> = table.rows[0]
            .cells
            .iter()
            .map(|c| c.as_ref().map(|e| e.to_string()))
            .collect();
        assert_eq!(cells, vec![Some("\"b\"".into()), Some("20".into()), None]);
    }

    #[test]
    fn unparsable_string_cells_keep_their_text() {
        let program = parse_program(
            "BEGIN_TABLE t\nlabel   n\nSTRING  INTEGER\nM8x(  1\nEND_TABLE",
        )
        .unwrap();
        let CommandKind::Table(table) = &program.asm[0].kind else {
            panic!("expected a table");
        };
        assert_eq!(
            table.rows[0].cells[0],
            Some(ast::Expression::StringLiteral("M8x(".into()))
        );
    }

    #[test]
    fn unterminated_table() {
        assert_eq!(
            error_messages("BEGIN_TABLE t\na\nINTEGER\n1"),
            vec!["5:1: missing closing END_TABLE"]
        );
    }

    #[test]
    fn recovery_resumes_at_next_command() {
        let parsed = parse("x = = 1\nDECLARE_VARIABLE INTEGER y 2\ny = 3 4\nz = 5").unwrap();
        let messages: Vec<_> = parsed.errors.iter().map(|e| format!("{}: {e}", e.span)).collect();
        assert_eq!(
            messages,
            vec![
                "1:5: expected expression, found '='",
                "3:7: expected end of line, found '4'",
            ]
        );
        assert_eq!(parsed.program.asm.len(), 2);
        assert!(matches!(
            parsed.program.asm[1].kind,
            CommandKind::Assignment(_)
        ));
    }

    #[test]
    fn unknown_option_word() {
        assert_eq!(
            error_messages("SHOW_PARAM DOUBLE w COLOUR"),
            vec!["1:21: unknown option 'COLOUR'"]
        );
    }

    #[test]
    fn widget_type_restrictions() {
        assert_eq!(
            error_messages("CHECKBOX_PARAM DOUBLE w"),
            vec!["1:16: 'DOUBLE' is not allowed here, expected one of: INTEGER, BOOL"]
        );
        assert_eq!(
            error_messages("DECLARE_VARIABLE LONG w"),
            vec!["1:18: unknown type 'LONG'"]
        );
    }

    #[test]
    fn missing_end_if() {
        assert_eq!(
            error_messages("IF a\nx = 1\n"),
            vec!["3:1: missing closing END_IF"]
        );
    }

    #[test]
    fn lex_errors_are_fatal() {
        assert!(matches!(
            parse("x = \"open"),
            Err(LexError::UnterminatedString { .. })
        ));
        assert!(matches!(
            parse_program("x = 1 $"),
            Err(ParserError::Lex(LexError::UnexpectedCharacter { ch: '$', .. }))
        ));
    }
}
