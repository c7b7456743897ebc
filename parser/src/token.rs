use ast::{OptionKind, RefKind, ScalarType, Span};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    BeginAsmDescr,
    EndAsmDescr,
    BeginGuiDescr,
    EndGuiDescr,
    BeginTabDescr,
    EndTabDescr,
    DeclareVariable,
    If,
    ElseIf,
    Else,
    EndIf,
    ShowParam,
    CheckboxParam,
    UserInputParam,
    RadiobuttonParam,
    UserSelect,
    UserSelectOptional,
    UserSelectMultiple,
    UserSelectMultipleOptional,
    GlobalPicture,
    SubPicture,
    BeginTable,
    EndTable,
    InvalidateParam,
    MeasureDistance,
    MeasureLength,
    SearchMdlRef,
    SearchMdlRefs,
    BeginCatchError,
    EndCatchError,
    ConfigElem,
    Print,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("BEGIN_ASM_DESCR", Keyword::BeginAsmDescr),
    ("END_ASM_DESCR", Keyword::EndAsmDescr),
    ("BEGIN_GUI_DESCR", Keyword::BeginGuiDescr),
    ("END_GUI_DESCR", Keyword::EndGuiDescr),
    ("BEGIN_TAB_DESCR", Keyword::BeginTabDescr),
    ("END_TAB_DESCR", Keyword::EndTabDescr),
    ("DECLARE_VARIABLE", Keyword::DeclareVariable),
    ("IF", Keyword::If),
    ("ELSE_IF", Keyword::ElseIf),
    ("ELSE", Keyword::Else),
    ("END_IF", Keyword::EndIf),
    ("SHOW_PARAM", Keyword::ShowParam),
    ("CHECKBOX_PARAM", Keyword::CheckboxParam),
    ("USER_INPUT_PARAM", Keyword::UserInputParam),
    ("RADIOBUTTON_PARAM", Keyword::RadiobuttonParam),
    ("USER_SELECT", Keyword::UserSelect),
    ("USER_SELECT_OPTIONAL", Keyword::UserSelectOptional),
    ("USER_SELECT_MULTIPLE", Keyword::UserSelectMultiple),
    ("USER_SELECT_MULTIPLE_OPTIONAL", Keyword::UserSelectMultipleOptional),
    ("GLOBAL_PICTURE", Keyword::GlobalPicture),
    ("SUB_PICTURE", Keyword::SubPicture),
    ("BEGIN_TABLE", Keyword::BeginTable),
    ("END_TABLE", Keyword::EndTable),
    ("INVALIDATE_PARAM", Keyword::InvalidateParam),
    ("MEASURE_DISTANCE", Keyword::MeasureDistance),
    ("MEASURE_LENGTH", Keyword::MeasureLength),
    ("SEARCH_MDL_REF", Keyword::SearchMdlRef),
    ("SEARCH_MDL_REFS", Keyword::SearchMdlRefs),
    ("BEGIN_CATCH_ERROR", Keyword::BeginCatchError),
    ("END_CATCH_ERROR", Keyword::EndCatchError),
    ("CONFIG_ELEM", Keyword::ConfigElem),
    ("PRINT", Keyword::Print),
];

impl Keyword {
    pub fn from_name(name: &str) -> Option<Self> {
        KEYWORDS.iter().find(|(n, _)| *n == name).map(|(_, k)| *k)
    }

    pub fn name(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, k)| *k == self)
            .map_or("?", |(n, _)| n)
    }

    /// Keywords that open or close a section.
    pub fn is_section_delimiter(self) -> bool {
        matches!(
            self,
            Keyword::BeginAsmDescr
                | Keyword::EndAsmDescr
                | Keyword::BeginGuiDescr
                | Keyword::EndGuiDescr
                | Keyword::BeginTabDescr
                | Keyword::EndTabDescr
        )
    }

    /// Keywords that continue or close a construct opened earlier.
    pub fn is_continuation(self) -> bool {
        matches!(
            self,
            Keyword::ElseIf
                | Keyword::Else
                | Keyword::EndIf
                | Keyword::EndTable
                | Keyword::EndCatchError
        )
    }
}

/// Type words: value kinds usable in declarations plus the reference kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeName {
    Scalar(ScalarType),
    Reference,
    FileDescriptor,
    Array,
    Map,
    Struct,
    Generic,
    Ref(RefKind),
}

impl TypeName {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(scalar) = ScalarType::from_name(name) {
            return Some(TypeName::Scalar(scalar));
        }
        if let Some(kind) = RefKind::from_name(name) {
            return Some(TypeName::Ref(kind));
        }
        Some(match name {
            "REFERENCE" => TypeName::Reference,
            "FILE_DESCRIPTOR" => TypeName::FileDescriptor,
            "ARRAY" => TypeName::Array,
            "MAP" => TypeName::Map,
            "STRUCT" => TypeName::Struct,
            "GENERIC" => TypeName::Generic,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            "%" => Operator::Percent,
            "=" => Operator::Assign,
            "==" => Operator::Equal,
            "<>" | "!=" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterEqual,
            "&&" | "AND" => Operator::And,
            "||" | "OR" => Operator::Or,
            "(" => Operator::LParen,
            ")" => Operator::RParen,
            "[" => Operator::LBracket,
            "]" => Operator::RBracket,
            "," => Operator::Comma,
            ":" => Operator::Colon,
            "." => Operator::Dot,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Double(f64),
    String(String),
    Bool(bool),
    Identifier,
    Keyword(Keyword),
    Type(TypeName),
    Option(OptionKind),
    Operator(Operator),
    /// Raw cell text of a table row.
    Field,
    RowEnd,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::RowEnd => "end of table row".to_string(),
            TokenKind::String(_) => format!("string {}", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Classifies a scanned bare word. Keywords win over type names, type names
/// over options; anything left is an identifier.
pub fn classify_word(word: &str) -> TokenKind {
    match word {
        "AND" => return TokenKind::Operator(Operator::And),
        "OR" => return TokenKind::Operator(Operator::Or),
        "TRUE" => return TokenKind::Bool(true),
        "FALSE" => return TokenKind::Bool(false),
        _ => {}
    }
    if let Some(keyword) = Keyword::from_name(word) {
        TokenKind::Keyword(keyword)
    } else if let Some(ty) = TypeName::from_name(word) {
        TokenKind::Type(ty)
    } else if let Some(option) = OptionKind::from_name(word) {
        TokenKind::Option(option)
    } else {
        TokenKind::Identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_order() {
        assert_eq!(classify_word("IF"), TokenKind::Keyword(Keyword::If));
        assert_eq!(
            classify_word("DOUBLE"),
            TokenKind::Type(TypeName::Scalar(ScalarType::Double))
        );
        assert_eq!(
            classify_word("PLANE"),
            TokenKind::Type(TypeName::Ref(RefKind::Plane))
        );
        assert_eq!(
            classify_word("REQUIRED"),
            TokenKind::Option(OptionKind::Required)
        );
        assert_eq!(classify_word("WIDTH_1"), TokenKind::Identifier);
        assert_eq!(classify_word("if"), TokenKind::Identifier);
    }

    #[test]
    fn keyword_names_round_trip() {
        for (name, keyword) in KEYWORDS {
            assert_eq!(keyword.name(), *name);
        }
    }
}
