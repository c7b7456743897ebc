use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Integer,
    Double,
    String,
    Bool,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Integer => "INTEGER",
            ScalarType::Double => "DOUBLE",
            ScalarType::String => "STRING",
            ScalarType::Bool => "BOOL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "INTEGER" => ScalarType::Integer,
            "DOUBLE" => ScalarType::Double,
            "STRING" => ScalarType::String,
            "BOOL" => ScalarType::Bool,
            _ => return None,
        })
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinds of model geometry a reference can point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    Axis,
    Csys,
    Curve,
    Edge,
    Surface,
    Plane,
    Point,
    Quilt,
    Feature,
    Component,
    Part,
    Assembly,
}

impl RefKind {
    pub const ALL: [RefKind; 12] = [
        RefKind::Axis,
        RefKind::Csys,
        RefKind::Curve,
        RefKind::Edge,
        RefKind::Surface,
        RefKind::Plane,
        RefKind::Point,
        RefKind::Quilt,
        RefKind::Feature,
        RefKind::Component,
        RefKind::Part,
        RefKind::Assembly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RefKind::Axis => "AXIS",
            RefKind::Csys => "CSYS",
            RefKind::Curve => "CURVE",
            RefKind::Edge => "EDGE",
            RefKind::Surface => "SURFACE",
            RefKind::Plane => "PLANE",
            RefKind::Point => "POINT",
            RefKind::Quilt => "QUILT",
            RefKind::Feature => "FEATURE",
            RefKind::Component => "COMPONENT",
            RefKind::Part => "PART",
            RefKind::Assembly => "ASSEMBLY",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl Display for RefKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectMode {
    Single,
    Optional,
    Multiple,
    MultipleOptional,
}

impl SelectMode {
    pub fn is_optional(self) -> bool {
        matches!(self, SelectMode::Optional | SelectMode::MultipleOptional)
    }

    pub fn is_multiple(self) -> bool {
        matches!(self, SelectMode::Multiple | SelectMode::MultipleOptional)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Asm,
    Gui,
    Tab,
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Section::Asm => f.write_str("ASM"),
            Section::Gui => f.write_str("GUI"),
            Section::Tab => f.write_str("TAB"),
        }
    }
}

/// What an option word expects after it on the same line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionArity {
    Flag,
    Integer,
    Expression,
    Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionKind {
    OnPicture,
    MinValue,
    MaxValue,
    DecimalPlaces,
    DisplayOrder,
    Width,
    Height,
    TableHeight,
    MaxSel,
    SelString,
    FilterColumn,
    Tooltip,
    Image,
    FilterString,
    Required,
    NoUpdate,
    NoAutosel,
    Autosel,
    ShowAutosel,
    InvalidateOnUnselect,
    FilterRmb,
    OrientationHorizontal,
    ScrollFrame,
    Resizeable,
    NoFocus,
}

impl OptionKind {
    pub const ALL: [OptionKind; 25] = [
        OptionKind::OnPicture,
        OptionKind::MinValue,
        OptionKind::MaxValue,
        OptionKind::DecimalPlaces,
        OptionKind::DisplayOrder,
        OptionKind::Width,
        OptionKind::Height,
        OptionKind::TableHeight,
        OptionKind::MaxSel,
        OptionKind::SelString,
        OptionKind::FilterColumn,
        OptionKind::Tooltip,
        OptionKind::Image,
        OptionKind::FilterString,
        OptionKind::Required,
        OptionKind::NoUpdate,
        OptionKind::NoAutosel,
        OptionKind::Autosel,
        OptionKind::ShowAutosel,
        OptionKind::InvalidateOnUnselect,
        OptionKind::FilterRmb,
        OptionKind::OrientationHorizontal,
        OptionKind::ScrollFrame,
        OptionKind::Resizeable,
        OptionKind::NoFocus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OptionKind::OnPicture => "ON_PICTURE",
            OptionKind::MinValue => "MIN_VALUE",
            OptionKind::MaxValue => "MAX_VALUE",
            OptionKind::DecimalPlaces => "DECIMAL_PLACES",
            OptionKind::DisplayOrder => "DISPLAY_ORDER",
            OptionKind::Width => "WIDTH",
            OptionKind::Height => "HEIGHT",
            OptionKind::TableHeight => "TABLE_HEIGHT",
            OptionKind::MaxSel => "MAX_SEL",
            OptionKind::SelString => "SEL_STRING",
            OptionKind::FilterColumn => "FILTER_COLUMN",
            OptionKind::Tooltip => "TOOLTIP",
            OptionKind::Image => "IMAGE",
            OptionKind::FilterString => "FILTER_STRING",
            OptionKind::Required => "REQUIRED",
            OptionKind::NoUpdate => "NO_UPDATE",
            OptionKind::NoAutosel => "NO_AUTOSEL",
            OptionKind::Autosel => "AUTOSEL",
            OptionKind::ShowAutosel => "SHOW_AUTOSEL",
            OptionKind::InvalidateOnUnselect => "INVALIDATE_ON_UNSELECT",
            OptionKind::FilterRmb => "FILTER_RMB",
            OptionKind::OrientationHorizontal => "ORIENTATION_HORIZONTAL",
            OptionKind::ScrollFrame => "SCROLL_FRAME",
            OptionKind::Resizeable => "RESIZEABLE",
            OptionKind::NoFocus => "NO_FOCUS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn arity(self) -> OptionArity {
        match self {
            OptionKind::OnPicture => OptionArity::Point,
            OptionKind::MinValue
            | OptionKind::MaxValue
            | OptionKind::Tooltip
            | OptionKind::Image
            | OptionKind::FilterString => OptionArity::Expression,
            OptionKind::DecimalPlaces
            | OptionKind::DisplayOrder
            | OptionKind::Width
            | OptionKind::Height
            | OptionKind::TableHeight
            | OptionKind::MaxSel
            | OptionKind::SelString
            | OptionKind::FilterColumn => OptionArity::Integer,
            _ => OptionArity::Flag,
        }
    }
}

impl Display for OptionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
