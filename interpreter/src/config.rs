/// Unit the trigonometric builtins work in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    pub(crate) fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_radians(),
            AngleUnit::Radians => angle,
        }
    }

    pub(crate) fn from_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_degrees(),
            AngleUnit::Radians => angle,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub angle_unit: AngleUnit,
    /// Start the symbol table with `PI` and `E`.
    pub seed_constants: bool,
    /// How many references a multiple selection may hold when the script
    /// gives no `MAX_SEL`. `None` means no limit.
    pub selection_limit: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Degrees,
            seed_constants: true,
            selection_limit: None,
        }
    }
}
