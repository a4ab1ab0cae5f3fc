use std::fmt;
use std::str::FromStr;

use crate::foundation::core::Color;
use crate::foundation::error::TileReelError;
use crate::source::FrameSource;
use crate::source::procedural::{
    BouncingBall, Checkerboard, ColorCycle, Gradient, Noise, Plasma, Solid, Stripes,
};

/// Built-in named effects, as exposed to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Plasma,
    Noise,
    ColorCycle,
    Checkerboard,
    Stripes,
    Ball,
    Gradient,
    VerticalGradient,
    Solid,
}

impl Effect {
    pub const ALL: [Self; 9] = [
        Self::Plasma,
        Self::Noise,
        Self::ColorCycle,
        Self::Checkerboard,
        Self::Stripes,
        Self::Ball,
        Self::Gradient,
        Self::VerticalGradient,
        Self::Solid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Plasma => "plasma",
            Self::Noise => "noise",
            Self::ColorCycle => "colorcycle",
            Self::Checkerboard => "checkerboard",
            Self::Stripes => "stripes",
            Self::Ball => "ball",
            Self::Gradient => "gradient",
            Self::VerticalGradient => "vgradient",
            Self::Solid => "solid",
        }
    }

    /// Comma-separated canonical names, for help and error text.
    pub fn catalog() -> String {
        Self::ALL
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fresh source instance with the effect's default parameters.
    pub fn build(self) -> Box<dyn FrameSource> {
        match self {
            Self::Plasma => Box::new(Plasma::default()),
            Self::Noise => Box::new(Noise),
            Self::ColorCycle => Box::new(ColorCycle::default()),
            Self::Checkerboard => Box::new(Checkerboard::default()),
            Self::Stripes => Box::new(Stripes::default()),
            Self::Ball => Box::new(BouncingBall::default()),
            Self::Gradient => Box::new(Gradient::horizontal(Color::BLUE, Color::RED)),
            Self::VerticalGradient => Box::new(Gradient::vertical(Color::BLUE, Color::RED)),
            Self::Solid => Box::new(Solid {
                color: Color::WHITE,
            }),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = TileReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let effect = match s.to_ascii_lowercase().as_str() {
            "plasma" => Self::Plasma,
            "noise" | "static" => Self::Noise,
            "colorcycle" | "rainbow" => Self::ColorCycle,
            "checkerboard" | "checker" => Self::Checkerboard,
            "stripes" => Self::Stripes,
            "ball" | "bounce" => Self::Ball,
            "gradient" => Self::Gradient,
            "vgradient" => Self::VerticalGradient,
            "solid" => Self::Solid,
            _ => {
                return Err(TileReelError::config(format!(
                    "unknown effect '{s}'; available: {}",
                    Self::catalog()
                )));
            }
        };
        Ok(effect)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/effect.rs"]
mod tests;
