use serde::{Deserialize, Serialize};

use super::values::PortValue;

/// Enumerated choice types that an upstream number can drive.
pub trait PortValueEnum: Copy + Default + PartialEq + 'static {
    const CHOICES: &'static [Self];

    fn into_port_value(self) -> PortValue;

    fn as_str(&self) -> &'static str;

    /// Truncates toward zero and clamps into the case range.
    fn from_number(n: f64) -> Self {
        let last = Self::CHOICES.len().saturating_sub(1);
        let index = if n.is_nan() || n <= 0.0 {
            0
        } else {
            (n.trunc() as usize).min(last)
        };
        Self::CHOICES.get(index).copied().unwrap_or_default()
    }

    fn index(&self) -> usize {
        Self::CHOICES
            .iter()
            .position(|choice| choice == self)
            .unwrap_or(0)
    }
}

macro_rules! port_value_enum {
    ($(#[$meta:meta])* $name:ident => $variant:ident { $($case:ident = $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            #[default]
            $($case),+
        }

        impl PortValueEnum for $name {
            const CHOICES: &'static [Self] = &[$($name::$case),+];

            fn into_port_value(self) -> PortValue {
                PortValue::$variant(self)
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$case => $label),+
                }
            }
        }
    };
}

port_value_enum!(
    /// Which point of a layer sits at its position.
    Anchoring => Anchoring {
        TopLeft = "topLeft",
        TopCenter = "topCenter",
        TopRight = "topRight",
        CenterLeft = "centerLeft",
        Center = "center",
        CenterRight = "centerRight",
        BottomLeft = "bottomLeft",
        BottomCenter = "bottomCenter",
        BottomRight = "bottomRight",
    }
);

port_value_enum!(BlendMode => BlendMode {
    Normal = "normal",
    Multiply = "multiply",
    Screen = "screen",
    Overlay = "overlay",
    Darken = "darken",
    Lighten = "lighten",
    ColorDodge = "colorDodge",
    ColorBurn = "colorBurn",
    SoftLight = "softLight",
    HardLight = "hardLight",
    Difference = "difference",
    Exclusion = "exclusion",
    Hue = "hue",
    Saturation = "saturation",
    Color = "color",
    Luminosity = "luminosity",
});

port_value_enum!(TextAlignment => TextAlignment {
    Left = "left",
    Center = "center",
    Right = "right",
    Justify = "justify",
});

port_value_enum!(TextVerticalAlignment => TextVerticalAlignment {
    Top = "top",
    Center = "center",
    Bottom = "bottom",
});

port_value_enum!(
    /// When a delay node holds a new value back.
    DelayStyle => DelayStyle {
        Always = "always",
        Increasing = "increasing",
        Decreasing = "decreasing",
    }
);

port_value_enum!(LightType => LightType {
    Ambient = "ambient",
    Omni = "omni",
    Directional = "directional",
    Spot = "spot",
});

port_value_enum!(AnimationCurve => AnimationCurve {
    Linear = "linear",
    QuadraticIn = "quadraticIn",
    QuadraticOut = "quadraticOut",
    QuadraticInOut = "quadraticInOut",
    SinusoidalIn = "sinusoidalIn",
    SinusoidalOut = "sinusoidalOut",
    SinusoidalInOut = "sinusoidalInOut",
    ExponentialIn = "exponentialIn",
    ExponentialOut = "exponentialOut",
    ExponentialInOut = "exponentialInOut",
});

port_value_enum!(FitStyle => FitStyle {
    Fill = "fill",
    Fit = "fit",
    Stretch = "stretch",
});

port_value_enum!(ShapeCoordinates => ShapeCoordinates {
    Relative = "relative",
    Absolute = "absolute",
});

port_value_enum!(NetworkRequestType => NetworkRequestType {
    Get = "get",
    Post = "post",
});

port_value_enum!(Orientation => Orientation {
    None = "none",
    Horizontal = "horizontal",
    Vertical = "vertical",
    Grid = "grid",
});

port_value_enum!(LayerStroke => LayerStroke {
    None = "none",
    Inside = "inside",
    Outside = "outside",
});

impl AnimationCurve {
    /// Maps linear progress in `[0, 1]` onto the curve.
    pub fn ease(&self, progress: f64) -> f64 {
        use std::f64::consts::PI;

        let x = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        match self {
            AnimationCurve::Linear => x,
            AnimationCurve::QuadraticIn => x * x,
            AnimationCurve::QuadraticOut => 1.0 - (1.0 - x).powi(2),
            AnimationCurve::QuadraticInOut => {
                if x < 0.5 {
                    2.0 * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
                }
            }
            AnimationCurve::SinusoidalIn => 1.0 - (x * PI / 2.0).cos(),
            AnimationCurve::SinusoidalOut => (x * PI / 2.0).sin(),
            AnimationCurve::SinusoidalInOut => -((PI * x).cos() - 1.0) / 2.0,
            AnimationCurve::ExponentialIn => {
                if x == 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * x - 10.0)
                }
            }
            AnimationCurve::ExponentialOut => {
                if x == 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * x)
                }
            }
            AnimationCurve::ExponentialInOut => {
                if x == 0.0 || x == 1.0 {
                    x
                } else if x < 0.5 {
                    2f64.powf(20.0 * x - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * x + 10.0)) / 2.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_number_clamps_into_case_range() {
        assert_eq!(DelayStyle::from_number(-3.0), DelayStyle::Always);
        assert_eq!(DelayStyle::from_number(1.9), DelayStyle::Increasing);
        assert_eq!(DelayStyle::from_number(2.0), DelayStyle::Decreasing);
        assert_eq!(DelayStyle::from_number(99.0), DelayStyle::Decreasing);
        assert_eq!(DelayStyle::from_number(f64::NAN), DelayStyle::Always);
    }

    #[test]
    fn index_matches_choice_position() {
        for (i, choice) in BlendMode::CHOICES.iter().enumerate() {
            assert_eq!(choice.index(), i);
            assert_eq!(BlendMode::from_number(i as f64), *choice);
        }
    }

    #[test]
    fn every_curve_starts_at_zero_and_ends_at_one() {
        for curve in AnimationCurve::CHOICES {
            assert!(curve.ease(0.0).abs() < 1e-9, "{curve:?} at 0");
            assert!((curve.ease(1.0) - 1.0).abs() < 1e-9, "{curve:?} at 1");
        }
    }
}
