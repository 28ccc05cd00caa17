use log::debug;

use crate::config::*;

/// The viridis-like gradient used for the published counts.
pub const GRADIENT: [&str; 3] = ["#440154", "#21918c", "#fde725"];
/// Fill color of the countries without a published count.
pub const WITHHELD_COLOR: &str = "#404040";
pub const WITHHELD_OUTLINE: &str = "#303030";
pub const PUBLISHED_OUTLINE: &str = "gray";

/// The smallest count on the scale.
pub const MIN_EDITORS: u64 = 1;
/// The upper bound of the scale when a request has no positive count.
pub const DEFAULT_MAX_EDITORS: u64 = 100;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb`.
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let h = s.strip_prefix('#')?;
        if h.len() != 6 || !h.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
        Some(Rgb(byte(0)?, byte(2)?, byte(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn floats(&self) -> [f64; 3] {
        [
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0,
        ]
    }
}

/// A piecewise linear gradient over `[vmin, vmax]`, the stops being evenly
/// spaced. Values outside the range take the color of the closest end.
#[derive(PartialEq, Debug, Clone)]
pub struct LinearColormap {
    index: Vec<f64>,
    colors: Vec<[f64; 3]>,
}

impl LinearColormap {
    /// `colors` must hold at least two `#rrggbb` entries.
    pub fn new(colors: &[&str], vmin: f64, vmax: f64) -> Option<LinearColormap> {
        if colors.len() < 2 || vmax <= vmin {
            return None;
        }
        let parsed: Option<Vec<[f64; 3]>> = colors
            .iter()
            .map(|c| Rgb::from_hex(c).map(|rgb| rgb.floats()))
            .collect();
        let n = colors.len();
        let index = (0..n)
            .map(|i| vmin + (vmax - vmin) * (i as f64) / ((n - 1) as f64))
            .collect();
        Some(LinearColormap {
            index,
            colors: parsed?,
        })
    }

    pub fn color_at(&self, x: f64) -> Rgb {
        let n = self.index.len();
        // NaN compares false everywhere and ends up on the first stop.
        let floats = if x.is_nan() || x <= self.index[0] {
            self.colors[0]
        } else if x >= self.index[n - 1] {
            self.colors[n - 1]
        } else {
            let i = self.index.iter().filter(|u| **u < x).count();
            let p = (x - self.index[i - 1]) / (self.index[i] - self.index[i - 1]);
            let (a, b) = (self.colors[i - 1], self.colors[i]);
            [
                (1.0 - p) * a[0] + p * b[0],
                (1.0 - p) * a[1] + p * b[1],
                (1.0 - p) * a[2] + p * b[2],
            ]
        };
        let to_byte = |u: f64| (u * 255.9999) as u8;
        Rgb(to_byte(floats[0]), to_byte(floats[1]), to_byte(floats[2]))
    }
}

/// Maps editor counts to colors on a log10 scale between [`MIN_EDITORS`] and a
/// per-request maximum.
///
/// The scale only depends on its maximum: two requests with the same data get
/// the same colors.
#[derive(PartialEq, Debug, Clone)]
pub struct LogColorScale {
    max_editors: u64,
    colormap: LinearColormap,
}

impl LogColorScale {
    /// A scale whose maximum is `max_editors` rounded up to the next multiple
    /// of 100.
    pub fn new(max_editors: u64) -> LogColorScale {
        let rounded = max_editors.div_ceil(100).max(1) * 100;
        let colormap = match LinearColormap::new(&GRADIENT, 0.0, 1.0) {
            Some(c) => c,
            None => unreachable!("the builtin gradient is valid"),
        };
        LogColorScale {
            max_editors: rounded,
            colormap,
        }
    }

    /// The scale for one request: the maximum is the largest positive count.
    pub fn for_counts<'a, I>(counts: I) -> LogColorScale
    where
        I: IntoIterator<Item = &'a DisplayEditors>,
    {
        let max = counts
            .into_iter()
            .filter_map(|d| match d {
                DisplayEditors::Count(x) if *x > 0 => Some(*x),
                _ => None,
            })
            .max()
            .unwrap_or(DEFAULT_MAX_EDITORS);
        let scale = LogColorScale::new(max);
        debug!(
            "LogColorScale::for_counts: max count {} -> scale max {}",
            max, scale.max_editors
        );
        scale
    }

    pub fn min_editors(&self) -> u64 {
        MIN_EDITORS
    }

    pub fn max_editors(&self) -> u64 {
        self.max_editors
    }

    /// The position of a count on the scale. Zero is below the scale (`-inf`).
    pub fn normalize(&self, editors: u64) -> f64 {
        let log_min = (MIN_EDITORS as f64).log10();
        let log_max = (self.max_editors as f64).log10();
        ((editors as f64).log10() - log_min) / (log_max - log_min)
    }

    /// The fill color of a displayed value.
    pub fn color(&self, editors: &DisplayEditors) -> String {
        match editors {
            DisplayEditors::Withheld(_) => WITHHELD_COLOR.to_string(),
            DisplayEditors::Count(x) => self.colormap.color_at(self.normalize(*x)).to_hex(),
        }
    }

    pub fn outline(&self, editors: &DisplayEditors) -> &'static str {
        if editors.is_withheld() {
            WITHHELD_OUTLINE
        } else {
            PUBLISHED_OUTLINE
        }
    }

    /// `n` values evenly spaced on the log scale, from the minimum to the
    /// maximum included.
    pub fn ticks(&self, n: usize) -> Vec<f64> {
        let log_min = (MIN_EDITORS as f64).log10();
        let log_max = (self.max_editors as f64).log10();
        match n {
            0 => vec![],
            1 => vec![MIN_EDITORS as f64],
            _ => (0..n)
                .map(|i| {
                    let t = log_min + (log_max - log_min) * (i as f64) / ((n - 1) as f64);
                    10f64.powf(t)
                })
                .collect(),
        }
    }
}
