// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Chart construction utilities on top of `egui_plot`.
//!
//! Charts are described by a [`ChartSpec`] and rendered into any `egui` Ui.
//! Caller-provided [`ChartOptions`] are merged over fixed defaults
//! (`responsive: true`, `maintain_aspect_ratio: false`); caller values win on
//! collision.

use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

/// Width used when a chart opts out of responsive sizing.
const FIXED_WIDTH: f32 = 480.0;

/// Width-to-height ratio used when a chart maintains aspect ratio.
const VIEW_ASPECT: f32 = 2.0;

/// Supported chart types.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
}

/// One named series of (x, y) points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

impl ChartSeries {
    /// Create a series from y-values at consecutive integer x positions.
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| [i as f64, *v])
                .collect(),
        }
    }
}

/// The data a chart renders: series plus optional categorical x labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub series: Vec<ChartSeries>,
    /// Labels for integer x positions (bar categories). Positions without a
    /// label fall back to the numeric value.
    pub x_labels: Vec<String>,
}

/// Caller-tunable chart options. Unset fields take the fixed defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChartOptions {
    /// Fill the available width instead of a fixed one.
    pub responsive: Option<bool>,
    /// Keep a fixed width-to-height ratio instead of a fixed height.
    pub maintain_aspect_ratio: Option<bool>,
    /// Chart height in points (ignored when maintaining aspect ratio).
    pub height: Option<f32>,
    /// Show the series legend.
    pub show_legend: Option<bool>,
}

/// Options after merging caller values over the defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub height: f32,
    pub show_legend: bool,
}

impl Default for ResolvedChartOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
            height: 240.0,
            show_legend: true,
        }
    }
}

impl ChartOptions {
    /// Merge these options over the defaults; set fields take precedence.
    #[must_use]
    pub fn resolve(&self) -> ResolvedChartOptions {
        let defaults = ResolvedChartOptions::default();
        ResolvedChartOptions {
            responsive: self.responsive.unwrap_or(defaults.responsive),
            maintain_aspect_ratio: self
                .maintain_aspect_ratio
                .unwrap_or(defaults.maintain_aspect_ratio),
            height: self.height.unwrap_or(defaults.height),
            show_legend: self.show_legend.unwrap_or(defaults.show_legend),
        }
    }
}

/// A complete chart description, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    id: String,
    kind: ChartKind,
    data: ChartData,
    options: ChartOptions,
}

impl ChartSpec {
    /// Create a chart with default options.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ChartKind, data: ChartData) -> Self {
        Self {
            id: id.into(),
            kind,
            data,
            options: ChartOptions::default(),
        }
    }

    /// Override chart options; unset fields keep their defaults.
    #[must_use]
    pub fn options(mut self, options: ChartOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the chart into the given Ui.
    pub fn show(&self, ui: &mut egui::Ui) {
        let opts = self.options.resolve();

        let mut plot = Plot::new(self.id.clone());

        if opts.show_legend {
            plot = plot.legend(Legend::default());
        }
        if !opts.responsive {
            plot = plot.width(FIXED_WIDTH);
        }
        if opts.maintain_aspect_ratio {
            plot = plot.view_aspect(VIEW_ASPECT);
        } else {
            plot = plot.height(opts.height);
        }

        if !self.data.x_labels.is_empty() {
            let labels = self.data.x_labels.clone();
            plot = plot.x_axis_formatter(move |mark, _range| {
                let index = mark.value.round();
                if (mark.value - index).abs() > f64::EPSILON || index < 0.0 {
                    return String::new();
                }
                labels
                    .get(index as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("{}", mark.value))
            });
        }

        plot.show(ui, |plot_ui| {
            for series in &self.data.series {
                match self.kind {
                    ChartKind::Line => {
                        plot_ui.line(Line::new(
                            series.name.clone(),
                            PlotPoints::from(series.points.clone()),
                        ));
                    }
                    ChartKind::Scatter => {
                        plot_ui.points(
                            Points::new(
                                series.name.clone(),
                                PlotPoints::from(series.points.clone()),
                            )
                            .radius(2.5),
                        );
                    }
                    ChartKind::Bar => {
                        let bars: Vec<Bar> = series
                            .points
                            .iter()
                            .map(|[x, y]| Bar::new(*x, *y).width(0.6))
                            .collect();
                        plot_ui.bar_chart(BarChart::new(series.name.clone(), bars));
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_unset() {
        let resolved = ChartOptions::default().resolve();
        assert!(resolved.responsive);
        assert!(!resolved.maintain_aspect_ratio);
        assert!(resolved.show_legend);
    }

    #[test]
    fn test_caller_options_take_precedence() {
        let resolved = ChartOptions {
            responsive: Some(false),
            maintain_aspect_ratio: Some(true),
            ..Default::default()
        }
        .resolve();
        assert!(!resolved.responsive);
        assert!(resolved.maintain_aspect_ratio);
        // Unset fields still take defaults.
        assert!(resolved.show_legend);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let resolved = ChartOptions {
            height: Some(400.0),
            ..Default::default()
        }
        .resolve();
        assert!((resolved.height - 400.0).abs() < f32::EPSILON);
        assert!(resolved.responsive);
        assert!(!resolved.maintain_aspect_ratio);
    }

    #[test]
    fn test_series_from_values_indexes_x() {
        let series = ChartSeries::from_values("exec", &[0.5, 1.5, 0.25]);
        assert_eq!(series.points, vec![[0.0, 0.5], [1.0, 1.5], [2.0, 0.25]]);
    }
}
