//! Plotly-compatible figure documents. The browser hands `data` and `layout`
//! straight to `Plotly.newPlot`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub mode: TraceMode,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(default)]
    pub showlegend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Title,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_title: &str, y_title: &str) -> Self {
        Self {
            data: Vec::new(),
            layout: Layout {
                title: Title { text: title.into() },
                xaxis: Axis {
                    title: Title {
                        text: x_title.to_string(),
                    },
                },
                yaxis: Axis {
                    title: Title {
                        text: y_title.to_string(),
                    },
                },
                showlegend: false,
            },
        }
    }

    pub fn with_trace(
        mut self,
        name: impl Into<String>,
        mode: TraceMode,
        x: Vec<NaiveDate>,
        y: Vec<f64>,
    ) -> Self {
        self.data.push(Trace {
            kind: TraceKind::Scatter,
            mode,
            name: name.into(),
            x,
            y,
        });
        self.layout.showlegend = self.data.len() > 1;
        self
    }

    pub fn to_value(&self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
