//! Renderable figure descriptions.
//!
//! Each builder is a pure function from one projection to a serializable
//! description. Turning these into pixels is left to the front end.

use serde::Serialize;

use crate::color::{ColorMap, Rgb};
use crate::data::aggregate::{AggregateResult, DistanceHistogram, HourCount, MapPoint, PassengerCount};

const MAP_ZOOM: u8 = 9;
const MAP_STYLE: &str = "open-street-map";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub t: u32,
    pub b: u32,
}

const CHART_MARGIN: Margin = Margin { l: 30, r: 10, t: 30, b: 30 };
const MAP_MARGIN: Margin = Margin { l: 0, r: 0, t: 30, b: 0 };

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterMapFigure {
    pub title: &'static str,
    pub style: &'static str,
    pub zoom: u8,
    /// `[lat, lon]` of the view centre; `None` when nothing is visible.
    pub center: Option<[f64; 2]>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub colors: Vec<Rgb>,
    pub legend: Vec<(String, Rgb)>,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XyFigure<X: Serialize> {
    pub title: &'static str,
    pub kind: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x: Vec<X>,
    pub y: Vec<usize>,
    pub markers: bool,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramFigure {
    pub title: &'static str,
    pub x_label: &'static str,
    /// Bin edges; one longer than `counts` unless empty.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub margin: Margin,
}

/// The four dashboard figures for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figures {
    pub map: ScatterMapFigure,
    pub hourly: XyFigure<u32>,
    pub distance: HistogramFigure,
    pub passengers: XyFigure<u32>,
}

pub fn render(result: &AggregateResult, colors: &ColorMap) -> Figures {
    Figures {
        map: map_figure(&result.points, colors),
        hourly: hourly_figure(&result.hourly),
        distance: distance_figure(&result.distance),
        passengers: passenger_figure(&result.passengers),
    }
}

pub fn map_figure(points: &[MapPoint], colors: &ColorMap) -> ScatterMapFigure {
    let center = if points.is_empty() {
        None
    } else {
        let n = points.len() as f64;
        Some([
            points.iter().map(|p| p.lat).sum::<f64>() / n,
            points.iter().map(|p| p.lon).sum::<f64>() / n,
        ])
    };
    ScatterMapFigure {
        title: "Pickup Hotspots",
        style: MAP_STYLE,
        zoom: MAP_ZOOM,
        center,
        lat: points.iter().map(|p| p.lat).collect(),
        lon: points.iter().map(|p| p.lon).collect(),
        colors: points.iter().map(|p| colors.color_for(p.cluster)).collect(),
        legend: colors.legend_entries(),
        margin: MAP_MARGIN,
    }
}

pub fn hourly_figure(hourly: &[HourCount]) -> XyFigure<u32> {
    XyFigure {
        title: "Trips by Hour",
        kind: "line",
        x_label: "hour",
        y_label: "Trips",
        x: hourly.iter().map(|h| h.hour).collect(),
        y: hourly.iter().map(|h| h.trips).collect(),
        markers: true,
        margin: CHART_MARGIN,
    }
}

pub fn distance_figure(hist: &DistanceHistogram) -> HistogramFigure {
    let mut edges: Vec<f64> = hist.bins.iter().map(|b| b.start).collect();
    if let Some(last) = hist.bins.last() {
        edges.push(last.end);
    }
    HistogramFigure {
        title: "Trip Distance Distribution",
        x_label: "trip_distance",
        edges,
        counts: hist.bins.iter().map(|b| b.trips).collect(),
        margin: CHART_MARGIN,
    }
}

pub fn passenger_figure(passengers: &[PassengerCount]) -> XyFigure<u32> {
    XyFigure {
        title: "Trips by Passenger Count",
        kind: "bar",
        x_label: "Passengers",
        y_label: "Trips",
        x: passengers.iter().map(|p| p.passengers).collect(),
        y: passengers.iter().map(|p| p.trips).collect(),
        markers: false,
        margin: CHART_MARGIN,
    }
}
