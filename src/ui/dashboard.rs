//! Mood stats dashboard

use crate::api::MoodStats;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Widget},
};

/// Slice colours, cycled when there are more categories than colours
const PALETTE: [Color; 6] = [
    Color::Rgb(0xf8, 0x71, 0x71),
    Color::Rgb(0x60, 0xa5, 0xfa),
    Color::Rgb(0xfa, 0xcc, 0x15),
    Color::Rgb(0x4a, 0xde, 0x80),
    Color::Rgb(0xc0, 0x84, 0xfc),
    Color::Rgb(0xa3, 0xe6, 0x35),
];

/// Input to the chart: one category per slice, in server order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl ChartData {
    pub fn from_stats(stats: &MoodStats) -> Self {
        Self {
            labels: stats.labels().into_iter().map(str::to_string).collect(),
            values: stats.values(),
        }
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    /// Each category's share of the total, in percent
    pub fn shares(&self) -> Vec<f64> {
        let total = self.total();
        self.values
            .iter()
            .map(|value| {
                if total == 0 {
                    0.0
                } else {
                    *value as f64 * 100.0 / total as f64
                }
            })
            .collect()
    }
}

/// Panel that shows the mood chart once stats arrive
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    chart: Option<ChartData>,
    visible: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chart from fresh stats and show the panel
    pub fn show_stats(&mut self, stats: &MoodStats) {
        self.chart = Some(ChartData::from_stats(stats));
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn chart(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }
}

impl Widget for &Dashboard {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible {
            return;
        }

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("📊 Mood dashboard (Esc to close)")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(chart) = &self.chart else {
            return;
        };

        if chart.labels.is_empty() {
            Paragraph::new("No moods recorded yet.")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(chart.labels.len() as u16)])
            .split(inner);

        let bars: Vec<Bar> = chart
            .labels
            .iter()
            .zip(&chart.values)
            .enumerate()
            .map(|(i, (label, value))| {
                Bar::default()
                    .label(Line::from(label.clone()))
                    .value(*value)
                    .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
            })
            .collect();

        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(9)
            .bar_gap(2)
            .value_style(
                Style::default()
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .render(chunks[0], buf);

        let legend: Vec<Line> = chart
            .labels
            .iter()
            .zip(chart.shares())
            .enumerate()
            .map(|(i, (label, share))| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(PALETTE[i % PALETTE.len()])),
                    Span::raw(format!("{} {:.0}%", label, share)),
                ])
            })
            .collect();
        Paragraph::new(legend).render(chunks[1], buf);
    }
}
