//! # slogview-chart
//!
//! Renders closed sessions as a self-contained HTML timeline with one lane
//! per user and a date-time axis along the bottom.

mod palette;

pub use palette::viridis;

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use slogview_parser::Elapsed;
use thiserror::Error;

const WIDTH: f64 = 900.0;
const MARGIN_LEFT: f64 = 160.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 50.0;
const LANE_HEIGHT: f64 = 36.0;
const AXIS_HEIGHT: f64 = 60.0;
/// Share of the lane height covered by a bar.
const BAR_FILL: f64 = 0.5;
const TICKS: usize = 6;
const TICK_FORMAT: &str = "%H:%M - %d %b %Y";
const TOOLTIP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to write chart: {0}")]
    Io(#[from] std::io::Error),
}

/// One horizontal bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBar {
    /// Lane the bar is drawn in.
    pub category: String,
    pub range_start: NaiveDateTime,
    pub range_end: NaiveDateTime,
}

/// Chart title for a project.
pub fn chart_title(project_code: &str) -> String {
    format!("{}_rvt_sessions", project_code)
}

/// Default output directory: `~/.local/share/slogview/html`.
pub fn default_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slogview")
        .join("html")
}

/// Render the chart and write it to `<dir>/<project_code>_rvt_sessions.html`.
pub fn write_timeline(
    dir: &Path,
    project_code: &str,
    bars: &[TimelineBar],
) -> Result<PathBuf, ChartError> {
    std::fs::create_dir_all(dir)?;

    let title = chart_title(project_code);
    let path = dir.join(format!("{}.html", title));
    std::fs::write(&path, render_timeline(&title, bars))?;

    tracing::debug!(path = %path.display(), bars = bars.len(), "Timeline written");
    Ok(path)
}

/// Render a complete HTML document containing the timeline as inline SVG.
pub fn render_timeline(title: &str, bars: &[TimelineBar]) -> String {
    let lanes = lanes(bars);
    let colors = viridis(lanes.len());

    let plot_height = LANE_HEIGHT * lanes.len().max(1) as f64;
    let height = MARGIN_TOP + plot_height + AXIS_HEIGHT;
    let scale = TimeScale::fit(bars);

    let mut html = String::with_capacity(4096 + bars.len() * 256);

    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html>\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(
        "<style>body{font-family:sans-serif;margin:24px;}text{fill:#444;font-size:11px;}\
         .title{font-size:18px;fill:#222;}rect.bar:hover{opacity:0.75;}</style>\n",
    );
    html.push_str("</head>\n<body>\n");

    html.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">\n",
        WIDTH, height, WIDTH, height
    ));
    html.push_str(&format!(
        "<text class=\"title\" x=\"{:.0}\" y=\"28\">{}</text>\n",
        MARGIN_LEFT,
        escape_html(title)
    ));

    if bars.is_empty() {
        html.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.1}\">No closed sessions</text>\n",
            MARGIN_LEFT,
            MARGIN_TOP + LANE_HEIGHT / 2.0
        ));
    }

    for (i, lane) in lanes.iter().enumerate() {
        let center = MARGIN_TOP + LANE_HEIGHT * (i as f64 + 0.5);
        html.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            MARGIN_LEFT - 10.0,
            center,
            escape_html(lane)
        ));
    }

    for bar in bars {
        let Some(lane) = lanes.iter().position(|l| *l == bar.category) else {
            continue;
        };
        let (from, to) = if bar.range_end < bar.range_start {
            (bar.range_end, bar.range_start)
        } else {
            (bar.range_start, bar.range_end)
        };
        let x = scale.x(&from);
        let width = (scale.x(&to) - x).max(1.0);
        let bar_height = LANE_HEIGHT * BAR_FILL;
        let y = MARGIN_TOP + LANE_HEIGHT * lane as f64 + (LANE_HEIGHT - bar_height) / 2.0;

        html.push_str(&format!(
            "<rect class=\"bar\" x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\">",
            x, y, width, bar_height, colors[lane]
        ));
        html.push_str(&format!(
            "<title>{}: {} to {} ({})</title></rect>\n",
            escape_html(&bar.category),
            bar.range_start.format(TOOLTIP_FORMAT),
            bar.range_end.format(TOOLTIP_FORMAT),
            Elapsed::between(&bar.range_start, &bar.range_end)
        ));
    }

    let axis_y = MARGIN_TOP + plot_height;
    if !bars.is_empty() {
        for tick in scale.ticks() {
            let x = scale.x(&tick);
            html.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#ddd\"/>\n",
                x, MARGIN_TOP, x, axis_y
            ));
            html.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n",
                x,
                axis_y + 20.0,
                tick.format(TICK_FORMAT)
            ));
        }
    }

    html.push_str("</svg>\n");
    html.push_str("</body>\n</html>\n");

    html
}

/// Distinct categories in first-seen order.
fn lanes(bars: &[TimelineBar]) -> Vec<String> {
    let mut lanes: Vec<String> = Vec::new();
    for bar in bars {
        if !lanes.contains(&bar.category) {
            lanes.push(bar.category.clone());
        }
    }
    lanes
}

/// Maps timestamps onto the horizontal plot area.
struct TimeScale {
    min: NaiveDateTime,
    span_secs: f64,
}

impl TimeScale {
    fn fit(bars: &[TimelineBar]) -> Self {
        let times = bars.iter().flat_map(|b| [b.range_start, b.range_end]);
        let min = times.clone().min();
        let max = times.max();

        match (min, max) {
            (Some(min), Some(max)) if max > min => Self {
                min,
                span_secs: (max - min).num_seconds() as f64,
            },
            (Some(at), _) => Self {
                min: at - Duration::minutes(30),
                span_secs: 3600.0,
            },
            _ => Self {
                min: NaiveDateTime::default(),
                span_secs: 3600.0,
            },
        }
    }

    fn x(&self, ts: &NaiveDateTime) -> f64 {
        let offset = (*ts - self.min).num_seconds() as f64;
        MARGIN_LEFT + offset / self.span_secs * (WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn ticks(&self) -> Vec<NaiveDateTime> {
        (0..TICKS)
            .map(|i| {
                let secs = self.span_secs * i as f64 / (TICKS - 1) as f64;
                self.min + Duration::seconds(secs.round() as i64)
            })
            .collect()
    }
}

/// Minimal HTML escaping for text content and attribute values.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn bar(category: &str, start: NaiveDateTime, end: NaiveDateTime) -> TimelineBar {
        TimelineBar {
            category: category.to_string(),
            range_start: start,
            range_end: end,
        }
    }

    #[test]
    fn test_one_lane_per_category() {
        let bars = vec![
            bar("jdoe", at(9, 0), at(10, 30)),
            bar("asmith", at(9, 2), at(12, 0)),
            bar("jdoe", at(11, 0), at(11, 45)),
        ];

        assert_eq!(lanes(&bars), vec!["jdoe", "asmith"]);

        let html = render_timeline("456_11_rvt_sessions", &bars);
        assert_eq!(html.matches("<rect class=\"bar\"").count(), 3);
        // Two lanes, two colors.
        assert_eq!(html.matches("fill=\"#440154\"").count(), 2);
        assert_eq!(html.matches("fill=\"#fde725\"").count(), 1);
    }

    #[test]
    fn test_axis_uses_datetime_format() {
        let bars = vec![bar("jdoe", at(9, 0), at(10, 0))];
        let html = render_timeline("t", &bars);

        assert!(html.contains(">09:00 - 01 Jan 2024</text>"));
        assert!(html.contains(">10:00 - 01 Jan 2024</text>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let bars = vec![bar("<script>", at(9, 0), at(10, 0))];
        let html = render_timeline("a & b", &bars);

        assert!(html.contains("<title>a &amp; b</title>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_chart_renders() {
        let html = render_timeline("empty", &[]);
        assert!(html.contains("No closed sessions"));
        assert!(!html.contains("<rect"));
    }

    #[test]
    fn test_degenerate_range_still_draws() {
        let bars = vec![bar("jdoe", at(9, 0), at(9, 0))];
        let html = render_timeline("t", &bars);
        assert_eq!(html.matches("<rect class=\"bar\"").count(), 1);
    }

    #[test]
    fn test_write_timeline_path() {
        let dir = TempDir::new().unwrap();
        let bars = vec![bar("jdoe", at(9, 0), at(10, 30))];

        let path = write_timeline(dir.path(), "456_11", &bars).unwrap();

        assert_eq!(path, dir.path().join("456_11_rvt_sessions.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>456_11_rvt_sessions</title>"));
        assert!(html.contains("(1:30:00)</title>"));
    }
}
