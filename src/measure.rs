use serde::Deserialize;
use unicode_width::UnicodeWidthStr;

/// Fallback size estimation for nodes the renderer has not measured yet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            min_node_width: 220.0,
            min_node_height: 80.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Size of a node showing `label` as header and one line per entry in `rows`.
    pub fn node_size(&self, label: &str, rows: &[String]) -> (f64, f64) {
        let header_width = self.text_width(label);

        let max_row_width = rows
            .iter()
            .map(|row| self.text_width(row) + self.char_width * 2.0)
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_row_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let header_height = self.line_height + self.header_padding * 2.0;
        let body_height = if rows.is_empty() {
            0.0
        } else {
            rows.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (header_height + body_height).max(self.min_node_height);

        (width, height)
    }
}
