use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};
use tui_layermap::braille::BrailleCanvas;
use tui_layermap::demo::Legend;
use tui_layermap::element::PopupView;
use tui_layermap::map::MapLayers;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            app.demo.title(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map.render(inner.width, inner.height);
    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let (cx, cy) = (col.checked_sub(1)?, row.checked_sub(1)?);
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });
    frame.render_widget(MapWidget { layers, cursor_pos }, inner);

    if let Some(popup) = app.map.popup() {
        let (px, py) = app.map.viewport().project_point(popup.anchor);
        let anchor = (
            (px / 2).clamp(0, inner.width.saturating_sub(1) as i32) as u16,
            (py / 4).clamp(0, inner.height.saturating_sub(1) as i32) as u16,
        );
        frame.render_widget(PopupView { popup }, popup.placement(anchor, inner));
    }

    if let Some(legend) = app.demo.legend().filter(|l| l.active) {
        let height = legend.entries.len() as u16 + 2;
        let width = 16.min(inner.width);
        if inner.height > height {
            let legend_area = Rect::new(inner.x, inner.y + inner.height - height, width, height);
            frame.render_widget(LegendWidget { legend }, legend_area);
        }
    }
}

/// Braille map with icon and title labels on top
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Copy the non-empty cells of a canvas, each in its own colour
    fn render_layer(&self, canvas: &BrailleCanvas, area: Rect, buf: &mut Buffer) {
        for row in 0..canvas.height().min(area.height as usize) {
            let y = area.y + row as u16;
            for (col, ch, color) in canvas.row_cells(row) {
                if col >= area.width as usize {
                    break;
                }
                buf[(area.x + col as u16, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_layer(&self.layers.basemap, area, buf);
        self.render_layer(&self.layers.overlay, area, buf);

        for label in &self.layers.labels {
            if label.y >= area.height || label.x >= area.width {
                continue;
            }
            let y = area.y + label.y;
            let max_len = (area.width - label.x) as usize;
            for (i, ch) in label.text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + label.x + i as u16, y)].set_char(ch).set_fg(label.color);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

struct LegendWidget<'a> {
    legend: &'a Legend,
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = self
            .legend
            .entries
            .iter()
            .map(|(label, color)| {
                Line::from(vec![
                    Span::styled("██ ", Style::default().fg(color.to_color())),
                    Span::raw(*label),
                ])
            })
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(self.legend.key);
        Clear.render(area, buf);
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

fn toggle_span(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map.renderer().settings;
    let legend_on = app.demo.legend().is_some_and(|l| l.active);

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        toggle_span(settings.show_basemap, "[B]asemap ", "[b]asemap "),
        toggle_span(settings.show_labels, "[L]abels ", "[l]abels "),
        toggle_span(!app.layer_hidden, "[V]isible ", "[v]isible "),
        toggle_span(legend_on, "[G]legend ", "[g]legend "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    if let Some(province) = app.province_label() {
        spans.push(Span::styled(format!(" | {province}"), Style::default().fg(Color::Magenta)));
    }
    if let Some(tile) = app.map.basemap() {
        spans.push(Span::styled(
            format!(" | {} {}", tile.name, tile.attribution),
            Style::default().fg(Color::DarkGray),
        ));
    }
    match &app.status {
        Some(status) => spans.push(Span::styled(format!(" | {status}"), Style::default().fg(Color::Red))),
        None => spans.push(Span::styled(
            " | p/P:province m:basemap f:fit c:clear tab/enter:popup q:quit",
            Style::default().fg(Color::DarkGray),
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
