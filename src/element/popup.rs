use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use std::collections::BTreeMap;

/// Colour of a popup line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Plain,
    Positive,
    Negative,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PopupLine {
    pub text: String,
    pub tone: Tone,
}

/// A popup button and the `data-*` attributes it carries into
/// `MarkerButtonClick`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopupButton {
    pub label: String,
    pub data: BTreeMap<String, String>,
}

impl PopupButton {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// Body of a popup: text lines followed by a row of buttons.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopupContent {
    pub lines: Vec<PopupLine>,
    pub buttons: Vec<PopupButton>,
}

impl PopupContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(self, text: impl Into<String>) -> Self {
        self.toned(text, Tone::Plain)
    }

    pub fn toned(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.lines.push(PopupLine {
            text: text.into(),
            tone,
        });
        self
    }

    pub fn button(mut self, button: PopupButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// An open popup anchored at a lon/lat position.
#[derive(Clone, Debug, PartialEq)]
pub struct PopupElement {
    pub anchor: DVec2,
    pub content: PopupContent,
    focus: usize,
}

impl PopupElement {
    pub fn new(anchor: DVec2, content: PopupContent) -> Self {
        Self {
            anchor,
            content,
            focus: 0,
        }
    }

    pub fn focused(&self) -> Option<&PopupButton> {
        self.content.buttons.get(self.focus)
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    /// Move focus to the next button, wrapping around
    pub fn focus_next(&mut self) {
        if !self.content.buttons.is_empty() {
            self.focus = (self.focus + 1) % self.content.buttons.len();
        }
    }

    pub fn button(&self, index: usize) -> Option<&PopupButton> {
        self.content.buttons.get(index)
    }

    /// Cells needed to show the content, border included
    pub fn size(&self) -> (u16, u16) {
        let text_width = self
            .content
            .lines
            .iter()
            .map(|l| l.text.chars().count())
            .max()
            .unwrap_or(0);
        let buttons_width: usize = self
            .content
            .buttons
            .iter()
            .map(|b| b.label.chars().count() + 3)
            .sum();
        let width = text_width.max(buttons_width).max(10) + 2;
        let height = self.content.lines.len() + usize::from(!self.content.buttons.is_empty()) + 2;
        (width as u16, height as u16)
    }

    /// Where the popup goes for an anchor cell: above and centred on the
    /// anchor, pushed inside `bounds`
    pub fn placement(&self, anchor: (u16, u16), bounds: Rect) -> Rect {
        let (w, h) = self.size();
        let w = w.min(bounds.width);
        let h = h.min(bounds.height);
        let x = (bounds.x + anchor.0)
            .saturating_sub(w / 2)
            .clamp(bounds.x, bounds.x + bounds.width - w);
        let y = if anchor.1 >= h {
            bounds.y + anchor.1 - h
        } else {
            bounds.y + (anchor.1 + 1).min(bounds.height - h)
        };
        Rect::new(x, y, w, h)
    }
}

/// Draws a popup as a light box over the map
pub struct PopupView<'a> {
    pub popup: &'a PopupElement,
}

impl Widget for PopupView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let base = Style::default().fg(Color::Black).bg(Color::White);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(base.fg(Color::DarkGray))
            .style(base);

        let mut lines: Vec<Line> = self
            .popup
            .content
            .lines
            .iter()
            .map(|l| {
                let style = match l.tone {
                    Tone::Plain => base,
                    Tone::Positive => base.fg(Color::Green),
                    Tone::Negative => base.fg(Color::Red),
                };
                Line::from(Span::styled(l.text.clone(), style))
            })
            .collect();

        if !self.popup.content.buttons.is_empty() {
            let spans: Vec<Span> = self
                .popup
                .content
                .buttons
                .iter()
                .enumerate()
                .map(|(i, b)| {
                    let style = if i == self.popup.focus {
                        base.fg(Color::White).bg(Color::Blue).add_modifier(Modifier::BOLD)
                    } else {
                        base.add_modifier(Modifier::UNDERLINED)
                    };
                    Span::styled(format!("[{}] ", b.label), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }

        Clear.render(area, buf);
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn popup() -> PopupElement {
        let content = PopupContent::new()
            .line("Wijkcode: WK0001")
            .toned("warmtepomp", Tone::Negative)
            .button(PopupButton::new("Toon wijk").with_data("wk_code", "WK0001"))
            .button(PopupButton::new("Sluit"));
        PopupElement::new(DVec2::new(5.0, 52.0), content)
    }

    #[test]
    fn focus_wraps() {
        let mut p = popup();
        assert_eq!(p.focused().map(|b| b.label.as_str()), Some("Toon wijk"));
        p.focus_next();
        assert_eq!(p.focus_index(), 1);
        p.focus_next();
        assert_eq!(p.focused().and_then(|b| b.data("wk_code")), Some("WK0001"));
    }

    #[test]
    fn placement_stays_inside() {
        let p = popup();
        let bounds = Rect::new(0, 0, 40, 20);
        let (w, h) = p.size();

        let above = p.placement((20, 15), bounds);
        assert_eq!(above.y + above.height, 15);

        let corner = p.placement((0, 0), bounds);
        assert_eq!((corner.x, corner.y), (0, 1));
        assert_eq!((corner.width, corner.height), (w, h));

        let right = p.placement((39, 10), bounds);
        assert!(right.x + right.width <= 40);
    }

    #[test]
    fn renders_buttons_and_text() {
        let p = popup();
        let (w, h) = p.size();
        let area = Rect::new(0, 0, w, h);
        let mut buf = Buffer::empty(area);
        PopupView { popup: &p }.render(area, &mut buf);

        let row: String = (0..w).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Wijkcode: WK0001"));
        assert_eq!(buf[(1, 2)].fg, Color::Red);
        let buttons: String = (0..w).map(|x| buf[(x, h - 2)].symbol().to_string()).collect();
        assert!(buttons.contains("[Toon wijk]"));
    }
}
