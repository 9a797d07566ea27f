use crate::app::App;
use crate::braille::{BrailleCanvas, BLANK};
use crate::map::{CursorHint, GlobeLayers, TooltipTarget};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

const BACKGROUND: Color = Color::Rgb(5, 5, 5);
const GRATICULE: Color = Color::Rgb(38, 38, 38);
const LAND: Color = Color::Rgb(115, 115, 115);
const HALO: Color = Color::Rgb(22, 101, 52);
const MARKER: Color = Color::Rgb(74, 222, 128);
const OUTLINE: Color = Color::Rgb(64, 64, 64);

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into globe area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_globe(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_globe(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .style(Style::default().bg(BACKGROUND))
        .title(Span::styled(
            " Active Nodes ",
            Style::default().fg(MARKER).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let widget = GlobeWidget {
        layers: app.render(),
        tooltip: app.tooltip.as_ref(),
    };
    frame.render_widget(widget, inner);
}

/// Braille globe with the tooltip drawn on top
struct GlobeWidget<'a> {
    layers: GlobeLayers,
    tooltip: Option<&'a TooltipTarget>,
}

impl GlobeWidget<'_> {
    /// Render a braille canvas layer with a specific color. Blank cells
    /// leave whatever is underneath.
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.rows().take(area.height as usize);
        for (row_idx, row_str) in rows.enumerate() {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().take(area.width as usize).enumerate() {
                if ch == BLANK {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }

    fn render_tooltip(target: &TooltipTarget, area: Rect, buf: &mut Buffer) {
        let lines = tooltip_lines(target);
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
        let Some((x0, y0)) = tooltip_origin(area, width, lines.len() as u16, target.screen_x, target.screen_y)
        else {
            return;
        };

        let styles = [
            Style::default().fg(Color::White).bg(Color::Black).add_modifier(Modifier::BOLD),
            Style::default().fg(MARKER).bg(Color::Black),
        ];
        for (i, (text, style)) in lines.iter().zip(styles).enumerate() {
            let y = y0 + i as u16;
            let padded = format!(" {text:<w$} ", w = width as usize - 2);
            for (j, ch) in padded.chars().enumerate() {
                let x = x0 + j as u16;
                if x >= area.x + area.width {
                    break;
                }
                buf[(x, y)].set_char(ch).set_style(style);
            }
        }
    }
}

impl Widget for GlobeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front
        Self::render_layer(&self.layers.graticule, GRATICULE, area, buf);
        Self::render_layer(&self.layers.land, LAND, area, buf);
        Self::render_layer(&self.layers.halos, HALO, area, buf);
        Self::render_layer(&self.layers.markers, MARKER, area, buf);
        Self::render_layer(&self.layers.outline, OUTLINE, area, buf);

        if let Some(target) = self.tooltip {
            Self::render_tooltip(target, area, buf);
        }
    }
}

fn tooltip_lines(target: &TooltipTarget) -> [String; 2] {
    [
        target.location.display_name.clone(),
        format!("{} Active Nodes", target.location.count),
    ]
}

/// Top-left cell of a `width` x `height` tooltip centered above the pointer,
/// shifted to stay inside `area`. `None` when it cannot fit at all.
fn tooltip_origin(area: Rect, width: u16, height: u16, pointer_x: u16, pointer_y: u16) -> Option<(u16, u16)> {
    if width > area.width || height > area.height {
        return None;
    }
    let max_x = area.x + area.width - width;
    let x = pointer_x.saturating_sub(width / 2).clamp(area.x, max_x);

    // Prefer the rows just above the pointer; flip below when there is no room
    let y = if pointer_y >= area.y + height + 1 {
        pointer_y - height - 1
    } else {
        pointer_y + 2
    };
    let max_y = area.y + area.height - height;
    Some((x, y.clamp(area.y, max_y)))
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let cursor = match app.cursor {
        CursorHint::Grab => Span::styled("✋ ", Style::default().fg(Color::DarkGray)),
        CursorHint::Pointer => Span::styled("☝ ", Style::default().fg(MARKER)),
    };
    let feed = if app.board.is_live() {
        Span::styled(
            format!("{} nodes @ {} places", app.board.total_nodes(), app.board.locations().len()),
            Style::default().fg(MARKER),
        )
    } else {
        Span::styled("waiting for nodes", Style::default().fg(Color::Yellow))
    };

    let status = Line::from(vec![
        Span::raw(" "),
        cursor,
        Span::styled("Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.mode_label(), Style::default().fg(Color::Magenta)),
        Span::styled(") | ", Style::default().fg(Color::DarkGray)),
        feed,
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.land_label(), Style::default().fg(Color::DarkGray)),
        Span::styled(
            " | drag:rotate wheel/+/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
