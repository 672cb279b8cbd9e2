use crate::app::{App, DataState};
use crate::braille::BrailleCanvas;
use crate::map::{MapLayers, PinCell};
use crate::markers::PATH_COLOR;
use crate::sidebar::DetailLine;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let layout = app.layout;

    render_map(frame, app, layout.map);
    render_zoom_control(frame, app);
    if app.sidebar.is_open() {
        render_sidebar(frame, app, layout.sidebar);
    } else {
        render_sidebar_tab(frame, layout.sidebar_tab);
    }
    render_status_bar(frame, app, layout.status);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let (label, color) = match &app.data_state {
        DataState::Loading => (format!(" {} (loading…) ", app.config.title), Color::Yellow),
        DataState::Ready { .. } => (format!(" {} ", app.config.title), Color::Cyan),
        DataState::Unavailable(_) => (format!(" {} (data unavailable) ", app.config.title), Color::Red),
    };

    // Create a block with border
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
        app.selected,
    );

    // Get mouse cursor position for marker
    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        // Convert braille pixels to character position
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        if cx < inner.width && cy < inner.height {
            Some((cx, cy))
        } else {
            None
        }
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Custom widget that renders the braille layers with marker pins on top
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }

    fn render_pin(pin: &PinCell, area: Rect, buf: &mut Buffer) {
        if pin.x >= area.width || pin.y >= area.height {
            return;
        }
        let mut style = Style::default().fg(pin.fg).bg(pin.bg).add_modifier(Modifier::BOLD);
        if pin.selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        buf[(area.x + pin.x, area.y + pin.y)].set_char(pin.symbol).set_style(style);
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: basemap, circle outlines, pins
        self.render_layer(&self.layers.basemap, Color::DarkGray, area, buf);
        self.render_layer(&self.layers.circles, PATH_COLOR, area, buf);

        // Selected pin last so it stays visible where pins overlap
        for pin in self.layers.pins.iter().filter(|p| !p.selected) {
            Self::render_pin(pin, area, buf);
        }
        for pin in self.layers.pins.iter().filter(|p| p.selected) {
            Self::render_pin(pin, area, buf);
        }

        // Render cursor marker
        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height && buf[(x, y)].symbol() == " " {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_zoom_control(frame: &mut Frame, app: &App) {
    let style = Style::default().fg(Color::White).bg(Color::DarkGray);
    frame.render_widget(Paragraph::new(Span::styled("[+]", style)), app.layout.zoom_in);
    frame.render_widget(Paragraph::new(Span::styled("[-]", style)), app.layout.zoom_out);
}

fn render_sidebar_tab(frame: &mut Frame, area: Rect) {
    let style = Style::default().fg(Color::Black).bg(Color::Cyan);
    frame.render_widget(Paragraph::new(Span::styled("[≡]", style)), area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let Some(panel) = app.sidebar.active_panel() else {
        return;
    };

    // Leave room on the top border for the close button
    let max_title = area.width.saturating_sub(8) as usize;
    let title: String = panel.title().chars().take(max_title).collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));

    let width = block.inner(area).width as usize;
    let lines: Vec<Line> = panel.lines().iter().flat_map(|line| detail_rows(line, width)).collect();

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if app.sidebar.close_button {
        let style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
        frame.render_widget(Paragraph::new(Span::styled("[✕]", style)), app.layout.close_button);
    }
}

/// A detail line broken into rows of `width` characters. Breaking by
/// character keeps row counts in step with [`DetailLine::rows`], which hover
/// hit testing relies on.
fn detail_rows(line: &DetailLine, width: usize) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::DarkGray);
    let value_style = if line.href().is_some() {
        Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default()
    };
    let arrow = if line.opens_new_context() { " ↗" } else { "" };

    let cells: Vec<(char, Style)> = format!("{}: ", line.kind.label())
        .chars()
        .map(|c| (c, label_style))
        .chain(line.value.chars().map(|c| (c, value_style)))
        .chain(arrow.chars().map(|c| (c, label_style)))
        .collect();

    cells.chunks(width.max(1)).map(styled_row).collect()
}

/// Merge runs of equally styled characters into spans
fn styled_row(cells: &[(char, Style)]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut current: Option<(String, Style)> = None;
    for &(c, style) in cells {
        match &mut current {
            Some((text, s)) if *s == style => text.push(c),
            _ => {
                if let Some((text, s)) = current.take() {
                    spans.push(Span::styled(text, s));
                }
                current = Some((c.to_string(), style));
            }
        }
    }
    if let Some((text, s)) = current {
        spans.push(Span::styled(text, s));
    }
    Line::from(spans)
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let data = match &app.data_state {
        DataState::Loading => Span::styled(" Loading data… ", Style::default().fg(Color::Yellow)),
        DataState::Ready { markers, unplaced } => {
            let text = if *unplaced > 0 {
                format!(" {markers} markers ({unplaced} unplaced) ")
            } else {
                format!(" {markers} markers ")
            };
            Span::styled(text, Style::default().fg(Color::Green))
        }
        DataState::Unavailable(reason) => Span::styled(
            format!(" Data unavailable: {reason} [R]etry "),
            Style::default().fg(Color::Red),
        ),
    };

    let mut spans = vec![data];

    // Hovering a link shows where it goes
    if let Some(href) = app.hovered_link() {
        spans.push(Span::styled("| ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(href, Style::default().fg(Color::Blue)));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
        return;
    }

    spans.extend([
        Span::styled("| Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
    ]);
    if app.map_renderer.tiles.is_enabled() {
        let pending = app.map_renderer.tile_cache.pending_count();
        spans.push(Span::styled(
            format!(" (z{})", app.tile_level()),
            Style::default().fg(Color::Magenta),
        ));
        if pending > 0 {
            spans.push(Span::styled(
                format!(" {pending} tiles…"),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    spans.extend([
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ]);
    if app.map_renderer.tiles.is_enabled() {
        spans.push(Span::styled(
            format!(" | {}", app.map_renderer.tiles.attribution()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom Tab:next r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
