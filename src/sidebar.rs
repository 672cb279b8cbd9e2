//! Slide-out detail sidebar.
//!
//! Panel content is structured: each [`DetailLine`] keeps its label, the
//! displayed value and, for links, a separate href. Nothing from the
//! spreadsheet is ever interpreted as markup.

use crate::config::{Side, SidebarConfig};
use crate::markers::MarkerMetadata;

/// Which detail a line shows. Order of the variants is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Documentation,
    Website,
    Contact,
    Email,
    Phone,
}

impl DetailKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Documentation => "Dokumentation",
            Self::Website => "Webbplats",
            Self::Contact => "Kontaktperson",
            Self::Email => "Mejladress",
            Self::Phone => "Telefon",
        }
    }
}

/// One line of panel content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub kind: DetailKind,
    pub value: String,
}

impl DetailLine {
    /// Link target, if this line is a link
    pub fn href(&self) -> Option<String> {
        match self.kind {
            DetailKind::Website => Some(self.value.clone()),
            DetailKind::Email => Some(format!("mailto:{}", self.value)),
            _ => None,
        }
    }

    /// Website links open in a new browsing context
    pub fn opens_new_context(&self) -> bool {
        self.kind == DetailKind::Website
    }

    pub fn text(&self) -> String {
        format!("{}: {}", self.kind.label(), self.value)
    }

    /// Characters on screen, including the new-context arrow
    pub fn display_len(&self) -> usize {
        let arrow = if self.opens_new_context() { 2 } else { 0 };
        self.text().chars().count() + arrow
    }

    /// Rows this line takes when wrapped at `width` columns
    pub fn rows(&self, width: usize) -> usize {
        wrapped_rows(self.display_len(), width)
    }
}

/// Rows needed for `chars` characters wrapped at `width` columns; never 0
pub fn wrapped_rows(chars: usize, width: usize) -> usize {
    chars.div_ceil(width.max(1)).max(1)
}

/// Replace terminal control characters so field text can't drive the terminal
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect()
}

/// Panel with a title slot and a content slot
#[derive(Debug, Clone)]
pub struct SidebarPanel {
    id: String,
    title: String,
    lines: Vec<DetailLine>,
}

impl SidebarPanel {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lines(&self) -> &[DetailLine] {
        &self.lines
    }

    /// Overwrite title and content with a marker's details.
    /// Empty fields are skipped.
    pub fn show(&mut self, metadata: &MarkerMetadata) {
        self.title = sanitize(&metadata.institution);
        self.lines.clear();

        let fields = [
            (DetailKind::Documentation, &metadata.documentation),
            (DetailKind::Website, &metadata.url),
            (DetailKind::Contact, &metadata.contact),
            (DetailKind::Email, &metadata.email),
            (DetailKind::Phone, &metadata.phone),
        ];
        for (kind, value) in fields {
            if !value.is_empty() {
                self.lines.push(DetailLine {
                    kind,
                    value: sanitize(value),
                });
            }
        }
    }

    /// Link under a content row when lines are wrapped at `width` columns
    pub fn link_at(&self, row: usize, width: usize) -> Option<String> {
        let mut top = 0;
        for line in &self.lines {
            top += line.rows(width);
            if row < top {
                return line.href();
            }
        }
        None
    }

    /// Content as plain text, one line per detail
    pub fn content_text(&self) -> String {
        self.lines
            .iter()
            .map(DetailLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Sidebar control holding panels, at most one of them open
#[derive(Debug, Clone)]
pub struct Sidebar {
    pub position: Side,
    pub width: u16,
    pub close_button: bool,
    panels: Vec<SidebarPanel>,
    active: Option<String>,
}

impl Sidebar {
    pub fn new(config: &SidebarConfig) -> Self {
        Self {
            position: config.position,
            width: config.width,
            close_button: config.close_button,
            panels: Vec::new(),
            active: None,
        }
    }

    pub fn add_panel(&mut self, panel: SidebarPanel) {
        self.panels.push(panel);
    }

    pub fn panel(&self, id: &str) -> Option<&SidebarPanel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn panel_mut(&mut self, id: &str) -> Option<&mut SidebarPanel> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    /// Open a panel by id; unknown ids leave the sidebar unchanged
    pub fn open(&mut self, id: &str) -> bool {
        if self.panel(id).is_none() {
            return false;
        }
        self.active = Some(id.to_string());
        true
    }

    /// Close the sidebar if the given panel is the open one
    pub fn close(&mut self, id: &str) {
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
    }

    /// Close whatever panel is open
    pub fn close_active(&mut self) {
        self.active = None;
    }

    /// Open the first panel, as the collapsed tab strip does
    pub fn open_first(&mut self) {
        self.active = self.panels.first().map(|p| p.id.clone());
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_panel(&self) -> Option<&SidebarPanel> {
        self.active.as_deref().and_then(|id| self.panel(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> MarkerMetadata {
        MarkerMetadata {
            institution: "Acme".into(),
            documentation: "Policy doc".into(),
            url: "https://acme.se".into(),
            contact: "Anna".into(),
            email: "anna@acme.se".into(),
            phone: "08-123".into(),
        }
    }

    #[test]
    fn test_all_lines_in_fixed_order() {
        let mut panel = SidebarPanel::new("p", "start");
        panel.show(&metadata());
        assert_eq!(panel.title(), "Acme");
        assert_eq!(
            panel.content_text(),
            "Dokumentation: Policy doc\n\
             Webbplats: https://acme.se\n\
             Kontaktperson: Anna\n\
             Mejladress: anna@acme.se\n\
             Telefon: 08-123"
        );
    }

    #[test]
    fn test_each_line_present_iff_field_non_empty() {
        let full = metadata();
        for skip in 0..5 {
            let mut meta = full.clone();
            match skip {
                0 => meta.documentation.clear(),
                1 => meta.url.clear(),
                2 => meta.contact.clear(),
                3 => meta.email.clear(),
                _ => meta.phone.clear(),
            }
            let mut panel = SidebarPanel::new("p", "");
            panel.show(&meta);
            assert_eq!(panel.lines().len(), 4);
            let kinds: Vec<_> = panel.lines().iter().map(|l| l.kind).collect();
            let all = [
                DetailKind::Documentation,
                DetailKind::Website,
                DetailKind::Contact,
                DetailKind::Email,
                DetailKind::Phone,
            ];
            let expected: Vec<_> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, k)| *k)
                .collect();
            assert_eq!(kinds, expected);
        }
    }

    #[test]
    fn test_whitespace_is_not_empty() {
        let meta = MarkerMetadata {
            phone: " ".into(),
            ..Default::default()
        };
        let mut panel = SidebarPanel::new("p", "");
        panel.show(&meta);
        assert_eq!(panel.content_text(), "Telefon:  ");
    }

    #[test]
    fn test_show_overwrites_previous_content() {
        let mut panel = SidebarPanel::new("p", "");
        panel.show(&metadata());
        panel.show(&MarkerMetadata::default());
        assert_eq!(panel.title(), "");
        assert!(panel.lines().is_empty());
        assert_eq!(panel.content_text(), "");
    }

    #[test]
    fn test_links() {
        let mut panel = SidebarPanel::new("p", "");
        panel.show(&metadata());
        let lines = panel.lines();
        assert_eq!(lines[0].href(), None);
        assert_eq!(lines[1].href().as_deref(), Some("https://acme.se"));
        assert!(lines[1].opens_new_context());
        assert_eq!(lines[3].href().as_deref(), Some("mailto:anna@acme.se"));
        assert!(!lines[3].opens_new_context());
    }

    #[test]
    fn test_wrapped_rows() {
        assert_eq!(wrapped_rows(0, 10), 1);
        assert_eq!(wrapped_rows(10, 10), 1);
        assert_eq!(wrapped_rows(11, 10), 2);
        assert_eq!(wrapped_rows(5, 0), 5);
    }

    #[test]
    fn test_link_at_follows_wrapped_lines() {
        let meta = MarkerMetadata {
            documentation: "Policy doc".into(),
            url: format!("https://acme.se/{}", "a".repeat(30)),
            email: "anna@acme.se".into(),
            ..Default::default()
        };
        let mut panel = SidebarPanel::new("p", "");
        panel.show(&meta);

        // Rows at width 20: documentation 0-1, website 2-4, email 5-6
        assert_eq!(panel.lines()[0].rows(20), 2);
        assert_eq!(panel.lines()[1].rows(20), 3);
        assert_eq!(panel.lines()[2].rows(20), 2);

        assert_eq!(panel.link_at(1, 20), None);
        for row in 2..5 {
            assert_eq!(panel.link_at(row, 20), panel.lines()[1].href());
        }
        assert_eq!(panel.link_at(6, 20).as_deref(), Some("mailto:anna@acme.se"));
        assert_eq!(panel.link_at(7, 20), None);
        assert_eq!(panel.link_at(2, 80).as_deref(), Some("mailto:anna@acme.se"));
    }

    #[test]
    fn test_markup_is_kept_as_text_and_controls_replaced() {
        let meta = MarkerMetadata {
            institution: "<b>Acme</b>\u{1b}[2J".into(),
            ..Default::default()
        };
        let mut panel = SidebarPanel::new("p", "");
        panel.show(&meta);
        assert_eq!(panel.title(), "<b>Acme</b>\u{FFFD}[2J");
    }

    #[test]
    fn test_open_and_close_by_id() {
        let mut sidebar = Sidebar::new(&SidebarConfig::default());
        sidebar.add_panel(SidebarPanel::new("info", "start"));
        assert!(!sidebar.is_open());

        assert!(!sidebar.open("missing"));
        assert!(!sidebar.is_open());

        assert!(sidebar.open("info"));
        assert_eq!(sidebar.active_panel().map(|p| p.id()), Some("info"));

        sidebar.close("other");
        assert!(sidebar.is_open());
        sidebar.close("info");
        assert!(!sidebar.is_open());

        sidebar.open_first();
        assert!(sidebar.is_open());
        sidebar.close_active();
        assert!(!sidebar.is_open());
    }
}
