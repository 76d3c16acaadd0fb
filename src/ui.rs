use crate::classification::{infer_education_levels, recommended_initial_kit, EducationLevel, Kit};
use crate::details::{get_establishment_details, EstablishmentDetails};
use crate::entities::{ConnectivityCategory, Establishment, ProgramEnrollment};
use crate::programs::get_programs;
use crate::search::search_establishments;
use crate::statistics::{dashboard_summary, DashboardSummary};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Search,
    Statistics,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Search => Page::Statistics,
            Page::Statistics => Page::Search,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Search => "Establishments",
            Page::Statistics => "Statistics",
        }
    }
}

/// Everything shown in the detail panel for the selected row.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub details: EstablishmentDetails,
    pub programs: Vec<ProgramEnrollment>,
    pub levels: Vec<EducationLevel>,
    pub kit: Option<&'static Kit>,
    pub connectivity: ConnectivityCategory,
}

pub struct App<'a> {
    conn: &'a Connection,
    pub query: String,
    pub editing: bool,
    pub results: Vec<Establishment>,
    pub state: TableState,
    pub current_page: Page,
    pub detail: Option<DetailView>,
    pub summary: DashboardSummary,
    pub message: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        let mut app = Self {
            conn,
            query: String::new(),
            editing: false,
            results: Vec::new(),
            state: TableState::default(),
            current_page: Page::Search,
            detail: None,
            summary: DashboardSummary::default(),
            message: None,
        };
        app.run_search();
        app.refresh_summary();
        app
    }

    pub fn run_search(&mut self) {
        match search_establishments(self.conn, &self.query) {
            Ok(results) => {
                self.message = None;
                self.results = results;
            }
            Err(e) => {
                self.message = Some(e.to_string());
                self.results.clear();
            }
        }
        self.detail = None;
        self.state
            .select(if self.results.is_empty() { None } else { Some(0) });
    }

    pub fn refresh_summary(&mut self) {
        self.summary = dashboard_summary(self.conn);
    }

    pub fn selected(&self) -> Option<&Establishment> {
        self.state.selected().and_then(|i| self.results.get(i))
    }

    /// Open or close the detail panel for the selected row.
    pub fn toggle_detail(&mut self) {
        if self.detail.is_some() {
            self.detail = None;
            return;
        }
        let Some(selected) = self.selected() else {
            return;
        };
        let (id, code) = (selected.id.clone(), selected.code);

        let loaded = get_establishment_details(self.conn, &id)
            .and_then(|details| Ok((details, get_programs(self.conn, code)?)));

        match loaded {
            Ok((details, programs)) => {
                let e = &details.establishment;
                let levels = infer_education_levels(e.level.as_deref());
                let kit = if levels.contains(&EducationLevel::Initial) {
                    recommended_initial_kit(e.sections)
                } else {
                    None
                };
                let connectivity = ConnectivityCategory::of(e);
                self.detail = Some(DetailView {
                    details,
                    programs,
                    levels,
                    kit,
                    connectivity,
                });
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    pub fn next(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.results.len() => i + 1,
            _ => 0,
        };
        self.select(i);
    }

    pub fn previous(&mut self) {
        if self.results.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.results.len() - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    fn select(&mut self, i: usize) {
        self.state.select(Some(i));
        self.detail = None;
    }

    /// Apply one key press. Returns `false` when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.editing {
            match code {
                KeyCode::Enter => {
                    self.editing = false;
                    self.run_search();
                }
                KeyCode::Esc => self.editing = false,
                KeyCode::Backspace => {
                    self.query.pop();
                }
                KeyCode::Char(c) => self.query.push(c),
                _ => {}
            }
            return true;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::Char('/') => {
                self.current_page = Page::Search;
                self.editing = true;
            }
            KeyCode::Char('r') => {
                self.run_search();
                self.refresh_summary();
            }
            KeyCode::Enter if self.current_page == Page::Search => self.toggle_detail(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key.code, key.modifiers) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Search if app.detail.is_some() => {
            let content = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[1]);
            render_table(f, content[0], app);
            render_detail_panel(f, content[1], app);
        }
        Page::Search => render_table(f, chunks[1], app),
        Page::Statistics => render_statistics(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Search, Page::Statistics].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  Search: "));
    let query_style = if app.editing {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let cursor = if app.editing { "▏" } else { "" };
    spans.push(Span::styled(format!("{}{}", app.query, cursor), query_style));

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Code", "Name", "District", "City", "Level"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.results.iter().map(|e| {
        Row::new(vec![
            Cell::from(e.code.to_string()),
            Cell::from(truncate(e.display_name(), 36)),
            Cell::from(truncate(e.district.as_deref().unwrap_or("-"), 18)),
            Cell::from(truncate(e.city.as_deref().unwrap_or("-"), 18)),
            Cell::from(truncate(e.level.as_deref().unwrap_or("-"), 20)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(38),
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Length(22),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Establishments ({}) ", app.results.len())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        format!("  {}", title),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("-").to_string()
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(view) = &app.detail else {
        return;
    };
    let e = &view.details.establishment;

    let mut lines = vec![
        field("Code", e.code.to_string()),
        field("Name", e.display_name().to_string()),
        field("Address", or_dash(e.address.as_deref())),
        field("District", or_dash(e.district.as_deref())),
        field("City", or_dash(e.city.as_deref())),
        field("Level", or_dash(e.level.as_deref())),
        field(
            "Enrollment",
            e.enrollment.map_or("-".to_string(), |n| n.to_string()),
        ),
        field("Connectivity", view.connectivity.label().to_string()),
        Line::from(""),
        section("CONTACT"),
    ];

    match &view.details.contact {
        Some(c) => {
            lines.push(field("Name", c.full_name()));
            lines.push(field("Role", or_dash(c.role.as_deref())));
            lines.push(field("Phone", or_dash(c.phone.as_deref())));
            lines.push(field("Email", or_dash(c.email.as_deref())));
        }
        None => lines.push(Line::from("  (none)")),
    }

    lines.push(Line::from(""));
    lines.push(section("EQUIPMENT"));
    match &view.details.equipment {
        Some(q) => {
            lines.push(field("Laptops", q.laptops.to_string()));
            lines.push(field("Tablets", q.tablets.to_string()));
            lines.push(field("Robotics kits", q.robotics_kits.to_string()));
            lines.push(field("3D printers", q.printers_3d.to_string()));
        }
        None => lines.push(Line::from("  (none)")),
    }

    lines.push(Line::from(""));
    lines.push(section("PROGRAMS"));
    if view.programs.is_empty() {
        lines.push(Line::from("  (none)"));
    }
    for p in &view.programs {
        lines.push(Line::from(format!("  • {}", p.program)));
    }

    lines.push(Line::from(""));
    let levels: Vec<&str> = view.levels.iter().map(EducationLevel::as_str).collect();
    lines.push(field("Levels", if levels.is_empty() { "-".to_string() } else { levels.join(", ") }));
    if let Some(kit) = view.kit {
        lines.push(field(
            "Initial kit",
            format!("{} ({} devices)", kit.code(), kit.equipment.total_devices()),
        ));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Details "),
    );
    f.render_widget(panel, area);
}

fn render_statistics(f: &mut Frame, area: Rect, app: &App) {
    let s = &app.summary;
    let g = &s.general;
    let c = &s.connectivity;

    let mut lines = vec![
        section("GENERAL"),
        field("Establishments", g.total_establishments.to_string()),
        field("Districts", s.district_count.to_string()),
        field("Total enrollment", s.total_enrollment.to_string()),
        field("Laptops", g.total_laptops.to_string()),
        field("Tablets", g.total_tablets.to_string()),
        field("Robotics kits", g.total_robotics_kits.to_string()),
        field("3D printers", g.total_printers_3d.to_string()),
        field(
            "Without equipment",
            format!("{} ({:.1}%)", g.without_equipment, g.without_equipment_pct),
        ),
        Line::from(""),
        section("CONNECTIVITY"),
    ];
    for category in ConnectivityCategory::ALL {
        lines.push(field(category.label(), c.count(category).to_string()));
    }

    lines.push(Line::from(""));
    lines.push(section("PROGRAMS"));
    for (program, count) in &s.programs.by_program {
        lines.push(field(program, count.to_string()));
    }
    lines.push(field(
        "With programs",
        s.programs.establishments_with_programs.to_string(),
    ));

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Dashboard "));
    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let mut spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.results.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(message.clone(), Style::default().fg(Color::Red)));
    }

    for (key, action) in [("/", "Search"), ("Enter", "Details"), ("Tab", "Page"), ("r", "Refresh")] {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}", action)));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::entities::{EstablishmentPatch, Program};
    use crate::programs::set_programs;
    use crate::testing::{insert_school, SchoolSeed};
    use crate::updates::patch_establishment;
    use ratatui::backend::TestBackend;

    fn type_query(app: &mut App, text: &str) {
        app.handle_key(KeyCode::Char('/'), KeyModifiers::NONE);
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
    }

    #[test]
    fn test_search_and_navigation() {
        let conn = open_in_memory().unwrap();
        insert_school(&conn, SchoolSeed::new(1, "Escuela Uno", "Merlo", "Merlo"));
        insert_school(&conn, SchoolSeed::new(2, "Escuela Dos", "Moreno", "Moreno"));
        insert_school(&conn, SchoolSeed::new(3, "Jardín Tres", "Moreno", "Moreno"));

        let mut app = App::new(&conn);
        assert_eq!(app.results.len(), 3);
        assert_eq!(app.summary.general.total_establishments, 3);

        type_query(&mut app, "moreno");
        assert!(!app.editing);
        assert_eq!(app.results.len(), 2);
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(1), "wraps to the last row");
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        // 'q' while typing is text, not quit
        app.handle_key(KeyCode::Char('/'), KeyModifiers::NONE);
        assert!(app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(app.query, "morenoq");
        app.handle_key(KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE));
    }

    #[test]
    fn test_detail_panel_loads_related_data() {
        let conn = open_in_memory().unwrap();
        let school = insert_school(&conn, SchoolSeed::new(905, "Jardín 905", "Lanús", "Lanús").level("Inicial"));
        patch_establishment(
            &conn,
            &school.id,
            &EstablishmentPatch {
                sections: Some(Some(11)),
                ..Default::default()
            },
        )
        .unwrap();
        set_programs(&conn, school.code, &[Program::AprenderConectadosInicial]).unwrap();

        let mut app = App::new(&conn);
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);

        let view = app.detail.as_ref().unwrap();
        assert_eq!(view.details.establishment.code, school.code);
        assert_eq!(view.programs.len(), 1);
        assert_eq!(view.levels, vec![EducationLevel::Initial]);
        assert_eq!(view.kit.map(Kit::code), Some('D'));
        assert_eq!(view.connectivity, ConnectivityCategory::Unknown);

        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.detail.is_none());
    }

    #[test]
    fn test_renders_both_pages() {
        let conn = open_in_memory().unwrap();
        insert_school(&conn, SchoolSeed::new(7, "Escuela de Educación Técnica N° 7", "Azul", "Azul"));

        let mut app = App::new(&conn);
        app.toggle_detail();
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        app.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.current_page, Page::Statistics);
        terminal.draw(|f| ui(f, &mut app)).unwrap();
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Jardín", 10), "Jardín");
        assert_eq!(truncate("Escuela Técnica", 8), "Escue...");
    }
}
