use crate::aggregate::{add_up, ranked, sum_by_category, sum_by_month, total};
use crate::dates::MonthKey;
use crate::entry::{display_amount, EntryKind, Record};
use crate::ledger::Ledger;
use crate::query::in_month;
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Entries,
    Categories,
    Months,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Entries => Page::Categories,
            Page::Categories => Page::Months,
            Page::Months => Page::Entries,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Entries => Page::Months,
            Page::Categories => Page::Entries,
            Page::Months => Page::Categories,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Entries => "Entries",
            Page::Categories => "By Category",
            Page::Months => "By Month",
        }
    }
}

/// Viewer state. Rows are display copies, re-fetched after every mutation.
pub struct App<K: EntryKind> {
    ledger: Ledger<K>,
    pub records: Vec<Record<K>>,
    pub state: TableState,
    pub current_page: Page,
    /// Restrict every page to the current month.
    pub month_only: Option<MonthKey>,
    pub show_detail: bool,
    pub status: Option<String>,
}

impl<K: EntryKind> App<K> {
    pub fn new(ledger: Ledger<K>) -> Self {
        let mut app = Self {
            ledger,
            records: Vec::new(),
            state: TableState::default(),
            current_page: Page::Entries,
            month_only: None,
            show_detail: false,
            status: None,
        };
        app.reload();
        app
    }

    /// Re-read the ledger. Storage failures leave an empty view plus a warning.
    pub fn reload(&mut self) {
        match self.ledger.listing() {
            Ok(listing) => {
                self.records = match self.month_only {
                    Some(month) => in_month(&listing.entries, month),
                    None => listing.entries,
                };
                self.status = listing.warning;
            }
            Err(err) => {
                self.records.clear();
                self.status = Some(err.to_string());
            }
        }

        let selected = self.state.selected().unwrap_or(0);
        if self.records.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(selected.min(self.records.len() - 1)));
        }
    }

    pub fn toggle_month(&mut self) {
        self.month_only = match self.month_only {
            Some(_) => None,
            None => Some(MonthKey::of(Local::now().date_naive())),
        };
        self.reload();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_record(&self) -> Option<&Record<K>> {
        self.state.selected().and_then(|i| self.records.get(i))
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_record().map(|r| r.id) else {
            return;
        };
        match self.ledger.remove_entry(id) {
            Ok(()) => {
                self.reload();
                self.status = Some(format!("Deleted {} #{}", K::KIND, id));
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    pub fn next(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }
}

pub fn run_ui<K: EntryKind>(app: &mut App<K>) -> Result<()> {
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, K: EntryKind>(
    terminal: &mut Terminal<B>,
    app: &mut App<K>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.current_page = app.current_page.previous();
                    } else {
                        app.current_page = app.current_page.next();
                    }
                }
                KeyCode::BackTab => app.current_page = app.current_page.previous(),
                KeyCode::Char('m') => app.toggle_month(),
                KeyCode::Char('r') => app.reload(),
                KeyCode::Char('d') if app.current_page == Page::Entries => app.delete_selected(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home if !app.records.is_empty() => app.state.select(Some(0)),
                KeyCode::End if !app.records.is_empty() => {
                    app.state.select(Some(app.records.len() - 1))
                }
                _ => {}
            }
        }
    }
}

fn ui<K: EntryKind>(f: &mut Frame, app: &mut App<K>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Entries {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Entries => render_table(f, chunks[1], app),
            Page::Categories => render_categories(f, chunks[1], app),
            Page::Months => render_months(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<K: EntryKind>(f: &mut Frame, area: Rect, app: &App<K>) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Entries, Page::Categories, Page::Months].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} entries: {}", K::KIND, app.records.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", display_amount(total(&app.records))),
        Style::default().fg(Color::Green),
    ));
    if let Some(month) = app.month_only {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Month: {}", month),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(labels: impl IntoIterator<Item = String>) -> Row<'static> {
    Row::new(labels.into_iter().map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1)
}

fn render_table<K: EntryKind>(f: &mut Frame, area: Rect, app: &mut App<K>) {
    let labels = std::iter::once("id".to_string()).chain(K::COLUMNS.iter().map(|c| c.replace('_', " ")));
    let header = header_row(labels);

    let rows = app.records.iter().map(|record| {
        let mut cells = vec![Cell::from(record.id.to_string())];
        for (column, value) in K::COLUMNS.iter().zip(record.entry.row()) {
            let cell = if *column == "amount" {
                Cell::from(record.entry.search_text("amount").unwrap_or(value))
                    .style(Style::default().fg(Color::Green))
            } else {
                Cell::from(truncate(&value, 32))
            };
            cells.push(cell);
        }
        Row::new(cells).height(1)
    });

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(6))
        .chain(K::COLUMNS.iter().map(|column| match *column {
            "amount" | "date" => Constraint::Length(12),
            "quantity" | "payment_mode" => Constraint::Length(13),
            _ => Constraint::Min(16),
        }))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" {} ledger ", K::KIND)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_categories<K: EntryKind>(f: &mut Frame, area: Rect, app: &App<K>) {
    let totals = ranked(&sum_by_category(&app.records));

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let labels: Vec<String> = totals.iter().map(|(c, _)| truncate(c, 10)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(&totals)
        .map(|(label, (_, amount))| (label.as_str(), amount.round().to_u64().unwrap_or(0)))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Distribution by Category "),
        )
        .data(bars.as_slice())
        .bar_width(10)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, chunks[0]);

    let grand_total = total(&app.records);
    let rows = totals.iter().map(|(category, amount)| {
        let share = if grand_total.is_zero() {
            0.0
        } else {
            (*amount / grand_total * rust_decimal::Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        };
        Row::new(vec![
            Cell::from(truncate(category, 28)),
            Cell::from(display_amount(*amount)).style(Style::default().fg(Color::Green)),
            Cell::from(format!("{:.1}%", share)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Min(20), Constraint::Length(14), Constraint::Length(8)],
    )
    .header(header_row(["Category", "Total", "Share"].map(String::from)))
    .block(Block::default().borders(Borders::ALL).title(" Totals "));
    f.render_widget(table, chunks[1]);
}

fn render_months<K: EntryKind>(f: &mut Frame, area: Rect, app: &App<K>) {
    let monthly = sum_by_month(&app.records);

    let rows = monthly.iter().rev().flat_map(|(month, categories)| {
        let month_total = add_up(categories.values().copied());
        let mut rows = vec![Row::new(vec![
            Cell::from(month.to_string()).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Cell::from(""),
            Cell::from(display_amount(month_total)).style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ])];
        rows.extend(categories.iter().map(|(category, amount)| {
            Row::new(vec![
                Cell::from(""),
                Cell::from(truncate(category, 40)),
                Cell::from(display_amount(*amount)),
            ])
        }));
        rows
    });

    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Min(20), Constraint::Length(14)],
    )
    .header(header_row(["Month", "Category", "Total"].map(String::from)))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Monthly Totals "),
    );

    f.render_widget(table, area);
}

fn render_detail_panel<K: EntryKind>(f: &mut Frame, area: Rect, app: &App<K>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Entry Details ");

    let Some(record) = app.selected_record() else {
        f.render_widget(Paragraph::new("No entry selected").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  id: ", label),
            Span::raw(record.id.to_string()),
        ]),
    ];
    for (column, value) in K::COLUMNS.iter().zip(record.entry.row()) {
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(format!("  {}: ", column.replace('_', " ")), label),
            Span::raw(value),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("  counts as: ", label),
        Span::styled(
            display_amount(record.entry.effective_amount()),
            Style::default().fg(Color::Green),
        ),
    ]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar<K: EntryKind>(f: &mut Frame, area: Rect, app: &App<K>) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.records.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Red)));
    }

    for (key, action) in [("Enter", " Details"), ("Tab", " Page"), ("m", " Month"), ("d", " Delete"), ("q", " Quit")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(action));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
