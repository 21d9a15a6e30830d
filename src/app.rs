use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::builder::{LinkOutcome, PluginBuilder, Stats, ValidationReport};
use crate::model::config::AppConfig;
use crate::model::mode::{Mode, PromptKind, Screen};
use crate::model::{Asset, AssetForm, AssetType, Plugin, UsageInfo};
use crate::msg::Msg;

const REFRESH_DEBOUNCE: Duration = Duration::from_millis(200);
const MAX_NOTIFICATIONS: usize = 8;

/// Which pane of the plugins screen receives `j`/`k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PluginPane {
    List,
    Contents,
}

/// Everything the view needs, rebuilt from disk on refresh.
#[derive(Debug, Default)]
struct Snapshot {
    assets: Vec<Asset>,
    plugins: Vec<Plugin>,
    usage: BTreeMap<String, UsageInfo>,
    stats: Stats,
    validation: Option<ValidationReport>,
}

pub struct App {
    pub screen: Screen,
    pub mode: Mode,
    pub config: AppConfig,
    builder: PluginBuilder,
    snapshot: Snapshot,
    asset_filter: Option<AssetType>,
    asset_selected: usize,
    plugin_selected: usize,
    plugin_pane: PluginPane,
    entry_selected: usize,
    search_query: String,
    search_results: Vec<Asset>,
    search_selected: usize,
    prompt_input: String,
    pub notifications: VecDeque<String>,
    pub should_quit: bool,
    refresh_due: Option<Instant>,
}

impl App {
    pub fn new(builder: PluginBuilder, config: AppConfig) -> Result<Self> {
        let mut app = Self {
            screen: Screen::Dashboard,
            mode: Mode::Normal,
            config,
            builder,
            snapshot: Snapshot::default(),
            asset_filter: None,
            asset_selected: 0,
            plugin_selected: 0,
            plugin_pane: PluginPane::List,
            entry_selected: 0,
            search_query: String::new(),
            search_results: Vec::new(),
            search_selected: 0,
            prompt_input: String::new(),
            notifications: VecDeque::new(),
            should_quit: false,
            refresh_due: None,
        };
        app.rescan()?;
        Ok(app)
    }

    // ── MVU: Update ──────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Key(key) => self.handle_key(key)?,
            Msg::FileChanged(path) => {
                tracing::debug!("marketplace change: {}", path.display());
                self.refresh_due = Some(Instant::now() + REFRESH_DEBOUNCE);
            }
            Msg::Refresh => self.refresh(),
            Msg::Tick => {
                if self.refresh_due.is_some_and(|due| Instant::now() >= due) {
                    self.refresh();
                }
            }
            Msg::Quit => self.should_quit = true,
            Msg::Resize(_, _) => {}
        }
        Ok(())
    }

    /// Rescan, keeping the previous snapshot on screen if the scan fails.
    fn refresh(&mut self) {
        if let Err(err) = self.rescan() {
            tracing::warn!("rescan failed: {err}");
            self.push_notification(format!("Error: {err}"));
        }
    }

    /// Rescan the marketplace and clamp selections to the new data.
    fn rescan(&mut self) -> Result<()> {
        self.refresh_due = None;
        self.snapshot = Snapshot {
            assets: self.builder.list_assets(None)?,
            plugins: self.builder.list_plugins()?,
            usage: self.builder.usage()?,
            stats: self.builder.stats()?,
            validation: self.builder.validate().ok(),
        };

        self.asset_selected = clamp(self.asset_selected, self.visible_assets().len());
        self.plugin_selected = clamp(self.plugin_selected, self.snapshot.plugins.len());
        self.entry_selected = clamp(self.entry_selected, self.selected_entries().len());
        if self.mode == Mode::Search {
            self.refresh_search_results();
        }
        Ok(())
    }

    fn push_notification(&mut self, message: String) {
        tracing::info!("{message}");
        self.notifications.push_back(message);
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode {
            Mode::Normal => self.handle_key_normal(key),
            Mode::Search => self.handle_key_search(key),
            Mode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                    self.mode = Mode::Normal;
                }
                Ok(())
            }
            Mode::Prompt(kind) => self.handle_key_prompt(kind, key),
        }
    }

    fn handle_key_normal(&mut self, key: KeyEvent) -> Result<()> {
        if self.screen == Screen::Plugins && self.handle_key_plugins(key)? {
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.screen = Screen::Dashboard,
            KeyCode::Char('d') => self.screen = Screen::Dashboard,
            KeyCode::Char('a') => self.screen = Screen::Assets,
            KeyCode::Char('p') => self.screen = Screen::Plugins,
            KeyCode::Tab => self.screen = next_screen(self.screen),
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                self.search_query.clear();
                self.search_results.clear();
                self.search_selected = 0;
            }
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Char('v') => self.run_validation()?,
            KeyCode::Char('f') if self.screen == Screen::Assets => {
                self.asset_filter = next_filter(self.asset_filter);
                self.asset_selected = 0;
            }
            KeyCode::Char('j') | KeyCode::Down if self.screen == Screen::Assets => {
                self.asset_selected = step(self.asset_selected, 1, self.visible_assets().len());
            }
            KeyCode::Char('k') | KeyCode::Up if self.screen == Screen::Assets => {
                self.asset_selected = step(self.asset_selected, -1, self.visible_assets().len());
            }
            _ => {}
        }
        Ok(())
    }

    /// Keys specific to the plugins screen. Returns `true` when consumed.
    fn handle_key_plugins(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('n') => self.open_prompt(PromptKind::NewPlugin),
            KeyCode::Char('a') => {
                if self.selected_plugin().is_none() {
                    self.push_notification("Select a plugin first".to_string());
                } else {
                    self.open_prompt(PromptKind::AddAsset);
                }
            }
            KeyCode::Char('r') => self.remove_selected_entry()?,
            KeyCode::Char('h') | KeyCode::Left => self.plugin_pane = PluginPane::List,
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => {
                if !self.selected_entries().is_empty() {
                    self.plugin_pane = PluginPane::Contents;
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_plugin_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_plugin_selection(-1),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn move_plugin_selection(&mut self, delta: isize) {
        match self.plugin_pane {
            PluginPane::List => {
                let before = self.plugin_selected;
                self.plugin_selected = step(before, delta, self.snapshot.plugins.len());
                if before != self.plugin_selected {
                    self.entry_selected = 0;
                }
            }
            PluginPane::Contents => {
                self.entry_selected = step(self.entry_selected, delta, self.selected_entries().len());
            }
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt_input.clear();
        self.mode = Mode::Prompt(kind);
    }

    fn handle_key_prompt(&mut self, kind: PromptKind, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.prompt_input.clear();
            }
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.prompt_input);
                self.mode = Mode::Normal;
                match kind {
                    PromptKind::NewPlugin => self.submit_new_plugin(&input)?,
                    PromptKind::AddAsset => self.submit_add_asset(&input)?,
                }
            }
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.prompt_input.push(ch);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_key_search(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.search_query.clear();
                self.search_results.clear();
                self.search_selected = 0;
            }
            KeyCode::Enter => {
                if let Some(asset) = self.search_results.get(self.search_selected).cloned() {
                    self.focus_asset(&asset);
                }
                self.mode = Mode::Normal;
                self.search_query.clear();
                self.search_results.clear();
                self.search_selected = 0;
            }
            KeyCode::Down => {
                self.search_selected = step(self.search_selected, 1, self.search_results.len());
            }
            KeyCode::Up => {
                self.search_selected = step(self.search_selected, -1, self.search_results.len());
            }
            KeyCode::Backspace => {
                self.search_query.pop();
                self.refresh_search_results();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.search_query.push(ch);
                self.refresh_search_results();
            }
            _ => {}
        }
        Ok(())
    }

    /// Substring hits on name or description, best fuzzy score first.
    fn refresh_search_results(&mut self) {
        self.search_results.clear();
        self.search_selected = 0;

        let query = self.search_query.trim();
        if query.chars().count() < self.config.search.min_query_len {
            return;
        }

        let needle = query.to_lowercase();
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, &Asset)> = self
            .snapshot
            .assets
            .iter()
            .filter(|asset| {
                asset.name.to_lowercase().contains(&needle)
                    || asset.description.to_lowercase().contains(&needle)
            })
            .map(|asset| {
                let score = matcher.fuzzy_match(&asset.name, query).unwrap_or(0);
                (score, asset)
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.key().cmp(&b.1.key())));

        self.search_results = scored
            .into_iter()
            .take(self.config.search.max_results)
            .map(|(_, asset)| asset.clone())
            .collect();
    }

    fn focus_asset(&mut self, asset: &Asset) {
        self.screen = Screen::Assets;
        self.asset_filter = None;
        if let Some(index) = self
            .snapshot
            .assets
            .iter()
            .position(|a| a.key() == asset.key())
        {
            self.asset_selected = index;
        }
    }

    fn run_validation(&mut self) -> Result<()> {
        let report = match self.builder.validate() {
            Ok(report) => report,
            Err(err) => {
                self.push_notification(format!("Error: {err}"));
                return Ok(());
            }
        };
        let broken = report.broken().count();
        let warnings = report.warnings().count();
        let message = if report.issues.is_empty() {
            "All plugins validated successfully".to_string()
        } else {
            format!("Validation: {broken} broken, {warnings} warnings")
        };
        self.snapshot.validation = Some(report);
        self.push_notification(message);
        Ok(())
    }

    fn submit_new_plugin(&mut self, input: &str) -> Result<()> {
        let (name, description) = match input.split_once(':') {
            Some((name, description)) => (name.trim(), description.trim()),
            None => (input.trim(), ""),
        };
        if name.is_empty() {
            self.push_notification("Plugin name is required".to_string());
            return Ok(());
        }

        match self.builder.create_plugin(name, description) {
            Ok(plugin) => {
                self.push_notification(format!("Created plugin: {}", plugin.name));
                self.refresh();
                if let Some(index) = self.snapshot.plugins.iter().position(|p| p.dir == plugin.dir) {
                    self.plugin_selected = index;
                    self.entry_selected = 0;
                }
            }
            Err(err) => self.push_notification(format!("Error: {err}")),
        }
        Ok(())
    }

    fn submit_add_asset(&mut self, input: &str) -> Result<()> {
        let Some(plugin) = self.selected_plugin_dir_name() else {
            self.push_notification("Select a plugin first".to_string());
            return Ok(());
        };

        let parsed = input
            .trim()
            .split_once('/')
            .and_then(|(kind, name)| Some((kind.parse::<AssetType>().ok()?, name.trim())))
            .filter(|(_, name)| !name.is_empty());
        let Some((asset_type, name)) = parsed else {
            self.push_notification(format!(
                "Expected type/name, e.g. skills/reviewer (got '{}')",
                input.trim()
            ));
            return Ok(());
        };

        match self.builder.add_asset_to_plugin(&plugin, name, asset_type) {
            Ok(LinkOutcome::Linked(_)) => self.push_notification(format!(
                "Added {} '{name}' to plugin '{plugin}'",
                asset_type.singular()
            )),
            Ok(LinkOutcome::AlreadyPresent(path)) => self.push_notification(format!(
                "Asset already exists in plugin: {}",
                path.display()
            )),
            Err(err) => self.push_notification(format!("Error: {err}")),
        }
        self.refresh();
        Ok(())
    }

    fn remove_selected_entry(&mut self) -> Result<()> {
        let Some(plugin) = self.selected_plugin_dir_name() else {
            self.push_notification("Select a plugin first".to_string());
            return Ok(());
        };
        let Some((asset_type, name)) = self.selected_entries().get(self.entry_selected).cloned()
        else {
            self.push_notification("Select an asset to remove".to_string());
            return Ok(());
        };

        match self
            .builder
            .remove_asset_from_plugin(&plugin, &name, asset_type)
        {
            Ok(()) => self.push_notification(format!(
                "Removed {} '{name}' from plugin '{plugin}'",
                asset_type.singular()
            )),
            Err(err) => self.push_notification(format!("Error: {err}")),
        }
        self.refresh();
        if self.selected_entries().is_empty() {
            self.plugin_pane = PluginPane::List;
        }
        Ok(())
    }

    fn visible_assets(&self) -> Vec<&Asset> {
        self.snapshot
            .assets
            .iter()
            .filter(|a| self.asset_filter.is_none_or(|t| a.asset_type == t))
            .collect()
    }

    fn selected_plugin(&self) -> Option<&Plugin> {
        self.snapshot.plugins.get(self.plugin_selected)
    }

    /// Directory name of the selected plugin, used for filesystem operations.
    fn selected_plugin_dir_name(&self) -> Option<String> {
        self.selected_plugin().map(|p| {
            p.dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.name.clone())
        })
    }

    fn selected_entries(&self) -> Vec<(AssetType, String)> {
        self.selected_plugin()
            .map(|plugin| {
                AssetType::ALL
                    .into_iter()
                    .flat_map(|t| plugin.assets(t).iter().map(move |name| (t, name.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // screen tabs
                Constraint::Min(1),    // body
                Constraint::Length(1), // status bar
            ])
            .split(frame.area());

        self.render_tab_bar(frame, chunks[0]);
        match self.screen {
            Screen::Dashboard => self.render_dashboard(frame, chunks[1]),
            Screen::Assets => self.render_assets(frame, chunks[1]),
            Screen::Plugins => self.render_plugins(frame, chunks[1]),
        }
        self.render_status_bar(frame, chunks[2]);

        match self.mode {
            Mode::Search => self.render_search_overlay(frame),
            Mode::Help => self.render_help_overlay(frame),
            Mode::Prompt(kind) => self.render_prompt_overlay(frame, kind),
            Mode::Normal => {}
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            " plugin-builder ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        for (key, screen) in [
            ('d', Screen::Dashboard),
            ('a', Screen::Assets),
            ('p', Screen::Plugins),
        ] {
            let style = if screen == self.screen {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!("  [{key}] {}", screen.label()), style));
        }

        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(15, 15, 24))),
            area,
        );
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let stats = &self.snapshot.stats;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        let first = [
            ("Commands", stats.commands.to_string()),
            ("Agents", stats.agents.to_string()),
            ("Skills", stats.skills.to_string()),
            ("Plugins", stats.plugins.to_string()),
        ];
        let second = [
            ("Total Assets", stats.total_assets.to_string()),
            ("Total Size", format!("{} KB", stats.total_size_kb)),
            ("Avg per Plugin", format!("{:.1}", stats.avg_assets_per_plugin)),
        ];
        render_stat_row(frame, rows[0], &first);
        render_stat_row(frame, rows[1], &second);

        let health = Paragraph::new(self.health_lines())
            .block(Block::default().title(" Health ").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(health, rows[2]);

        let hint = Paragraph::new(Line::from(Span::styled(
            " a: assets  p: plugins  /: search  v: validate  ?: help  q: quit",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(hint, rows[3]);
    }

    fn health_lines(&self) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();

        let (broken, warnings) = self
            .snapshot
            .validation
            .as_ref()
            .map(|r| (r.broken().count(), r.warnings().count()))
            .unwrap_or((0, 0));
        let orphans: Vec<&UsageInfo> = self
            .snapshot
            .usage
            .values()
            .filter(|u| u.is_orphan())
            .collect();
        let shared = self.snapshot.usage.values().filter(|u| u.is_shared()).count();

        if broken == 0 && warnings == 0 && orphans.is_empty() {
            lines.push(Line::from(Span::styled(
                "All systems healthy",
                Style::default().fg(Color::Green),
            )));
        }
        if broken > 0 {
            lines.push(Line::from(Span::styled(
                format!("Broken symlinks: {broken}"),
                Style::default().fg(Color::Red),
            )));
        }
        if !orphans.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Orphaned assets: {}", orphans.len()),
                Style::default().fg(Color::Yellow),
            )));
            for info in orphans.iter().take(3) {
                lines.push(Line::from(Span::styled(
                    format!("  {}/{}", info.asset_type, info.asset_name),
                    dim,
                )));
            }
            if orphans.len() > 3 {
                lines.push(Line::from(Span::styled(
                    format!("  ... and {} more", orphans.len() - 3),
                    dim,
                )));
            }
        }
        if warnings > 0 {
            lines.push(Line::from(Span::styled(
                format!("Warnings: {warnings}"),
                Style::default().fg(Color::Yellow),
            )));
        }
        if shared > 0 {
            lines.push(Line::from(Span::styled(
                format!("Shared assets: {shared}"),
                Style::default().fg(Color::Blue),
            )));
        }
        lines
    }

    fn render_assets(&self, frame: &mut Frame, area: Rect) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Min(1)])
            .split(area);

        let assets = self.visible_assets();
        let title = match self.asset_filter {
            Some(t) => format!(" Assets: {t} (f: filter) "),
            None => " Assets: all (f: filter) ".to_string(),
        };
        let items: Vec<Line> = if assets.is_empty() {
            vec![Line::from(Span::styled(
                "No assets in registry",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            assets
                .iter()
                .enumerate()
                .map(|(idx, asset)| {
                    selectable_line(
                        format!("[{}] {}", asset.asset_type.singular(), asset.name),
                        idx == self.asset_selected,
                    )
                })
                .collect()
        };
        frame.render_widget(
            Paragraph::new(scroll_window(items, self.asset_selected, body[0].height))
                .block(Block::default().title(title).borders(Borders::ALL)),
            body[0],
        );

        let detail = match assets.get(self.asset_selected) {
            Some(asset) => self.asset_detail_lines(asset),
            None => vec![Line::from("")],
        };
        frame.render_widget(
            Paragraph::new(detail)
                .block(Block::default().title(" Details ").borders(Borders::ALL))
                .wrap(Wrap { trim: false }),
            body[1],
        );
    }

    fn asset_detail_lines(&self, asset: &Asset) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        let field = |name: &str, value: String| {
            Line::from(vec![Span::styled(format!("{name:<10}"), label), Span::raw(value)])
        };

        let mut lines = vec![
            Line::from(Span::styled(
                asset.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            field("Type", asset.asset_type.to_string()),
            field(
                "Form",
                match asset.form {
                    AssetForm::LeafFile => "file".to_string(),
                    AssetForm::DirectoryTree => "directory".to_string(),
                },
            ),
            field("Size", format!("{} bytes", asset.size_bytes)),
            field(
                "Modified",
                asset
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            field("Path", asset.path.display().to_string()),
            Line::from(""),
        ];

        if !asset.description.is_empty() {
            lines.push(Line::from(asset.description.clone()));
            lines.push(Line::from(""));
        }

        let plugins = self
            .snapshot
            .usage
            .get(&asset.key())
            .map(|u| u.plugins.clone())
            .unwrap_or_default();
        if plugins.is_empty() {
            lines.push(Line::from(Span::styled(
                "Not used by any plugin",
                Style::default().fg(Color::Yellow),
            )));
        } else {
            lines.push(Line::from(Span::styled("Used by:", label)));
            for plugin in plugins {
                lines.push(Line::from(format!("  {plugin}")));
            }
        }
        lines
    }

    fn render_plugins(&self, frame: &mut Frame, area: Rect) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Min(1)])
            .split(area);

        let list_focus = self.plugin_pane == PluginPane::List;
        let items: Vec<Line> = if self.snapshot.plugins.is_empty() {
            vec![Line::from(Span::styled(
                "No plugins found (n: new)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.snapshot
                .plugins
                .iter()
                .enumerate()
                .map(|(idx, plugin)| {
                    selectable_line(
                        format!("{} ({})", plugin.name, plugin.total_assets()),
                        list_focus && idx == self.plugin_selected,
                    )
                })
                .collect()
        };
        frame.render_widget(
            Paragraph::new(scroll_window(items, self.plugin_selected, body[0].height))
                .block(Block::default().title(" Plugins ").borders(Borders::ALL)),
            body[0],
        );

        let (title, lines) = match self.selected_plugin() {
            Some(plugin) => (
                format!(" {} ", plugin.name),
                self.plugin_detail_lines(plugin, !list_focus),
            ),
            None => (
                " Plugin Contents ".to_string(),
                vec![Line::from(Span::styled(
                    "Select a plugin to view its contents",
                    Style::default().fg(Color::DarkGray),
                ))],
            ),
        };
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().title(title).borders(Borders::ALL))
                .wrap(Wrap { trim: false }),
            body[1],
        );
    }

    fn plugin_detail_lines(&self, plugin: &Plugin, contents_focus: bool) -> Vec<Line<'static>> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = Vec::new();
        if !plugin.description.is_empty() {
            lines.push(Line::from(plugin.description.clone()));
        }
        lines.push(Line::from(Span::styled(
            format!("Version: {} | Category: {}", plugin.version, plugin.category),
            dim,
        )));
        lines.push(Line::from(""));

        let mut index = 0;
        for asset_type in AssetType::ALL {
            let names = plugin.assets(asset_type);
            if names.is_empty() {
                continue;
            }
            lines.push(Line::from(Span::styled(
                capitalize(asset_type.dir_name()),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for name in names {
                let label = match asset_type {
                    AssetType::Command => format!("/{name}"),
                    _ => name.clone(),
                };
                lines.push(selectable_line(
                    format!("  {label}"),
                    contents_focus && index == self.entry_selected,
                ));
                index += 1;
            }
        }
        if index == 0 {
            lines.push(Line::from(Span::styled("No assets", dim)));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "n: new plugin  a: add asset  r: remove asset  h/l: switch pane",
            dim,
        )));
        lines
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mode_style = match self.mode {
            Mode::Normal => Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            Mode::Search => Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            _ => Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        };
        let mode_span = Span::styled(format!(" {} ", self.mode.label()), mode_style);

        let notice = self
            .notifications
            .back()
            .map(|n| format!(" | {n}"))
            .unwrap_or_default();
        let info = Span::styled(
            format!(
                " {}  {} assets, {} plugins{} ",
                self.screen.label(),
                self.snapshot.stats.total_assets,
                self.snapshot.stats.plugins,
                notice
            ),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        );

        let bar = Line::from(vec![mode_span, info]);
        let status = Paragraph::new(bar).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status, area);
    }

    fn render_search_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(area);

        let input = Paragraph::new(self.search_query.clone()).block(
            Block::default()
                .title(" Search Assets ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(input, chunks[0]);

        let results: Vec<Line> = if self.search_query.trim().chars().count()
            < self.config.search.min_query_len
        {
            vec![Line::from(Span::styled(
                format!(
                    "Type at least {} characters",
                    self.config.search.min_query_len
                ),
                Style::default().fg(Color::DarkGray),
            ))]
        } else if self.search_results.is_empty() {
            vec![Line::from(Span::styled(
                "No matches",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.search_results
                .iter()
                .enumerate()
                .map(|(idx, asset)| {
                    let mut label = format!("{} ({})", asset.name, asset.asset_type);
                    if !asset.description.is_empty() {
                        label.push_str(&format!("  {}", truncate(&asset.description, 60)));
                    }
                    selectable_line(label, idx == self.search_selected)
                })
                .collect()
        };

        let result_block = Paragraph::new(scroll_window(
            results,
            self.search_selected,
            chunks[1].height,
        ))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .style(Style::default().bg(Color::Rgb(10, 10, 18))),
        );
        frame.render_widget(result_block, chunks[1]);

        let footer = Paragraph::new(" Enter: show asset  Esc: close  Up/Down: move ").block(
            Block::default().borders(Borders::ALL).style(
                Style::default()
                    .bg(Color::Rgb(15, 15, 24))
                    .fg(Color::DarkGray),
            ),
        );
        frame.render_widget(footer, chunks[2]);

        let cursor_x = chunks[0].x + 1 + self.search_query.chars().count() as u16;
        let cursor_y = chunks[0].y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn render_help_overlay(&self, frame: &mut Frame) {
        let area = centered_rect(50, 70, frame.area());
        frame.render_widget(Clear, area);

        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = HELP
            .iter()
            .map(|(key, action)| {
                if key.is_empty() {
                    Line::from(Span::styled(
                        action.to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(vec![
                        Span::styled(format!("  {key:<8}"), key_style),
                        Span::raw(action.to_string()),
                    ])
                }
            })
            .collect();

        let help = Paragraph::new(lines).block(
            Block::default()
                .title(" Keyboard Shortcuts ")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(help, area);
    }

    fn render_prompt_overlay(&self, frame: &mut Frame, kind: PromptKind) {
        let area = centered_rect(70, 20, frame.area());
        frame.render_widget(Clear, area);

        let title = match kind {
            PromptKind::NewPlugin => " New plugin (name or name: description) ",
            PromptKind::AddAsset => " Add asset (type/name, e.g. skills/reviewer) ",
        };
        let prompt = Paragraph::new(format!("> {}", self.prompt_input)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Rgb(15, 15, 24))),
        );
        frame.render_widget(prompt, area);

        let cursor_x = area.x + 3 + self.prompt_input.chars().count() as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

const HELP: &[(&str, &str)] = &[
    ("", "Navigation"),
    ("d", "Dashboard"),
    ("a", "Assets (add asset on Plugins)"),
    ("p", "Plugins"),
    ("Tab", "Next screen"),
    ("Esc", "Back / close"),
    ("j/k", "Move selection"),
    ("", ""),
    ("", "Actions"),
    ("/", "Search assets"),
    ("v", "Validate symlinks"),
    ("f", "Cycle type filter (Assets)"),
    ("n", "New plugin (Plugins)"),
    ("r", "Remove asset (Plugins)"),
    ("?", "Toggle help"),
    ("q", "Quit"),
];

fn render_stat_row(frame: &mut Frame, area: Rect, cards: &[(&str, String)]) {
    let constraints: Vec<Constraint> = cards
        .iter()
        .map(|_| Constraint::Ratio(1, cards.len() as u32))
        .collect();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for ((label, value), cell) in cards.iter().zip(cells.iter()) {
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                value.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                label.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(card, *cell);
    }
}

fn selectable_line(label: String, selected: bool) -> Line<'static> {
    if selected {
        Line::from(Span::styled(
            format!("> {label}"),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ))
    } else {
        Line::from(Span::styled(
            format!("  {label}"),
            Style::default().fg(Color::Gray),
        ))
    }
}

/// Lines visible in a bordered pane of `height`, keeping `selected` in view.
fn scroll_window(lines: Vec<Line<'static>>, selected: usize, height: u16) -> Vec<Line<'static>> {
    let visible = height.saturating_sub(2).max(1) as usize;
    let start = selected.saturating_sub(visible - 1);
    lines.into_iter().skip(start).take(visible).collect()
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn clamp(current: usize, len: usize) -> usize {
    current.min(len.saturating_sub(1))
}

fn next_screen(screen: Screen) -> Screen {
    match screen {
        Screen::Dashboard => Screen::Assets,
        Screen::Assets => Screen::Plugins,
        Screen::Plugins => Screen::Dashboard,
    }
}

fn next_filter(filter: Option<AssetType>) -> Option<AssetType> {
    match filter {
        None => Some(AssetType::Command),
        Some(AssetType::Command) => Some(AssetType::Agent),
        Some(AssetType::Agent) => Some(AssetType::Skill),
        Some(AssetType::Skill) => None,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(width).collect::<String>())
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(key(KeyCode::Char(ch))).unwrap();
        }
    }

    fn marketplace() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let skill = dir.path().join("registry/skills/reviewer");
        fs::create_dir_all(&skill).unwrap();
        fs::write(skill.join("SKILL.md"), "---\ndescription: \"Reviews code\"\n---\n").unwrap();
        let commands = dir.path().join("registry/commands");
        fs::create_dir_all(&commands).unwrap();
        fs::write(commands.join("commit.md"), "Write commit messages").unwrap();

        let builder = PluginBuilder::new(dir.path());
        builder.create_plugin("core", "Core tools").unwrap();
        let app = App::new(builder, AppConfig::default()).unwrap();
        (dir, app)
    }

    fn render(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.view(f)).unwrap();
    }

    #[test]
    fn screen_switching_and_quit() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.screen, Screen::Assets);
        app.update(key(KeyCode::Char('p'))).unwrap();
        assert_eq!(app.screen, Screen::Plugins);
        app.update(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.screen, Screen::Dashboard);
        app.update(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn search_needs_minimum_length_and_jumps_to_asset() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('/'))).unwrap();
        assert_eq!(app.mode, Mode::Search);

        type_text(&mut app, "r");
        assert!(app.search_results.is_empty());
        type_text(&mut app, "ev");
        assert_eq!(app.search_results.len(), 1);
        assert_eq!(app.search_results[0].name, "reviewer");
        render(&mut app);

        app.update(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.screen, Screen::Assets);
        let selected = app.visible_assets()[app.asset_selected].name.clone();
        assert_eq!(selected, "reviewer");
    }

    #[test]
    fn add_and_remove_through_prompts() {
        let (dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('p'))).unwrap();
        app.update(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.mode, Mode::Prompt(PromptKind::AddAsset));
        type_text(&mut app, "skills/reviewer");
        render(&mut app);
        app.update(key(KeyCode::Enter)).unwrap();

        assert!(dir.path().join("plugins/core/skills/reviewer").exists());
        assert_eq!(app.snapshot.plugins[0].skills, vec!["reviewer"]);
        assert!(app.notifications.back().unwrap().contains("Added skill"));

        app.update(key(KeyCode::Char('l'))).unwrap();
        app.update(key(KeyCode::Char('r'))).unwrap();
        assert!(app.snapshot.plugins[0].skills.is_empty());
        assert_eq!(app.plugin_pane, PluginPane::List);
    }

    #[test]
    fn bad_prompt_input_becomes_notification() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('p'))).unwrap();
        app.update(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "widgets/x");
        app.update(key(KeyCode::Enter)).unwrap();
        assert!(app.notifications.back().unwrap().contains("type/name"));

        app.update(key(KeyCode::Char('a'))).unwrap();
        type_text(&mut app, "skills/ghost");
        app.update(key(KeyCode::Enter)).unwrap();
        assert!(app.notifications.back().unwrap().starts_with("Error:"));
    }

    #[test]
    fn new_plugin_prompt_selects_created_plugin() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('p'))).unwrap();
        app.update(key(KeyCode::Char('n'))).unwrap();
        type_text(&mut app, "alpha: First one");
        app.update(key(KeyCode::Enter)).unwrap();

        assert_eq!(app.snapshot.plugins.len(), 2);
        assert_eq!(app.selected_plugin().unwrap().name, "alpha");
        assert_eq!(app.selected_plugin().unwrap().description, "First one");
    }

    #[test]
    fn filter_cycles_through_types() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.visible_assets().len(), 2);
        app.update(key(KeyCode::Char('f'))).unwrap();
        assert_eq!(app.asset_filter, Some(AssetType::Command));
        assert_eq!(app.visible_assets().len(), 1);
        for _ in 0..3 {
            app.update(key(KeyCode::Char('f'))).unwrap();
        }
        assert_eq!(app.asset_filter, None);
        render(&mut app);
    }

    #[cfg(unix)]
    #[test]
    fn failed_rescan_is_reported_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, mut app) = marketplace();
        let commands = dir.path().join("registry/commands");
        fs::set_permissions(&commands, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores directory permissions; nothing to observe then.
        if fs::read_dir(&commands).is_err() {
            app.update(Msg::Refresh).unwrap();
            assert!(
                app.notifications
                    .back()
                    .is_some_and(|n| n.starts_with("Error:"))
            );
            assert_eq!(app.snapshot.assets.len(), 2);
            assert!(!app.should_quit);
        }
        fs::set_permissions(&commands, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn file_changes_refresh_after_debounce() {
        let (dir, mut app) = marketplace();
        fs::write(dir.path().join("registry/commands/bump.md"), "Bump").unwrap();
        app.update(Msg::FileChanged(dir.path().join("registry/commands/bump.md")))
            .unwrap();
        assert_eq!(app.snapshot.assets.len(), 2);

        app.refresh_due = Some(Instant::now());
        app.update(Msg::Tick).unwrap();
        assert_eq!(app.snapshot.assets.len(), 3);
        assert!(app.refresh_due.is_none());
    }

    #[test]
    fn validate_and_help_render() {
        let (_dir, mut app) = marketplace();
        app.update(key(KeyCode::Char('v'))).unwrap();
        assert_eq!(
            app.notifications.back().map(String::as_str),
            Some("All plugins validated successfully")
        );
        render(&mut app);
        app.update(key(KeyCode::Char('?'))).unwrap();
        assert_eq!(app.mode, Mode::Help);
        render(&mut app);
        app.update(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.mode, Mode::Normal);
    }
}
