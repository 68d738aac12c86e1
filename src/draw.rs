use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs};
use tui::{Frame, Terminal};

use crate::app::{App, MenuItem};
use crate::state::app_state::{
    FormState, LoginField, ranked_participants, round_start_blocker, round_start_label,
};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::round::{RoundPhase, RoundSession, ScoreDialog, TableView};
use crate::ui::layout::LayoutAreas;
use tourney_api::Tournament;

static TABS: &[&str; 3] = &["Tournaments", "Tournament", "Round"];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let _ = terminal.draw(|f| {
        if !app.state.session.is_authenticated() {
            draw_login(f, f.area(), app);
            return;
        }

        layout.update(f.area(), app.state.full_screen);

        if !app.state.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status_line(f, layout.status, app);
        }

        let mut main = layout.main;
        if app.state.show_logs {
            let [top, logs] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(10)]).areas(main);
            main = top;
            draw_logs(f, logs);
        }

        match app.state.active_tab {
            MenuItem::Tournaments => draw_tournaments(f, main, app),
            MenuItem::TournamentDetail => draw_tournament_detail(f, main, app),
            MenuItem::RoundDetail => draw_round(f, main, app),
            MenuItem::Help => draw_placeholder(
                f,
                main,
                "Help: q=quit  1=Tournaments  j/k=move  Enter=open  R=refresh  n=next page  s=start round  L=logout  Esc=back  \"=logs  f=fullscreen",
            ),
        }

        if let Some(form) = app.state.form.as_ref() {
            draw_form(f, main, form);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Tournaments => 0,
        MenuItem::TournamentDetail => 1,
        MenuItem::RoundDetail => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let Some(status) = app.state.status.as_deref() else {
        return;
    };
    f.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Yellow)),
        area,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = tui_logger::TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(widget, area);
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

fn draw_login(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" podtui — sign in ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [_top_pad, form, _bottom_pad] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Fill(1),
    ])
    .areas(inner);

    let login = &app.state.login;
    let field_style = |field: LoginField| {
        if login.field == field {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };
    let masked: String = login.password.chars().map(|_| '*').collect();

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Email:    ", field_style(LoginField::Email)),
            Span::raw(login.email.as_str()),
            Span::raw(if login.field == LoginField::Email { "_" } else { "" }),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_style(LoginField::Password)),
            Span::raw(masked),
            Span::raw(if login.field == LoginField::Password { "_" } else { "" }),
        ]),
        Line::from(""),
    ];

    if login.in_flight {
        lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(error) = login.error.as_deref() {
        lines.push(Line::from(Span::styled(
            error,
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Tab=switch field  Enter=sign in  Ctrl+C=quit",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), form);
}

// ---------------------------------------------------------------------------
// Tournament list
// ---------------------------------------------------------------------------

fn draw_tournaments(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Tournaments ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let list = &app.state.tournaments;

    if !list.loaded {
        f.render_widget(
            Paragraph::new("Loading tournaments...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    if let Some(error) = list.error.as_deref() {
        f.render_widget(
            Paragraph::new(format!("Tournament list load failed:\n{error}\n\nR=retry"))
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    if list.tournaments.is_empty() {
        f.render_widget(
            Paragraph::new("No tournaments yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let [rows_area, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    let mut lines = Vec::with_capacity(list.tournaments.len());
    for (idx, t) in list.tournaments.iter().enumerate() {
        let marker = if idx == list.selected { '>' } else { ' ' };
        let row_style = if idx == list.selected {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} {}", t.name), row_style),
            Span::styled(
                format!("  [{}]", t.status.label()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    f.render_widget(Paragraph::new(lines), rows_area);

    let footer_text = if list.last_page {
        "j/k=move  Enter=open  c=new  R=refresh".to_string()
    } else {
        format!("j/k=move  Enter=open  c=new  n=next page (page {})  R=refresh", list.page)
    };
    f.render_widget(
        Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray)),
        footer,
    );
}

// ---------------------------------------------------------------------------
// Tournament detail
// ---------------------------------------------------------------------------

fn draw_tournament_detail(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Tournament ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(error) = app.state.detail.error.as_deref() {
        f.render_widget(
            Paragraph::new(format!("Tournament load failed:\n{error}\n\nR=retry"))
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let Some(tournament) = app.state.detail.tournament.as_ref() else {
        f.render_widget(
            Paragraph::new("Loading tournament...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let [header, body] =
        Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(inner);
    let [participants_area, rounds_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);

    let header_lines = vec![
        Line::from(Span::styled(
            tournament.name.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(tournament.format.as_str(), Style::default().fg(Color::Gray)),
            Span::styled(
                format!("  [{}]", tournament.status.label()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            tournament.description_raw.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(header_lines), header);

    draw_participants(f, participants_area, app, tournament);
    draw_rounds(f, rounds_area, app, tournament);
}

fn draw_participants(f: &mut Frame, area: Rect, app: &App, tournament: &Tournament) {
    let block = default_border(Color::DarkGray).title(format!(
        " Players ({}) ",
        tournament.participants.len()
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [rows_area, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    let is_owner = app.viewer_owns_detail();
    let lines: Vec<Line> = ranked_participants(tournament)
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let marker = if is_owner && idx == app.state.detail.player_cursor {
                '>'
            } else {
                ' '
            };
            Line::from(vec![
                Span::styled(format!("{marker} {}", p.name), Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("  {} pts", p.points.unwrap_or(0)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), rows_area);

    if is_owner {
        f.render_widget(
            Paragraph::new("a=add  e=rename  p/P=select")
                .style(Style::default().fg(Color::DarkGray)),
            footer,
        );
    }
}

fn draw_rounds(f: &mut Frame, area: Rect, app: &App, tournament: &Tournament) {
    let block = default_border(Color::DarkGray).title(format!(
        " Rounds ({}/{}) ",
        tournament.rounds.len(),
        tournament.round_count
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [rows_area, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]).areas(inner);

    let mut lines = Vec::with_capacity(tournament.rounds.len());
    for (idx, round) in tournament.rounds.iter().enumerate() {
        let marker = if idx == app.state.detail.selected_round { '>' } else { ' ' };
        let badge = if round.is_complete { "complete" } else { "in progress" };
        let row_style = if idx == app.state.detail.selected_round {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} Round {}", round.number + 1), row_style),
            Span::styled(format!("  [{badge}]"), Style::default().fg(Color::DarkGray)),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No rounds yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines), rows_area);

    // Round-start action only renders for the organizer.
    if app.viewer_owns_detail() && tournament.rounds.len() < tournament.round_count as usize {
        let footer_line = match round_start_blocker(tournament) {
            None => Line::from(Span::styled(
                format!("s={}", round_start_label(tournament)),
                Style::default().fg(Color::Green),
            )),
            Some(reason) => Line::from(Span::styled(reason, Style::default().fg(Color::Yellow))),
        };
        f.render_widget(Paragraph::new(footer_line), footer);
    }
}

// ---------------------------------------------------------------------------
// Round view
// ---------------------------------------------------------------------------

fn draw_round(f: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.state.round.as_ref() else {
        draw_placeholder(f, area, "No round open");
        return;
    };

    let block = default_border(Color::White).title(format!(" Round {} ", session.number + 1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match &session.phase {
        RoundPhase::Loading => {
            f.render_widget(
                Paragraph::new("Loading round...")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }
        RoundPhase::Failed(message) => {
            f.render_widget(
                Paragraph::new(format!("Round load failed:\n{message}\n\nR=retry"))
                    .style(Style::default().fg(Color::Red))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }
        RoundPhase::Loaded => {}
    }

    let [header, tables_area, footer] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let is_complete = session.is_complete();
    let clock_line = if is_complete {
        Line::from(Span::styled("Round complete", Style::default().fg(Color::Green)))
    } else {
        Line::from(vec![
            Span::styled("Round time: ", Style::default().fg(Color::Gray)),
            Span::styled(
                session.clock.as_str(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ])
    };
    f.render_widget(Paragraph::new(vec![clock_line, Line::from("")]), header);

    let mut lines = Vec::new();
    for (idx, table) in session.tables.iter().enumerate() {
        lines.push(table_line(table, idx == session.selected));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No pairings in this round",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines), tables_area);

    let footer_text = if session.can_enter_results(app.viewer_owns_round()) {
        "j/k=move  Enter=enter results  R=refresh  Esc=back"
    } else {
        "j/k=move  R=refresh  Esc=back"
    };
    f.render_widget(
        Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray)),
        footer,
    );

    if let Some(dialog) = session.dialog.as_ref() {
        draw_score_dialog(f, area, session, dialog);
    }
}

fn table_line<'a>(table: &'a TableView, selected: bool) -> Line<'a> {
    let marker = if selected { '>' } else { ' ' };
    let row_style = if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let players = table
        .players
        .iter()
        .map(|p| match p.points {
            Some(points) => format!("{} ({points} pts)", p.participant_name()),
            None => p.participant_name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" vs ");

    let mut spans = vec![Span::styled(format!("{marker} Table {}  ", table.table), row_style)];
    spans.push(Span::styled(players, row_style));
    if table.is_bye() {
        spans.push(Span::styled("  [BYE]", Style::default().fg(Color::DarkGray)));
    }
    if !table.active {
        spans.push(Span::styled("  [done]", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

fn draw_score_dialog(f: &mut Frame, area: Rect, session: &RoundSession, dialog: &ScoreDialog) {
    let height = (dialog.table.players.len() as u16 + 6).min(area.height);
    let width = 44.min(area.width);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, popup);
    let block = default_border(Color::White).title(format!(
        " Table {} — Round {} ",
        dialog.table.table,
        session.number + 1
    ));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::with_capacity(dialog.table.players.len() + 3);
    for (idx, pairing) in dialog.table.players.iter().enumerate() {
        let marker = if idx == dialog.cursor { '>' } else { ' ' };
        let row_style = if idx == dialog.cursor {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value = dialog.value(pairing.participant_id);
        let cursor = if idx == dialog.cursor && !dialog.submitting { "_" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("{marker} {}: {value}{cursor}", pairing.participant_name()),
            row_style,
        )));
    }
    lines.push(Line::from(""));

    if dialog.submitting {
        lines.push(Line::from(Span::styled(
            "Submitting...",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(error) = dialog.error.as_deref() {
        lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter=submit  Esc=cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Create/edit form popup
// ---------------------------------------------------------------------------

fn draw_form(f: &mut Frame, area: Rect, form: &FormState) {
    let height = (form.fields.len() as u16 + 6).min(area.height);
    let width = 52.min(area.width);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );

    f.render_widget(Clear, popup);
    let block = default_border(Color::White).title(format!(" {} ", form.title()));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::with_capacity(form.fields.len() + 2);
    for (idx, field) in form.fields.iter().enumerate() {
        let marker = if idx == form.cursor { '>' } else { ' ' };
        let row_style = if idx == form.cursor {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if idx == form.cursor && !form.in_flight { "_" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("{marker} {}: {}{cursor}", field.label, field.value),
            row_style,
        )));
    }
    lines.push(Line::from(""));

    if form.in_flight {
        lines.push(Line::from(Span::styled(
            "Saving...",
            Style::default().fg(Color::DarkGray),
        )));
    } else if let Some(error) = form.error.as_deref() {
        lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
    } else {
        lines.push(Line::from(Span::styled(
            "Tab=next field  Enter=save  Esc=cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.state.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
