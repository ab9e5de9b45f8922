use std::time::Duration;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    config::Theme,
    scoring::Outcome,
    typing_test::{LifecycleState, Snapshot},
};

const HEADER_HEIGHT: u16 = 3;
const CONTENT_HEIGHT: u16 = 10;
const FOOTER_HEIGHT: u16 = 3;

/// Draws one frame of a test from its snapshot.
pub struct TestView<'a> {
    snapshot: &'a Snapshot<'a>,
    theme: &'a Theme,
}

impl<'a> TestView<'a> {
    pub fn new(snapshot: &'a Snapshot<'a>, theme: &'a Theme) -> Self {
        Self { snapshot, theme }
    }

    fn header(&self) -> Line<'static> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled("tt", bold.fg(self.theme.title)),
            Span::raw(" \u{2014} "),
            Span::styled(
                "A minimalist CLI typing speed test.",
                bold.fg(self.theme.primary),
            ),
        ])
    }

    fn typing_lines(&self) -> Vec<Line<'static>> {
        let snapshot = self.snapshot;
        let correct_style = Style::default().fg(self.theme.correct);
        let incorrect_style = Style::default().fg(self.theme.incorrect);
        let secondary_style = Style::default().fg(self.theme.secondary);

        let cursor_style = if snapshot.input_active {
            Style::default()
                .fg(self.theme.cursor)
                .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
        } else {
            secondary_style
        };

        // typed chars take the colour of the word they belong to
        let mut word = 0;
        let mut in_word = false;
        let mut cells: Vec<(char, Style)> = snapshot
            .input
            .chars()
            .map(|c| {
                if c.is_whitespace() {
                    if in_word {
                        word += 1;
                        in_word = false;
                    }
                    return (c, Style::default());
                }
                in_word = true;
                let style = match snapshot.word_outcomes.get(word) {
                    Some(Outcome::Correct) => correct_style,
                    Some(Outcome::Incorrect) | None => incorrect_style,
                };
                (c, style)
            })
            .collect();

        // past the typed text the next reference char sits under the cursor
        let phrase = snapshot.reference.text();
        let typed_len = cells.len();
        let mut rest = phrase.chars().skip(typed_len);
        let next_char = rest.next().unwrap_or(' ');
        if snapshot.cursor < typed_len {
            cells[snapshot.cursor].1 = cursor_style;
            cells.push((next_char, secondary_style));
        } else {
            cells.push((next_char, cursor_style));
        }
        cells.extend(rest.map(|c| (c, secondary_style)));

        let spans: Vec<Span> = cells
            .into_iter()
            .chunk_by(|(_, style)| *style)
            .into_iter()
            .map(|(style, run)| Span::styled(run.map(|(c, _)| c).collect::<String>(), style))
            .collect();

        vec![
            Line::from(Span::styled(
                format_remaining(snapshot.remaining),
                Style::default().fg(self.theme.primary),
            )),
            Line::from(spans),
        ]
    }

    fn result_lines(&self) -> Vec<Line<'static>> {
        let Some(result) = self.snapshot.result else {
            return vec![];
        };
        let key_style = Style::default()
            .fg(self.theme.primary)
            .add_modifier(Modifier::BOLD);
        let value_style = Style::default().fg(self.theme.secondary);

        vec![
            Line::from(vec![
                Span::styled("WPM: ", key_style),
                Span::styled(format!("{:.2}", result.wpm), value_style),
            ]),
            Line::from(vec![
                Span::styled("Accuracy: ", key_style),
                Span::styled(format!("{:.2}%", result.accuracy), value_style),
            ]),
        ]
    }

    fn idle_lines(&self) -> Vec<Line<'static>> {
        vec![Line::from(Span::styled(
            self.snapshot.reference.text(),
            Style::default().fg(self.theme.secondary),
        ))]
    }

    fn help_line(&self) -> Line<'static> {
        let key_style = Style::default().fg(self.theme.primary);
        let desc_style = Style::default().fg(self.theme.secondary);

        let entries = self.snapshot.help.iter().map(|(key, desc)| {
            vec![
                Span::styled(*key, key_style),
                Span::raw(" "),
                Span::styled(*desc, desc_style),
            ]
        });
        let spans = Itertools::intersperse(entries, vec![Span::styled(" \u{2022} ", desc_style)])
            .flatten()
            .collect::<Vec<_>>();

        Line::from(spans)
    }
}

impl Widget for TestView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = clamp_to_viewport(area, self.snapshot);
        let margin = area.width / 10;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(CONTENT_HEIGHT),
                Constraint::Length(FOOTER_HEIGHT),
                Constraint::Fill(1),
            ])
            .split(area);

        let inset = |rect: Rect| Rect {
            x: rect.x + margin,
            width: rect.width.saturating_sub(margin * 2),
            ..rect
        };

        Paragraph::new(self.header())
            .wrap(Wrap { trim: true })
            .render(inset(rows[1]), buf);

        let content = match self.snapshot.state {
            LifecycleState::Idle => self.idle_lines(),
            LifecycleState::Running => self.typing_lines(),
            LifecycleState::Finished => self.result_lines(),
        };
        let content_area = inset(rows[2]);
        let phrase_width = self.snapshot.reference.text().width();
        Paragraph::new(content)
            .wrap(Wrap { trim: false })
            .alignment(if phrase_width < content_area.width as usize {
                // a phrase that fits on one line reads best centered
                Alignment::Center
            } else {
                Alignment::Left
            })
            .render(content_area, buf);

        let footer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Fill(1), Constraint::Length(1)])
            .split(rows[3]);
        Paragraph::new(self.help_line())
            .alignment(Alignment::Center)
            .render(footer[1], buf);
    }
}

/// Timer text, e.g. `4.2s`.
pub fn format_remaining(remaining: Duration) -> String {
    format!("{:.1}s", remaining.as_secs_f64())
}

/// Limits drawing to the last known terminal size when one was reported.
fn clamp_to_viewport(area: Rect, snapshot: &Snapshot) -> Rect {
    let viewport = snapshot.viewport;
    if viewport.width == 0 || viewport.height == 0 {
        return area;
    }
    area.intersection(Rect {
        x: area.x,
        y: area.y,
        width: viewport.width,
        height: viewport.height,
    })
}
