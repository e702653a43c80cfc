use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Clear, Paragraph, Widget};
use ratatui::Frame;

use super::dashboard::Dashboard;
use super::sanitize::display_moniker;
use super::viewport::{compute_scroll_limits, scroll_indicator_position, visible_history_slice};
use crate::history::{HistoryTracker, SigningOutcome};
use crate::validator::ValidatorRecord;

// Column offsets inside the bordered list area
const RANK_X: u16 = 1;
const MONIKER_X: u16 = 6;
const SHARE_X: u16 = 38;
const ADDRESS_X: u16 = 45;
const HISTORY_X: u16 = 86;

const BLOCK_GLYPH: &str = "■";
const THUMB_GLYPH: &str = "█";
const SEARCH_WIDTH: u16 = 40;
const SEARCH_HEIGHT: u16 = 3;

fn outcome_style(outcome: SigningOutcome) -> Style {
    match outcome {
        SigningOutcome::Missed => Style::default().fg(Color::Red),
        SigningOutcome::Signed => Style::default().fg(Color::Green),
        SigningOutcome::Proposed => Style::default().fg(Color::Blue),
    }
}

/// Write `text` at a position relative to `area`, clipped to its bounds.
fn put(buf: &mut Buffer, area: Rect, col: u16, row: u16, text: &str, style: Style) {
    if col >= area.width || row >= area.height {
        return;
    }
    buf.set_stringn(
        area.x + col,
        area.y + row,
        text,
        (area.width - col) as usize,
        style,
    );
}

/// Area available to validator rows: inside the border, minus the scrollbar column.
pub fn list_area(frame_area: Rect) -> Rect {
    Rect::new(
        frame_area.x + 1,
        frame_area.y + 1,
        frame_area.width.saturating_sub(3),
        frame_area.height.saturating_sub(2),
    )
}

/// Number of history columns that fit beside the fixed columns.
pub fn history_budget(list: Rect) -> usize {
    list.width.saturating_sub(HISTORY_X) as usize
}

struct ValidatorList<'a> {
    rows: &'a [&'a ValidatorRecord],
    history: &'a HistoryTracker,
    offset: usize,
}

impl Widget for ValidatorList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let budget = history_budget(area);

        for (line, (index, validator)) in self
            .rows
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(area.height as usize)
            .enumerate()
        {
            let row = line as u16;
            put(buf, area, RANK_X, row, &(index + 1).to_string(), Style::default());

            let moniker_style = if validator.is_key_assigned() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            put(buf, area, MONIKER_X, row, &display_moniker(&validator.display_name), moniker_style);

            let share_style = if validator.soft_opt_out {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let share = format!("{:.2}%", validator.voting_power_share * 100.0);
            put(buf, area, SHARE_X, row, &share, share_style);

            put(buf, area, ADDRESS_X, row, &validator.address_hex, Style::default());

            if let Some(sequence) = self.history.sequence_for(&validator.address_hex) {
                for (column, outcome) in visible_history_slice(sequence, budget).into_iter().enumerate() {
                    put(buf, area, HISTORY_X + column as u16, row, BLOCK_GLYPH, outcome_style(outcome));
                }
            }
        }
    }
}

fn header_text(dashboard: &Dashboard) -> String {
    let height = dashboard
        .history()
        .last_height()
        .map(|h| h.to_string())
        .unwrap_or_else(|| "-".to_string());
    let pacing = dashboard.pacing();

    let mut header = format!(
        " {}  {}  poll {:.1}s  avg block {:.2}s ",
        height,
        dashboard.chain_id(),
        pacing.poll_interval_secs,
        pacing.average_block_time_secs
    );
    if let Some(query) = dashboard.query() {
        header.push_str(&format!(" search: {} ", query));
    }
    header
}

pub fn draw(frame: &mut Frame<'_>, dashboard: &Dashboard) {
    let area = frame.area();
    frame.render_widget(Block::bordered(), area);

    let rows = dashboard.visible_rows();
    let list = list_area(area);
    frame.render_widget(
        ValidatorList {
            rows: &rows,
            history: dashboard.history(),
            offset: dashboard.scroll_offset(),
        },
        list,
    );

    let buf = frame.buffer_mut();
    let header = header_text(dashboard);
    put(buf, area, 0, 0, &header, Style::default());
    if let Some(error) = dashboard.last_error() {
        let col = header.chars().count() as u16;
        put(buf, area, col, 0, &format!(" fetch error: {} ", error), Style::default().fg(Color::Red));
    }

    let limits = compute_scroll_limits(rows.len(), area.height as usize);
    let thumb_row = scroll_indicator_position(dashboard.scroll_offset(), limits.max_offset, area.height as usize);
    put(
        buf,
        area,
        area.width.saturating_sub(1),
        thumb_row as u16,
        THUMB_GLYPH,
        Style::default(),
    );
}

/// Centred single-line search dialog drawn over the dashboard.
pub fn draw_search_dialog(frame: &mut Frame<'_>, input: &str) {
    let area = frame.area();
    let width = SEARCH_WIDTH.min(area.width);
    let height = SEARCH_HEIGHT.min(area.height);
    let dialog = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(format!("{}_", input)).block(Block::bordered().title(" search ")),
        dialog,
    );
}
