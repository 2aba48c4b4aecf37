/// Layout knobs for [`render`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

const MIN_COLUMN: usize = 4;
const GAP: &str = "  ";

/// Render rows as left-aligned columns under a dashed header rule.
///
/// Numeric cells are right-aligned. When `max_width` is set the widest
/// columns shrink first and overflowing cells end in `…`.
#[must_use]
pub fn render(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| display_width(cell))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0)
        })
        .collect();
    if let Some(max_width) = options.max_width {
        shrink_to(&mut widths, max_width);
    }

    let status_column = headers.iter().position(|h| *h == "status");
    let header_line = join_cells(headers.iter().zip(&widths).map(|(header, width)| {
        pad(&truncate(header, *width), *width, false)
    }));
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header_line.trim_end().to_string());
    lines.push("-".repeat(display_width(lines[0].as_str())));

    for row in rows {
        let line = join_cells(widths.iter().enumerate().map(|(index, width)| {
            let cell = row.get(index).map_or("-", String::as_str);
            let text = truncate(cell, *width);
            let padded = pad(&text, *width, looks_numeric(&text));
            if options.color && status_column == Some(index) {
                paint_status(&padded, &text)
            } else {
                padded
            }
        }));
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    cells.collect::<Vec<_>>().join(GAP)
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Take one column off the widest shrinkable column until the row fits.
fn shrink_to(widths: &mut [usize], max_width: usize) {
    let gaps = widths.len().saturating_sub(1) * GAP.len();
    while widths.iter().sum::<usize>() + gaps > max_width {
        let widest = widths
            .iter_mut()
            .filter(|width| **width > MIN_COLUMN)
            .max_by_key(|width| **width);
        match widest {
            Some(width) => *width -= 1,
            None => break,
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(display_width(text)));
    if right_align {
        format!("{fill}{text}")
    } else {
        format!("{text}{fill}")
    }
}

fn looks_numeric(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty()
        && text.chars().any(|ch| ch.is_ascii_digit())
        && text
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | ',' | '-' | '+'))
}

fn paint_status(padded: &str, status: &str) -> String {
    let code = match status.trim() {
        "completed" => "32",
        "pending" | "running" => "33",
        "failed" | "cancelled" | "unreachable" => "31",
        _ => return padded.to_string(),
    };
    format!("\u{1b}[{code}m{padded}\u{1b}[0m")
}
