use super::{Stage, StageContext};

const DELIMITER: &[u8] = b"||";
const ROW_END: &str = "||\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn separator(self) -> &'static str {
        match self {
            Self::Left => "----",
            Self::Center => ":----:",
            Self::Right => "----:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableCell<'a> {
    content: &'a str,
    alignment: Alignment,
}

impl<'a> TableCell<'a> {
    /// A leading `~` marks a heading cell, rendered like any other cell.
    /// After it, `=` centers and `>` right-aligns.
    fn parse(raw: &'a str) -> Self {
        let rest = raw.strip_prefix('~').unwrap_or(raw);
        let (alignment, content) = if let Some(content) = rest.strip_prefix('=') {
            (Alignment::Center, content)
        } else if let Some(content) = rest.strip_prefix('>') {
            (Alignment::Right, content)
        } else {
            (Alignment::Left, rest)
        };
        Self { content, alignment }
    }
}

/// Rewrite every `||`-delimited block into a pipe table.
///
/// A block starts with `||` at the beginning of a line and ends at the first
/// `||` line end whose next line does not open with `||`. Only the first
/// row's alignment markers reach the separator row; markers on later rows are
/// stripped from the content and otherwise ignored. Rows keep their own cell
/// counts.
pub(super) fn convert_tables(buffer: &str, context: &mut StageContext<'_>) -> String {
    let mut output = String::with_capacity(buffer.len());
    let mut copied = 0usize;
    let mut from = 0usize;
    while let Some(start) = next_table_start(buffer, from) {
        let Some(end) = table_end(buffer, start) else {
            from = start + 1;
            continue;
        };
        let block = &buffer[start..end];
        context.diagnostics.record(Stage::Tables, block);
        output.push_str(&buffer[copied..start]);
        output.push_str(&render_table(block));
        copied = end;
        from = end;
    }
    output.push_str(&buffer[copied..]);
    output
}

fn next_table_start(buffer: &str, from: usize) -> Option<usize> {
    let search_from = from.saturating_sub(1);
    buffer[search_from..]
        .find("\n||")
        .map(|found| search_from + found + 1)
}

fn table_end(buffer: &str, start: usize) -> Option<usize> {
    let bytes = buffer.as_bytes();
    let mut search_from = start + DELIMITER.len();
    while let Some(found) = buffer[search_from..].find(ROW_END) {
        let delimiter = search_from + found;
        let next_line = delimiter + ROW_END.len();
        let continues_table = match (bytes.get(next_line), bytes.get(next_line + 1)) {
            (None, _) => true,
            (Some(b'|'), Some(b'|')) => true,
            (Some(b'|'), None) => true,
            _ => false,
        };
        if !continues_table {
            return Some(delimiter + DELIMITER.len());
        }
        search_from = delimiter + 1;
    }
    None
}

fn render_table(block: &str) -> String {
    let mut output = String::with_capacity(block.len() + 32);
    let mut alignments = Vec::new();
    for (row_index, row) in block.split(ROW_END).enumerate() {
        let row = if row.ends_with("||") {
            row.to_string()
        } else {
            format!("{row}||")
        };
        output.push('|');
        for raw in row_cells(&row) {
            let cell = TableCell::parse(raw);
            if row_index == 0 {
                alignments.push(cell.alignment);
            }
            output.push_str(cell.content);
            output.push('|');
        }
        output.push('\n');
        if row_index == 0 {
            let separators = alignments
                .iter()
                .map(|alignment| alignment.separator())
                .collect::<Vec<_>>();
            output.push('|');
            output.push_str(&separators.join("|"));
            output.push_str("|\n");
        }
    }
    output
}

/// Text between each `||` and the next one.
fn row_cells(row: &str) -> Vec<&str> {
    let bytes = row.as_bytes();
    let mut cells = Vec::new();
    let mut position = 0usize;
    while let Some(open) = find_delimiter(bytes, position.saturating_sub(DELIMITER.len())) {
        let cell_start = open + DELIMITER.len();
        let Some(close) = find_delimiter(bytes, cell_start) else {
            break;
        };
        cells.push(&row[cell_start..close]);
        position = if close > cell_start { close } else { close + 1 };
    }
    cells
}

fn find_delimiter(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(DELIMITER.len())
        .position(|window| window == DELIMITER)
        .map(|found| from + found)
}
