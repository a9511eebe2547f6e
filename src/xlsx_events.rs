//! Minimal `.xlsx` reader: just enough of SpreadsheetML to pull the first
//! worksheet out of an export as a header row plus text cells.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

const CONTENT_TYPES: &str = "[Content_Types].xml";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const FALLBACK_SHEET: &str = "xl/worksheets/sheet1.xml";
/// Zero-based index of column `XFD`, the widest sheet Excel allows.
const MAX_COLUMN: u32 = 16_383;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a spreadsheet archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing required part: {0}")]
    MissingPart(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// First worksheet of a workbook, split into a header row and data rows.
///
/// Cells are kept as text; absent, blank and error cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl SheetTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first header equal to `name` (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of column `name`, top to bottom, with blank cells dropped.
    pub fn non_empty_column(&self, name: &str) -> Option<Vec<String>> {
        let idx = self.column_index(name)?;
        let values = self
            .rows
            .iter()
            .filter_map(|row| row.get(idx).cloned().flatten())
            .filter(|value| !value.trim().is_empty())
            .collect();
        Some(values)
    }
}

pub fn read_first_sheet(bytes: &[u8]) -> XlsxResult<SheetTable> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if read_part(&mut archive, CONTENT_TYPES)?.is_none() {
        return Err(XlsxError::MissingPart(CONTENT_TYPES.to_string()));
    }

    let shared_strings = match read_part(&mut archive, SHARED_STRINGS)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_path = first_sheet_path(&mut archive)?;
    let sheet_xml = read_part(&mut archive, &sheet_path)?
        .ok_or_else(|| XlsxError::MissingPart(sheet_path.clone()))?;
    let cells = parse_sheet_cells(&sheet_xml, &shared_strings)?;
    Ok(build_table(cells))
}

fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut raw = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut raw)?;
    Ok(Some(raw))
}

/// Path of the first `<sheet>` in workbook order, resolved through the
/// workbook relationships. Exports without a workbook part fall back to
/// `sheet1.xml`.
fn first_sheet_path<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<String> {
    let Some(workbook) = read_part(archive, WORKBOOK)? else {
        return Ok(FALLBACK_SHEET.to_string());
    };
    let Some(rel_id) = first_sheet_rel_id(&workbook)? else {
        return Err(XlsxError::Parse("workbook lists no sheets".to_string()));
    };
    let rels = match read_part(archive, WORKBOOK_RELS)? {
        Some(xml) => parse_worksheet_rels(&xml)?,
        None => HashMap::new(),
    };
    Ok(rels
        .get(&rel_id)
        .cloned()
        .unwrap_or_else(|| FALLBACK_SHEET.to_string()))
}

fn first_sheet_rel_id(xml: &[u8]) -> XlsxResult<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                // `r:id`; the namespace prefix varies between writers.
                return Ok(attr_value(&e, b"id"));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_worksheet_rels(xml: &[u8]) -> XlsxResult<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut rels = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id");
                let target = attr_value(&e, b"Target");
                let rel_type = attr_value(&e, b"Type");
                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        let path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("xl/{target}"),
                        };
                        rels.insert(id, path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Text is taken verbatim: rich-text runs meet at spaces that trimming
/// would eat.
fn parse_shared_strings(xml: &[u8]) -> XlsxResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(e) if in_t => current.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Reads every valued cell as `(row, col, text)`, zero-based.
fn parse_sheet_cells(
    xml: &[u8],
    shared_strings: &[String],
) -> XlsxResult<Vec<(u32, u32, Option<String>)>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut cells = Vec::new();

    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    let mut cell_pos: (u32, u32) = (0, 0);
    let mut cell_type: Option<String> = None;
    let mut cell_text = String::new();
    let mut has_text = false;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_inline_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = attr_value(&e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or(next_row);
                    next_row = row.saturating_add(1);
                    next_col = 0;
                }
                b"c" => {
                    cell_pos = cell_position(&e, row, next_col)?;
                    next_col = cell_pos.1 + 1;
                    cell_type = attr_value(&e, b"t");
                    cell_text.clear();
                    has_text = false;
                }
                b"v" => in_value = true,
                b"is" => in_inline = true,
                b"t" if in_inline => in_inline_t = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = attr_value(&e, b"r")
                        .and_then(|r| r.parse::<u32>().ok())
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or(next_row);
                    next_row = row.saturating_add(1);
                }
                b"c" => {
                    next_col = cell_position(&e, row, next_col)?.1 + 1;
                }
                _ => {}
            },
            Event::Text(e) if in_value || in_inline_t => {
                cell_text.push_str(&e.unescape()?);
                has_text = true;
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_t = false,
                b"is" => in_inline = false,
                b"c" => {
                    let value = if has_text {
                        cell_to_text(cell_type.as_deref(), &cell_text, shared_strings)?
                    } else {
                        None
                    };
                    cells.push((cell_pos.0, cell_pos.1, value));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}

fn cell_to_text(
    cell_type: Option<&str>,
    raw: &str,
    shared_strings: &[String],
) -> XlsxResult<Option<String>> {
    let text = match cell_type {
        Some("s") => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse(format!("invalid shared string index '{raw}'")))?;
            let value = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("shared string index {idx} out of bounds"))
            })?;
            value.clone()
        }
        Some("inlineStr") | Some("str") => decode_excel_escapes(raw),
        Some("b") => {
            if raw == "1" || raw.eq_ignore_ascii_case("true") {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        // Error cells (#N/A, #REF!, ...) carry no usable text.
        Some("e") => return Ok(None),
        None | Some("n") => format_number(raw),
        Some(_) => raw.to_string(),
    };
    Ok(Some(text))
}

fn build_table(cells: Vec<(u32, u32, Option<String>)>) -> SheetTable {
    let mut by_row: BTreeMap<u32, BTreeMap<u32, Option<String>>> = BTreeMap::new();
    for (row, col, value) in cells {
        by_row.entry(row).or_default().insert(col, value);
    }

    let header_row = by_row.iter().find_map(|(row, cols)| {
        cols.values()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .then_some(*row)
    });
    let Some(header_row) = header_row else {
        return SheetTable::default();
    };

    let mut headers = Vec::new();
    for (col, value) in &by_row[&header_row] {
        let col = *col as usize;
        if headers.len() <= col {
            headers.resize(col + 1, String::new());
        }
        headers[col] = value.clone().unwrap_or_default();
    }

    let rows = by_row
        .range(header_row + 1..)
        .map(|(_, cols)| {
            let width = cols.keys().next_back().map(|c| *c as usize + 1).unwrap_or(0);
            let mut row = vec![None; width];
            for (col, value) in cols {
                row[*col as usize] = value.clone();
            }
            row
        })
        .collect();

    SheetTable { headers, rows }
}

fn cell_position(e: &BytesStart, row: u32, next_col: u32) -> XlsxResult<(u32, u32)> {
    let (row, col) = match attr_value(e, b"r") {
        Some(reference) => parse_cell_ref(&reference)
            .ok_or_else(|| XlsxError::Parse(format!("invalid cell reference '{reference}'")))?,
        None => (row, next_col),
    };
    if col > MAX_COLUMN {
        return Err(XlsxError::Parse(format!(
            "cell in row {} is past the last column",
            row as u64 + 1
        )));
    }
    Ok((row, col))
}

/// `"B12"` -> `(11, 1)`. Columns past `XFD` are rejected.
fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > MAX_COLUMN + 1 {
            return None;
        }
    }
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

fn attr_value(e: &BytesStart, local_name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local_name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

fn format_number(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        Ok(n) => n.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Excel escapes control characters as `_xHHHH_`.
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::{XlsxError, decode_excel_escapes, format_number, parse_cell_ref, read_first_sheet};

    fn zip_parts(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            for (name, body) in parts {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const CONTENT_TYPES: &str = r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

    #[test]
    fn reads_inline_strings_without_workbook_part() {
        let sheet = r#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="B1" t="inlineStr"><is><t>imprevisto</t></is></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="B2" t="inlineStr"><is><t>Alluvione &amp; frane</t></is></c></row>
<row r="3"><c r="A3"><v>2</v></c></row>
<row r="4"><c r="A4"><v>3</v></c><c r="B4" t="inlineStr"><is><t>Rivolta</t></is></c></row>
</sheetData></worksheet>"#;
        let bytes = zip_parts(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);
        let table = read_first_sheet(&bytes).expect("parse");
        assert_eq!(table.headers(), ["id", "imprevisto"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.non_empty_column("imprevisto").unwrap(),
            vec!["Alluvione & frane".to_string(), "Rivolta".to_string()]
        );
        assert_eq!(
            table.non_empty_column("id").unwrap(),
            vec!["1".to_string(), "2".to_string(), "3".to_string()]
        );
    }

    #[test]
    fn error_cells_are_blank() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>imprevisto</t></is></c></row>
<row r="2"><c r="A2" t="e"><v>#N/A</v></c></row>
<row r="3"><c r="A3" t="b"><v>1</v></c></row>
</sheetData></worksheet>"#;
        let bytes = zip_parts(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);
        let table = read_first_sheet(&bytes).expect("parse");
        assert_eq!(
            table.non_empty_column("imprevisto").unwrap(),
            vec!["TRUE".to_string()]
        );
    }

    #[test]
    fn html_payload_is_not_an_archive() {
        let err = read_first_sheet(b"<!DOCTYPE html><html><body>Sign in</body></html>")
            .unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }

    #[test]
    fn archive_without_content_types_is_rejected() {
        let bytes = zip_parts(&[("hello.txt", "hi")]);
        let err = read_first_sheet(&bytes).unwrap_err();
        assert!(matches!(err, XlsxError::MissingPart(_)));
    }

    #[test]
    fn cell_refs_are_zero_based() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("B12"), Some((11, 1)));
        assert_eq!(parse_cell_ref("AA3"), Some((2, 26)));
        assert_eq!(parse_cell_ref("12"), None);
    }

    #[test]
    fn cell_refs_stop_at_last_column() {
        assert_eq!(parse_cell_ref("XFD1"), Some((0, 16_383)));
        assert_eq!(parse_cell_ref("XFE1"), None);
        assert_eq!(parse_cell_ref("ZZZZZZZZ1"), None);
    }

    #[test]
    fn oversized_column_is_a_parse_error() {
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="ZZZZZZZZ1" t="inlineStr"><is><t>imprevisto</t></is></c></row>
</sheetData></worksheet>"#;
        let bytes = zip_parts(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);
        let err = read_first_sheet(&bytes).unwrap_err();
        assert!(matches!(err, XlsxError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn rich_text_runs_keep_their_spaces() {
        let shared = r#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
<si><t>imprevisto</t></si>
<si><r><t xml:space="preserve">Alluvione </t></r><r><rPr><b/></rPr><t>grave</t></r></si>
</sst>"#;
        let sheet = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c></row>
<row r="3"><c r="A3" t="inlineStr"><is><t xml:space="preserve">  Rivolta in piazza </t></is></c></row>
</sheetData></worksheet>"#;
        let bytes = zip_parts(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("xl/sharedStrings.xml", shared),
            ("xl/worksheets/sheet1.xml", sheet),
        ]);
        let table = read_first_sheet(&bytes).expect("parse");
        assert_eq!(
            table.non_empty_column("imprevisto").unwrap(),
            vec![
                "Alluvione grave".to_string(),
                "  Rivolta in piazza ".to_string()
            ]
        );
    }

    #[test]
    fn integral_numbers_drop_fraction() {
        assert_eq!(format_number("3"), "3");
        assert_eq!(format_number("3.0"), "3");
        assert_eq!(format_number("2.5"), "2.5");
    }

    #[test]
    fn decodes_control_escapes() {
        assert_eq!(decode_excel_escapes("a_x000a_b"), "a\nb");
        assert_eq!(decode_excel_escapes("snake_x_case"), "snake_x_case");
        assert_eq!(decode_excel_escapes("plain"), "plain");
    }
}
