//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use bookdeps_core::{CellAddress, Workbook, Worksheet};

/// Options controlling what the reader returns
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Return formula text rather than cached values.
    ///
    /// When false the reader behaves like a "cached values only" load: sheets
    /// are listed but no formula cells are returned.
    pub raw_formulas: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { raw_formulas: true }
    }
}

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '_' {
            result.push(c);
            continue;
        }

        let mut hex_chars = String::new();
        let mut consumed_x = false;
        let mut decoded = None;

        if chars.peek() == Some(&'x') {
            chars.next();
            consumed_x = true;

            while hex_chars.len() < 4 {
                match chars.peek() {
                    Some(&ch) if ch.is_ascii_hexdigit() => {
                        hex_chars.push(ch);
                        chars.next();
                    }
                    _ => break,
                }
            }

            if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                decoded = u32::from_str_radix(&hex_chars, 16)
                    .ok()
                    .and_then(char::from_u32);
                if decoded.is_some() {
                    chars.next();
                }
            }
        }

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                // Not an escape sequence, output what we consumed
                result.push('_');
                if consumed_x {
                    result.push('x');
                }
                result.push_str(&hex_chars);
            }
        }
    }

    result
}

/// Read one attribute value as an owned string
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path, named after the file
    pub fn read_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> XlsxResult<Workbook> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path)?;
        Self::read(&name, BufReader::new(file), options)
    }

    /// Read a workbook from an in-memory buffer
    pub fn read_bytes(name: &str, bytes: &[u8], options: &LoadOptions) -> XlsxResult<Workbook> {
        Self::read(name, Cursor::new(bytes), options)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(
        name: &str,
        reader: R,
        options: &LoadOptions,
    ) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        // Read workbook.xml to get sheet info
        let sheet_info = Self::read_workbook_xml(&mut archive)?;

        // Read workbook.xml.rels to get sheet paths
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut worksheets = Vec::with_capacity(sheet_info.len());
        for (sheet_name, r_id) in &sheet_info {
            match sheet_paths.get(r_id) {
                Some(path) => {
                    worksheets.push(Self::read_worksheet(
                        &mut archive,
                        path,
                        sheet_name,
                        options,
                    )?);
                }
                // Chartsheets and dialog sheets have no cells
                None => tracing::debug!("{}: skipping non-worksheet '{}'", name, sheet_name),
            }
        }

        let workbook = Workbook::new(name, worksheets);
        tracing::debug!(
            "loaded {}: {} sheets, {} formulas",
            name,
            workbook.sheet_count(),
            workbook.formula_count()
        );
        Ok(workbook)
    }

    /// Read workbook.xml to get sheet names and rIds
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attr_value(&e, b"name"), attr_value(&e, b"r:id")) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read the formula cells of one worksheet part
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        sheet_name: &str,
        options: &LoadOptions,
    ) -> XlsxResult<Worksheet> {
        let mut worksheet = Worksheet::new(sheet_name);

        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();

        // Position for cells that omit their `r` attribute
        let mut next_row: u32 = 0;
        let mut current_row: u32 = 0;
        let mut next_col: u16 = 0;

        // Current cell state
        let mut current_cell: Option<CellAddress> = None;
        let mut current_formula: Option<String> = None;
        let mut current_shared: Option<String> = None;
        let mut has_formula = false;
        let mut in_formula = false;

        // Shared formula masters by `si`
        let mut shared_formulas: HashMap<String, String> = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = Self::row_index(&e, next_row)?;
                        next_row = current_row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        let addr = Self::cell_address(&e, current_row, next_col)?;
                        next_col = addr.col.saturating_add(1);
                        current_cell = Some(addr);
                        current_formula = None;
                        current_shared = None;
                        has_formula = false;
                    }
                    b"f" if current_cell.is_some() => {
                        in_formula = true;
                        has_formula = true;
                        current_shared = Self::shared_index(&e);
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => {
                        current_row = Self::row_index(&e, next_row)?;
                        next_row = current_row + 1;
                        next_col = 0;
                    }
                    b"c" => {
                        // Empty cell element, only advances the column
                        let addr = Self::cell_address(&e, current_row, next_col)?;
                        next_col = addr.col.saturating_add(1);
                    }
                    // Shared formula child: `<f t="shared" si="0"/>`
                    b"f" if current_cell.is_some() => {
                        has_formula = true;
                        current_shared = Self::shared_index(&e);
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_formula => {
                    if let Ok(text) = e.unescape() {
                        current_formula
                            .get_or_insert_with(String::new)
                            .push_str(&text);
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"f" => {
                        in_formula = false;
                    }
                    b"c" => {
                        if let Some(addr) = current_cell.take() {
                            let text = match current_shared.take() {
                                Some(si) => match current_formula.take() {
                                    Some(master) => {
                                        shared_formulas.insert(si, master.clone());
                                        Some(master)
                                    }
                                    None => shared_formulas.get(&si).cloned(),
                                },
                                None => current_formula.take(),
                            };

                            if has_formula && options.raw_formulas {
                                if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
                                    worksheet.push_formula(addr, decode_excel_escapes(&text));
                                }
                            }
                        }
                        has_formula = false;
                        in_formula = false;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(worksheet)
    }

    /// 0-based row index from `<row r="..">`, or the next row if absent
    fn row_index(e: &BytesStart<'_>, next_row: u32) -> XlsxResult<u32> {
        match attr_value(e, b"r") {
            Some(r) => {
                let r: u32 = r
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("Invalid row number '{}'", r)))?;
                Ok(r.saturating_sub(1))
            }
            None => Ok(next_row),
        }
    }

    /// Address from `<c r="..">`, or the next column of the current row
    fn cell_address(e: &BytesStart<'_>, row: u32, next_col: u16) -> XlsxResult<CellAddress> {
        match attr_value(e, b"r") {
            Some(cell_ref) => CellAddress::parse(&cell_ref).map_err(|e| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
            }),
            None => Ok(CellAddress::new(row, next_col)),
        }
    }

    /// `si` of a shared formula element, if it is one
    fn shared_index(e: &BytesStart<'_>) -> Option<String> {
        match attr_value(e, b"t").as_deref() {
            Some("shared") => attr_value(e, b"si"),
            _ => None,
        }
    }
}
