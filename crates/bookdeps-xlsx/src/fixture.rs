//! In-memory XLSX fixtures for tests
//!
//! Writes the smallest package [`XlsxReader`](crate::XlsxReader) accepts:
//! content types, workbook, workbook relationships and one part per sheet.

use std::collections::BTreeMap;
use std::io::{Cursor, Seek, Write};

use bookdeps_core::CellAddress;

use crate::error::XlsxResult;

/// Builder for a small XLSX package
#[derive(Debug, Clone, Default)]
pub struct FixtureWorkbook {
    /// Sheet name and `<sheetData>` body
    sheets: Vec<(String, String)>,
}

impl FixtureWorkbook {
    /// Start an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet from `(address, content)` pairs
    ///
    /// Content starting with `=` becomes a formula cell; anything else is a
    /// plain string value.
    pub fn sheet(self, name: &str, cells: &[(&str, &str)]) -> Self {
        let mut rows: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for (address, content) in cells {
            let row = CellAddress::parse(address).map(|a| a.row).unwrap_or(0);
            let cell = match content.strip_prefix('=') {
                Some(formula) => format!(
                    r#"<c r="{}"><f>{}</f><v>0</v></c>"#,
                    address,
                    escape_xml(formula)
                ),
                None => format!(
                    r#"<c r="{}" t="str"><v>{}</v></c>"#,
                    address,
                    escape_xml(content)
                ),
            };
            rows.entry(row).or_default().push(cell);
        }

        let body: String = rows
            .into_iter()
            .map(|(row, cells)| format!(r#"<row r="{}">{}</row>"#, row + 1, cells.concat()))
            .collect();

        self.raw_sheet(name, &body)
    }

    /// Add a sheet with a hand-written `<sheetData>` body
    pub fn raw_sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), sheet_data.to_string()));
        self
    }

    /// Write the package to a byte buffer
    pub fn to_bytes(&self) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_package(Cursor::new(&mut buf))?;
        Ok(buf)
    }

    fn write_package<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        let mut sheets = String::new();
        let mut rels = String::new();

        for (i, (name, _)) in self.sheets.iter().enumerate() {
            content_types.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(name),
                i + 1,
                i + 1
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        content_types.push_str("\n</Types>");

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
                sheets
            )
            .as_bytes(),
        )?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                rels
            )
            .as_bytes(),
        )?;

        for (i, (_, body)) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    body
                )
                .as_bytes(),
            )?;
        }

        zip.finish()?;
        Ok(())
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
