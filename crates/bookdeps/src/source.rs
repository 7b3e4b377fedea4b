//! Input flattening
//!
//! The analysis core takes a flat list of named byte buffers. These helpers
//! build that list from files, directories and zip archives. Archive members
//! are read straight into memory, so nothing is extracted to disk.

use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{AnalysisError, AnalysisResult};

/// Upper bound on the buffer reserved up front for one archive member
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// A named, readable workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookSource {
    /// Display name (file name, no directories)
    pub name: String,
    /// Raw container bytes
    pub bytes: Vec<u8>,
}

impl WorkbookSource {
    /// Create a source from a name and its bytes
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a single file; the name is the file name
    pub fn from_file<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| AnalysisError::io(path, e))?;
        Ok(Self::new(file_name(path), bytes))
    }

    /// Lowercased extension of the display name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Check whether a file name looks like a spreadsheet worth loading
///
/// Hidden files and Office lock files (`~$Budget.xlsx`) are not eligible.
pub fn is_spreadsheet_name(name: &str) -> bool {
    if name.starts_with('.') || name.starts_with("~$") {
        return false;
    }
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    matches!(extension.as_deref(), Some("xlsx") | Some("xlsm") | Some("xls"))
}

/// Flatten one input path into sources
///
/// - a directory contributes its spreadsheet files, sorted by name
///   (not recursive)
/// - a `.zip` file contributes its spreadsheet members in archive order
/// - any other file is taken as a single workbook
pub fn collect_sources<P: AsRef<Path>>(path: P) -> AnalysisResult<Vec<WorkbookSource>> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| AnalysisError::io(path, e))?;

    if metadata.is_dir() {
        return read_directory(path);
    }

    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("zip"));
    if is_zip {
        let file = fs::File::open(path).map_err(|e| AnalysisError::io(path, e))?;
        return read_archive(file).map_err(|e| match e {
            ArchiveError::Zip(source) => AnalysisError::Archive {
                path: path.to_path_buf(),
                source,
            },
            ArchiveError::Io(source) => AnalysisError::io(path, source),
        });
    }

    Ok(vec![WorkbookSource::from_file(path)?])
}

/// Flatten several input paths, keeping their order
pub fn collect_all<I, P>(paths: I) -> AnalysisResult<Vec<WorkbookSource>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut sources = Vec::new();
    for path in paths {
        sources.extend(collect_sources(path)?);
    }
    Ok(sources)
}

/// Spreadsheet members of an in-memory zip archive
pub fn sources_from_archive(
    archive_name: &str,
    bytes: &[u8],
) -> AnalysisResult<Vec<WorkbookSource>> {
    read_archive(Cursor::new(bytes)).map_err(|e| match e {
        ArchiveError::Zip(source) => AnalysisError::Archive {
            path: archive_name.into(),
            source,
        },
        ArchiveError::Io(source) => AnalysisError::io(archive_name, source),
    })
}

fn read_directory(dir: &Path) -> AnalysisResult<Vec<WorkbookSource>> {
    let entries = fs::read_dir(dir).map_err(|e| AnalysisError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && is_spreadsheet_name(&file_name(&path)) {
            paths.push(path);
        }
    }
    paths.sort_by_key(|p| file_name(p));

    tracing::debug!("{}: {} spreadsheet files", dir.display(), paths.len());
    paths.iter().map(WorkbookSource::from_file).collect()
}

enum ArchiveError {
    Zip(zip::result::ZipError),
    Io(std::io::Error),
}

fn read_archive<R: Read + Seek>(reader: R) -> Result<Vec<WorkbookSource>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(ArchiveError::Zip)?;
    let mut sources = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i).map_err(ArchiveError::Zip)?;
        if member.is_dir() {
            continue;
        }

        let full_name = member.name().to_string();
        if full_name.starts_with("__MACOSX/") {
            continue;
        }
        let name = full_name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&full_name)
            .to_string();
        if !is_spreadsheet_name(&name) {
            tracing::warn!("skipping archive member '{}'", full_name);
            continue;
        }

        let mut bytes = Vec::with_capacity(capacity_hint(member.size()));
        member.read_to_end(&mut bytes).map_err(ArchiveError::Io)?;
        sources.push(WorkbookSource::new(name, bytes));
    }

    Ok(sources)
}

/// Preallocation for an archive member; the declared size is not trusted
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOC)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
