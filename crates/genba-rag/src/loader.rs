//! Document loading and folder-tree ingestion

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use genba_core::{Error, Result};

/// Maximum decompressed bytes read from a single ZIP entry
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// A loaded source document, immutable after ingestion
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: HashMap<String, String>,
    pub source: PathBuf,
}

/// Format-specific loader producing one or more documents from a file
pub type LoaderFn = fn(&Path) -> Result<Vec<Document>>;

/// Registry mapping lowercase file extensions to loaders
pub struct LoaderRegistry {
    loaders: HashMap<String, LoaderFn>,
}

impl LoaderRegistry {
    pub fn empty() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    pub fn register(&mut self, extension: &str, loader: LoaderFn) {
        self.loaders.insert(extension.to_lowercase(), loader);
    }

    pub fn get(&self, extension: &str) -> Option<LoaderFn> {
        self.loaders.get(&extension.to_lowercase()).copied()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("pdf", load_pdf);
        registry.register("xlsx", load_xlsx);
        registry.register("txt", load_txt);
        registry
    }
}

/// Load every supported file under the immediate subfolders of `root`.
///
/// A missing root is treated as empty. Dot-prefixed folder names and files
/// with unregistered extensions are skipped. Each produced document gets a
/// fresh uuid. One-shot batch; nothing is watched.
pub fn load_tree(root: &Path, registry: &LoaderRegistry) -> Result<Vec<Document>> {
    let mut docs_all = Vec::new();
    if !root.is_dir() {
        return Ok(docs_all);
    }

    let mut folders: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| !n.starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    folders.sort();

    for folder in folders {
        add_docs(&folder, registry, &mut docs_all)?;
    }

    Ok(docs_all)
}

/// Append all loadable documents from one folder
fn add_docs(folder: &Path, registry: &LoaderRegistry, docs_all: &mut Vec<Document>) -> Result<()> {
    if !folder.is_dir() {
        return Ok(());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for file in files {
        let Some(extension) = file.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(loader) = registry.get(extension) else {
            debug!(path = %file.display(), "skipping unsupported extension");
            continue;
        };
        let mut docs = loader(&file)?;
        for doc in &mut docs {
            doc.id = Uuid::new_v4().to_string();
        }
        docs_all.append(&mut docs);
    }

    Ok(())
}

fn source_metadata(path: &Path) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), path.display().to_string());
    metadata
}

fn load_txt(path: &Path) -> Result<Vec<Document>> {
    let content = fs::read_to_string(path)?;
    Ok(vec![Document {
        id: String::new(),
        content,
        metadata: source_metadata(path),
        source: path.to_path_buf(),
    }])
}

fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let bytes = fs::read(path)?;
    let content = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
        Error::Ingestion(format!("PDF extraction failed for {}: {}", path.display(), e))
    })?;
    Ok(vec![Document {
        id: String::new(),
        content,
        metadata: source_metadata(path),
        source: path.to_path_buf(),
    }])
}

/// One document per worksheet; cell text comes from the shared-string table.
fn load_xlsx(path: &Path) -> Result<Vec<Document>> {
    let bytes = fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| Error::Ingestion(format!("{}: {}", path.display(), e)))?;

    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_names = worksheet_names(&mut archive);

    let mut docs = Vec::new();
    for (ordinal, name) in sheet_names.into_iter().enumerate() {
        let xml = read_zip_entry(&mut archive, &name)?;
        let text = sheet_cell_text(&xml, &shared_strings)?;
        if text.is_empty() {
            continue;
        }
        let mut metadata = source_metadata(path);
        metadata.insert("sheet".to_string(), format!("{}", ordinal + 1));
        docs.push(Document {
            id: String::new(),
            content: text,
            metadata,
            source: path.to_path_buf(),
        });
    }
    Ok(docs)
}

fn read_zip_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|e| Error::Ingestion(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| Error::Ingestion(e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(Error::Ingestion(format!(
            "ZIP entry {} exceeds size limit",
            name
        )));
    }
    Ok(out)
}

fn worksheet_names(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>> {
    // A workbook with no text cells has no shared-string table.
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry(archive, "xl/sharedStrings.xml")?;

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        strings.push(te.unescape().unwrap_or_default().into_owned());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::Ingestion(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn sheet_cell_text(xml: &[u8], shared_strings: &[String]) -> Result<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_v = false;
    let mut cell_is_shared_str = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                } else if e.local_name().as_ref() == b"v" {
                    in_v = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_v => {
                let value = te.unescape().unwrap_or_default();
                let trimmed = value.trim();
                if !trimmed.is_empty() && cell_is_shared_str {
                    if let Ok(i) = trimmed.parse::<usize>() {
                        if i < shared_strings.len() {
                            cells.push(shared_strings[i].clone());
                        }
                    }
                }
                in_v = false;
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"v" {
                    in_v = false;
                } else if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::Ingestion(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_empty() {
        let registry = LoaderRegistry::default();
        let docs = load_tree(Path::new("/nonexistent/data/rag"), &registry).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn loads_supported_files_and_skips_the_rest() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("manuals");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("schedule.txt"), "Work ends on the 30th.").unwrap();
        fs::write(folder.join("photo.jpg"), b"\xff\xd8\xff").unwrap();

        let hidden = tmp.path().join(".cache");
        fs::create_dir(&hidden).unwrap();
        fs::write(hidden.join("notes.txt"), "should not be loaded").unwrap();

        // Files directly under the root are not ingested either.
        fs::write(tmp.path().join("stray.txt"), "also skipped").unwrap();

        let registry = LoaderRegistry::default();
        let docs = load_tree(tmp.path(), &registry).unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Work ends on the 30th.");
        assert!(!docs[0].id.is_empty());
        assert!(docs[0].metadata.contains_key("source"));
    }

    #[test]
    fn each_document_gets_a_distinct_identity() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("plans");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("a.txt"), "first").unwrap();
        fs::write(folder.join("b.txt"), "second").unwrap();

        let docs = load_tree(tmp.path(), &LoaderRegistry::default()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_ne!(docs[0].id, docs[1].id);
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let registry = LoaderRegistry::default();
        assert!(registry.get("PDF").is_some());
        assert!(registry.get("xls").is_none());
    }
}
