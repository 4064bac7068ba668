//! Build the license table from the regulator's CSV exports.
//!
//! The ingredient export has one row per (license, ingredient). Rows are
//! grouped per normalized license string; each license is written under its
//! full key and, when different, under its bare digits so either form of
//! user input resolves. An optional product export adds the Chinese product
//! name to each record.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::table::{DetailedRecord, LicenseRecord, LicenseTable};
use super::LicenseDbError;

pub const BUILD_SOURCE: &str = "TFDA_43_csv";

const LICENSE_COLUMNS: &[&str] = &["許可證字號", "許可", "字號", "LICNO", "LICENSE"];
const ACTIVE_COLUMNS: &[&str] = &["成分名稱", "成分", "INGREDIENT", "ACTIVE"];
const NAME_COLUMNS: &[&str] = &["中文品名", "品名", "中文"];
const PLACEHOLDERS: &[&str] = &["None", "-", "nan"];

static RE_DOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d[\d.,]*\s*(?:mg|ml|mcg|g|iu|%|unit|cc)s?").unwrap());
static RE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（【\[].*?[)）】\]]").unwrap());
static RE_BUILD_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{5,7}").unwrap());

/// Counts reported after a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub licenses: usize,
    pub keys: usize,
    pub skipped_rows: usize,
    pub named: usize,
}

/// Strip ASCII and ideographic spaces.
pub fn normalize_license(raw: &str) -> String {
    raw.replace([' ', '\u{3000}'], "").trim().to_string()
}

/// Digits core used as the secondary key (5–7 digits in the export).
pub fn license_digits(raw: &str) -> String {
    RE_BUILD_DIGITS
        .find(raw)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Reduce an ingredient cell to a lowercase generic name, or empty when too
/// little is left.
pub fn clean_active(raw: &str) -> String {
    let s = raw.trim();
    let s = RE_DOSE.replace_all(s, "");
    let s = RE_ANNOTATION.replace_all(&s, "");
    let s = s.trim_matches(|c| matches!(c, ' ' | '.' | ',' | '，' | '。' | '\t'));
    if s.chars().count() >= 2 {
        s.to_lowercase()
    } else {
        String::new()
    }
}

/// First header containing any keyword, trying keywords in priority order.
pub fn find_column(headers: &[String], keywords: &[&str]) -> Option<usize> {
    keywords
        .iter()
        .find_map(|kw| headers.iter().position(|h| h.contains(kw)))
}

struct Sheet {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

/// Decode an export as UTF-8 (BOM optional), falling back to Big5. The
/// Big5 table also covers cp950, the other encoding these exports ship in.
pub fn decode_export(bytes: &[u8]) -> Result<String, LicenseDbError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    encoding_rs::BIG5
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| {
            tracing::info!("CSV export is not UTF-8, decoded as Big5");
            text.into_owned()
        })
        .ok_or_else(|| LicenseDbError::Build("export is neither UTF-8 nor Big5".into()))
}

fn read_sheet<R: Read>(mut input: R) -> Result<Sheet, LicenseDbError> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|e| LicenseDbError::Build(e.to_string()))?;
    let text = decode_export(&raw)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LicenseDbError::Build(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LicenseDbError::Build(e.to_string()))?;

    Ok(Sheet { headers, rows })
}

fn required_column(headers: &[String], keywords: &[&str], what: &str) -> Result<usize, LicenseDbError> {
    find_column(headers, keywords).ok_or_else(|| {
        LicenseDbError::Build(format!("no {what} column among {headers:?}"))
    })
}

fn cell<'a>(row: &'a csv::StringRecord, idx: usize) -> &'a str {
    row.get(idx).unwrap_or("").trim()
}

/// Build a table from an ingredient export and an optional product export.
pub fn build_table<R: Read, N: Read>(
    ingredients: R,
    product_names: Option<N>,
    updated: NaiveDate,
) -> Result<(LicenseTable, BuildReport), LicenseDbError> {
    let sheet = read_sheet(ingredients)?;
    let license_col = required_column(&sheet.headers, LICENSE_COLUMNS, "license")?;
    let active_col = required_column(&sheet.headers, ACTIVE_COLUMNS, "ingredient")?;

    let mut report = BuildReport::default();
    let mut order: Vec<String> = Vec::new();
    let mut actives_by_license: HashMap<String, Vec<String>> = HashMap::new();

    for row in &sheet.rows {
        let license_raw = cell(row, license_col);
        let active_raw = cell(row, active_col);
        if license_raw.is_empty() || active_raw.is_empty() || PLACEHOLDERS.contains(&active_raw) {
            report.skipped_rows += 1;
            continue;
        }

        let license = normalize_license(license_raw);
        let active = clean_active(active_raw);
        if license.is_empty() || active.is_empty() {
            continue;
        }

        let actives = actives_by_license.entry(license.clone()).or_insert_with(|| {
            order.push(license);
            Vec::new()
        });
        if !actives.contains(&active) {
            actives.push(active);
        }
    }

    let names = match product_names {
        Some(reader) => read_product_names(reader)?,
        None => HashMap::new(),
    };

    let updated = updated.format("%Y-%m-%d").to_string();
    let mut table = LicenseTable::new();
    for license in order {
        let Some(actives) = actives_by_license.remove(&license) else {
            continue;
        };
        let name_zh = names.get(&license).cloned();
        if name_zh.is_some() {
            report.named += 1;
        }

        let record = LicenseRecord::Detailed(DetailedRecord {
            actives,
            source: Some(BUILD_SOURCE.to_string()),
            updated: Some(updated.clone()),
            name_zh,
        });

        let digits = license_digits(&license);
        if !digits.is_empty() && digits != license {
            table.insert(digits, record.clone());
        }
        table.insert(license, record);
        report.licenses += 1;
    }
    report.keys = table.len();

    tracing::info!(
        licenses = report.licenses,
        keys = report.keys,
        skipped = report.skipped_rows,
        named = report.named,
        "Built license table"
    );

    Ok((table, report))
}

/// Normalized license → Chinese product name. Missing columns only warn,
/// since names are optional decoration.
fn read_product_names<R: Read>(reader: R) -> Result<HashMap<String, String>, LicenseDbError> {
    let sheet = read_sheet(reader)?;
    let (Some(license_col), Some(name_col)) = (
        find_column(&sheet.headers, LICENSE_COLUMNS),
        find_column(&sheet.headers, NAME_COLUMNS),
    ) else {
        tracing::warn!(headers = ?sheet.headers, "Product export lacks license/name columns, skipping");
        return Ok(HashMap::new());
    };

    let mut names = HashMap::new();
    for row in &sheet.rows {
        let license = cell(row, license_col);
        let name = cell(row, name_col);
        if !license.is_empty() && !name.is_empty() && !PLACEHOLDERS.contains(&name) {
            names.insert(normalize_license(license), name.to_string());
        }
    }
    Ok(names)
}

/// Build from files and write the JSON table, creating parent directories.
pub fn build_table_file(
    ingredients_csv: &Path,
    product_csv: Option<&Path>,
    output: &Path,
    updated: NaiveDate,
) -> Result<BuildReport, LicenseDbError> {
    let open = |path: &Path| {
        std::fs::File::open(path)
            .map_err(|e| LicenseDbError::Read(path.display().to_string(), e.to_string()))
    };

    let ingredients = open(ingredients_csv)?;
    let products = product_csv.map(open).transpose()?;
    let (table, report) = build_table(ingredients, products, updated)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LicenseDbError::Build(format!("{}: {e}", parent.display())))?;
    }
    std::fs::write(output, table.to_json()?)
        .map_err(|e| LicenseDbError::Build(format!("{}: {e}", output.display())))?;

    Ok(report)
}
