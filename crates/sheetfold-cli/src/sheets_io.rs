//! Sheet adapters at the process boundary: CSV directories and JSON sheet
//! files in, CSVs or a JSON sheet file out. CSV cells are read as text; the
//! engine's schema-driven coercion supplies the types.

use anyhow::{Context, Result, bail};
use sheetfold_engine::{CellValue, Flattener, InputRow, InputSheets, display_json};
use std::path::Path;

pub fn read_json_sheets(path: &Path) -> Result<InputSheets> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    let Some(object) = document.as_object() else {
        bail!("{} must hold an object of sheets", path.display());
    };

    let mut sheets = InputSheets::new();
    for (name, rows) in object {
        let Some(rows) = rows.as_array() else {
            bail!("sheet `{name}` must be an array of rows");
        };
        let mut input_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(cells) = row.as_object() else {
                bail!("sheet `{name}` has a non-object row");
            };
            let row: InputRow = cells
                .iter()
                .map(|(column, value)| (column.clone(), CellValue::from_json(value)))
                .collect();
            input_rows.push(row);
        }
        sheets.insert(name.clone(), input_rows);
    }
    Ok(sheets)
}

pub fn read_csv_dir(dir: &Path) -> Result<InputSheets> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut sheets = InputSheets::new();
    for path in paths {
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("reading headers of {}", path.display()))?
            .clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("reading {}", path.display()))?;
            let row: InputRow = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.to_string(), CellValue::from(cell)))
                .collect();
            rows.push(row);
        }
        sheets.insert(name.to_string(), rows);
    }
    Ok(sheets)
}

pub fn write_csv_sheets(dir: &Path, flattener: &Flattener<'_>) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_csv_sheet(dir, flattener.main_sheet())?;
    for sheet in flattener.sub_sheets().values() {
        write_csv_sheet(dir, sheet)?;
    }
    Ok(())
}

fn write_csv_sheet(dir: &Path, sheet: &sheetfold_engine::Sheet) -> Result<()> {
    let path = dir.join(format!("{}.csv", sheet.name()));
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    let columns: Vec<&str> = sheet.columns().collect();
    writer
        .write_record(&columns)
        .with_context(|| format!("writing {}", path.display()))?;
    for line in sheet.lines() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| line.get(*column).map(display_json).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn write_json_sheets(path: &Path, flattener: &Flattener<'_>) -> Result<()> {
    let mut document = serde_json::Map::new();
    let mut add = |sheet: &sheetfold_engine::Sheet| {
        let rows: Vec<serde_json::Value> = sheet
            .lines()
            .iter()
            .map(|line| serde_json::Value::Object(line.clone()))
            .collect();
        document.insert(sheet.name().to_string(), serde_json::Value::Array(rows));
    };
    add(flattener.main_sheet());
    for sheet in flattener.sub_sheets().values() {
        add(sheet);
    }
    let rendered = serde_json::to_string_pretty(&serde_json::Value::Object(document))
        .context("serializing sheets")?;
    std::fs::write(path, rendered + "\n").with_context(|| format!("writing {}", path.display()))
}
