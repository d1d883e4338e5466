//! Lightweight description of delimited tabular files.

use crate::error::{InsightError, Result};
use crate::parser;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const DELIMITERS: &[char] = &[',', ';', '\t', '|'];
const MAX_NUMERIC_COLUMNS: usize = 10;
const MAX_CATEGORICAL_COLUMNS: usize = 3;
const MAX_CATEGORY_CARDINALITY: usize = 20;
const MAX_CATEGORY_AVG_LEN: f64 = 20.0;
const TOP_VALUES: usize = 5;
const IDENTIFIER_COLUMNS: &[&str] = &["name", "id", "uuid"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalColumn {
    pub column: String,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvSummary {
    pub delimiter: char,
    pub rows: usize,
    pub cols: usize,
    pub missing_cells: usize,
    pub total_cells: usize,
    pub numeric_cols: Vec<String>,
    pub categorical: Vec<CategoricalColumn>,
}

fn sniff_delimiter(header: &str) -> char {
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| (header.matches(*d).count(), std::cmp::Reverse(DELIMITERS.iter().position(|x| x == d))))
        .unwrap_or(',')
}

/// Split one record, honouring double quotes (`""` inside quotes is a quote).
fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut cur)),
            c => cur.push(c),
        }
    }
    fields.push(cur);
    fields
}

/// Describe a CSV-like source: the first non-blank line is the header.
pub fn describe_csv<R: BufRead>(mut reader: R) -> std::io::Result<CsvSummary> {
    let mut buf = Vec::new();
    let mut records: Vec<String> = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = parser::decode_best_effort(parser::trim_record_end(&buf)).into_owned();
        if !line.trim().is_empty() {
            records.push(line);
        }
    }
    let Some((header, body)) = records.split_first() else {
        return Ok(CsvSummary {
            delimiter: ',',
            rows: 0,
            cols: 0,
            missing_cells: 0,
            total_cells: 0,
            numeric_cols: Vec::new(),
            categorical: Vec::new(),
        });
    };
    let delimiter = sniff_delimiter(header);
    let columns: Vec<String> = split_record(header, delimiter).into_iter().map(|c| c.trim().to_string()).collect();
    let cols = columns.len();
    let mut values: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(body.len()); cols];
    let mut missing_cells = 0;
    for record in body {
        let mut fields = split_record(record, delimiter).into_iter();
        for column in values.iter_mut() {
            let v = fields.next().map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
            if v.is_none() {
                missing_cells += 1;
            }
            column.push(v);
        }
    }

    let mut numeric_cols = Vec::new();
    let mut categorical = Vec::new();
    for (name, column) in columns.iter().zip(&values) {
        let present: Vec<&str> = column.iter().flatten().map(String::as_str).collect();
        if present.is_empty() {
            continue;
        }
        if present.iter().all(|v| v.parse::<f64>().is_ok()) {
            if numeric_cols.len() < MAX_NUMERIC_COLUMNS {
                numeric_cols.push(name.clone());
            }
            continue;
        }
        if categorical.len() >= MAX_CATEGORICAL_COLUMNS
            || IDENTIFIER_COLUMNS.contains(&name.to_lowercase().as_str())
        {
            continue;
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in &present {
            *counts.entry(*v).or_insert(0) += 1;
        }
        let avg_len = present.iter().map(|v| v.chars().count()).sum::<usize>() as f64 / present.len() as f64;
        if counts.len() > MAX_CATEGORY_CARDINALITY || avg_len > MAX_CATEGORY_AVG_LEN {
            continue;
        }
        let mut top: Vec<ValueCount> =
            counts.into_iter().map(|(value, count)| ValueCount { value: value.to_string(), count }).collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        top.truncate(TOP_VALUES);
        categorical.push(CategoricalColumn { column: name.clone(), top_values: top });
    }

    Ok(CsvSummary {
        delimiter,
        rows: body.len(),
        cols,
        missing_cells,
        total_cells: body.len() * cols,
        numeric_cols,
        categorical,
    })
}

pub fn describe_csv_file(path: &Path) -> Result<CsvSummary> {
    let file = File::open(path).map_err(|e| InsightError::io(path, e))?;
    describe_csv(BufReader::new(file)).map_err(|e| InsightError::io(path, e))
}
